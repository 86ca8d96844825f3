pub mod batch_executor;
pub mod decode_dump_use_case;
pub mod dump_decoder;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod tensor_dump;
