pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod tensor;
