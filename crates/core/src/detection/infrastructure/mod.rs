pub mod box_decoder;
pub mod face_decoder;
pub mod face_extractor;
