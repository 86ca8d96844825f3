//! Decoding of post-NMS object and face detector output tensors.
//!
//! The decoders turn the parallel float buffers an inference pass leaves
//! behind (row count, box corners, scores, class ids and optionally five
//! facial landmarks) into ordered, bounded lists of detections.

pub mod detection;
pub mod embedding;
pub mod pipeline;
pub mod shared;
