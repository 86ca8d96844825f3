pub mod candidate_decoder;
pub mod detection;
pub mod detection_params;
pub mod face_landmarks;
pub mod frame_scaler;
