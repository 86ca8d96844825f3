use serde::{Deserialize, Serialize};

use super::face_landmarks::FaceLandmarks;
use crate::shared::geometry::BoxRect;

/// Generic object detection: box, confidence and class id.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rect: BoxRect,
    pub confidence: f32,
    pub class_id: usize,
}

/// Face detection with its box stored as corner pairs `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: usize,
    pub landmarks: FaceLandmarks,
}

impl FaceDetection {
    pub fn width(&self) -> f32 {
        self.bbox[2] - self.bbox[0]
    }

    pub fn height(&self) -> f32 {
        self.bbox[3] - self.bbox[1]
    }

    pub fn rect(&self) -> BoxRect {
        BoxRect::from_corners(self.bbox)
    }
}
