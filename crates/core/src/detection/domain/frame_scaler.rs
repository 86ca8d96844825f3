use super::detection::{Detection, FaceDetection};
use super::detection_params::NetworkInfo;
use crate::shared::error::DecodeError;
use crate::shared::geometry::BoxRect;

/// Maps decoded coordinates from network resolution back to the source frame.
///
/// Each axis is scaled independently (`frame_w / net_w`, `frame_h / net_h`),
/// so a stretched network input maps back without distortion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameScaler {
    sx: f32,
    sy: f32,
}

impl FrameScaler {
    pub fn new(network: NetworkInfo, frame_width: u32, frame_height: u32) -> Result<Self, DecodeError> {
        if network.width == 0 || network.height == 0 || frame_width == 0 || frame_height == 0 {
            return Err(DecodeError::InvalidParams(format!(
                "cannot rescale {network} to {frame_width}x{frame_height}"
            )));
        }
        Ok(Self {
            sx: frame_width as f32 / network.width as f32,
            sy: frame_height as f32 / network.height as f32,
        })
    }

    pub fn factors(&self) -> (f32, f32) {
        (self.sx, self.sy)
    }

    pub fn scale_corners(&self, [x1, y1, x2, y2]: [f32; 4]) -> [f32; 4] {
        [x1 * self.sx, y1 * self.sy, x2 * self.sx, y2 * self.sy]
    }

    pub fn scale_detection(&self, det: &Detection) -> Detection {
        let r = det.rect;
        Detection {
            rect: BoxRect {
                left: r.left * self.sx,
                top: r.top * self.sy,
                width: r.width * self.sx,
                height: r.height * self.sy,
            },
            ..*det
        }
    }

    pub fn scale_face(&self, face: &FaceDetection) -> FaceDetection {
        FaceDetection {
            bbox: self.scale_corners(face.bbox),
            landmarks: face.landmarks.scaled(self.sx, self.sy),
            ..*face
        }
    }
}
