//! On-disk form of captured detector output and of decoded results.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detection::{Detection, FaceDetection};
use crate::detection::domain::frame_scaler::FrameScaler;
use crate::detection::infrastructure::face_extractor::ExtractedFaces;
use crate::shared::error::DecodeError;
use crate::shared::tensor::TensorLayer;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize output: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("frame {frame}: {source}")]
    Decode {
        frame: u64,
        #[source]
        source: DecodeError,
    },
    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
}

/// Output layers captured for one frame.
///
/// `frame_width`/`frame_height` are the source frame size; when both are
/// present, decoded coordinates are rescaled from network to frame space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameTensors {
    pub frame: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_height: Option<u32>,
    pub layers: Vec<TensorLayer>,
}

impl FrameTensors {
    pub fn new(frame: u64, layers: Vec<TensorLayer>) -> Self {
        Self {
            frame,
            frame_width: None,
            frame_height: None,
            layers,
        }
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_width = Some(width);
        self.frame_height = Some(height);
        self
    }

    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_width.zip(self.frame_height)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TensorDump {
    pub frames: Vec<FrameTensors>,
}

impl TensorDump {
    pub fn load(path: &Path) -> Result<Self, DumpError> {
        let json = fs::read_to_string(path).map_err(|e| DumpError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| DumpError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DumpError> {
        let json = serde_json::to_string(self).map_err(DumpError::Serialize)?;
        fs::write(path, json).map_err(|e| DumpError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Decoded records of one frame, tagged by decoder kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameRecords {
    Boxes(Vec<Detection>),
    Faces(Vec<FaceDetection>),
    Extracted(ExtractedFaces),
}

impl FrameRecords {
    pub fn len(&self) -> usize {
        match self {
            FrameRecords::Boxes(dets) => dets.len(),
            FrameRecords::Faces(faces) => faces.len(),
            FrameRecords::Extracted(extracted) => extracted.faces.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rescaled(self, scaler: &FrameScaler) -> Self {
        match self {
            FrameRecords::Boxes(dets) => {
                FrameRecords::Boxes(dets.iter().map(|d| scaler.scale_detection(d)).collect())
            }
            FrameRecords::Faces(faces) => {
                FrameRecords::Faces(faces.iter().map(|f| scaler.scale_face(f)).collect())
            }
            FrameRecords::Extracted(mut extracted) => {
                extracted.faces = extracted.faces.iter().map(|f| scaler.scale_face(f)).collect();
                FrameRecords::Extracted(extracted)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecodedFrame {
    pub frame: u64,
    pub records: FrameRecords,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedDump {
    pub frames: Vec<DecodedFrame>,
}

impl DecodedDump {
    pub fn total_records(&self) -> usize {
        self.frames.iter().map(|f| f.records.len()).sum()
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), DumpError> {
        serde_json::to_writer_pretty(writer, self).map_err(DumpError::Serialize)
    }

    pub fn save(&self, path: &Path) -> Result<(), DumpError> {
        let write_err = |e: std::io::Error| DumpError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        let file = fs::File::create(path).map_err(write_err)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(write_err)
    }

    pub fn load(path: &Path) -> Result<Self, DumpError> {
        let json = fs::read_to_string(path).map_err(|e| DumpError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| DumpError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_params::NetworkInfo;
    use crate::shared::geometry::BoxRect;
    use crate::shared::tensor::COUNT_LAYER;
    use tempfile::TempDir;

    fn detection(left: f32) -> Detection {
        Detection {
            rect: BoxRect {
                left,
                top: 10.0,
                width: 20.0,
                height: 20.0,
            },
            confidence: 0.9,
            class_id: 0,
        }
    }

    #[test]
    fn test_dump_load_after_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.json");
        let dump = TensorDump {
            frames: vec![
                FrameTensors::new(0, vec![TensorLayer::int32(COUNT_LAYER, vec![1], vec![0])]),
                FrameTensors::new(1, vec![]).with_frame_size(1920, 1080),
            ],
        };
        dump.save(&path).unwrap();
        let loaded = TensorDump::load(&path).unwrap();
        assert_eq!(loaded, dump);
        assert_eq!(loaded.frames[1].frame_size(), Some((1920, 1080)));
        assert_eq!(loaded.frames[0].frame_size(), None);
    }

    #[test]
    fn test_frame_size_fields_are_optional_in_json() {
        let json = r#"{"frames":[{"frame":7,"layers":[]}]}"#;
        let dump: TensorDump = serde_json::from_str(json).unwrap();
        assert_eq!(dump.frames[0].frame, 7);
        assert_eq!(dump.frames[0].frame_size(), None);
    }

    #[test]
    fn test_missing_dump_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = TensorDump::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DumpError::Read { .. }));
    }

    #[test]
    fn test_malformed_dump_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.json");
        fs::write(&path, r#"{"frames": 3}"#).unwrap();
        let err = TensorDump::load(&path).unwrap_err();
        assert!(matches!(err, DumpError::Parse { .. }));
    }

    #[test]
    fn test_records_are_tagged_by_kind() {
        let frame = DecodedFrame {
            frame: 3,
            records: FrameRecords::Boxes(vec![detection(1.0)]),
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["frame"], 3);
        assert_eq!(value["records"]["boxes"][0]["rect"]["left"], 1.0);
    }

    #[test]
    fn test_rescaled_boxes() {
        let scaler = FrameScaler::new(NetworkInfo::new(640, 640), 1280, 640).unwrap();
        let records = FrameRecords::Boxes(vec![detection(5.0)]).rescaled(&scaler);
        match records {
            FrameRecords::Boxes(dets) => {
                assert_eq!(dets[0].rect.left, 10.0);
                assert_eq!(dets[0].rect.top, 10.0);
                assert_eq!(dets[0].rect.width, 40.0);
            }
            other => panic!("unexpected records: {other:?}"),
        }
    }

    #[test]
    fn test_decoded_dump_write_and_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let decoded = DecodedDump {
            frames: vec![
                DecodedFrame {
                    frame: 0,
                    records: FrameRecords::Boxes(vec![detection(1.0), detection(2.0)]),
                },
                DecodedFrame {
                    frame: 1,
                    records: FrameRecords::Faces(vec![]),
                },
            ],
        };
        assert_eq!(decoded.total_records(), 2);
        decoded.save(&path).unwrap();
        assert_eq!(DecodedDump::load(&path).unwrap(), decoded);
    }

    #[test]
    fn test_decode_error_names_frame() {
        let err = DumpError::Decode {
            frame: 42,
            source: DecodeError::MissingCount,
        };
        assert!(err.to_string().starts_with("frame 42:"));
    }
}
