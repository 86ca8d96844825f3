//! Typed, length-checked views over raw detector output layers.
//!
//! The host hands over one buffer per output layer together with its declared
//! dimensions. Nothing here trusts a buffer to describe itself: the row count
//! is read once from the count layer and every other layer is validated
//! against it before any row is read.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// Floats per row in the box layer: `(x1, y1, x2, y2)`.
pub const BOX_STRIDE: usize = 4;
/// Floats per row in the score and class layers.
pub const SCALAR_STRIDE: usize = 1;
/// Floats per row in the landmark layer: five interleaved `(x, y)` pairs.
pub const LANDMARK_STRIDE: usize = 10;

pub const COUNT_LAYER: &str = "num_detections";
pub const BOXES_LAYER: &str = "boxes";
pub const SCORES_LAYER: &str = "scores";
pub const CLASSES_LAYER: &str = "classes";
pub const LANDMARKS_LAYER: &str = "landmarks";

/// Element storage of one output layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorBuffer {
    Int32(Vec<i32>),
    Float32(Vec<f32>),
}

impl TensorBuffer {
    pub fn len(&self) -> usize {
        match self {
            TensorBuffer::Int32(v) => v.len(),
            TensorBuffer::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One host-side output layer: name, declared dimensions (batch excluded) and buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TensorLayer {
    pub name: String,
    pub dims: Vec<usize>,
    pub buffer: TensorBuffer,
}

impl TensorLayer {
    pub fn int32(name: &str, dims: Vec<usize>, data: Vec<i32>) -> Self {
        Self {
            name: name.to_string(),
            dims,
            buffer: TensorBuffer::Int32(data),
        }
    }

    pub fn float32(name: &str, dims: Vec<usize>, data: Vec<f32>) -> Self {
        Self {
            name: name.to_string(),
            dims,
            buffer: TensorBuffer::Float32(data),
        }
    }

    /// Number of elements the declared dimensions describe, or `None` when
    /// the product does not fit in `usize`.
    pub fn num_elements(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }
}

/// Which decoder a layer list is meant for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorSetKind {
    /// count, boxes, scores, classes
    Boxes,
    /// count, boxes, scores, classes, landmarks
    Faces,
}

impl TensorSetKind {
    pub fn layer_count(self) -> usize {
        match self {
            TensorSetKind::Boxes => 4,
            TensorSetKind::Faces => 5,
        }
    }
}

/// Row-major view over a flattened float buffer with a fixed row stride.
///
/// Only the first `rows` rows of the buffer are visible; reads past them
/// return `None` instead of touching memory.
#[derive(Clone, Copy, Debug)]
pub struct StridedView<'a> {
    layer: &'static str,
    rows: ArrayView2<'a, f32>,
}

impl<'a> StridedView<'a> {
    pub fn new(
        layer: &'static str,
        data: &'a [f32],
        stride: usize,
        rows: usize,
    ) -> Result<Self, DecodeError> {
        let needed = rows * stride;
        let too_short = DecodeError::BufferTooShort {
            layer,
            needed,
            actual: data.len(),
        };
        if data.len() < needed {
            return Err(too_short);
        }
        let rows = ArrayView2::from_shape((rows, stride), &data[..needed]).map_err(|_| too_short)?;
        Ok(Self { layer, rows })
    }

    pub fn layer(&self) -> &'static str {
        self.layer
    }

    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    pub fn stride(&self) -> usize {
        self.rows.ncols()
    }

    /// Copies row `index` into a fixed-size array. `N` must equal the stride.
    pub fn row<const N: usize>(&self, index: usize) -> Option<[f32; N]> {
        if N != self.stride() || index >= self.len() {
            return None;
        }
        let mut out = [0.0f32; N];
        for (col, value) in out.iter_mut().enumerate() {
            *value = *self.rows.get((index, col))?;
        }
        Some(out)
    }

    /// First element of row `index`, for stride-1 layers.
    pub fn scalar(&self, index: usize) -> Option<f32> {
        self.rows.get((index, 0)).copied()
    }

    fn checked_row<const N: usize>(&self, index: usize) -> Result<[f32; N], DecodeError> {
        self.row(index).ok_or(DecodeError::RowOutOfBounds {
            layer: self.layer,
            row: index,
        })
    }

    fn checked_scalar(&self, index: usize) -> Result<f32, DecodeError> {
        self.scalar(index).ok_or(DecodeError::RowOutOfBounds {
            layer: self.layer,
            row: index,
        })
    }
}

/// The validated output of one inference pass.
///
/// Every view holds exactly `num_detections` rows, so any row index below
/// the count is readable from every layer.
#[derive(Clone, Copy, Debug)]
pub struct RawTensorSet<'a> {
    num_detections: usize,
    boxes: StridedView<'a>,
    scores: StridedView<'a>,
    classes: StridedView<'a>,
    landmarks: Option<StridedView<'a>>,
}

impl<'a> RawTensorSet<'a> {
    /// Builds a tensor set from plain slices, sizing rows from each slice length.
    pub fn new(
        count: i32,
        boxes: &'a [f32],
        scores: &'a [f32],
        classes: &'a [f32],
        landmarks: Option<&'a [f32]>,
    ) -> Result<Self, DecodeError> {
        let count = checked_count(count)?;
        let boxes = view_for_count(BOXES_LAYER, boxes, BOX_STRIDE, boxes.len() / BOX_STRIDE, count)?;
        let scores = view_for_count(SCORES_LAYER, scores, SCALAR_STRIDE, scores.len(), count)?;
        let classes = view_for_count(CLASSES_LAYER, classes, SCALAR_STRIDE, classes.len(), count)?;
        let landmarks = landmarks
            .map(|data| {
                view_for_count(
                    LANDMARKS_LAYER,
                    data,
                    LANDMARK_STRIDE,
                    data.len() / LANDMARK_STRIDE,
                    count,
                )
            })
            .transpose()?;

        Ok(Self {
            num_detections: count,
            boxes,
            scores,
            classes,
            landmarks,
        })
    }

    /// Validates a host layer list in positional order:
    /// count, boxes, scores, classes and (faces only) landmarks.
    pub fn from_layers(layers: &'a [TensorLayer], kind: TensorSetKind) -> Result<Self, DecodeError> {
        if layers.len() != kind.layer_count() {
            return Err(DecodeError::LayerCount {
                expected: kind.layer_count(),
                actual: layers.len(),
            });
        }

        let count = match &layers[0].buffer {
            TensorBuffer::Int32(data) => *data.first().ok_or(DecodeError::MissingCount)?,
            TensorBuffer::Float32(_) => {
                return Err(DecodeError::DataType {
                    layer: COUNT_LAYER,
                    expected: "int32",
                })
            }
        };
        let count = checked_count(count)?;

        let boxes = layer_view(&layers[1], BOXES_LAYER, 2, BOX_STRIDE, count)?;
        let scores = layer_view(&layers[2], SCORES_LAYER, 1, SCALAR_STRIDE, count)?;
        let classes = layer_view(&layers[3], CLASSES_LAYER, 1, SCALAR_STRIDE, count)?;
        let landmarks = match kind {
            TensorSetKind::Boxes => None,
            TensorSetKind::Faces => Some(layer_view(
                &layers[4],
                LANDMARKS_LAYER,
                2,
                LANDMARK_STRIDE,
                count,
            )?),
        };

        Ok(Self {
            num_detections: count,
            boxes,
            scores,
            classes,
            landmarks,
        })
    }

    pub fn num_detections(&self) -> usize {
        self.num_detections
    }

    pub fn has_landmarks(&self) -> bool {
        self.landmarks.is_some()
    }

    pub fn corners(&self, row: usize) -> Result<[f32; BOX_STRIDE], DecodeError> {
        self.boxes.checked_row(row)
    }

    pub fn score(&self, row: usize) -> Result<f32, DecodeError> {
        self.scores.checked_scalar(row)
    }

    /// Raw class value as stored by the network (a float).
    pub fn class_value(&self, row: usize) -> Result<f32, DecodeError> {
        self.classes.checked_scalar(row)
    }

    pub fn landmarks(&self, row: usize) -> Result<[f32; LANDMARK_STRIDE], DecodeError> {
        self.landmarks
            .as_ref()
            .ok_or(DecodeError::MissingLayer(LANDMARKS_LAYER))?
            .checked_row(row)
    }
}

fn checked_count(count: i32) -> Result<usize, DecodeError> {
    usize::try_from(count).map_err(|_| DecodeError::NegativeCount(count))
}

fn view_for_count<'a>(
    layer: &'static str,
    data: &'a [f32],
    stride: usize,
    rows: usize,
    count: usize,
) -> Result<StridedView<'a>, DecodeError> {
    if count > rows {
        return Err(DecodeError::CountExceedsRows { layer, count, rows });
    }
    StridedView::new(layer, data, stride, count)
}

fn layer_view<'a>(
    layer: &'a TensorLayer,
    name: &'static str,
    num_dims: usize,
    stride: usize,
    count: usize,
) -> Result<StridedView<'a>, DecodeError> {
    let data = match &layer.buffer {
        TensorBuffer::Float32(data) => data,
        TensorBuffer::Int32(_) => {
            return Err(DecodeError::DataType {
                layer: name,
                expected: "float32",
            })
        }
    };
    if layer.dims.len() != num_dims {
        return Err(DecodeError::Dimensionality {
            layer: name,
            expected: num_dims,
            actual: layer.dims.len(),
        });
    }
    if num_dims == 2 && layer.dims[1] != stride {
        return Err(DecodeError::RowStride {
            layer: name,
            expected: stride,
            actual: layer.dims[1],
        });
    }
    let declared = layer
        .num_elements()
        .ok_or(DecodeError::DimsOverflow { layer: name })?;
    if data.len() < declared {
        return Err(DecodeError::BufferTooShort {
            layer: name,
            needed: declared,
            actual: data.len(),
        });
    }
    if data.len() > declared {
        return Err(DecodeError::BufferSizeMismatch {
            layer: name,
            declared,
            actual: data.len(),
        });
    }
    view_for_count(name, data, stride, layer.dims[0], count)
}
