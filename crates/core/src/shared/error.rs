use thiserror::Error;

/// Input-validation failures raised while decoding one tensor set.
///
/// All variants are local to a single decode call. Degenerate geometry is
/// not represented here: undersized boxes are dropped silently.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("expected {expected} output layers, got {actual}")]
    LayerCount { expected: usize, actual: usize },
    #[error("missing output layer: {0}")]
    MissingLayer(&'static str),
    #[error("layer {layer} must have {expected} dimension(s), got {actual}")]
    Dimensionality {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("layer {layer} must have row stride {expected}, got {actual}")]
    RowStride {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("layer {layer} must hold {expected} data")]
    DataType {
        layer: &'static str,
        expected: &'static str,
    },
    #[error("layer {layer} needs {needed} elements but its buffer holds {actual}")]
    BufferTooShort {
        layer: &'static str,
        needed: usize,
        actual: usize,
    },
    #[error("layer {layer} declares more elements than can be addressed")]
    DimsOverflow { layer: &'static str },
    #[error("layer {layer} declares {declared} elements but its buffer holds {actual}")]
    BufferSizeMismatch {
        layer: &'static str,
        declared: usize,
        actual: usize,
    },
    #[error("detection count tensor is empty")]
    MissingCount,
    #[error("detection count must not be negative, got {0}")]
    NegativeCount(i32),
    #[error("detection count {count} exceeds the {rows} rows available in layer {layer}")]
    CountExceedsRows {
        layer: &'static str,
        count: usize,
        rows: usize,
    },
    #[error("row {row} of layer {layer} is out of bounds")]
    RowOutOfBounds { layer: &'static str, row: usize },
    #[error("row {row}: class id {value} is not a valid index")]
    InvalidClassId { row: usize, value: f32 },
    #[error("row {row}: class id {class_id} is outside the {num_classes}-entry threshold table")]
    ClassIdOutOfRange {
        row: usize,
        class_id: usize,
        num_classes: usize,
    },
    #[error("invalid detection parameters: {0}")]
    InvalidParams(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_layer() {
        let err = DecodeError::CountExceedsRows {
            layer: "boxes",
            count: 12,
            rows: 10,
        };
        assert_eq!(
            err.to_string(),
            "detection count 12 exceeds the 10 rows available in layer boxes"
        );
    }

    #[test]
    fn test_class_id_out_of_range_message() {
        let err = DecodeError::ClassIdOutOfRange {
            row: 3,
            class_id: 80,
            num_classes: 80,
        };
        assert!(err.to_string().contains("80-entry threshold table"));
    }
}
