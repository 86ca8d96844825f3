//! Face embedding summarizer.
//!
//! Splits a 512-float face embedding into 43 labelled attribute records so it
//! can ride along with per-object classifier metadata. Chunks 0..=41 hold 12
//! values each and chunk 42 holds the remaining 8.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const EMBEDDING_SIZE: usize = 512;
pub const CHUNK_SIZE: usize = 12;
pub const CHUNK_COUNT: usize = EMBEDDING_SIZE.div_ceil(CHUNK_SIZE);

const LABEL_SEPARATOR: &str = ",";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("embedding must hold {expected} values, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("expected {expected} embedding chunks, got {actual}")]
    ChunkCount { expected: usize, actual: usize },

    #[error("embedding chunk {index} is malformed: {reason}")]
    MalformedChunk { index: usize, reason: String },
}

/// One labelled slice of an embedding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingAttribute {
    pub index: usize,
    pub value: u32,
    pub confidence: f32,
    /// Comma-joined decimal values of this chunk.
    pub label: String,
}

/// Number of values stored in chunk `index`.
pub fn chunk_len(index: usize) -> usize {
    EMBEDDING_SIZE
        .saturating_sub(index * CHUNK_SIZE)
        .min(CHUNK_SIZE)
}

pub fn summarize(embedding: &[f32]) -> Result<Vec<EmbeddingAttribute>, EmbeddingError> {
    if embedding.len() != EMBEDDING_SIZE {
        return Err(EmbeddingError::Length {
            expected: EMBEDDING_SIZE,
            actual: embedding.len(),
        });
    }

    let attributes = embedding
        .chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(index, chunk)| EmbeddingAttribute {
            index,
            value: 1,
            confidence: 1.0,
            label: chunk
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(LABEL_SEPARATOR),
        })
        .collect();
    Ok(attributes)
}

/// Parses attribute labels back into the original embedding.
///
/// Attributes must be in chunk order and each must hold exactly the number
/// of values its position calls for.
pub fn reassemble(attributes: &[EmbeddingAttribute]) -> Result<Vec<f32>, EmbeddingError> {
    if attributes.len() != CHUNK_COUNT {
        return Err(EmbeddingError::ChunkCount {
            expected: CHUNK_COUNT,
            actual: attributes.len(),
        });
    }

    let mut embedding = Vec::with_capacity(EMBEDDING_SIZE);
    for (position, attr) in attributes.iter().enumerate() {
        if attr.index != position {
            return Err(EmbeddingError::MalformedChunk {
                index: position,
                reason: format!("found chunk index {} out of order", attr.index),
            });
        }
        let start = embedding.len();
        for token in attr.label.split(LABEL_SEPARATOR) {
            let value = token
                .trim()
                .parse::<f32>()
                .map_err(|e| EmbeddingError::MalformedChunk {
                    index: position,
                    reason: format!("'{token}': {e}"),
                })?;
            embedding.push(value);
        }
        let parsed = embedding.len() - start;
        if parsed != chunk_len(position) {
            return Err(EmbeddingError::MalformedChunk {
                index: position,
                reason: format!("holds {parsed} values, expected {}", chunk_len(position)),
            });
        }
    }
    Ok(embedding)
}
