//! 5-point facial landmarks as emitted by the face detector.
//!
//! Stored exactly as the landmark layer lays them out: ten floats with x and
//! y interleaved, in the order left eye, right eye, nose, left mouth corner,
//! right mouth corner.

use serde::{Deserialize, Serialize};

use crate::shared::tensor::LANDMARK_STRIDE;

pub const NUM_LANDMARKS: usize = 5;

pub const LEFT_EYE: usize = 0;
pub const RIGHT_EYE: usize = 1;
pub const NOSE: usize = 2;
pub const LEFT_MOUTH: usize = 3;
pub const RIGHT_MOUTH: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    coords: [f32; LANDMARK_STRIDE],
}

impl FaceLandmarks {
    pub fn new(coords: [f32; LANDMARK_STRIDE]) -> Self {
        Self { coords }
    }

    pub fn from_points(points: [(f32, f32); NUM_LANDMARKS]) -> Self {
        let mut coords = [0.0; LANDMARK_STRIDE];
        for (i, (x, y)) in points.into_iter().enumerate() {
            coords[2 * i] = x;
            coords[2 * i + 1] = y;
        }
        Self { coords }
    }

    /// Interleaved `x, y` coordinates.
    pub fn coords(&self) -> &[f32; LANDMARK_STRIDE] {
        &self.coords
    }

    /// Landmark `index` as an `(x, y)` pair, or `None` past the fifth point.
    pub fn point(&self, index: usize) -> Option<(f32, f32)> {
        if index >= NUM_LANDMARKS {
            return None;
        }
        Some((self.coords[2 * index], self.coords[2 * index + 1]))
    }

    pub fn points(&self) -> [(f32, f32); NUM_LANDMARKS] {
        std::array::from_fn(|i| (self.coords[2 * i], self.coords[2 * i + 1]))
    }

    /// Adds `offset` to every coordinate, x and y alike.
    pub fn shifted(&self, offset: f32) -> Self {
        Self {
            coords: self.coords.map(|c| c + offset),
        }
    }

    /// Scales x coordinates by `sx` and y coordinates by `sy`.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        let mut coords = self.coords;
        for (i, c) in coords.iter_mut().enumerate() {
            *c *= if i % 2 == 0 { sx } else { sy };
        }
        Self { coords }
    }
}
