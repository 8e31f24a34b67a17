use serde::Serialize;

use crate::error::CoreError;

/// Number of LEDs on the panel (16 × 16).
pub const LED_COUNT: usize = 256;

/// Maps raw pixel-buffer positions onto physical display positions.
///
/// Always a permutation of `0..LED_COUNT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PixelIndexMap(Vec<u8>);

impl PixelIndexMap {
    /// `[0, 1, 2, ..., 255]`: the buffer is already in display order.
    pub fn identity() -> Self {
        Self((0..=u8::MAX).collect())
    }

    /// Validate and wrap a permutation.
    pub fn from_permutation(indices: Vec<u8>) -> Result<Self, CoreError> {
        if indices.len() != LED_COUNT {
            return Err(CoreError::InvalidIndexMap {
                message: format!("expected {LED_COUNT} entries, got {}", indices.len()),
            });
        }
        let mut seen = [false; LED_COUNT];
        for &index in &indices {
            let slot = &mut seen[usize::from(index)];
            if *slot {
                return Err(CoreError::InvalidIndexMap {
                    message: format!("index {index} appears more than once"),
                });
            }
            *slot = true;
        }
        Ok(Self(indices))
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().copied().eq(0..=u8::MAX)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Reorder a raw buffer into display order. Missing pixels read as 0.
    pub fn to_display_order(&self, raw: &[u8]) -> Vec<u8> {
        self.0
            .iter()
            .map(|&source| raw.get(usize::from(source)).copied().unwrap_or(0))
            .collect()
    }
}

impl Default for PixelIndexMap {
    fn default() -> Self {
        Self::identity()
    }
}
