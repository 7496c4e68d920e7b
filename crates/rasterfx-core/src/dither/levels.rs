//! Evenly spaced per-channel quantization levels.

use crate::error::{FilterError, Result};

/// Distinct values a `u8` channel can hold.
const MAX_LEVELS: usize = 256;

/// `N` evenly spaced integer levels in `0..=255`.
///
/// `level[i] = round(i * 255 / (N - 1))`. Nearest-level lookups are
/// precomputed for all 256 inputs; ties go to the lower level. Any `N`
/// above 256 yields every value `0..=255` and is stored as 256 levels.
///
/// # Example
///
/// ```
/// use rasterfx_core::QuantizationLevels;
///
/// let levels = QuantizationLevels::new(4).unwrap();
/// assert_eq!(levels.levels(), &[0, 85, 170, 255]);
/// assert_eq!(levels.nearest(42), 0);
/// assert_eq!(levels.nearest(43), 85);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizationLevels {
    levels: Vec<u8>,
    nearest: [u8; 256],
}

impl QuantizationLevels {
    /// Build `count` levels; fails when `count < 2`.
    ///
    /// Counts above 256 are capped: every channel value is then a level.
    pub fn new(count: usize) -> Result<Self> {
        if count < 2 {
            return Err(FilterError::invalid(
                "levels",
                format!("need at least 2 quantization levels, got {count}"),
            ));
        }
        let count = count.min(MAX_LEVELS);
        let steps = count - 1;
        // Integer round-half-up of i * 255 / steps
        let levels: Vec<u8> = (0..count)
            .map(|i| ((2 * i * 255 + steps) / (2 * steps)) as u8)
            .collect();

        let mut nearest = [0u8; 256];
        for (value, slot) in nearest.iter_mut().enumerate() {
            *slot = closest(&levels, value as u8);
        }
        Ok(Self { levels, nearest })
    }

    /// The level values, ascending.
    #[inline]
    pub fn levels(&self) -> &[u8] {
        &self.levels
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false: there are at least two levels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The level closest to `value`, ties to the lower level.
    #[inline]
    pub fn nearest(&self, value: u8) -> u8 {
        self.nearest[value as usize]
    }
}

fn closest(levels: &[u8], value: u8) -> u8 {
    let mut best = levels[0];
    let mut best_distance = u8::MAX as i32 + 1;
    for &level in levels {
        let distance = (value as i32 - level as i32).abs();
        if distance < best_distance {
            best = level;
            best_distance = distance;
        }
    }
    best
}
