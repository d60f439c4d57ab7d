use std::ops::RangeInclusive;

use crate::error::BlurError;

/// Accepted range for the tap spacing, in scratch-texture texels.
pub const OFFSET_RANGE: RangeInclusive<f32> = 1.0..=10.0;
/// Accepted range for the kernel spread.
pub const SPREAD_RANGE: RangeInclusive<f32> = 10.0..=1000.0;

/// Validated blur configuration.
///
/// `offset` controls how far apart the taps are placed and only affects
/// sample spacing; `spread` controls the Gaussian falloff and therefore the
/// weight table. Values outside [`OFFSET_RANGE`] / [`SPREAD_RANGE`] are
/// rejected at construction, so a `BlurParameters` always holds usable
/// values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParameters {
    offset: f32,
    spread: f32,
}

impl BlurParameters {
    /// Creates parameters, validating both ranges.
    pub fn new(offset: f32, spread: f32) -> Result<Self, BlurError> {
        if !offset.is_finite() || !OFFSET_RANGE.contains(&offset) {
            return Err(BlurError::InvalidParameter {
                name: "offset",
                value: offset,
                min: *OFFSET_RANGE.start(),
                max: *OFFSET_RANGE.end(),
            });
        }
        if !spread.is_finite() || !SPREAD_RANGE.contains(&spread) {
            return Err(BlurError::InvalidParameter {
                name: "spread",
                value: spread,
                min: *SPREAD_RANGE.start(),
                max: *SPREAD_RANGE.end(),
            });
        }
        Ok(Self { offset, spread })
    }

    /// Tap spacing in scratch-texture texels.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Kernel spread.
    pub fn spread(&self) -> f32 {
        self.spread
    }
}

impl Default for BlurParameters {
    fn default() -> Self {
        Self {
            offset: 1.0,
            spread: 100.0,
        }
    }
}
