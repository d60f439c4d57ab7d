use crate::error::BlurError;

/// Number of taps in the kernel: one center tap plus nine mirrored pairs.
pub const TAP_COUNT: usize = 10;

/// Normalized 10-tap one-dimensional Gaussian kernel.
///
/// Index 0 is the center tap; indices 1..9 each stand for two mirrored
/// sample positions, so normalization counts them twice:
/// `w[0] + 2·Σ w[1..] == 1.0` within floating-point tolerance.
///
/// The table is a pure function of `spread` and is only recomputed when
/// `spread` changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightTable {
    weights: [f32; TAP_COUNT],
}

impl WeightTable {
    /// Computes the kernel for a `spread` known to be positive and finite.
    ///
    /// `BlurParameters` guarantees that; external callers go through
    /// [`WeightTable::new`].
    pub(crate) fn compute(spread: f32) -> Self {
        let d = spread * spread * 0.001;

        let mut weights = [0.0f32; TAP_COUNT];
        let mut total = 0.0f32;
        for (i, weight) in weights.iter_mut().enumerate() {
            // Sample positions step by two texels.
            let x = i as f32 * 2.0;
            *weight = (-0.5 * x * x / d).exp();
            total += if i == 0 { *weight } else { *weight * 2.0 };
        }
        for weight in &mut weights {
            *weight /= total;
        }

        Self { weights }
    }

    /// Computes the kernel, rejecting non-positive or non-finite `spread`
    /// (the falloff divides by `spread²`).
    pub fn new(spread: f32) -> Result<Self, BlurError> {
        if !spread.is_finite() || spread <= 0.0 {
            return Err(BlurError::InvalidParameter {
                name: "spread",
                value: spread,
                min: *crate::params::SPREAD_RANGE.start(),
                max: *crate::params::SPREAD_RANGE.end(),
            });
        }
        Ok(Self::compute(spread))
    }

    /// The normalized weights, center tap first.
    pub fn as_array(&self) -> &[f32; TAP_COUNT] {
        &self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirrored_sum(table: &WeightTable) -> f32 {
        let w = table.as_array();
        w[0] + 2.0 * w[1..].iter().sum::<f32>()
    }

    #[test]
    fn test_weights_sum_to_one() {
        for spread in [10.0, 50.0, 100.0, 400.0, 1000.0] {
            let table = WeightTable::new(spread).unwrap();
            let sum = mirrored_sum(&table);
            assert!(
                (sum - 1.0).abs() < 1e-5,
                "sum for spread {spread} was {sum}"
            );
        }
    }

    #[test]
    fn test_weights_monotonically_non_increasing() {
        for spread in [10.0, 100.0, 1000.0] {
            let w = *WeightTable::new(spread).unwrap().as_array();
            for i in 1..TAP_COUNT {
                assert!(
                    w[i] <= w[i - 1],
                    "w[{i}] = {} > w[{}] = {} at spread {spread}",
                    w[i],
                    i - 1,
                    w[i - 1]
                );
            }
        }
    }

    #[test]
    fn test_same_spread_yields_identical_table() {
        let a = WeightTable::new(123.4).unwrap();
        let b = WeightTable::new(123.4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_larger_spread_flattens_kernel() {
        let narrow = WeightTable::new(100.0).unwrap();
        let wide = WeightTable::new(400.0).unwrap();
        assert!(wide.as_array()[9] > narrow.as_array()[9]);
    }

    #[test]
    fn test_known_values_for_spread_100() {
        // d = 100² × 0.001 = 10; raw w[0] = 1, raw w[1] = exp(-0.2).
        let w = *WeightTable::new(100.0).unwrap().as_array();
        let raw: Vec<f32> = (0..TAP_COUNT)
            .map(|i| {
                let x = i as f32 * 2.0;
                (-0.5 * x * x / 10.0).exp()
            })
            .collect();
        let total = raw[0] + 2.0 * raw[1..].iter().sum::<f32>();
        assert!((raw[1] - (-0.2f32).exp()).abs() < 1e-6);
        for i in 0..TAP_COUNT {
            assert!((w[i] - raw[i] / total).abs() < 1e-6, "tap {i}");
        }
    }

    #[test]
    fn test_spread_boundaries() {
        // Minimum spread: the kernel is narrow, the outermost tap vanishes.
        let narrow = *WeightTable::new(10.0).unwrap().as_array();
        assert!(narrow[9] < 1e-6);

        // Maximum spread: near-flat kernel, the outermost tap approaches the
        // center tap.
        let flat = *WeightTable::new(1000.0).unwrap().as_array();
        assert!(flat[9] / flat[0] > 0.8);
    }

    #[test]
    fn test_rejects_unusable_spread() {
        assert!(WeightTable::new(0.0).is_err());
        assert!(WeightTable::new(-5.0).is_err());
        assert!(WeightTable::new(f32::NAN).is_err());
    }
}
