//! Octave composition over the gradient noise primitive.

use glam::{DVec2, DVec3};

use crate::musgrave::{hetero_terrain, hybrid_multifractal, ridged_multifractal};
use crate::{GradientNoise, NoiseError, SpectralWeights};

/// Which octave-combination rule a [`Fractal`] applies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FractalKind {
    /// Additive 1/f summation: each octave doubles frequency, halves amplitude.
    Brownian,
    /// As Brownian, but each octave contributes the negated absolute value,
    /// folding the noise at zero into sharp ridge lines.
    Ridge,
    /// Musgrave heterogeneous terrain (multiplicative, valley-smoothing).
    HeteroTerrain {
        /// Roughness exponent.
        h: f64,
        /// Frequency multiplier between octaves.
        lacunarity: f64,
    },
    /// Musgrave hybrid multifractal.
    HybridMultifractal {
        /// Roughness exponent.
        h: f64,
        /// Frequency multiplier between octaves.
        lacunarity: f64,
    },
    /// Musgrave ridged multifractal.
    RidgedMultifractal {
        /// Roughness exponent.
        h: f64,
        /// Frequency multiplier between octaves.
        lacunarity: f64,
    },
}

/// Configuration for a [`Fractal`] field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalParams {
    /// Amplitude of the first octave; overall output scale.
    pub amplitude: f64,
    /// Frequency of the first octave. Must be finite and non-zero.
    pub frequency: f64,
    /// Number of octaves. Zero octaves evaluate to 0 everywhere.
    pub octaves: u32,
    /// Spatial offset applied to every sample point before frequency scaling.
    /// Shifts the noise domain so one seed can yield many distinct fields.
    pub offset: DVec3,
    /// Octave combination rule.
    pub kind: FractalKind,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            frequency: 0.01,
            octaves: 6,
            offset: DVec3::ZERO,
            kind: FractalKind::Brownian,
        }
    }
}

/// A validated, seeded fractal scalar field over 2D points.
///
/// Construction validates the parameters once and resolves the kind into a
/// [`Combiner`], so sampling is infallible and two instances with equal seed
/// and parameters are bit-identical.
pub struct Fractal {
    noise: GradientNoise,
    params: FractalParams,
    combiner: Combiner,
}

/// The combination rule after validation. Musgrave kinds carry their
/// precomputed weight table, so a constructed fractal cannot lack one.
enum Combiner {
    Brownian,
    Ridge,
    Hetero(SpectralWeights),
    Hybrid(SpectralWeights),
    Ridged(SpectralWeights),
}

impl Fractal {
    /// Validate `params` and build the sampler.
    ///
    /// # Errors
    ///
    /// Returns [`NoiseError::InvalidConfiguration`] for a zero or non-finite
    /// frequency, non-finite amplitude or offset, or Musgrave parameters with
    /// a divergent weight table.
    pub fn new(seed: u64, params: FractalParams) -> Result<Self, NoiseError> {
        if !params.frequency.is_finite() || params.frequency == 0.0 {
            return Err(NoiseError::InvalidConfiguration(format!(
                "frequency must be finite and non-zero, got {}",
                params.frequency
            )));
        }
        if !params.amplitude.is_finite() {
            return Err(NoiseError::InvalidConfiguration(format!(
                "amplitude must be finite, got {}",
                params.amplitude
            )));
        }
        if !params.offset.is_finite() {
            return Err(NoiseError::InvalidConfiguration(format!(
                "offset must be finite, got {}",
                params.offset
            )));
        }

        let combiner = match params.kind {
            FractalKind::Brownian => Combiner::Brownian,
            FractalKind::Ridge => Combiner::Ridge,
            FractalKind::HeteroTerrain { h, lacunarity } => {
                Combiner::Hetero(SpectralWeights::new(h, lacunarity, params.octaves)?)
            }
            FractalKind::HybridMultifractal { h, lacunarity } => {
                Combiner::Hybrid(SpectralWeights::new(h, lacunarity, params.octaves)?)
            }
            FractalKind::RidgedMultifractal { h, lacunarity } => {
                Combiner::Ridged(SpectralWeights::new(h, lacunarity, params.octaves)?)
            }
        };

        Ok(Self {
            noise: GradientNoise::new(seed),
            params,
            combiner,
        })
    }

    /// The validated parameters.
    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    /// Evaluate the fractal field at a 2D world point.
    pub fn sample(&self, point: DVec2) -> f64 {
        let base = (DVec3::new(point.x, point.y, 0.0) + self.params.offset) * self.params.frequency;
        match &self.combiner {
            Combiner::Brownian => self.sum_octaves(base, false),
            Combiner::Ridge => self.sum_octaves(base, true),
            Combiner::Hetero(table) => {
                self.params.amplitude * hetero_terrain(&self.noise, table, base)
            }
            Combiner::Hybrid(table) => {
                self.params.amplitude * hybrid_multifractal(&self.noise, table, base)
            }
            Combiner::Ridged(table) => {
                self.params.amplitude * ridged_multifractal(&self.noise, table, base)
            }
        }
    }

    /// Additive octave loop shared by Brownian and ridge summation.
    fn sum_octaves(&self, base: DVec3, ridge: bool) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = self.params.amplitude;

        for _ in 0..self.params.octaves {
            let v = self.noise.sample(base * frequency);
            total += if ridge {
                -amplitude * v.abs()
            } else {
                amplitude * v
            };
            frequency *= 2.0;
            amplitude *= 0.5;
        }
        total
    }

    /// Theoretical maximum absolute amplitude of the additive kinds
    /// (geometric series sum). Meaningful for Brownian and Ridge only.
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.params.amplitude.abs();
        for _ in 0..self.params.octaves {
            sum += amp;
            amp *= 0.5;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_zero_octaves_is_zero_everywhere() {
        let f = Fractal::new(
            42,
            FractalParams {
                octaves: 0,
                ..Default::default()
            },
        )
        .unwrap();
        for i in 0..50 {
            let p = DVec2::new(i as f64 * 3.17, i as f64 * -1.4);
            assert_eq!(f.sample(p), 0.0, "octaves=0 must return 0 at {p}");
        }
    }

    #[test]
    fn test_same_seed_same_params_identical() {
        let params = FractalParams {
            amplitude: 40.0,
            frequency: 0.05,
            octaves: 7,
            ..Default::default()
        };
        let a = Fractal::new(9, params).unwrap();
        let b = Fractal::new(9, params).unwrap();
        for i in 0..200 {
            let p = DVec2::new(i as f64 * 0.7, i as f64 * 1.3);
            assert_eq!(
                a.sample(p).to_bits(),
                b.sample(p).to_bits(),
                "fractal must be deterministic for a fixed seed at {p}"
            );
        }
    }

    #[test]
    fn test_brownian_bounded_by_geometric_sum() {
        let f = Fractal::new(
            3,
            FractalParams {
                amplitude: 10.0,
                frequency: 0.2,
                octaves: 6,
                ..Default::default()
            },
        )
        .unwrap();
        let max = f.max_amplitude() * 1.5;
        for i in 0..1000 {
            let p = DVec2::new(i as f64 * 0.53, i as f64 * 0.107);
            let v = f.sample(p);
            assert!(v.abs() <= max, "fBm exceeded amplitude bound at {p}: {v}");
        }
    }

    #[test]
    fn test_ridge_never_positive() {
        let f = Fractal::new(
            11,
            FractalParams {
                kind: FractalKind::Ridge,
                amplitude: 5.0,
                frequency: 0.1,
                octaves: 4,
                ..Default::default()
            },
        )
        .unwrap();
        for i in 0..500 {
            let p = DVec2::new(i as f64 * 0.31, i as f64 * 0.177);
            let v = f.sample(p);
            assert!(
                v <= EPSILON,
                "ridge noise folds at zero and must be non-positive, got {v} at {p}"
            );
        }
    }

    #[test]
    fn test_offset_shifts_the_field() {
        let base = FractalParams {
            amplitude: 3.0,
            frequency: 0.07,
            octaves: 5,
            ..Default::default()
        };
        let a = Fractal::new(5, base).unwrap();
        let b = Fractal::new(
            5,
            FractalParams {
                offset: DVec3::new(100.0, 0.0, 0.0),
                ..base
            },
        )
        .unwrap();
        let p = DVec2::new(1.0, 2.0);
        assert_ne!(
            a.sample(p),
            b.sample(p),
            "a spatial offset must move the noise domain"
        );
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let r = Fractal::new(
            1,
            FractalParams {
                frequency: 0.0,
                ..Default::default()
            },
        );
        assert!(matches!(r, Err(NoiseError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_non_finite_amplitude_rejected() {
        let r = Fractal::new(
            1,
            FractalParams {
                amplitude: f64::INFINITY,
                ..Default::default()
            },
        );
        assert!(matches!(r, Err(NoiseError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_musgrave_kinds_validate_weights() {
        let r = Fractal::new(
            1,
            FractalParams {
                kind: FractalKind::HeteroTerrain {
                    h: f64::NAN,
                    lacunarity: 2.0,
                },
                ..Default::default()
            },
        );
        assert!(matches!(r, Err(NoiseError::InvalidConfiguration(_))));

        let ok = Fractal::new(
            1,
            FractalParams {
                kind: FractalKind::RidgedMultifractal {
                    h: 1.0,
                    lacunarity: 2.0,
                },
                ..Default::default()
            },
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_musgrave_kinds_sample_finite_values() {
        let kinds = [
            FractalKind::HeteroTerrain {
                h: 1.0,
                lacunarity: 2.0,
            },
            FractalKind::HybridMultifractal {
                h: 0.25,
                lacunarity: 2.0,
            },
            FractalKind::RidgedMultifractal {
                h: 1.0,
                lacunarity: 2.0,
            },
        ];
        for kind in kinds {
            let f = Fractal::new(
                13,
                FractalParams {
                    kind,
                    amplitude: 2.0,
                    frequency: 0.05,
                    octaves: 5,
                    ..Default::default()
                },
            )
            .unwrap();
            for i in 0..100 {
                let p = DVec2::new(i as f64 * 0.43, i as f64 * -0.29);
                let v = f.sample(p);
                assert!(v.is_finite(), "{kind:?} produced {v} at {p}");
            }
        }
    }
}
