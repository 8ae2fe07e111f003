//! Musgrave multifractal variants.
//!
//! All three variants share the per-octave spectral weight `f^-H`: octave `k`
//! samples at frequency `lacunarity^k` and is attenuated by
//! `lacunarity^(-h k)`. Unlike additive fBm, the octaves combine
//! multiplicatively, scaling each octave's contribution by the accumulated
//! signal so far, which concentrates roughness where the terrain is already
//! high.

use glam::DVec3;

use crate::{GradientNoise, NoiseError};

/// Signal offset used by the multiplicative variants (classic Musgrave value).
const OFFSET: f64 = 0.7;
/// Feedback gain for the ridged variant.
const GAIN: f64 = 2.0;

/// Per-octave spectral attenuation table, `weights[k] = lacunarity^(-h * k)`.
///
/// A pure function of `(h, lacunarity, octaves)`: the table is computed at
/// construction, owned by whoever holds the configuration, and never shared
/// through process-wide state, so distinct parameter sets can coexist in one
/// process.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralWeights {
    h: f64,
    lacunarity: f64,
    weights: Vec<f64>,
}

impl SpectralWeights {
    /// Precompute the weight table.
    ///
    /// # Errors
    ///
    /// Returns [`NoiseError::InvalidConfiguration`] if `h` or `lacunarity` is
    /// non-finite, `lacunarity` is not strictly positive, or any resulting
    /// weight is non-finite.
    pub fn new(h: f64, lacunarity: f64, octaves: u32) -> Result<Self, NoiseError> {
        if !h.is_finite() || !lacunarity.is_finite() || lacunarity <= 0.0 {
            return Err(NoiseError::InvalidConfiguration(format!(
                "spectral weights need finite h and positive lacunarity, got h={h}, lacunarity={lacunarity}"
            )));
        }
        let weights: Vec<f64> = (0..octaves)
            .map(|k| lacunarity.powf(-h * k as f64))
            .collect();
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(NoiseError::InvalidConfiguration(format!(
                "weight table diverges for h={h}, lacunarity={lacunarity}, octaves={octaves}"
            )));
        }
        Ok(Self {
            h,
            lacunarity,
            weights,
        })
    }

    /// Roughness exponent the table was built for.
    pub fn h(&self) -> f64 {
        self.h
    }

    /// Frequency multiplier between octaves.
    pub fn lacunarity(&self) -> f64 {
        self.lacunarity
    }

    /// Number of octaves in the table.
    pub fn octaves(&self) -> usize {
        self.weights.len()
    }

    /// The raw attenuation factors.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Heterogeneous terrain: later octaves are damped by the accumulated value,
/// leaving valleys smooth while peaks stay rough.
pub fn hetero_terrain(noise: &GradientNoise, table: &SpectralWeights, point: DVec3) -> f64 {
    let Some(&w0) = table.weights().first() else {
        return 0.0;
    };
    let mut p = point;
    let mut value = (noise.sample(p) + OFFSET) * w0;
    p *= table.lacunarity();

    for &w in &table.weights()[1..] {
        let mut increment = (noise.sample(p) + OFFSET) * w;
        increment *= value;
        value += increment;
        p *= table.lacunarity();
    }
    value
}

/// Hybrid multifractal: octave contributions are weighted by the running
/// product of previous signals, clamped so the feedback cannot blow up.
pub fn hybrid_multifractal(noise: &GradientNoise, table: &SpectralWeights, point: DVec3) -> f64 {
    let Some(&w0) = table.weights().first() else {
        return 0.0;
    };
    let mut p = point;
    let mut result = (noise.sample(p) + OFFSET) * w0;
    let mut weight = result;
    p *= table.lacunarity();

    for &w in &table.weights()[1..] {
        weight = weight.min(1.0);
        let signal = (noise.sample(p) + OFFSET) * w;
        result += weight * signal;
        weight *= signal;
        p *= table.lacunarity();
    }
    result
}

/// Ridged multifractal: folds the noise at zero and squares it, so every
/// octave contributes sharp crease lines, modulated by the previous octave.
pub fn ridged_multifractal(noise: &GradientNoise, table: &SpectralWeights, point: DVec3) -> f64 {
    let Some(&w0) = table.weights().first() else {
        return 0.0;
    };
    let mut p = point;
    let mut signal = OFFSET - noise.sample(p).abs();
    signal *= signal;
    let mut result = signal * w0;
    p *= table.lacunarity();

    for &w in &table.weights()[1..] {
        let weight = (signal * GAIN).clamp(0.0, 1.0);
        signal = OFFSET - noise.sample(p).abs();
        signal *= signal;
        signal *= weight;
        result += signal * w;
        p *= table.lacunarity();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_table_is_pure_function_of_params() {
        let a = SpectralWeights::new(1.0, 2.0, 6).unwrap();
        let b = SpectralWeights::new(1.0, 2.0, 6).unwrap();
        assert_eq!(a, b, "same parameters must yield the same table");
    }

    #[test]
    fn test_distinct_parameter_sets_get_distinct_tables() {
        let a = SpectralWeights::new(1.0, 2.0, 6).unwrap();
        let b = SpectralWeights::new(0.5, 2.0, 6).unwrap();
        assert_ne!(
            a.weights(),
            b.weights(),
            "a second parameter set must not reuse the first table"
        );
    }

    #[test]
    fn test_weight_table_values() {
        let t = SpectralWeights::new(1.0, 2.0, 4).unwrap();
        let expected = [1.0, 0.5, 0.25, 0.125];
        for (k, (&w, &e)) in t.weights().iter().zip(expected.iter()).enumerate() {
            assert!(
                (w - e).abs() < 1e-12,
                "weight[{k}] should be {e}, got {w}"
            );
        }
    }

    #[test]
    fn test_invalid_lacunarity_rejected() {
        assert!(SpectralWeights::new(1.0, 0.0, 4).is_err());
        assert!(SpectralWeights::new(1.0, -2.0, 4).is_err());
        assert!(SpectralWeights::new(f64::NAN, 2.0, 4).is_err());
    }

    #[test]
    fn test_zero_octaves_yield_zero() {
        let noise = GradientNoise::new(42);
        let t = SpectralWeights::new(1.0, 2.0, 0).unwrap();
        let p = DVec3::new(1.3, 2.7, 0.0);
        assert_eq!(hetero_terrain(&noise, &t, p), 0.0);
        assert_eq!(hybrid_multifractal(&noise, &t, p), 0.0);
        assert_eq!(ridged_multifractal(&noise, &t, p), 0.0);
    }

    #[test]
    fn test_variants_deterministic() {
        let noise = GradientNoise::new(42);
        let t = SpectralWeights::new(0.9, 2.0, 6).unwrap();
        let p = DVec3::new(0.37, -1.91, 0.0);
        assert_eq!(
            hetero_terrain(&noise, &t, p).to_bits(),
            hetero_terrain(&noise, &t, p).to_bits()
        );
        assert_eq!(
            hybrid_multifractal(&noise, &t, p).to_bits(),
            hybrid_multifractal(&noise, &t, p).to_bits()
        );
        assert_eq!(
            ridged_multifractal(&noise, &t, p).to_bits(),
            ridged_multifractal(&noise, &t, p).to_bits()
        );
    }

    #[test]
    fn test_ridged_output_finite_over_domain() {
        let noise = GradientNoise::new(7);
        let t = SpectralWeights::new(1.0, 2.0, 8).unwrap();
        for i in 0..500 {
            let p = DVec3::new(i as f64 * 0.113, i as f64 * 0.059, 0.0);
            let v = ridged_multifractal(&noise, &t, p);
            assert!(v.is_finite(), "ridged multifractal diverged at {p}: {v}");
        }
    }
}
