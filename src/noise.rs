//! Seeded 2-D gradient noise.
//!
//! [`Perlin::sample`] is a pure function of its position, so partitions that
//! consult it may run in any order and on any thread with identical results.
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{check_unit, Error, Result};

/// Parameters of the noise used to ripple run boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerlinOptions {
    pub seed: u64,
    /// Lattice cells per pixel of the first octave.
    pub frequency: f32,
    pub octaves: u32,
    /// Largest offset added to the inclusion threshold.
    pub amplitude: f32,
}

impl Default for PerlinOptions {
    fn default() -> Self {
        PerlinOptions {
            seed: 0,
            frequency: 1.0 / 64.0,
            octaves: 4,
            amplitude: 0.25,
        }
    }
}

impl PerlinOptions {
    pub fn with_seed(seed: u64) -> Self {
        PerlinOptions {
            seed,
            ..PerlinOptions::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(Error::InvalidParameterRange {
                name: "frequency",
                value: self.frequency,
            });
        }
        if self.octaves == 0 {
            return Err(Error::InvalidParameterRange {
                name: "octaves",
                value: 0.0,
            });
        }
        check_unit("amplitude", self.amplitude).map(|_| ())
    }
}

/// Fractal Perlin noise with a permutation table derived from a seed.
#[derive(Clone)]
pub struct Perlin {
    perm: [u8; 512],
    options: PerlinOptions,
}

impl Perlin {
    pub fn new(options: PerlinOptions) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut StdRng::seed_from_u64(options.seed));
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Perlin { perm, options }
    }

    /// The fractal noise value at pixel `(x, y)`, in `[-1, 1]`.
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        let (mut fx, mut fy) = (
            (x as f32 + 0.5) * self.options.frequency,
            (y as f32 + 0.5) * self.options.frequency,
        );
        let (mut sum, mut weight, mut amplitude) = (0.0, 0.0, 1.0);
        for _ in 0..self.options.octaves {
            sum += amplitude * self.gradient(fx, fy);
            weight += amplitude;
            amplitude *= 0.5;
            fx *= 2.0;
            fy *= 2.0;
        }
        (sum / weight).max(-1.0).min(1.0)
    }

    /// The threshold offset at pixel `(x, y)`.
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> f32 {
        self.options.amplitude * self.sample(x, y)
    }

    fn gradient(&self, x: f32, y: f32) -> f32 {
        let (x0, y0) = (x.floor(), y.floor());
        let (xf, yf) = (x - x0, y - y0);
        // the lattice repeats every 256 cells
        let xi = (x0 as i64).rem_euclid(256) as usize;
        let yi = (y0 as i64).rem_euclid(256) as usize;
        let p = &self.perm;

        let aa = p[p[xi] as usize + yi];
        let ab = p[p[xi] as usize + yi + 1];
        let ba = p[p[xi + 1] as usize + yi];
        let bb = p[p[xi + 1] as usize + yi + 1];

        let (u, v) = (fade(xf), fade(yf));
        lerp(
            v,
            lerp(u, grad(aa, xf, yf), grad(ba, xf - 1.0, yf)),
            lerp(u, grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0)),
        )
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_field() {
        let a = Perlin::new(PerlinOptions::with_seed(7));
        let b = Perlin::new(PerlinOptions::with_seed(7));
        for y in (0..300).step_by(13) {
            for x in (0..300).step_by(11) {
                assert_eq!(a.sample(x, y).to_bits(), b.sample(x, y).to_bits());
            }
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = Perlin::new(PerlinOptions::with_seed(1));
        let b = Perlin::new(PerlinOptions::with_seed(2));
        let differs = (0..64).any(|i| a.sample(i * 5, i * 3) != b.sample(i * 5, i * 3));
        assert!(differs);
    }

    #[test]
    fn samples_are_bounded_and_continuous() {
        let noise = Perlin::new(PerlinOptions {
            octaves: 1,
            ..PerlinOptions::with_seed(42)
        });
        for y in 0..128 {
            for x in 0..128 {
                let here = noise.sample(x, y);
                assert!(here >= -1.0 && here <= 1.0);
                assert!((here - noise.sample(x + 1, y)).abs() < 0.2);
                assert!((here - noise.sample(x, y + 1)).abs() < 0.2);
            }
        }
    }

    #[test]
    fn offset_is_scaled_by_amplitude() {
        let noise = Perlin::new(PerlinOptions {
            amplitude: 0.1,
            ..PerlinOptions::with_seed(3)
        });
        for i in 0..100 {
            assert!(noise.offset(i * 7, i).abs() <= 0.1);
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let bad_frequency = PerlinOptions {
            frequency: 0.0,
            ..PerlinOptions::default()
        };
        assert!(bad_frequency.validate().is_err());
        let bad_amplitude = PerlinOptions {
            amplitude: 1.5,
            ..PerlinOptions::default()
        };
        assert!(bad_amplitude.validate().is_err());
        assert!(PerlinOptions::default().validate().is_ok());
    }
}
