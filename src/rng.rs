//! Deterministic random number generation for simulation runs.
//!
//! Every stochastic function in this crate takes an explicit [`SimRng`]
//! instance instead of touching a global generator. Reproducibility is then a
//! function of the inputs alone, and concurrent generation tasks are safe by
//! construction: each task owns its own generator, derived from the master
//! seed and a stream index.

use num_complex::Complex64;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::f64::consts::PI;

/// Seeded generator for one simulation run.
///
/// Wraps ChaCha20 with a fixed draw discipline: uniform `f64` draws feed a
/// Box-Muller transform whose spare value is stored per instance, so the
/// sequence of normals produced by a given seed never depends on thread
/// scheduling or call-site interleaving elsewhere in the process.
#[derive(Debug, Clone)]
pub struct SimRng {
    rng: ChaCha20Rng,
    /// Spare Box-Muller normal, consumed before any new uniform draws.
    spare_normal: Option<f64>,
}

impl SimRng {
    /// Create a generator from an explicit seed.
    ///
    /// `seed_from_u64` expands the word into a full 256-bit ChaCha20 key, so
    /// nearby seeds still produce unrelated streams.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            spare_normal: None,
        }
    }

    /// Create a generator seeded from OS entropy, for callers that do not
    /// need reproducibility.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
            spare_normal: None,
        }
    }

    /// Derive an independent generator for stream `stream` of a master seed.
    ///
    /// Used to hand each concurrently-generated sequence its own generator
    /// while keeping the whole dataset a deterministic function of one seed.
    pub fn derive(master_seed: u64, stream: u64) -> Self {
        Self::with_seed(master_seed.wrapping_add(stream))
    }

    /// Draw a fresh master seed from OS entropy.
    ///
    /// Used when a dataset is requested without an explicit seed: the drawn
    /// value is recorded alongside the data so the run stays reproducible
    /// after the fact.
    pub fn entropy_seed() -> u64 {
        ChaCha20Rng::from_entropy().gen()
    }

    /// Uniform draw in `[0, 1)`.
    pub fn f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Bernoulli draw with success probability `p`.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p)
    }

    /// Standard normal draw via the Box-Muller transform.
    ///
    /// Consumes two uniforms and banks the second normal for the next call.
    pub fn standard_normal(&mut self) -> f64 {
        if let Some(spare) = self.spare_normal.take() {
            return spare;
        }

        // Clamp away from zero so ln(u) stays finite.
        let u = self.rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let v = self.rng.gen::<f64>();

        let mag = (-2.0 * u.ln()).sqrt();
        let angle = 2.0 * PI * v;

        self.spare_normal = Some(mag * angle.sin());
        mag * angle.cos()
    }

    /// Zero-mean normal draw with the given variance.
    pub fn normal(&mut self, variance: f64) -> f64 {
        self.standard_normal() * variance.sqrt()
    }

    /// Circularly-symmetric complex Gaussian draw with total variance
    /// `variance`: real and imaginary parts each `N(0, variance/2)`,
    /// independent, real part drawn first.
    pub fn complex_normal(&mut self, variance: f64) -> Complex64 {
        let component_std = (variance / 2.0).sqrt();
        let re = self.standard_normal() * component_std;
        let im = self.standard_normal() * component_std;
        Complex64::new(re, im)
    }

    /// In-place Fisher-Yates permutation of `0..n`, returned as an index map.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = self.rng.gen_range(0..=i);
            indices.swap(i, j);
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SimRng::with_seed(12345);
        let mut b = SimRng::with_seed(12345);
        for _ in 0..200 {
            assert_eq!(a.f64(), b.f64());
            assert_eq!(a.standard_normal(), b.standard_normal());
        }
    }

    #[test]
    fn test_derived_streams_differ() {
        let mut a = SimRng::derive(100, 0);
        let mut b = SimRng::derive(100, 1);
        let xs: Vec<f64> = (0..50).map(|_| a.f64()).collect();
        let ys: Vec<f64> = (0..50).map(|_| b.f64()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_standard_normal_moments() {
        let mut rng = SimRng::with_seed(7);
        let n = 50_000;
        let draws: Vec<f64> = (0..n).map(|_| rng.standard_normal()).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.02, "sample mean {} too far from 0", mean);
        assert!((var - 1.0).abs() < 0.05, "sample variance {} too far from 1", var);
    }

    #[test]
    fn test_complex_normal_variance_split() {
        let mut rng = SimRng::with_seed(11);
        let n = 50_000;
        let mut re_var = 0.0;
        let mut im_var = 0.0;
        for _ in 0..n {
            let z = rng.complex_normal(1.0);
            re_var += z.re * z.re;
            im_var += z.im * z.im;
        }
        re_var /= n as f64;
        im_var /= n as f64;
        // Each component carries half the total unit variance
        assert!((re_var - 0.5).abs() < 0.03);
        assert!((im_var - 0.5).abs() < 0.03);
    }

    #[test]
    fn test_permutation_is_a_permutation() {
        let mut rng = SimRng::with_seed(3);
        let perm = rng.permutation(100);
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
    }
}
