//! Single-regime AR generator with mismatched coefficients.
//!
//! Models estimator training under model mismatch: every batch element gets
//! its own AR coefficient pair, drawn as a Gaussian perturbation around the
//! nominal means and rejection-sampled for stability. An unstable matrix
//! would diverge and silently corrupt the training data, so the rejection
//! loop is mandatory. It is also capped, so a pathological perturbation
//! variance surfaces as an error instead of an endless loop.

use crate::config::{MismatchConfig, RegimeCoefficients};
use crate::errors::{ChannelDataError, ChannelResult};
use crate::rng::SimRng;
use ndarray::{Array3, Array4};
use num_complex::Complex64;

/// Labeled data from the mismatched-coefficient generator.
///
/// Layouts are the fixed channel contracts of the downstream learner:
/// `states[:, c, :]` holds, per batch element and series, channel `c` of the
/// current/next true state split into real and imaginary parts, and
/// `observations` holds the measured sequences with real parts in channel 0
/// and imaginary parts in channel 1.
#[derive(Debug, Clone)]
pub struct MismatchedData {
    /// Shape `(batch_size, 4, sim_length)`: current re, next re, current im,
    /// next im.
    pub states: Array3<f64>,
    /// Shape `(batch_size, 2, sequence_length, sim_length)`.
    pub observations: Array4<f64>,
}

/// Generate a full series of mismatched-coefficient AR data.
///
/// Cost is `O(batch_size × sim_length × sequence_length)` plus the rejection
/// redraws. Each batch element of each series is generated independently, so
/// the two outer loops could be fanned out across tasks with derived
/// generators; the reference implementation keeps one generator and a fixed
/// iteration order for bit-for-bit reproducibility of a whole series.
pub fn generate_mismatched(config: &MismatchConfig) -> ChannelResult<MismatchedData> {
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => SimRng::with_seed(seed),
        None => SimRng::from_entropy(),
    };

    let batch = config.batch_size;
    let seq_len = config.sequence_length;
    let sim_len = config.sim_length;

    let mut states = Array3::zeros((batch, 4, sim_len));
    let mut observations = Array4::zeros((batch, 2, seq_len, sim_len));

    for series in 0..sim_len {
        for element in 0..batch {
            let coeffs = draw_stable_coefficients(config, &mut rng)?;

            // Single-regime trajectory with the per-element coefficients held
            // fixed; same step semantics as the Gilbert-Elliot recursion,
            // warm start included.
            let mut x_current = Complex64::new(0.0, 0.0);
            let mut x_previous = Complex64::new(0.0, 0.0);

            for step in 0..=seq_len {
                let v = rng.complex_normal(config.noise.process_variance);
                let w = rng.complex_normal(config.noise.observation_variance);

                let z = if step == 0 {
                    x_current = rng.complex_normal(1.0);
                    x_previous = rng.complex_normal(1.0);
                    x_current + w
                } else {
                    let next = coeffs.a1 * x_current + coeffs.a2 * x_previous + v;
                    x_previous = x_current;
                    x_current = next;
                    x_current + w
                };

                if step < seq_len {
                    observations[[element, 0, step, series]] = z.re;
                    observations[[element, 1, step, series]] = z.im;
                }
            }

            // After the final step x_previous is the state the observations
            // end on ("current") and x_current is the one-step-ahead label.
            states[[element, 0, series]] = x_previous.re;
            states[[element, 1, series]] = x_current.re;
            states[[element, 2, series]] = x_previous.im;
            states[[element, 3, series]] = x_current.im;
        }
    }

    Ok(MismatchedData {
        states,
        observations,
    })
}

/// Draw one stable coefficient pair around the configured means.
///
/// Coefficients are perturbed with independent zero-mean Gaussians of the
/// configured variance and redrawn until both companion eigenvalues have
/// magnitude at most one, up to the attempt ceiling.
pub fn draw_stable_coefficients(
    config: &MismatchConfig,
    rng: &mut SimRng,
) -> ChannelResult<RegimeCoefficients> {
    let std = config.coeff_noise_variance.sqrt();

    for attempt in 1..=config.max_rejection_attempts {
        let candidate = RegimeCoefficients::new(
            config.coeff_means.a1 + rng.standard_normal() * std,
            config.coeff_means.a2 + rng.standard_normal() * std,
        );
        if candidate.is_stable() {
            if attempt > 100 {
                log::warn!(
                    "stability rejection needed {} attempts (coeff_noise_variance={}); \
                     acceptance region is getting thin",
                    attempt,
                    config.coeff_noise_variance
                );
            }
            return Ok(candidate);
        }
    }

    Err(ChannelDataError::StabilityExhausted {
        attempts: config.max_rejection_attempts,
        coeff_noise_variance: config.coeff_noise_variance,
    })
}
