//! Gilbert-Elliot channel generator: a two-state Markov chain switching the
//! coefficients of a complex-valued AR(2) recursion.
//!
//! Each step advances the Markov regime, then the companion-form state
//! recursion `x ← F·x + v` with circularly-symmetric process noise, and the
//! scalar observation `z = x[0] + w`. The regime matrices' steady-state
//! Kalman MSE bounds are solved up front and travel with the generated
//! sequence so downstream evaluation can grade estimators against the
//! theoretical floor.

use crate::config::{GilbertElliotConfig, RegimeCoefficients};
use crate::errors::ChannelResult;
use crate::markov::Regime;
use crate::riccati::{steady_state_mse, RiccatiConvergences};
use crate::rng::SimRng;
use num_complex::Complex64;

/// One simulated channel trajectory.
///
/// `states[k]` is the first companion component (the observable true state) at
/// step `k`, `observations[k]` the noisy measurement of it. Both vectors have
/// `sequence_length + 1` entries; index 0 is the warm-start state.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// True first-component states, length `sequence_length + 1`.
    pub states: Vec<Complex64>,
    /// Noisy observations, same length as `states`.
    pub observations: Vec<Complex64>,
}

impl Trajectory {
    /// Number of recursion steps (one less than the number of entries).
    pub fn sequence_length(&self) -> usize {
        debug_assert_eq!(self.states.len(), self.observations.len());
        self.states.len().saturating_sub(1)
    }
}

/// Output of one Gilbert-Elliot generation run.
#[derive(Debug, Clone)]
pub struct GilbertElliotSequence {
    /// The generated trajectory.
    pub trajectory: Trajectory,
    /// Regime active at each step, length `sequence_length + 1`.
    pub regime_path: Vec<Regime>,
    /// Good-regime coefficients the run was generated with.
    pub good: RegimeCoefficients,
    /// Bad-regime coefficients the run was generated with.
    pub bad: RegimeCoefficients,
    /// Steady-state Kalman MSE bounds of the two regimes.
    pub riccati: RiccatiConvergences,
}

impl GilbertElliotSequence {
    /// AR coefficients that produced step `step`.
    pub fn coefficients_at(&self, step: usize) -> RegimeCoefficients {
        match self.regime_path[step] {
            Regime::Good => self.good,
            Regime::Bad => self.bad,
        }
    }
}

/// Generate one Gilbert-Elliot trajectory.
///
/// The run is strictly sequential: every step depends on the previous state
/// and the evolving Markov regime. Given the same configuration and seed the
/// output is bit-identical, because the draw order is fixed per step: regime
/// transition, process noise, observation noise (and at step 0 the warm-start
/// state after the noises).
///
/// # Example
/// ```rust
/// use channel_datagen::{generate_gilbert_elliot, GilbertElliotConfig};
///
/// let config = GilbertElliotConfig {
///     sequence_length: 50,
///     seed: Some(7),
///     ..Default::default()
/// };
/// let sequence = generate_gilbert_elliot(&config).unwrap();
/// assert_eq!(sequence.trajectory.states.len(), 51);
/// ```
pub fn generate_gilbert_elliot(config: &GilbertElliotConfig) -> ChannelResult<GilbertElliotSequence> {
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => SimRng::with_seed(seed),
        None => SimRng::from_entropy(),
    };

    generate_with_rng(config, &mut rng)
}

/// Generate one trajectory from an already-constructed generator.
///
/// This is the entry point for concurrent callers: hand every trajectory its
/// own [`SimRng`] (e.g. via [`SimRng::derive`]) and the runs share no mutable
/// state at all. The `seed` field of the configuration is ignored here.
pub fn generate_with_rng(
    config: &GilbertElliotConfig,
    rng: &mut SimRng,
) -> ChannelResult<GilbertElliotSequence> {
    config.validate()?;

    let riccati = steady_state_mse(&config.good, &config.bad, &config.noise)?;

    let steps = config.sequence_length + 1;
    let mut states = Vec::with_capacity(steps);
    let mut observations = Vec::with_capacity(steps);
    let mut regime_path = Vec::with_capacity(steps);

    let mut regime = Regime::initial(config.start_policy, rng);

    // Companion-form state (x[k], x[k-1]); the recursion is written out
    // rather than going through a complex matrix type because F's second row
    // is the fixed shift [1, 0].
    let mut x_current = Complex64::new(0.0, 0.0);
    let mut x_previous = Complex64::new(0.0, 0.0);

    for step in 0..steps {
        if step > 0 {
            regime = regime.step(&config.transition, rng);
        }
        let coeffs = match regime {
            Regime::Good => config.good,
            Regime::Bad => config.bad,
        };

        // Process noise drives only the first companion component (Q's second
        // diagonal entry is zero); drawn every step to keep the per-step draw
        // pattern uniform.
        let v = rng.complex_normal(config.noise.process_variance);
        let w = rng.complex_normal(config.noise.observation_variance);

        let z = if step == 0 {
            // Warm start: both components are fresh unit-variance complex
            // Gaussians, not governed by the recursion.
            x_current = rng.complex_normal(1.0);
            x_previous = rng.complex_normal(1.0);
            x_current + w
        } else {
            let next = coeffs.a1 * x_current + coeffs.a2 * x_previous + v;
            x_previous = x_current;
            x_current = next;
            x_current + w
        };

        states.push(x_current);
        observations.push(z);
        regime_path.push(regime);
    }

    Ok(GilbertElliotSequence {
        trajectory: Trajectory {
            states,
            observations,
        },
        regime_path,
        good: config.good,
        bad: config.bad,
        riccati,
    })
}
