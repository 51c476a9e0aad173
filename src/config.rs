//! Configuration structures for the data generators.
//!
//! The generators are driven by plain typed configuration structs rather than
//! positional parameter lists. Every struct carries a `validate` method that
//! is called at the top of the corresponding `generate_*` entry point, so a
//! bad configuration fails before any simulation work starts.
//!
//! Defaults follow the channel model this crate was built around: a mildly
//! correlated good regime, a near-oscillatory bad regime, sticky transitions
//! and equal process/observation noise variances.

use crate::errors::{
    validate_finite, validate_probability, validate_variance, ChannelDataError, ChannelResult,
};
use crate::markov::StartPolicy;
use nalgebra::Matrix2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// AR(2) coefficient pair defining one regime.
///
/// The pair `(a1, a2)` induces the companion transition matrix
/// `F = [[a1, a2], [1, 0]]`, whose eigenvalues determine the stability of the
/// regime.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegimeCoefficients {
    /// First AR coefficient (weight on the current state).
    pub a1: f64,
    /// Second AR coefficient (weight on the previous state).
    pub a2: f64,
}

impl RegimeCoefficients {
    /// New coefficient pair.
    pub fn new(a1: f64, a2: f64) -> Self {
        Self { a1, a2 }
    }

    /// Companion-form transition matrix `[[a1, a2], [1, 0]]`.
    pub fn companion(&self) -> Matrix2<f64> {
        Matrix2::new(self.a1, self.a2, 1.0, 0.0)
    }

    /// Largest eigenvalue magnitude of the companion matrix.
    ///
    /// The characteristic polynomial is `λ² − a1·λ − a2`; real or conjugate
    /// roots are handled through the closed form, no general eigensolver
    /// needed for a 2×2 companion matrix.
    pub fn spectral_radius(&self) -> f64 {
        let discriminant = self.a1 * self.a1 + 4.0 * self.a2;
        if discriminant >= 0.0 {
            let root = discriminant.sqrt();
            let lambda_plus = (self.a1 + root) / 2.0;
            let lambda_minus = (self.a1 - root) / 2.0;
            lambda_plus.abs().max(lambda_minus.abs())
        } else {
            // Conjugate pair: |λ|² equals the product of the roots, −a2.
            (-self.a2).sqrt()
        }
    }

    /// Whether both eigenvalues have magnitude at most one.
    pub fn is_stable(&self) -> bool {
        self.spectral_radius() <= 1.0
    }

    /// Validate that both coefficients are finite.
    pub fn validate(&self, regime_name: &str) -> ChannelResult<()> {
        validate_finite(self.a1, &format!("{} a1", regime_name))?;
        validate_finite(self.a2, &format!("{} a2", regime_name))
    }
}

/// Switch probabilities of the two-state Markov chain.
///
/// Both values are probabilities of leaving the current regime on one tick;
/// the stay probability is the complement. A sticky channel therefore uses
/// values near zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransitionProbabilities {
    /// Probability of switching from the good to the bad regime.
    pub good_to_bad: f64,
    /// Probability of switching from the bad to the good regime.
    pub bad_to_good: f64,
}

impl TransitionProbabilities {
    /// Validate that both entries are probabilities.
    pub fn validate(&self) -> ChannelResult<()> {
        validate_probability(self.good_to_bad, "good_to_bad transition probability")?;
        validate_probability(self.bad_to_good, "bad_to_good transition probability")
    }
}

impl Default for TransitionProbabilities {
    fn default() -> Self {
        Self {
            good_to_bad: 0.001,
            bad_to_good: 0.001,
        }
    }
}

/// Process and observation noise variances of the AR recursion.
///
/// The process covariance is `Q = diag(process_variance, 0)`: only the first
/// companion component is driven by noise. The observation variance is the
/// scalar `R`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NoiseConfig {
    /// Upper-left entry of the process noise covariance `Q`.
    pub process_variance: f64,
    /// Observation noise variance `R`.
    pub observation_variance: f64,
}

impl NoiseConfig {
    /// Validate that both variances are finite and non-negative.
    pub fn validate(&self) -> ChannelResult<()> {
        validate_variance(self.process_variance, "process variance Q")?;
        validate_variance(self.observation_variance, "observation variance R")
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            process_variance: 0.1,
            observation_variance: 0.1,
        }
    }
}

/// Configuration for one Gilbert-Elliot trajectory generation run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GilbertElliotConfig {
    /// AR coefficients of the good regime.
    pub good: RegimeCoefficients,
    /// AR coefficients of the bad regime.
    pub bad: RegimeCoefficients,
    /// Markov switch probabilities.
    pub transition: TransitionProbabilities,
    /// Number of recursion steps; the trajectory has `sequence_length + 1`
    /// entries including the warm-start state.
    pub sequence_length: usize,
    /// Process/observation noise variances.
    pub noise: NoiseConfig,
    /// Initial-regime policy.
    pub start_policy: StartPolicy,
    /// Seed for the run; `None` draws one from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GilbertElliotConfig {
    fn default() -> Self {
        Self {
            good: RegimeCoefficients::new(0.5, -0.4),
            bad: RegimeCoefficients::new(1.414, -0.99968),
            transition: TransitionProbabilities::default(),
            sequence_length: 20,
            noise: NoiseConfig::default(),
            start_policy: StartPolicy::Good,
            seed: None,
        }
    }
}

impl GilbertElliotConfig {
    /// Validate the full configuration.
    pub fn validate(&self) -> ChannelResult<()> {
        self.good.validate("good regime")?;
        self.bad.validate("bad regime")?;
        self.transition.validate()?;
        self.noise.validate()?;
        if self.sequence_length == 0 {
            return Err(ChannelDataError::InvalidParameter {
                parameter: "sequence_length".to_string(),
                value: 0.0,
                constraint: "> 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for the mismatched-coefficient (single-regime) generator.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MismatchConfig {
    /// Mean AR coefficients around which each batch element is perturbed.
    pub coeff_means: RegimeCoefficients,
    /// Variance of the Gaussian perturbation applied to each coefficient.
    pub coeff_noise_variance: f64,
    /// Number of batch elements per series.
    pub batch_size: usize,
    /// Observed samples per sequence; the underlying trajectory runs one step
    /// further to provide the next-state label.
    pub sequence_length: usize,
    /// Number of series to generate.
    pub sim_length: usize,
    /// Process/observation noise variances.
    pub noise: NoiseConfig,
    /// Seed for the run; `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// Ceiling on stability rejection redraws per batch element.
    pub max_rejection_attempts: usize,
}

impl Default for MismatchConfig {
    fn default() -> Self {
        Self {
            coeff_means: RegimeCoefficients::new(0.5, 0.4),
            coeff_noise_variance: 0.1,
            batch_size: 32,
            sequence_length: 20,
            sim_length: 100,
            noise: NoiseConfig::default(),
            seed: None,
            max_rejection_attempts: 10_000,
        }
    }
}

impl MismatchConfig {
    /// Validate the full configuration.
    pub fn validate(&self) -> ChannelResult<()> {
        self.coeff_means.validate("coefficient means")?;
        validate_variance(self.coeff_noise_variance, "coefficient noise variance")?;
        self.noise.validate()?;
        for (name, value) in [
            ("batch_size", self.batch_size),
            ("sequence_length", self.sequence_length),
            ("sim_length", self.sim_length),
            ("max_rejection_attempts", self.max_rejection_attempts),
        ] {
            if value == 0 {
                return Err(ChannelDataError::InvalidParameter {
                    parameter: name.to_string(),
                    value: 0.0,
                    constraint: "> 0".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Configuration for windowed/batched dataset generation.
///
/// One long Markov-switching trajectory is generated and cut into
/// `num_sequences` sliding windows of `sequence_length` observations each, so
/// consecutive samples share channel state the way consecutive estimation
/// problems do on a real link.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatasetConfig {
    /// Observations per windowed sample.
    pub sequence_length: usize,
    /// Number of windowed samples to produce.
    pub num_sequences: usize,
    /// Batch size for the batched variants; must divide `num_sequences`.
    pub batch_size: usize,
    /// AR coefficients of the good regime.
    pub good: RegimeCoefficients,
    /// AR coefficients of the bad regime.
    pub bad: RegimeCoefficients,
    /// Markov switch probabilities.
    pub transition: TransitionProbabilities,
    /// Process/observation noise variances.
    pub noise: NoiseConfig,
    /// Master seed for the dataset; `None` draws one from OS entropy.
    pub seed: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            sequence_length: 20,
            num_sequences: 100,
            batch_size: 20,
            good: RegimeCoefficients::new(0.5, -0.4),
            bad: RegimeCoefficients::new(1.414, -0.99968),
            transition: TransitionProbabilities::default(),
            noise: NoiseConfig::default(),
            seed: None,
        }
    }
}

impl DatasetConfig {
    /// Validate the full configuration.
    pub fn validate(&self) -> ChannelResult<()> {
        for (name, value) in [
            ("sequence_length", self.sequence_length),
            ("num_sequences", self.num_sequences),
            ("batch_size", self.batch_size),
        ] {
            if value == 0 {
                return Err(ChannelDataError::InvalidParameter {
                    parameter: name.to_string(),
                    value: 0.0,
                    constraint: "> 0".to_string(),
                });
            }
        }
        self.as_gilbert_elliot(self.long_sequence_length(), StartPolicy::Random)
            .validate()
    }

    /// Length of the single long trajectory whose sliding windows yield
    /// exactly `num_sequences` samples.
    pub fn long_sequence_length(&self) -> usize {
        self.num_sequences + self.sequence_length - 1
    }

    /// Lower this dataset configuration onto a single trajectory run.
    pub fn as_gilbert_elliot(
        &self,
        sequence_length: usize,
        start_policy: StartPolicy,
    ) -> GilbertElliotConfig {
        GilbertElliotConfig {
            good: self.good,
            bad: self.bad,
            transition: self.transition,
            sequence_length,
            noise: self.noise,
            start_policy,
            seed: self.seed,
        }
    }
}

/// Configuration for the pinned-regime training set generator.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrainingSetConfig {
    /// Observations per training sample.
    pub sequence_length: usize,
    /// Sequences generated per regime; the shuffled set holds twice this.
    pub num_sequences: usize,
    /// AR coefficients of the good regime.
    pub good: RegimeCoefficients,
    /// AR coefficients of the bad regime.
    pub bad: RegimeCoefficients,
    /// Process/observation noise variances.
    pub noise: NoiseConfig,
    /// Master seed; `None` draws one from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TrainingSetConfig {
    fn default() -> Self {
        Self {
            sequence_length: 20,
            num_sequences: 100,
            good: RegimeCoefficients::new(0.5, -0.4),
            bad: RegimeCoefficients::new(1.414, -0.99968),
            noise: NoiseConfig::default(),
            seed: None,
        }
    }
}

impl TrainingSetConfig {
    /// Validate the full configuration.
    pub fn validate(&self) -> ChannelResult<()> {
        self.good.validate("good regime")?;
        self.bad.validate("bad regime")?;
        self.noise.validate()?;
        for (name, value) in [
            ("sequence_length", self.sequence_length),
            ("num_sequences", self.num_sequences),
        ] {
            if value == 0 {
                return Err(ChannelDataError::InvalidParameter {
                    parameter: name.to_string(),
                    value: 0.0,
                    constraint: "> 0".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Top-level generation mode selector.
///
/// Mirrors the external CLI flag choosing between the Markov-switching channel
/// and the single-regime mismatched-coefficient process.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GenerationMode {
    /// Gilbert-Elliot channel with Markov regime switching, windowed into
    /// supervised samples.
    MarkovSwitching(DatasetConfig),
    /// Single-regime AR process with per-batch-element coefficient mismatch.
    SingleRegimeMismatch(MismatchConfig),
}

impl GenerationMode {
    /// Validate the wrapped configuration.
    pub fn validate(&self) -> ChannelResult<()> {
        match self {
            GenerationMode::MarkovSwitching(config) => config.validate(),
            GenerationMode::SingleRegimeMismatch(config) => config.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_matrix_layout() {
        let coeffs = RegimeCoefficients::new(0.3, 0.1);
        let f = coeffs.companion();
        assert_eq!(f[(0, 0)], 0.3);
        assert_eq!(f[(0, 1)], 0.1);
        assert_eq!(f[(1, 0)], 1.0);
        assert_eq!(f[(1, 1)], 0.0);
    }

    #[test]
    fn test_spectral_radius_real_roots() {
        // λ² − 0.5λ − 0.14 = 0 has roots 0.7 and −0.2
        let coeffs = RegimeCoefficients::new(0.5, 0.14);
        assert!((coeffs.spectral_radius() - 0.7).abs() < 1e-12);
        assert!(coeffs.is_stable());
    }

    #[test]
    fn test_spectral_radius_complex_roots() {
        // The default bad regime has a conjugate pair with |λ| = sqrt(0.99968)
        let coeffs = RegimeCoefficients::new(1.414, -0.99968);
        assert!((coeffs.spectral_radius() - 0.99968f64.sqrt()).abs() < 1e-12);
        assert!(coeffs.is_stable());
    }

    #[test]
    fn test_spectral_radius_unstable() {
        let coeffs = RegimeCoefficients::new(2.0, 0.5);
        assert!(coeffs.spectral_radius() > 1.0);
        assert!(!coeffs.is_stable());
    }

    #[test]
    fn test_default_configs_validate() {
        assert!(GilbertElliotConfig::default().validate().is_ok());
        assert!(MismatchConfig::default().validate().is_ok());
        assert!(DatasetConfig::default().validate().is_ok());
        assert!(TrainingSetConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let config = GilbertElliotConfig {
            transition: TransitionProbabilities {
                good_to_bad: 1.2,
                bad_to_good: 0.0,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ChannelDataError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_negative_variance_rejected() {
        let config = GilbertElliotConfig {
            noise: NoiseConfig {
                process_variance: -0.1,
                observation_variance: 0.1,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sequence_length_rejected() {
        let config = GilbertElliotConfig {
            sequence_length: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_long_sequence_length() {
        let config = DatasetConfig {
            sequence_length: 20,
            num_sequences: 100,
            ..Default::default()
        };
        // 100 windows of 20 observations over a single trajectory
        assert_eq!(config.long_sequence_length(), 119);
    }
}
