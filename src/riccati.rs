//! Steady-state Riccati (DARE) solver for the per-regime Kalman MSE bounds.
//!
//! For each regime the filter form of the discrete algebraic Riccati equation
//!
//! ```text
//! P = F P Fᵀ + Q − F P Hᵀ (H P Hᵀ + R)⁻¹ H P Fᵀ
//! ```
//!
//! is solved by bounded fixed-point iteration of the measurement-update map.
//! With `H = [1, 0]` and a companion-form `F` the pair is detectable and the
//! process noise reaches every mode, so the iteration converges to the unique
//! stabilizing solution even for regimes with spectral radius above one. The
//! `[0, 0]` entries of the prediction and estimation covariances are the
//! theoretical one-step-prediction and filtering MSE floors used to grade
//! estimators trained on the generated data.

use crate::config::{NoiseConfig, RegimeCoefficients};
use crate::errors::{ChannelDataError, ChannelResult};
use nalgebra::{Matrix2, RowVector2, Vector2};

/// Relative convergence tolerance on the max-abs elementwise update.
const CONVERGENCE_TOL: f64 = 1e-13;

/// Hard ceiling on fixed-point sweeps.
const MAX_SWEEPS: usize = 10_000;

/// Innovation variances below this are treated as singular.
const MIN_INNOVATION: f64 = 1e-300;

/// Converged solution of one DARE solve.
#[derive(Debug, Clone, PartialEq)]
pub struct DareSolution {
    /// Steady-state a-priori (one-step prediction) error covariance.
    pub prediction: Matrix2<f64>,
    /// Steady-state a-posteriori (estimation) error covariance.
    pub estimate: Matrix2<f64>,
    /// Steady-state Kalman gain.
    pub kalman_gain: Vector2<f64>,
    /// Number of fixed-point sweeps used.
    pub sweeps: usize,
}

impl DareSolution {
    /// Scalar one-step-prediction MSE bound (first state component).
    pub fn prediction_mse(&self) -> f64 {
        self.prediction[(0, 0)]
    }

    /// Scalar estimation MSE bound (first state component).
    pub fn estimation_mse(&self) -> f64 {
        self.estimate[(0, 0)]
    }
}

/// Theoretical steady-state MSE bounds for both regimes.
///
/// Laid out as the 2×2 matrix `[[pred_good, est_good], [pred_bad, est_bad]]`
/// consumed by the evaluation side.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiccatiConvergences {
    /// Prediction MSE bound of the good regime.
    pub prediction_good: f64,
    /// Estimation MSE bound of the good regime.
    pub estimate_good: f64,
    /// Prediction MSE bound of the bad regime.
    pub prediction_bad: f64,
    /// Estimation MSE bound of the bad regime.
    pub estimate_bad: f64,
}

impl RiccatiConvergences {
    /// The `[[pred_good, est_good], [pred_bad, est_bad]]` layout as rows.
    pub fn as_rows(&self) -> [[f64; 2]; 2] {
        [
            [self.prediction_good, self.estimate_good],
            [self.prediction_bad, self.estimate_bad],
        ]
    }
}

/// Solve the filter DARE for one regime matrix with `H = [1, 0]`.
///
/// `q` is the full 2×2 process covariance, `r` the scalar observation
/// variance. Fails with a `NumericalError` if the innovation variance becomes
/// singular or the iteration does not converge within its sweep ceiling; no
/// fallback value is ever returned, since a wrong bound would silently corrupt
/// every downstream MSE comparison.
pub fn solve_dare(f: &Matrix2<f64>, q: &Matrix2<f64>, r: f64) -> ChannelResult<DareSolution> {
    let h = RowVector2::new(1.0, 0.0);
    let ht = Vector2::new(1.0, 0.0);

    let mut p = Matrix2::identity();
    let mut sweeps = 0usize;
    let mut converged = false;

    while sweeps < MAX_SWEEPS {
        sweeps += 1;

        let innovation = (h * p * ht)[(0, 0)] + r;
        if innovation < MIN_INNOVATION {
            return Err(ChannelDataError::NumericalError {
                reason: format!("singular innovation variance {} in DARE sweep", innovation),
                operation: Some("solve_dare".to_string()),
            });
        }

        let fp = f * p;
        let fpht = fp * ht;
        // H P Fᵀ = (F P Hᵀ)ᵀ for symmetric P, so the correction is an outer
        // product of one vector with itself.
        let mut next = fp * f.transpose() + q - (fpht * fpht.transpose()) / innovation;
        // Symmetrize to keep rounding from drifting the iterate off the
        // symmetric cone.
        next = (next + next.transpose()) * 0.5;

        let update = (next - p).abs().max();
        let scale = p.abs().max().max(1.0);
        p = next;

        if update <= CONVERGENCE_TOL * scale {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(ChannelDataError::NumericalError {
            reason: format!("DARE fixed-point iteration did not converge in {} sweeps", MAX_SWEEPS),
            operation: Some("solve_dare".to_string()),
        });
    }

    let innovation = (h * p * ht)[(0, 0)] + r;
    if innovation < MIN_INNOVATION {
        return Err(ChannelDataError::NumericalError {
            reason: format!("singular innovation variance {} at DARE fixed point", innovation),
            operation: Some("solve_dare".to_string()),
        });
    }

    let kalman_gain = (p * ht) / innovation;
    let mut estimate = p - kalman_gain * (h * p);
    estimate = (estimate + estimate.transpose()) * 0.5;

    ensure_psd(&p, "prediction covariance")?;
    ensure_psd(&estimate, "estimation covariance")?;

    Ok(DareSolution {
        prediction: p,
        estimate,
        kalman_gain,
        sweeps,
    })
}

/// Solve the DARE for both regimes and assemble the MSE bound matrix.
///
/// Called once per dataset generation; any failure is fatal for the whole
/// generation call.
pub fn steady_state_mse(
    good: &RegimeCoefficients,
    bad: &RegimeCoefficients,
    noise: &NoiseConfig,
) -> ChannelResult<RiccatiConvergences> {
    noise.validate()?;
    let q = process_covariance(noise);
    let r = noise.observation_variance;

    let good_solution =
        solve_dare(&good.companion(), &q, r).map_err(|e| annotate_regime(e, "good"))?;
    let bad_solution =
        solve_dare(&bad.companion(), &q, r).map_err(|e| annotate_regime(e, "bad"))?;

    Ok(RiccatiConvergences {
        prediction_good: good_solution.prediction_mse(),
        estimate_good: good_solution.estimation_mse(),
        prediction_bad: bad_solution.prediction_mse(),
        estimate_bad: bad_solution.estimation_mse(),
    })
}

/// Process covariance `Q = diag(q, 0)`: noise drives only the first
/// companion component.
fn process_covariance(noise: &NoiseConfig) -> Matrix2<f64> {
    Matrix2::new(noise.process_variance, 0.0, 0.0, 0.0)
}

/// Check symmetry and positive semi-definiteness of a 2×2 covariance.
fn ensure_psd(m: &Matrix2<f64>, name: &str) -> ChannelResult<()> {
    let tol = 1e-9 * m.abs().max().max(1.0);
    let symmetric = (m[(0, 1)] - m[(1, 0)]).abs() <= tol;
    // 2×2 PSD test: non-negative diagonal and determinant.
    let psd = m[(0, 0)] >= -tol && m[(1, 1)] >= -tol && m.determinant() >= -tol;
    if symmetric && psd {
        Ok(())
    } else {
        Err(ChannelDataError::NumericalError {
            reason: format!("{} is not symmetric positive semi-definite: {:?}", name, m),
            operation: Some("solve_dare".to_string()),
        })
    }
}

/// Attach the failing regime to a solver error.
fn annotate_regime(error: ChannelDataError, regime: &str) -> ChannelDataError {
    match error {
        ChannelDataError::NumericalError { reason, .. } => ChannelDataError::NumericalError {
            reason: format!("{} for regime={}", reason, regime),
            operation: Some("steady_state_mse".to_string()),
        },
        other => other,
    }
}
