//! Error types and validation functions for channel data generation.
//!
//! All fallible operations in this crate return [`ChannelResult`]. Errors are
//! split along the lines of configuration (bad parameters, caught before any
//! simulation work), numerical failure (the Riccati solve), and exhausted
//! stability rejection in the mismatched-coefficient generator. None of them
//! are retried internally; they propagate to the caller.

use thiserror::Error;

/// Error types for channel data generation operations.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ChannelDataError {
    /// Invalid parameter value in a generation configuration.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Window size incompatible with the trajectory it should slide over.
    #[error("Window size {window} exceeds sequence length {sequence_length}: no windows can be formed")]
    WindowTooLarge {
        /// Requested window size
        window: usize,
        /// Sequence length of the trajectory (trajectory length minus one)
        sequence_length: usize,
    },

    /// Sample count not divisible into the requested batch size.
    #[error("Cannot batch {samples} samples into batches of {batch_size}: {samples} % {batch_size} != 0")]
    BatchSizeMismatch {
        /// Number of windowed samples available
        samples: usize,
        /// Requested batch size
        batch_size: usize,
    },

    /// Numerical computation failed (Riccati non-convergence, singular
    /// innovation variance, non-PSD fixed point).
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for the failure
        reason: String,
        /// Operation that failed, when known
        operation: Option<String>,
    },

    /// Coefficient rejection sampling hit its attempt ceiling without finding
    /// a stable matrix.
    #[error(
        "Stability rejection exhausted after {attempts} attempts \
         (coefficient noise variance {coeff_noise_variance}); refusing to emit an unstable process"
    )]
    StabilityExhausted {
        /// Number of draws attempted before giving up
        attempts: usize,
        /// The configured coefficient perturbation variance
        coeff_noise_variance: f64,
    },
}

/// Result type for channel data generation operations.
pub type ChannelResult<T> = Result<T, ChannelDataError>;

/// Validates that a parameter lies within `[min, max]`.
///
/// NaN values (of the parameter or the bounds) are rejected rather than
/// silently passing the comparison.
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> ChannelResult<()> {
    if value.is_nan() {
        return Err(ChannelDataError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if min.is_nan() || max.is_nan() || min > max {
        return Err(ChannelDataError::NumericalError {
            reason: format!(
                "invalid bounds for parameter {}: min={}, max={}",
                name, min, max
            ),
            operation: None,
        });
    }

    if value < min || value > max {
        Err(ChannelDataError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("[{}, {}]", min, max),
        })
    } else {
        Ok(())
    }
}

/// Validates that a value is a probability in `[0, 1]`.
pub fn validate_probability(value: f64, name: &str) -> ChannelResult<()> {
    validate_parameter(value, 0.0, 1.0, name)
}

/// Validates that a variance is finite and non-negative.
pub fn validate_variance(value: f64, name: &str) -> ChannelResult<()> {
    validate_finite(value, name)?;
    validate_parameter(value, 0.0, f64::MAX, name)
}

/// Validates that a value is finite (not NaN or infinite).
pub fn validate_finite(value: f64, name: &str) -> ChannelResult<()> {
    if !value.is_finite() {
        Err(ChannelDataError::NumericalError {
            reason: format!("{} is not finite: {}", name, value),
            operation: None,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_parameter_in_range() {
        assert!(validate_parameter(0.5, 0.0, 1.0, "p").is_ok());
        // Boundary values are valid
        assert!(validate_parameter(0.0, 0.0, 1.0, "p").is_ok());
        assert!(validate_parameter(1.0, 0.0, 1.0, "p").is_ok());
    }

    #[test]
    fn test_validate_parameter_out_of_range() {
        match validate_parameter(1.5, 0.0, 1.0, "transition probability") {
            Err(ChannelDataError::InvalidParameter {
                parameter,
                value,
                constraint,
            }) => {
                assert_eq!(parameter, "transition probability");
                assert_eq!(value, 1.5);
                assert_eq!(constraint, "[0, 1]");
            }
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_parameter_nan_inputs() {
        assert!(matches!(
            validate_parameter(f64::NAN, 0.0, 1.0, "p"),
            Err(ChannelDataError::InvalidParameter { .. })
        ));
        assert!(matches!(
            validate_parameter(0.5, f64::NAN, 1.0, "p"),
            Err(ChannelDataError::NumericalError { .. })
        ));
        // min > max is a caller bug, reported as numerical
        assert!(matches!(
            validate_parameter(0.5, 1.0, 0.0, "p"),
            Err(ChannelDataError::NumericalError { .. })
        ));
    }

    #[test]
    fn test_validate_variance() {
        assert!(validate_variance(0.0, "Q").is_ok());
        assert!(validate_variance(0.1, "Q").is_ok());
        assert!(validate_variance(-0.1, "Q").is_err());
        assert!(validate_variance(f64::INFINITY, "Q").is_err());
        assert!(validate_variance(f64::NAN, "Q").is_err());
    }

    #[test]
    fn test_error_display_formatting() {
        let err = ChannelDataError::WindowTooLarge {
            window: 25,
            sequence_length: 20,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("25"));
        assert!(msg.contains("20"));

        let err = ChannelDataError::StabilityExhausted {
            attempts: 10_000,
            coeff_noise_variance: 50.0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("10000"));
        assert!(msg.contains("unstable"));
    }
}
