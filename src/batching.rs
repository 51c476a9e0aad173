//! Regrouping of windowed samples into fixed-size batches.
//!
//! Pure reshaping, no randomness: batch `i`, element `b` receives original
//! sample `i·batch_size + b`, so concatenating batches in order reconstructs
//! the original sample ordering exactly. A sample count that does not divide
//! evenly is rejected rather than truncated; silently dropping the remainder
//! would shrink a requested dataset without anyone noticing.

use crate::errors::{ChannelDataError, ChannelResult};
use ndarray::{Array2, Array3, Array4};

/// Windowed samples regrouped into batches for the external learner.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedDataset {
    /// Shape `(batch_size, 4, num_batches)`.
    pub states: Array3<f64>,
    /// Shape `(batch_size, 2, sequence_length, num_batches)`.
    pub observations: Array4<f64>,
}

impl BatchedDataset {
    /// Number of batches.
    pub fn num_batches(&self) -> usize {
        self.states.dim().2
    }
}

/// Regroup `n` flat samples into `n / batch_size` batches.
///
/// `final_states` must have shape `(4, n)` and `observations`
/// `(2, sequence_length, n)`; `n` must be divisible by `batch_size`.
pub fn to_batches(
    final_states: &Array2<f64>,
    observations: &Array3<f64>,
    batch_size: usize,
) -> ChannelResult<BatchedDataset> {
    if batch_size == 0 {
        return Err(ChannelDataError::InvalidParameter {
            parameter: "batch_size".to_string(),
            value: 0.0,
            constraint: "> 0".to_string(),
        });
    }

    let (state_channels, samples) = final_states.dim();
    let (obs_channels, sequence_length, obs_samples) = observations.dim();
    if state_channels != 4 || obs_channels != 2 || samples != obs_samples {
        return Err(ChannelDataError::NumericalError {
            reason: format!(
                "inconsistent sample tensors: final_states {:?}, observations {:?}",
                final_states.dim(),
                observations.dim()
            ),
            operation: Some("to_batches".to_string()),
        });
    }

    if samples % batch_size != 0 {
        return Err(ChannelDataError::BatchSizeMismatch {
            samples,
            batch_size,
        });
    }
    let num_batches = samples / batch_size;

    let mut states = Array3::zeros((batch_size, 4, num_batches));
    let mut batched_observations = Array4::zeros((batch_size, 2, sequence_length, num_batches));

    for batch in 0..num_batches {
        for element in 0..batch_size {
            let sample = batch * batch_size + element;
            for channel in 0..4 {
                states[[element, channel, batch]] = final_states[[channel, sample]];
            }
            for channel in 0..2 {
                for step in 0..sequence_length {
                    batched_observations[[element, channel, step, batch]] =
                        observations[[channel, step, sample]];
                }
            }
        }
    }

    Ok(BatchedDataset {
        states,
        observations: batched_observations,
    })
}
