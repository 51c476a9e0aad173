//! Sliding-window (Toeplitz) transform from a raw trajectory to supervised
//! samples.
//!
//! A window of `window` consecutive observations is paired with the true
//! state at the window's end and the one after it (the prediction target),
//! plus the full within-window state trajectory for auxiliary supervision.
//! Complex values are split into real/imaginary channels here, because the
//! downstream learner consumes fixed real-valued channel layouts.

use crate::errors::{ChannelDataError, ChannelResult};
use crate::gilbert_elliot::Trajectory;
use ndarray::{Array2, Array3};

/// Windowed supervised dataset built from one trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedDataset {
    /// Shape `(2, window + 1, num_windows)`: re/im of the full state
    /// trajectory inside each window.
    pub all_state_windows: Array3<f64>,
    /// Shape `(2, window, num_windows)`: re/im of the observations inside
    /// each window.
    pub observation_windows: Array3<f64>,
    /// Shape `(4, num_windows)`: re(current), re(next), im(current), im(next)
    /// true states at each window's end.
    pub final_states: Array2<f64>,
}

impl WindowedDataset {
    /// Number of windows (supervised samples).
    pub fn num_windows(&self) -> usize {
        self.final_states.ncols()
    }

    /// Observations per window.
    pub fn window_size(&self) -> usize {
        self.observation_windows.dim().1
    }
}

/// Slide a fixed-length window across a trajectory.
///
/// Produces `sequence_length − window + 1` windows, where `sequence_length`
/// is the trajectory length minus one (the final state is reserved as the
/// last window's prediction target). Fails with a domain error when not even
/// one window fits.
///
/// The transform is pure: windows share no mutable state and could be filled
/// in any order.
pub fn build_windows(trajectory: &Trajectory, window: usize) -> ChannelResult<WindowedDataset> {
    if window == 0 {
        return Err(ChannelDataError::InvalidParameter {
            parameter: "window".to_string(),
            value: 0.0,
            constraint: "> 0".to_string(),
        });
    }

    let sequence_length = trajectory.sequence_length();
    if window > sequence_length {
        return Err(ChannelDataError::WindowTooLarge {
            window,
            sequence_length,
        });
    }
    let num_windows = sequence_length - window + 1;

    let x = &trajectory.states;
    let z = &trajectory.observations;

    let mut all_state_windows = Array3::zeros((2, window + 1, num_windows));
    let mut observation_windows = Array3::zeros((2, window, num_windows));
    let mut final_states = Array2::zeros((4, num_windows));

    for i in 0..num_windows {
        for k in 0..window {
            observation_windows[[0, k, i]] = z[i + k].re;
            observation_windows[[1, k, i]] = z[i + k].im;
        }
        for k in 0..=window {
            all_state_windows[[0, k, i]] = x[i + k].re;
            all_state_windows[[1, k, i]] = x[i + k].im;
        }
        // Current true state at the window's end, then its successor.
        final_states[[0, i]] = x[i + window - 1].re;
        final_states[[1, i]] = x[i + window].re;
        final_states[[2, i]] = x[i + window - 1].im;
        final_states[[3, i]] = x[i + window].im;
    }

    Ok(WindowedDataset {
        all_state_windows,
        observation_windows,
        final_states,
    })
}
