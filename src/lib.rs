//! # Channel Data Generation
//!
//! Simulation of a Markov-modulated autoregressive wireless channel and
//! construction of labeled datasets for learned estimators.
//!
//! The channel is a Gilbert-Elliot model: a two-state hidden Markov chain
//! switches the coefficients of a complex-valued AR(2) recursion between a
//! benign ("good") and a near-oscillatory ("bad") regime, with
//! circularly-symmetric Gaussian process and observation noise. Alongside the
//! raw trajectories the crate computes the theoretical steady-state Kalman
//! MSE bounds of each regime by solving the discrete algebraic Riccati
//! equation, so estimators trained on the data can be graded against the
//! optimal-filter floor.
//!
//! ## Key Features
//!
//! - **Gilbert-Elliot generator**: regime-switching complex AR(2) trajectories
//!   with reproducible, explicitly seeded randomness
//! - **Riccati MSE bounds**: steady-state prediction/estimation error floors
//!   per regime via a bounded DARE fixed-point solve
//! - **Mismatched-coefficient generator**: single-regime series whose AR
//!   coefficients are perturbed per batch element and rejection-sampled for
//!   stability
//! - **Toeplitz windowing**: sliding-window transform from trajectories to
//!   supervised (observation window, current/next state) samples
//! - **Batching**: order-preserving regrouping into fixed-size batches
//! - **Persistence handoff**: flat key→value archives of data, bounds, seed
//!   and parameters
//!
//! ## Quick Start
//!
//! ```rust
//! use channel_datagen::{generate_batched_dataset, DatasetConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatasetConfig {
//!         sequence_length: 20,
//!         num_sequences: 100,
//!         batch_size: 20,
//!         seed: Some(100),
//!         ..Default::default()
//!     };
//!
//!     let dataset = generate_batched_dataset(&config)?;
//!     println!(
//!         "generated {} batches, prediction MSE floor (good regime): {:.4}",
//!         dataset.batches.num_batches(),
//!         dataset.windowed.riccati.prediction_good
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The leaf modules ([`markov`], [`rng`], [`riccati`]) feed the generators
//! ([`gilbert_elliot`], [`mismatch`]); [`toeplitz`] and [`batching`] reshape
//! generated trajectories into learner-facing tensors, and [`dataset`] wires
//! the full flows together. Everything is synchronous and CPU-bound; runs
//! sharing nothing but distinct generator streams may execute concurrently.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batching;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod gilbert_elliot;
pub mod markov;
pub mod mismatch;
pub mod records;
pub mod riccati;
pub mod rng;
pub mod toeplitz;

// Re-exports for convenience - main public API
pub use batching::{to_batches, BatchedDataset};
pub use config::{
    DatasetConfig, GenerationMode, GilbertElliotConfig, MismatchConfig, NoiseConfig,
    RegimeCoefficients, TrainingSetConfig, TransitionProbabilities,
};
pub use dataset::{
    generate, generate_batched_dataset, generate_training_set, generate_windowed_dataset,
    BatchedChannelDataset, ChannelDataset, GeneratedData, TrainingSet,
};
pub use errors::{ChannelDataError, ChannelResult};
pub use gilbert_elliot::{
    generate_gilbert_elliot, generate_with_rng, GilbertElliotSequence, Trajectory,
};
pub use markov::{Regime, StartPolicy};
pub use mismatch::{draw_stable_coefficients, generate_mismatched, MismatchedData};
pub use records::{ArchiveValue, DatasetArchive};
pub use riccati::{solve_dare, steady_state_mse, DareSolution, RiccatiConvergences};
pub use rng::SimRng;
pub use toeplitz::{build_windows, WindowedDataset};
