//! High-level dataset generation flows.
//!
//! These functions wire the leaf components together the way the external
//! training and evaluation harnesses consume them: one long Markov-switching
//! trajectory cut into overlapping windows (and optionally batched), a
//! pinned-regime training set with samples from both regimes shuffled
//! together, and a mode dispatch mirroring the external CLI flag.

use crate::batching::{to_batches, BatchedDataset};
use crate::config::{
    DatasetConfig, GenerationMode, GilbertElliotConfig, TrainingSetConfig, TransitionProbabilities,
};
use crate::errors::ChannelResult;
use crate::gilbert_elliot::{generate_with_rng, Trajectory};
use crate::markov::StartPolicy;
use crate::mismatch::{generate_mismatched, MismatchedData};
use crate::riccati::{steady_state_mse, RiccatiConvergences};
use crate::rng::SimRng;
use crate::toeplitz::{build_windows, WindowedDataset};
use ndarray::{Array2, Array3};

/// Windowed dataset from one long Gilbert-Elliot trajectory, with the raw
/// trajectory and generation metadata kept for persistence and for the
/// classical (Kalman / least-squares) baselines.
#[derive(Debug, Clone)]
pub struct ChannelDataset {
    /// The windowed supervised samples.
    pub windows: WindowedDataset,
    /// The raw trajectory the windows were cut from.
    pub trajectory: Trajectory,
    /// Steady-state Kalman MSE bounds of the two regimes.
    pub riccati: RiccatiConvergences,
    /// Master seed the dataset was generated from.
    pub seed: u64,
}

/// A [`ChannelDataset`] regrouped into fixed-size batches.
#[derive(Debug, Clone)]
pub struct BatchedChannelDataset {
    /// The underlying windowed dataset.
    pub windowed: ChannelDataset,
    /// The batched tensors handed to the external learner.
    pub batches: BatchedDataset,
}

/// Shuffled pinned-regime training set.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// Stacked single-window samples, `2 × num_sequences` columns.
    pub windows: WindowedDataset,
    /// Steady-state Kalman MSE bounds of the two regimes.
    pub riccati: RiccatiConvergences,
    /// Master seed the set was generated from.
    pub seed: u64,
}

/// Output of the top-level mode dispatch.
#[derive(Debug, Clone)]
pub enum GeneratedData {
    /// Markov-switching windowed and batched dataset.
    MarkovSwitching(BatchedChannelDataset),
    /// Single-regime mismatched-coefficient series.
    SingleRegimeMismatch(MismatchedData),
}

/// Generate a windowed dataset with exactly `num_sequences` samples.
///
/// A single trajectory of `num_sequences + sequence_length − 1` steps is
/// generated with a random starting regime and slid over with a
/// `sequence_length` window, so consecutive samples overlap and share channel
/// state the way consecutive estimation problems do on a live link.
pub fn generate_windowed_dataset(config: &DatasetConfig) -> ChannelResult<ChannelDataset> {
    config.validate()?;

    let seed = config.seed.unwrap_or_else(SimRng::entropy_seed);
    let mut rng = SimRng::with_seed(seed);

    let run = config.as_gilbert_elliot(config.long_sequence_length(), StartPolicy::Random);
    let sequence = generate_with_rng(&run, &mut rng)?;
    let windows = build_windows(&sequence.trajectory, config.sequence_length)?;

    debug_assert_eq!(windows.num_windows(), config.num_sequences);
    log::info!(
        "generated windowed dataset: {} windows of {} observations (seed {})",
        windows.num_windows(),
        config.sequence_length,
        seed
    );

    Ok(ChannelDataset {
        windows,
        trajectory: sequence.trajectory,
        riccati: sequence.riccati,
        seed,
    })
}

/// Generate a windowed dataset and regroup it into batches.
pub fn generate_batched_dataset(config: &DatasetConfig) -> ChannelResult<BatchedChannelDataset> {
    let windowed = generate_windowed_dataset(config)?;
    let batches = to_batches(
        &windowed.windows.final_states,
        &windowed.windows.observation_windows,
        config.batch_size,
    )?;
    Ok(BatchedChannelDataset { windowed, batches })
}

/// Generate a shuffled training set of pinned-regime sequences.
///
/// `num_sequences` full sequences are generated with the chain frozen in the
/// good regime and as many frozen in the bad regime; each sequence becomes
/// its single full-length window, and the `2 × num_sequences` samples are
/// interleaved by a seeded Fisher-Yates permutation so the learner sees both
/// regimes mixed. Every sequence gets its own derived generator stream.
pub fn generate_training_set(config: &TrainingSetConfig) -> ChannelResult<TrainingSet> {
    config.validate()?;

    let seed = config.seed.unwrap_or_else(SimRng::entropy_seed);
    let num_sequences = config.num_sequences;
    let total = 2 * num_sequences;
    let window = config.sequence_length;

    // The bounds depend only on the regime matrices and noise, not on any
    // particular sequence; solve once for the whole set.
    let riccati = steady_state_mse(&config.good, &config.bad, &config.noise)?;

    let mut all_state_windows = Array3::zeros((2, window + 1, total));
    let mut observation_windows = Array3::zeros((2, window, total));
    let mut final_states = Array2::zeros((4, total));

    let frozen = TransitionProbabilities {
        good_to_bad: 0.0,
        bad_to_good: 0.0,
    };

    for sample in 0..total {
        let start_policy = if sample < num_sequences {
            StartPolicy::Good
        } else {
            StartPolicy::Bad
        };

        let run = GilbertElliotConfig {
            good: config.good,
            bad: config.bad,
            transition: frozen,
            sequence_length: window,
            noise: config.noise,
            start_policy,
            seed: None,
        };
        let mut rng = SimRng::derive(seed, sample as u64);
        let sequence = generate_with_rng(&run, &mut rng)?;
        let single = build_windows(&sequence.trajectory, window)?;
        debug_assert_eq!(single.num_windows(), 1);

        for channel in 0..2 {
            for k in 0..=window {
                all_state_windows[[channel, k, sample]] = single.all_state_windows[[channel, k, 0]];
            }
            for k in 0..window {
                observation_windows[[channel, k, sample]] =
                    single.observation_windows[[channel, k, 0]];
            }
        }
        for channel in 0..4 {
            final_states[[channel, sample]] = single.final_states[[channel, 0]];
        }
    }

    // Interleave good and bad samples; one permutation applied to all three
    // tensors keeps observations aligned with their labels.
    let mut shuffle_rng = SimRng::derive(seed, total as u64);
    let permutation = shuffle_rng.permutation(total);

    let mut shuffled_states = Array3::zeros((2, window + 1, total));
    let mut shuffled_observations = Array3::zeros((2, window, total));
    let mut shuffled_finals = Array2::zeros((4, total));
    for (target, &source) in permutation.iter().enumerate() {
        for channel in 0..2 {
            for k in 0..=window {
                shuffled_states[[channel, k, target]] = all_state_windows[[channel, k, source]];
            }
            for k in 0..window {
                shuffled_observations[[channel, k, target]] =
                    observation_windows[[channel, k, source]];
            }
        }
        for channel in 0..4 {
            shuffled_finals[[channel, target]] = final_states[[channel, source]];
        }
    }

    log::info!(
        "generated training set: {} good + {} bad sequences, shuffled (seed {})",
        num_sequences,
        num_sequences,
        seed
    );

    Ok(TrainingSet {
        windows: WindowedDataset {
            all_state_windows: shuffled_states,
            observation_windows: shuffled_observations,
            final_states: shuffled_finals,
        },
        riccati,
        seed,
    })
}

/// Top-level dispatch between the two generation modes.
pub fn generate(mode: &GenerationMode) -> ChannelResult<GeneratedData> {
    mode.validate()?;
    match mode {
        GenerationMode::MarkovSwitching(config) => {
            Ok(GeneratedData::MarkovSwitching(generate_batched_dataset(config)?))
        }
        GenerationMode::SingleRegimeMismatch(config) => {
            Ok(GeneratedData::SingleRegimeMismatch(generate_mismatched(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MismatchConfig, RegimeCoefficients};
    use crate::errors::ChannelDataError;

    fn dataset_config(seed: u64) -> DatasetConfig {
        DatasetConfig {
            sequence_length: 10,
            num_sequences: 40,
            batch_size: 8,
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_windowed_dataset_sample_count() {
        let dataset = generate_windowed_dataset(&dataset_config(5)).unwrap();
        assert_eq!(dataset.windows.num_windows(), 40);
        assert_eq!(dataset.trajectory.states.len(), 50);
        assert_eq!(dataset.seed, 5);
    }

    #[test]
    fn test_windowed_dataset_deterministic() {
        let a = generate_windowed_dataset(&dataset_config(5)).unwrap();
        let b = generate_windowed_dataset(&dataset_config(5)).unwrap();
        assert_eq!(a.windows, b.windows);
    }

    #[test]
    fn test_batched_dataset_shapes() {
        let dataset = generate_batched_dataset(&dataset_config(5)).unwrap();
        assert_eq!(dataset.batches.states.dim(), (8, 4, 5));
        assert_eq!(dataset.batches.observations.dim(), (8, 2, 10, 5));
    }

    #[test]
    fn test_batched_rejects_non_divisible() {
        let config = DatasetConfig {
            num_sequences: 41,
            ..dataset_config(5)
        };
        assert!(matches!(
            generate_batched_dataset(&config),
            Err(ChannelDataError::BatchSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_training_set_size_and_determinism() {
        let config = TrainingSetConfig {
            sequence_length: 8,
            num_sequences: 10,
            seed: Some(21),
            ..Default::default()
        };
        let a = generate_training_set(&config).unwrap();
        let b = generate_training_set(&config).unwrap();
        assert_eq!(a.windows.num_windows(), 20);
        assert_eq!(a.windows, b.windows);
        assert_eq!(a.seed, 21);
    }

    #[test]
    fn test_training_set_regimes_differ_between_halves() {
        // The bad regime is near-oscillatory with much larger excursions; the
        // shuffled set must contain both kinds, so the spread of per-sample
        // energies is wide.
        let config = TrainingSetConfig {
            sequence_length: 30,
            num_sequences: 20,
            seed: Some(2),
            ..Default::default()
        };
        let set = generate_training_set(&config).unwrap();
        let energies: Vec<f64> = (0..set.windows.num_windows())
            .map(|i| {
                (0..30)
                    .map(|k| {
                        let re = set.windows.observation_windows[[0, k, i]];
                        let im = set.windows.observation_windows[[1, k, i]];
                        re * re + im * im
                    })
                    .sum::<f64>()
            })
            .collect();
        let max = energies.iter().cloned().fold(f64::MIN, f64::max);
        let min = energies.iter().cloned().fold(f64::MAX, f64::min);
        assert!(
            max / min > 2.0,
            "expected a mix of regimes, energy spread {}..{}",
            min,
            max
        );
    }

    #[test]
    fn test_mode_dispatch() {
        let markov = generate(&GenerationMode::MarkovSwitching(dataset_config(3))).unwrap();
        assert!(matches!(markov, GeneratedData::MarkovSwitching(_)));

        let mismatch_config = MismatchConfig {
            coeff_means: RegimeCoefficients::new(0.5, 0.4),
            batch_size: 2,
            sequence_length: 5,
            sim_length: 2,
            seed: Some(3),
            ..Default::default()
        };
        let mismatched =
            generate(&GenerationMode::SingleRegimeMismatch(mismatch_config)).unwrap();
        assert!(matches!(mismatched, GeneratedData::SingleRegimeMismatch(_)));
    }
}
