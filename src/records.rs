//! Flat key→value handoff to the external persistence layer.
//!
//! A generated dataset is flattened into an ordered map of named scalars and
//! real-valued arrays (trajectory, windowed tensors, Riccati convergences,
//! seed and generating parameters) and handed to whatever storage backend
//! the caller uses. No file format is assumed here; with the `serde` feature
//! the whole archive serializes directly.

use crate::config::{DatasetConfig, MismatchConfig, TrainingSetConfig};
use crate::dataset::{ChannelDataset, TrainingSet};
use crate::mismatch::MismatchedData;
use crate::riccati::RiccatiConvergences;
use ndarray::{Array2, Array3, Array4};
use std::collections::BTreeMap;

/// One value in a dataset archive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArchiveValue {
    /// Real scalar.
    Scalar(f64),
    /// Integer (lengths, counts, seeds).
    Integer(u64),
    /// Short text (parameter descriptions).
    Text(String),
    /// 1-D real array.
    Vector(Vec<f64>),
    /// 2-D real array.
    Matrix(Array2<f64>),
    /// 3-D real array.
    Tensor(Array3<f64>),
    /// 4-D real array.
    Tensor4(Array4<f64>),
}

/// Ordered flat key→value archive of one generation run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetArchive {
    entries: BTreeMap<String, ArchiveValue>,
}

impl DatasetArchive {
    /// Empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: &str, value: ArchiveValue) {
        self.entries.insert(key.to_string(), value);
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&ArchiveValue> {
        self.entries.get(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArchiveValue)> {
        self.entries.iter()
    }

    /// Archive a windowed channel dataset with its generating parameters.
    pub fn from_channel_dataset(dataset: &ChannelDataset, config: &DatasetConfig) -> Self {
        let mut archive = Self::new();
        archive.insert(
            "observedStates",
            ArchiveValue::Tensor(dataset.windows.observation_windows.clone()),
        );
        archive.insert(
            "systemStates",
            ArchiveValue::Tensor(dataset.windows.all_state_windows.clone()),
        );
        archive.insert(
            "finalStateValues",
            ArchiveValue::Matrix(dataset.windows.final_states.clone()),
        );
        archive.insert(
            "trajectoryStates",
            ArchiveValue::Matrix(complex_rows(&dataset.trajectory.states)),
        );
        archive.insert(
            "trajectoryObservations",
            ArchiveValue::Matrix(complex_rows(&dataset.trajectory.observations)),
        );
        archive.insert("seed", ArchiveValue::Integer(dataset.seed));
        archive.insert(
            "riccatiConvergences",
            ArchiveValue::Matrix(riccati_matrix(&dataset.riccati)),
        );
        archive.insert(
            "goodCoeffs",
            ArchiveValue::Vector(vec![config.good.a1, config.good.a2]),
        );
        archive.insert(
            "badCoeffs",
            ArchiveValue::Vector(vec![config.bad.a1, config.bad.a2]),
        );
        archive.insert(
            "sequenceLength",
            ArchiveValue::Integer(config.sequence_length as u64),
        );
        archive.insert(
            "numSequences",
            ArchiveValue::Integer(config.num_sequences as u64),
        );
        archive.insert("QVar", ArchiveValue::Scalar(config.noise.process_variance));
        archive.insert(
            "RVar",
            ArchiveValue::Scalar(config.noise.observation_variance),
        );
        archive.insert(
            "goodToBadProb",
            ArchiveValue::Scalar(config.transition.good_to_bad),
        );
        archive.insert(
            "badToGoodProb",
            ArchiveValue::Scalar(config.transition.bad_to_good),
        );
        archive
    }

    /// Archive a shuffled training set with its generating parameters.
    pub fn from_training_set(set: &TrainingSet, config: &TrainingSetConfig) -> Self {
        let mut archive = Self::new();
        archive.insert(
            "observedStates",
            ArchiveValue::Tensor(set.windows.observation_windows.clone()),
        );
        archive.insert(
            "systemStates",
            ArchiveValue::Tensor(set.windows.all_state_windows.clone()),
        );
        archive.insert(
            "finalStateValues",
            ArchiveValue::Matrix(set.windows.final_states.clone()),
        );
        archive.insert("seed", ArchiveValue::Integer(set.seed));
        archive.insert(
            "riccatiConvergences",
            ArchiveValue::Matrix(riccati_matrix(&set.riccati)),
        );
        archive.insert(
            "goodCoeffs",
            ArchiveValue::Vector(vec![config.good.a1, config.good.a2]),
        );
        archive.insert(
            "badCoeffs",
            ArchiveValue::Vector(vec![config.bad.a1, config.bad.a2]),
        );
        archive.insert(
            "sequenceLength",
            ArchiveValue::Integer(config.sequence_length as u64),
        );
        archive.insert(
            "numSequences",
            ArchiveValue::Integer(config.num_sequences as u64),
        );
        archive.insert("QVar", ArchiveValue::Scalar(config.noise.process_variance));
        archive.insert(
            "RVar",
            ArchiveValue::Scalar(config.noise.observation_variance),
        );
        archive
    }

    /// Archive a mismatched-coefficient series with its generating parameters.
    pub fn from_mismatched(data: &MismatchedData, config: &MismatchConfig) -> Self {
        let mut archive = Self::new();
        archive.insert(
            "measuredData",
            ArchiveValue::Tensor4(data.observations.clone()),
        );
        archive.insert("predAndCurState", ArchiveValue::Tensor(data.states.clone()));
        archive.insert(
            "coeffMeans",
            ArchiveValue::Vector(vec![config.coeff_means.a1, config.coeff_means.a2]),
        );
        archive.insert(
            "coeffNoiseVar",
            ArchiveValue::Scalar(config.coeff_noise_variance),
        );
        archive.insert(
            "sequenceLength",
            ArchiveValue::Integer(config.sequence_length as u64),
        );
        archive.insert("batchSize", ArchiveValue::Integer(config.batch_size as u64));
        archive.insert("simLength", ArchiveValue::Integer(config.sim_length as u64));
        archive.insert("QVar", ArchiveValue::Scalar(config.noise.process_variance));
        archive.insert(
            "RVar",
            ArchiveValue::Scalar(config.noise.observation_variance),
        );
        if let Some(seed) = config.seed {
            archive.insert("seed", ArchiveValue::Integer(seed));
        }
        archive
    }
}

/// Split a complex sequence into a `(2, len)` real matrix, real row first.
fn complex_rows(values: &[num_complex::Complex64]) -> Array2<f64> {
    let mut rows = Array2::zeros((2, values.len()));
    for (k, value) in values.iter().enumerate() {
        rows[[0, k]] = value.re;
        rows[[1, k]] = value.im;
    }
    rows
}

/// The `[[pred_good, est_good], [pred_bad, est_bad]]` matrix.
fn riccati_matrix(riccati: &RiccatiConvergences) -> Array2<f64> {
    let rows = riccati.as_rows();
    let mut matrix = Array2::zeros((2, 2));
    for (i, row) in rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            matrix[[i, j]] = value;
        }
    }
    matrix
}
