//! End-to-end integration tests for the full generation pipelines.
//!
//! These exercise the documented reference scenario: a sticky two-regime
//! channel with a benign good regime and a near-oscillatory bad regime,
//! windowed into supervised samples and regrouped into batches, with the
//! Riccati MSE bounds travelling alongside the data.

use assert_approx_eq::assert_approx_eq;
use channel_datagen::{
    build_windows, generate_batched_dataset, generate_gilbert_elliot, generate_windowed_dataset,
    steady_state_mse, ArchiveValue, ChannelDataError, DatasetArchive, DatasetConfig,
    GilbertElliotConfig, NoiseConfig, RegimeCoefficients, StartPolicy, TransitionProbabilities,
};

/// The reference channel used across these tests.
fn reference_config(sequence_length: usize, seed: u64) -> GilbertElliotConfig {
    GilbertElliotConfig {
        good: RegimeCoefficients::new(0.3, 0.1),
        bad: RegimeCoefficients::new(1.949, -0.95),
        transition: TransitionProbabilities {
            good_to_bad: 0.0005,
            bad_to_good: 0.0005,
        },
        sequence_length,
        noise: NoiseConfig {
            process_variance: 0.1,
            observation_variance: 0.1,
        },
        start_policy: StartPolicy::Good,
        seed: Some(seed),
    }
}

#[test]
fn test_reference_trajectory_and_windowing() {
    let sequence = generate_gilbert_elliot(&reference_config(20, 100)).unwrap();
    assert_eq!(sequence.trajectory.states.len(), 21);
    assert_eq!(sequence.trajectory.observations.len(), 21);

    let windows = build_windows(&sequence.trajectory, 5).unwrap();
    assert_eq!(windows.num_windows(), 16);
    assert_eq!(windows.observation_windows.dim(), (2, 5, 16));
    assert_eq!(windows.all_state_windows.dim(), (2, 6, 16));
    assert_eq!(windows.final_states.dim(), (4, 16));

    // Every window's label pair must match the trajectory it was cut from
    for i in 0..16 {
        let current = sequence.trajectory.states[i + 4];
        let next = sequence.trajectory.states[i + 5];
        assert_eq!(windows.final_states[[0, i]], current.re);
        assert_eq!(windows.final_states[[1, i]], next.re);
        assert_eq!(windows.final_states[[2, i]], current.im);
        assert_eq!(windows.final_states[[3, i]], next.im);
    }
}

#[test]
fn test_reference_trajectory_is_deterministic() {
    let a = generate_gilbert_elliot(&reference_config(20, 100)).unwrap();
    let b = generate_gilbert_elliot(&reference_config(20, 100)).unwrap();
    assert_eq!(a.trajectory, b.trajectory);
    assert_eq!(a.regime_path, b.regime_path);

    // Windowing the same trajectory twice is also bit-stable
    let wa = build_windows(&a.trajectory, 5).unwrap();
    let wb = build_windows(&b.trajectory, 5).unwrap();
    assert_eq!(wa, wb);
}

#[test]
fn test_oversized_window_reports_both_sizes() {
    let sequence = generate_gilbert_elliot(&reference_config(20, 100)).unwrap();
    let err = build_windows(&sequence.trajectory, 25).unwrap_err();
    match &err {
        ChannelDataError::WindowTooLarge {
            window,
            sequence_length,
        } => {
            assert_eq!(*window, 25);
            assert_eq!(*sequence_length, 20);
        }
        other => panic!("expected WindowTooLarge, got {:?}", other),
    }
    let message = format!("{}", err);
    assert!(message.contains("25") && message.contains("20"), "{}", message);
}

#[test]
fn test_riccati_reference_solution_reproducible() {
    let good = RegimeCoefficients::new(0.3, 0.1);
    let bad = RegimeCoefficients::new(1.949, -0.95);
    let noise = NoiseConfig {
        process_variance: 0.1,
        observation_variance: 0.1,
    };

    let first = steady_state_mse(&good, &bad, &noise).unwrap();
    let second = steady_state_mse(&good, &bad, &noise).unwrap();
    assert_approx_eq!(first.prediction_good, second.prediction_good, 1e-14);
    assert_approx_eq!(first.estimate_good, second.estimate_good, 1e-14);
    assert_approx_eq!(first.prediction_bad, second.prediction_bad, 1e-14);
    assert_approx_eq!(first.estimate_bad, second.estimate_bad, 1e-14);

    // Estimation refines prediction, and the near-oscillatory regime is
    // strictly harder than the benign one.
    assert!(first.estimate_good < first.prediction_good);
    assert!(first.estimate_bad < first.prediction_bad);
    assert!(first.prediction_bad > first.prediction_good);
    // Prediction error cannot drop below the injected process noise.
    assert!(first.prediction_good >= 0.1);
}

#[test]
fn test_full_batched_pipeline() {
    let config = DatasetConfig {
        sequence_length: 20,
        num_sequences: 100,
        batch_size: 20,
        good: RegimeCoefficients::new(0.3, 0.1),
        bad: RegimeCoefficients::new(1.949, -0.95),
        transition: TransitionProbabilities {
            good_to_bad: 0.0005,
            bad_to_good: 0.0005,
        },
        noise: NoiseConfig {
            process_variance: 0.1,
            observation_variance: 0.1,
        },
        seed: Some(100),
    };

    let dataset = generate_batched_dataset(&config).unwrap();
    // 100 windows over a 119-step trajectory, in 5 batches of 20
    assert_eq!(dataset.windowed.trajectory.states.len(), 120);
    assert_eq!(dataset.windowed.windows.num_windows(), 100);
    assert_eq!(dataset.batches.states.dim(), (20, 4, 5));
    assert_eq!(dataset.batches.observations.dim(), (20, 2, 20, 5));

    // Batch (i, b) must hold flat sample i*20 + b
    for batch in 0..5 {
        for element in 0..20 {
            let sample = batch * 20 + element;
            for channel in 0..4 {
                assert_eq!(
                    dataset.batches.states[[element, channel, batch]],
                    dataset.windowed.windows.final_states[[channel, sample]]
                );
            }
        }
    }
}

#[test]
fn test_archive_round_trip_of_metadata() {
    let config = DatasetConfig {
        sequence_length: 10,
        num_sequences: 30,
        batch_size: 10,
        seed: Some(2024),
        ..Default::default()
    };
    let dataset = generate_windowed_dataset(&config).unwrap();
    let archive = DatasetArchive::from_channel_dataset(&dataset, &config);

    assert!(!archive.is_empty());
    match archive.get("seed") {
        Some(ArchiveValue::Integer(seed)) => assert_eq!(*seed, 2024),
        other => panic!("unexpected seed entry: {:?}", other),
    }
    match archive.get("observedStates") {
        Some(ArchiveValue::Tensor(t)) => assert_eq!(t.dim(), (2, 10, 30)),
        other => panic!("unexpected observedStates entry: {:?}", other),
    }
    match archive.get("riccatiConvergences") {
        Some(ArchiveValue::Matrix(m)) => {
            assert_eq!(m.dim(), (2, 2));
            assert_approx_eq!(m[[0, 0]], dataset.riccati.prediction_good, 1e-15);
        }
        other => panic!("unexpected riccatiConvergences entry: {:?}", other),
    }
}

#[test]
fn test_sticky_chain_rarely_switches() {
    // With switch probability 5e-4 over 2000 steps, regime changes are rare;
    // the chain must not flap.
    let config = reference_config(2000, 8);
    let sequence = generate_gilbert_elliot(&config).unwrap();
    let switches = sequence
        .regime_path
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .count();
    assert!(switches < 10, "sticky chain switched {} times", switches);
}
