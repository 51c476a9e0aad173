//! Two-state Markov chain driving the regime switches.
//!
//! The chain lives in the closed state space {good, bad}. Using an enum makes
//! the "outside the defined states" failure mode unrepresentable, so the step
//! function is total: every run initializes one [`Regime`] value, advances it
//! once per tick, and drops it at the end of the run.

use crate::config::TransitionProbabilities;
use crate::rng::SimRng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Channel regime selected by the Markov chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Regime {
    /// Low-distortion regime ("good" state of the Gilbert-Elliot model).
    Good,
    /// High-distortion regime ("bad" state).
    Bad,
}

/// Initial-state policy for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StartPolicy {
    /// Start in the good regime.
    Good,
    /// Start in the bad regime.
    Bad,
    /// Draw the starting regime uniformly.
    Random,
}

impl Default for StartPolicy {
    fn default() -> Self {
        StartPolicy::Good
    }
}

impl Regime {
    /// Draw the initial regime for a run according to the start policy.
    pub fn initial(policy: StartPolicy, rng: &mut SimRng) -> Regime {
        match policy {
            StartPolicy::Good => Regime::Good,
            StartPolicy::Bad => Regime::Bad,
            StartPolicy::Random => {
                if rng.f64() < 0.5 {
                    Regime::Good
                } else {
                    Regime::Bad
                }
            }
        }
    }

    /// Advance the chain one tick.
    ///
    /// From good the chain switches to bad with probability
    /// `transition.good_to_bad` and stays otherwise; symmetric from bad. The
    /// configured values are switch probabilities, so a value near zero gives
    /// a sticky chain.
    pub fn step(self, transition: &TransitionProbabilities, rng: &mut SimRng) -> Regime {
        let switch_probability = match self {
            Regime::Good => transition.good_to_bad,
            Regime::Bad => transition.bad_to_good,
        };
        if rng.bernoulli(switch_probability) {
            self.other()
        } else {
            self
        }
    }

    /// The opposite regime.
    pub fn other(self) -> Regime {
        match self {
            Regime::Good => Regime::Bad,
            Regime::Bad => Regime::Good,
        }
    }
}
