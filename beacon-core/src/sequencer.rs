//! Duplicate suppression driven by the broadcaster's rolling counter.
//!
//! A board keeps advertising the same frame until it has a new reading, so a
//! scanner sees each reading many times. The counter in the low byte of
//! `major` changes whenever the reading does; a counter equal to the last
//! accepted one is a repeat. Only inequality matters: `255 -> 0` is a new
//! reading like any other change.

use serde::{Deserialize, Serialize};

/// Verdict for one observed counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Observation {
    Accepted,
    Duplicate,
}

/// Last accepted counter of one tracked broadcaster.
///
/// The value is threaded through [`SequencerState::observe`] by whoever owns
/// the scan session. Starting a new session means starting again from
/// [`SequencerState::Unseen`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    /// Nothing accepted yet; the next reading is always new.
    #[default]
    Unseen,
    Tracking { last: u8 },
}

impl SequencerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(self, counter: u8) -> (Self, Observation) {
        match self {
            SequencerState::Tracking { last } if last == counter => (self, Observation::Duplicate),
            _ => (
                SequencerState::Tracking { last: counter },
                Observation::Accepted,
            ),
        }
    }

    pub fn last_counter(&self) -> Option<u8> {
        match self {
            SequencerState::Unseen => None,
            SequencerState::Tracking { last } => Some(*last),
        }
    }
}
