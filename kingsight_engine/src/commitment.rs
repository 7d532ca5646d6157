//! Time-delayed commitment.
//!
//! Commitment is purely wall-clock-triggered: an observation's decision is
//! frozen only once it is old enough that forthcoming evidence can no longer
//! plausibly overturn it. Frames may arrive at any rate, including bursts
//! after an occlusion, so ages are measured from each frame's own arrival
//! instant rather than from frame counts.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::search::InferenceEngine;

/// Source of monotonic time-points. The production implementation is
/// [`SystemClock`]; tests substitute a scripted clock.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Maps observation timesteps to their arrival instants and triggers
/// [`InferenceEngine::commit`] once they age past the configured delay.
#[derive(Debug)]
pub struct CommitmentController {
    delay: Duration,
    timestamps: BTreeMap<usize, Instant>,
}

impl CommitmentController {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timestamps: BTreeMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records the arrival instant of the observation at `timestep`.
    pub fn observed(&mut self, timestep: usize, at: Instant) {
        self.timestamps.insert(timestep, at);
    }

    /// Commits the newest sufficiently old timestep, if any.
    ///
    /// Only timesteps strictly between the engine's bound and its frontier
    /// are considered; the frontier itself is never committed because its
    /// decision may still be overturned. A failed commit is reported as "did
    /// not commit" and retried on the next poll.
    pub fn poll(&mut self, now: Instant, engine: &mut InferenceEngine) -> bool {
        let lower = engine.top_bind_t() + 1;
        let upper = engine.top_t();
        if lower >= upper {
            return false;
        }

        let mut bind_at = None;
        for (&timestep, &stamp) in self.timestamps.range(lower..upper) {
            if now.saturating_duration_since(stamp) >= self.delay {
                bind_at = Some(timestep);
            }
        }

        let Some(timestep) = bind_at else {
            return false;
        };

        match engine.commit(timestep) {
            Ok(()) => {
                debug!(timestep, "commitment delay elapsed, bound");
                self.timestamps = self.timestamps.split_off(&(timestep + 1));
                true
            }
            Err(err) => {
                warn!(timestep, %err, "did not commit this tick");
                false
            }
        }
    }
}
