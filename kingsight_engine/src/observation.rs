//! Per-frame board observations.
//!
//! The piece classifier emits an 8x8x13 tensor per frame: for every square,
//! one value per cell label. Internally the engine works on negative
//! log-probabilities ("costs", lower = more likely), with the element for
//! rank `r`, file `f`, label `k` at flat index `r * 104 + f * 13 + k`.

use kingsight_core::board::LABEL_COUNT;
use thiserror::Error;

/// Flattened length of an observation tensor: 8 ranks x 8 files x 13 labels.
pub const TENSOR_LEN: usize = 8 * 8 * LABEL_COUNT;

/// Probabilities are floored before the log transform so that a confident
/// zero still maps to a finite cost (about 16.1 nats).
pub const PROB_FLOOR: f32 = 1e-7;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationError {
    #[error("observation tensor must have {TENSOR_LEN} elements, got {0}")]
    Shape(usize),
}

/// A single frame's observation, stored as per-label costs.
#[derive(Clone)]
pub struct Observation {
    costs: Box<[f32; TENSOR_LEN]>,
}

impl Observation {
    /// Wraps a tensor that already holds negative log-probabilities.
    pub fn from_costs(values: &[f32]) -> Result<Self, ObservationError> {
        let costs: Box<[f32; TENSOR_LEN]> = values
            .to_vec()
            .into_boxed_slice()
            .try_into()
            .map_err(|_| ObservationError::Shape(values.len()))?;

        Ok(Self { costs })
    }

    /// Wraps a raw probability tensor, applying `x -> -ln(x + 1e-7)`
    /// element-wise.
    pub fn from_probabilities(values: &[f32]) -> Result<Self, ObservationError> {
        let mut observation = Self::from_costs(values)?;
        for value in observation.costs.iter_mut() {
            *value = -(*value + PROB_FLOOR).ln();
        }
        Ok(observation)
    }

    /// Cost of seeing `label` on the square at `rank`/`file`.
    pub fn cost(&self, rank: u8, file: u8, label: usize) -> f32 {
        self.costs[flat_index(rank, file, label)]
    }

    /// The cheapest (most likely) label observed on a square. The lowest
    /// channel index wins ties.
    pub fn observed_label(&self, rank: u8, file: u8) -> usize {
        let base = flat_index(rank, file, 0);
        let square = &self.costs[base..base + LABEL_COUNT];

        let mut best = 0;
        for (label, &cost) in square.iter().enumerate() {
            if cost < square[best] {
                best = label;
            }
        }
        best
    }
}

const fn flat_index(rank: u8, file: u8, label: usize) -> usize {
    rank as usize * (8 * LABEL_COUNT) + file as usize * LABEL_COUNT + label
}
