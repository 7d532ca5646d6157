//! Board orientation relative to the camera.
//!
//! The rule engine expects rank 0 to be white's back rank, but the camera may
//! see the board from any of four sides. The resolver inspects the first
//! frame: it takes the argmax label of every square and counts white pieces
//! in each half of the grid; the half with the strongest white surplus tells
//! us which image edge white sits on. That fixes a number of 90-degree
//! counter-clockwise quarter turns which, followed by a vertical flip
//! (camera rows run top-down, ranks bottom-up), maps every subsequent frame
//! into rule-engine coordinates.

use kingsight_core::board::LABEL_COUNT;

use crate::observation::{Observation, ObservationError, TENSOR_LEN};

/// Which image edge white's pieces sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// White at the bottom of the image; no rotation needed.
    Bottom,
    /// White on the left; one counter-clockwise quarter turn.
    Left,
    /// White at the top; two quarter turns.
    Top,
    /// White on the right; three quarter turns.
    Right,
}

impl Orientation {
    /// Counter-clockwise quarter turns that bring white to the image bottom.
    pub const fn quarter_turns(self) -> usize {
        match self {
            Orientation::Bottom => 0,
            Orientation::Left => 1,
            Orientation::Top => 2,
            Orientation::Right => 3,
        }
    }
}

/// Detects the board orientation on the first frame and normalises every
/// frame into rule-engine coordinates.
#[derive(Debug, Default)]
pub struct OrientationResolver {
    orientation: Option<Orientation>,
}

impl OrientationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The orientation locked in by the first frame, if any.
    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    /// Rotates a raw probability frame into rule-engine coordinates and
    /// applies the negative-log transform.
    ///
    /// The first call resolves and stores the orientation; later calls reuse
    /// it.
    pub fn prepare(&mut self, frame: &[f32]) -> Result<Observation, ObservationError> {
        if frame.len() != TENSOR_LEN {
            return Err(ObservationError::Shape(frame.len()));
        }

        let orientation = *self
            .orientation
            .get_or_insert_with(|| resolve_orientation(frame));

        let rotated = rotate_frame(frame, orientation.quarter_turns());
        Observation::from_probabilities(&rotated)
    }
}

/// Argmax label of a square in a raw probability frame.
fn argmax_label(frame: &[f32], row: usize, col: usize) -> usize {
    let base = row * (8 * LABEL_COUNT) + col * LABEL_COUNT;
    let square = &frame[base..base + LABEL_COUNT];

    let mut best = 0;
    for (label, &p) in square.iter().enumerate() {
        if p > square[best] {
            best = label;
        }
    }
    best
}

fn resolve_orientation(frame: &[f32]) -> Orientation {
    let mut white_top = 0i32;
    let mut white_bottom = 0i32;
    let mut white_left = 0i32;
    let mut white_right = 0i32;

    for row in 0..8 {
        for col in 0..8 {
            // White piece labels occupy channels 0-5.
            if argmax_label(frame, row, col) < 6 {
                if row < 4 {
                    white_top += 1;
                } else {
                    white_bottom += 1;
                }
                if col < 4 {
                    white_left += 1;
                } else {
                    white_right += 1;
                }
            }
        }
    }

    let signatures = [
        (Orientation::Bottom, white_bottom - white_top),
        (Orientation::Left, white_left - white_right),
        (Orientation::Top, white_top - white_bottom),
        (Orientation::Right, white_right - white_left),
    ];

    // First entry wins ties, so an all-empty frame maps to Bottom.
    let mut best = signatures[0];
    for candidate in signatures {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }
    best.0
}

/// Applies `turns` counter-clockwise quarter turns followed by a vertical
/// flip, copying whole 13-label square vectors.
fn rotate_frame(frame: &[f32], turns: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; TENSOR_LEN];

    for rank in 0..8usize {
        for file in 0..8usize {
            // Undo the vertical flip, then the rotation, to find the source
            // cell in camera coordinates.
            let (row, col) = (7 - rank, file);
            let (src_row, src_col) = match turns {
                0 => (row, col),
                1 => (col, 7 - row),
                2 => (7 - row, 7 - col),
                3 => (7 - col, row),
                _ => unreachable!("quarter turns are taken modulo 4"),
            };

            let dst = (rank * 8 + file) * LABEL_COUNT;
            let src = (src_row * 8 + src_col) * LABEL_COUNT;
            out[dst..dst + LABEL_COUNT].copy_from_slice(&frame[src..src + LABEL_COUNT]);
        }
    }

    out
}
