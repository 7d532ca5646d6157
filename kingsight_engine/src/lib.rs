//! Temporal game-state inference over per-frame board observations.
//!
//! A hidden-Markov beam search couples the rule engine in `kingsight_core`
//! to noisy per-square piece classifications: every frame either extends
//! each retained hypothesis by a legal move or keeps it in place via a
//! self-loop, and a wall-clock delay decides when the past becomes
//! irrevocable.

use std::time::Duration;

use kingsight_core::board::{Board, FenParseError, STARTING_POSITION_FEN};
use thiserror::Error;

pub mod beam;
pub mod commitment;
pub mod lattice;
pub mod observation;
pub mod orientation;
pub mod search;

use commitment::{Clock, CommitmentController, SystemClock};
use observation::ObservationError;
use orientation::OrientationResolver;
use search::{InferenceEngine, SearchError};

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum number of hypotheses retained per timestep.
    pub breadth: usize,
    /// Wall-clock age an observation must reach before its decision is
    /// frozen.
    pub delay: Duration,
    /// FEN of the position the game starts from.
    pub start_fen: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            breadth: 50,
            delay: Duration::from_secs(120),
            start_fen: STARTING_POSITION_FEN.to_owned(),
        }
    }
}

#[derive(Error, Debug)]
pub enum TrackError {
    #[error(transparent)]
    Observation(#[from] ObservationError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// End-to-end tracker: orientation resolution, beam search and delayed
/// commitment behind a single per-frame entry point.
pub struct Tracker<C = SystemClock> {
    resolver: OrientationResolver,
    engine: InferenceEngine,
    controller: CommitmentController,
    clock: C,
    next_timestep: usize,
}

impl Tracker<SystemClock> {
    pub fn new(config: TrackerConfig) -> Result<Self, FenParseError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Tracker<C> {
    pub fn with_clock(config: TrackerConfig, clock: C) -> Result<Self, FenParseError> {
        Ok(Self {
            resolver: OrientationResolver::new(),
            engine: InferenceEngine::from_fen(config.breadth, &config.start_fen)?,
            controller: CommitmentController::new(config.delay),
            clock,
            next_timestep: 1,
        })
    }

    /// Folds one raw camera-orientation probability frame into the search.
    pub fn observe(&mut self, frame: &[f32]) -> Result<(), TrackError> {
        let observation = self.resolver.prepare(frame)?;
        let timestep = self.next_timestep;

        self.engine.advance(timestep, &observation)?;
        self.controller.observed(timestep, self.clock.now());
        self.next_timestep = timestep + 1;
        Ok(())
    }

    /// Commits any observation old enough per the configured delay. Returns
    /// whether a commitment happened.
    pub fn poll(&mut self) -> bool {
        self.controller.poll(self.clock.now(), &mut self.engine)
    }

    /// Binds the remaining frontier, e.g. on shutdown. Returns whether
    /// anything new was bound.
    pub fn finish(&mut self) -> bool {
        let top = self.engine.top_t();
        top > self.engine.top_bind_t() && self.engine.commit(top).is_ok()
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Boards along the committed trajectory, oldest first, self-loop
    /// duplicates included.
    pub fn committed_history(&self) -> Vec<Board> {
        self.engine.history(false)
    }

    /// Like [`Self::committed_history`] but extended with the uncommitted
    /// frontier.
    pub fn full_history(&self) -> Vec<Board> {
        self.engine.history(true)
    }

    /// FENs of the committed trajectory with consecutive self-loop
    /// duplicates collapsed.
    pub fn committed_fens(&self) -> Vec<String> {
        dedup_consecutive(self.committed_history().iter().map(Board::fen))
    }
}

/// Collapses runs of equal FENs produced by self-loop frames.
pub fn dedup_consecutive(fens: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for fen in fens {
        if out.last() != Some(&fen) {
            out.push(fen);
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::observation::TENSOR_LEN;
    use kingsight_core::board::LABEL_COUNT;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::time::Instant;

    /// Scripted clock whose time only moves when the test says so.
    struct ScriptedClock {
        base: Instant,
        offset: Cell<Duration>,
    }

    impl ScriptedClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Cell::new(Duration::ZERO),
            }
        }

        fn set(&self, offset: Duration) {
            self.offset.set(offset);
        }
    }

    impl Clock for &ScriptedClock {
        fn now(&self) -> Instant {
            self.base + self.offset.get()
        }
    }

    /// Upright camera frame (white at the image bottom) showing `board`.
    fn frame_of(board: &Board) -> Vec<f32> {
        let mut frame = vec![0.0f32; TENSOR_LEN];
        for rank in 0..8u8 {
            for file in 0..8u8 {
                let row = 7 - rank as usize;
                let label = board.label_at(rank, file);
                frame[(row * 8 + file as usize) * LABEL_COUNT + label] = 1.0;
            }
        }
        frame
    }

    fn config(delay: Duration) -> TrackerConfig {
        TrackerConfig {
            breadth: 30,
            delay,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn tracks_a_short_game_end_to_end() {
        let clock = ScriptedClock::new();
        let mut tracker = Tracker::with_clock(config(Duration::ZERO), &clock).unwrap();

        let mut position = Board::starting_position();
        let mut frames = vec![frame_of(&position)];
        for mv in ["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"] {
            position = position.apply(mv.parse().unwrap()).unwrap();
            frames.push(frame_of(&position));
        }

        for (i, frame) in frames.iter().enumerate() {
            clock.set(Duration::from_millis(200 * i as u64));
            tracker.observe(frame).unwrap();
            tracker.poll();
        }
        tracker.finish();

        let fens = tracker.committed_fens();
        assert_eq!(fens.len(), 8);
        assert_eq!(
            fens.last().unwrap().split_whitespace().next().unwrap(),
            "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNBQK1NR"
        );
    }

    #[test]
    fn delay_gates_commitment() {
        let clock = ScriptedClock::new();
        let mut tracker =
            Tracker::with_clock(config(Duration::from_secs(2)), &clock).unwrap();

        let frame = frame_of(&Board::starting_position());

        // Four observations at t = 0, 0.5, 1.0, 1.5 seconds.
        for i in 0..4u64 {
            clock.set(Duration::from_millis(500 * i));
            tracker.observe(&frame).unwrap();
            tracker.poll();
        }
        assert_eq!(tracker.engine().top_bind_t(), 0);

        clock.set(Duration::from_secs(2));
        tracker.observe(&frame).unwrap();
        assert!(tracker.poll());
        assert!(tracker.engine().top_bind_t() >= 1);
    }

    #[test]
    fn dedup_collapses_self_loop_runs() {
        let fens = ["a", "a", "b", "b", "b", "a"]
            .iter()
            .map(|s| s.to_string());
        assert_eq!(dedup_consecutive(fens), vec!["a", "b", "a"]);
    }

    #[test]
    fn occluded_stretch_keeps_the_position_stable() {
        let clock = ScriptedClock::new();
        let mut tracker = Tracker::with_clock(config(Duration::ZERO), &clock).unwrap();

        let frame = frame_of(&Board::starting_position());
        for i in 0..5u64 {
            clock.set(Duration::from_secs(i));
            tracker.observe(&frame).unwrap();
            tracker.poll();
        }
        tracker.finish();

        let fens = tracker.committed_fens();
        assert_eq!(fens.len(), 1);
        assert_eq!(
            fens[0].split_whitespace().next().unwrap(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"
        );
    }
}
