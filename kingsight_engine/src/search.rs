//! Time-indexed beam search over the HMM lattice.
//!
//! The engine keeps one [`Beam`] per observed timestep. Advancing extends
//! every retained hypothesis by its self-loop and every legal move, scores
//! the children against the frame's observation and keeps the `breadth`
//! cheapest. Committing freezes the best trajectory's prefix: beams up to
//! the bound timestep collapse to singletons and later beams are filtered
//! down to descendants of the survivors, so a bound decision can never be
//! reversed.

use std::collections::HashSet;

use kingsight_core::board::{Board, FenParseError, Move};
use kingsight_core::game_tree::GameArena;
use thiserror::Error;
use tracing::{debug, trace};

use crate::beam::Beam;
use crate::lattice::{HmmArena, HmmNodeId};
use crate::observation::Observation;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// `advance` accepts only the frontier timestep (re-observe) or the one
    /// past it; `commit` only timesteps in `(top_bind_t, top_t]`.
    #[error("timestep {timestep} is invalid (frontier {top_t}, bound up to {top_bind_t})")]
    InvalidTimestep {
        timestep: usize,
        top_t: usize,
        top_bind_t: usize,
    },
    /// No hypothesis survived pruning; the observations are incompatible
    /// with every position reachable from the root. Fatal.
    #[error("beam at timestep {0} is empty")]
    BeamEmpty(usize),
}

pub struct InferenceEngine {
    games: GameArena,
    hmm: HmmArena,
    beams: Vec<Beam>,
    breadth: usize,
    top_bind_t: usize,
}

impl InferenceEngine {
    /// Creates an engine rooted at the given position.
    pub fn new(breadth: usize, root: Board) -> Self {
        let mut games = GameArena::new();
        let root_game = games.root(root);
        let mut hmm = HmmArena::new();
        let root_node = hmm.root(root_game);

        let mut first_beam = Beam::new();
        first_beam.insert(0.0, root_node);

        Self {
            games,
            hmm,
            beams: vec![first_beam],
            breadth,
            top_bind_t: 0,
        }
    }

    pub fn from_fen(breadth: usize, fen: &str) -> Result<Self, FenParseError> {
        Ok(Self::new(breadth, Board::parse_fen(fen)?))
    }

    /// Index of the newest observed timestep.
    pub fn top_t(&self) -> usize {
        self.beams.len() - 1
    }

    /// Newest timestep whose history has been frozen.
    pub fn top_bind_t(&self) -> usize {
        self.top_bind_t
    }

    pub fn breadth(&self) -> usize {
        self.breadth
    }

    pub fn games(&self) -> &GameArena {
        &self.games
    }

    pub fn hmm(&self) -> &HmmArena {
        &self.hmm
    }

    /// The cheapest hypothesis on the frontier.
    pub fn best(&self) -> Option<HmmNodeId> {
        self.beams[self.top_t()].best()
    }

    pub fn beam_len(&self, timestep: usize) -> usize {
        self.beams[timestep].len()
    }

    pub fn beam_nodes(&self, timestep: usize) -> Vec<HmmNodeId> {
        self.beams[timestep].nodes().collect()
    }

    /// Folds one frame's observation into the lattice.
    ///
    /// `timestep` must be either `top_t()` (replacing that frame's
    /// observation) or `top_t() + 1` (extending the lattice); timestep 0
    /// belongs to the root and carries no observation.
    pub fn advance(
        &mut self,
        timestep: usize,
        observation: &Observation,
    ) -> Result<(), SearchError> {
        let top = self.top_t();
        if timestep == 0 || (timestep != top && timestep != top + 1) {
            return Err(SearchError::InvalidTimestep {
                timestep,
                top_t: top,
                top_bind_t: self.top_bind_t,
            });
        }

        if timestep == top {
            self.beams[timestep].clear();
        } else {
            self.beams.push(Beam::new());
        }

        let parents: Vec<HmmNodeId> = self.beams[timestep - 1].nodes().collect();
        for parent in parents {
            let children: Vec<HmmNodeId> =
                self.hmm.children(parent, &mut self.games).to_vec();

            for child in children {
                let cost = self.hmm.score(child, &self.games, observation);
                self.beams[timestep].insert(cost, child);
            }
        }

        self.beams[timestep].truncate(self.breadth);

        if self.beams[timestep].is_empty() {
            return Err(SearchError::BeamEmpty(timestep));
        }

        trace!(
            timestep,
            beam = self.beams[timestep].len(),
            nodes = self.hmm.len(),
            "advanced beam"
        );
        Ok(())
    }

    /// Freezes the best trajectory up to and including `timestep`.
    ///
    /// Beams at and before `timestep` collapse to the best frontier node's
    /// ancestors; beams after it retain only nodes whose parent survived.
    /// `top_bind_t` is monotone: re-binding an already-bound timestep is an
    /// error.
    pub fn commit(&mut self, timestep: usize) -> Result<(), SearchError> {
        let top = self.top_t();
        if timestep <= self.top_bind_t || timestep > top {
            return Err(SearchError::InvalidTimestep {
                timestep,
                top_t: top,
                top_bind_t: self.top_bind_t,
            });
        }

        let best = self.beams[top].best().ok_or(SearchError::BeamEmpty(top))?;

        let mut node = Some(best);
        while let Some(id) = node {
            let t = self.hmm.timestep(id);
            if t <= timestep {
                self.beams[t].collapse_to(self.hmm.cost(id), id);
            }
            node = self.hmm.parent(id);
        }

        for t in timestep + 1..=top {
            let survivors: HashSet<HmmNodeId> = self.beams[t - 1].nodes().collect();
            self.beams[t]
                .retain(|id| self.hmm.parent(id).is_some_and(|p| survivors.contains(&p)));
        }

        self.top_bind_t = timestep;
        debug!(timestep, "bound trajectory prefix");
        Ok(())
    }

    /// Boards along the best trajectory, oldest first, one per timestep up
    /// to `top_bind_t` (or the frontier with `include_uncommitted`).
    ///
    /// Self-loop duplicates are preserved; de-duplication is left to the
    /// caller serialising FENs.
    pub fn history(&self, include_uncommitted: bool) -> Vec<Board> {
        let limit = if include_uncommitted {
            self.top_t()
        } else {
            self.top_bind_t
        };

        let mut boards = Vec::new();
        let mut node = self.best();
        while let Some(id) = node {
            if self.hmm.timestep(id) <= limit {
                boards.push(self.games.board(self.hmm.game(id)).clone());
            }
            node = self.hmm.parent(id);
        }

        boards.reverse();
        boards
    }

    /// The move played into the best node at `timestep` along the best
    /// trajectory, or `None` for the root and for self-loops.
    pub fn move_at(&self, timestep: usize) -> Option<Move> {
        let mut node = self.best()?;
        while self.hmm.timestep(node) > timestep {
            node = self.hmm.parent(node)?;
        }

        if self.hmm.is_self_loop(node) {
            return None;
        }
        self.games.incoming_move(self.hmm.game(node))
    }
}
