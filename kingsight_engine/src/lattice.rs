//! The HMM lattice over the game tree.
//!
//! Every hypothesis "the game was in position P at frame t" is an
//! arena-allocated node wrapping a game-tree node. Child lists are computed
//! at most once: a self-loop child first (nothing moved this frame), then
//! one child per legal successor position. Parent links never form cycles
//! because the timestep strictly increases along every edge.

use kingsight_core::game_tree::{GameArena, GameNodeId};

use crate::observation::Observation;

/// Cost, in nats, of hypothesising that a move happened this frame rather
/// than nothing. Observation evidence must overcome this to advance the
/// game.
pub const MOVE_TRANSITION_PENALTY: f64 = 20.0;

/// Stable handle to a node in an [`HmmArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HmmNodeId(u32);

impl HmmNodeId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

struct HmmNode {
    game: GameNodeId,
    parent: Option<HmmNodeId>,
    timestep: usize,
    /// Accumulated negative log-probability of the trajectory ending here.
    cost: f64,
    /// Whether the incoming transition kept the same game-tree node.
    is_self_loop: bool,
    children: Option<Box<[HmmNodeId]>>,
}

/// Owns every lattice node created during a session.
#[derive(Default)]
pub struct HmmArena {
    nodes: Vec<HmmNode>,
}

impl HmmArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a root node at timestep 0 with zero accumulated cost.
    pub fn root(&mut self, game: GameNodeId) -> HmmNodeId {
        self.push(game, None, 0, false)
    }

    fn push(
        &mut self,
        game: GameNodeId,
        parent: Option<HmmNodeId>,
        timestep: usize,
        is_self_loop: bool,
    ) -> HmmNodeId {
        let id = HmmNodeId(self.nodes.len() as u32);
        self.nodes.push(HmmNode {
            game,
            parent,
            timestep,
            cost: 0.0,
            is_self_loop,
            children: None,
        });
        id
    }

    pub fn game(&self, id: HmmNodeId) -> GameNodeId {
        self.nodes[id.index()].game
    }

    pub fn parent(&self, id: HmmNodeId) -> Option<HmmNodeId> {
        self.nodes[id.index()].parent
    }

    pub fn timestep(&self, id: HmmNodeId) -> usize {
        self.nodes[id.index()].timestep
    }

    pub fn cost(&self, id: HmmNodeId) -> f64 {
        self.nodes[id.index()].cost
    }

    pub fn is_self_loop(&self, id: HmmNodeId) -> bool {
        self.nodes[id.index()].is_self_loop
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node's children, computing them on the first call: the
    /// self-loop first, then one child per legal successor of the underlying
    /// position. Count and order are fixed thereafter.
    pub fn children(&mut self, id: HmmNodeId, games: &mut GameArena) -> &[HmmNodeId] {
        if self.nodes[id.index()].children.is_none() {
            let game = self.nodes[id.index()].game;
            let timestep = self.nodes[id.index()].timestep;

            let successors: Vec<GameNodeId> =
                games.expand(game).iter().map(|&(_, child)| child).collect();

            let mut children = Vec::with_capacity(successors.len() + 1);
            children.push(self.push(game, Some(id), timestep + 1, true));
            for successor in successors {
                children.push(self.push(successor, Some(id), timestep + 1, false));
            }

            self.nodes[id.index()].children = Some(children.into_boxed_slice());
        }

        self.nodes[id.index()]
            .children
            .as_deref()
            .expect("children just computed")
    }

    /// Scores a node against an observation and stores the accumulated cost.
    ///
    /// The cost is the sum of:
    /// * the observation term: the cost of this position's label on every
    ///   square;
    /// * the disagreement term: the same cost again on every square whose
    ///   label differs from the parent position or from the square's most
    ///   likely observed label;
    /// * the transition term: `ln` of the parent's child count, plus
    ///   [`MOVE_TRANSITION_PENALTY`] unless this is a self-loop;
    /// * the parent's accumulated cost.
    pub fn score(&mut self, id: HmmNodeId, games: &GameArena, observation: &Observation) -> f64 {
        let node = &self.nodes[id.index()];
        let parent_id = node
            .parent
            .expect("the root carries no observation and is never scored");
        let parent = &self.nodes[parent_id.index()];

        let board = games.board(node.game);
        let parent_board = games.board(parent.game);

        let mut cost = 0.0f64;
        for rank in 0..8u8 {
            for file in 0..8u8 {
                let label = board.label_at(rank, file);
                let label_cost = observation.cost(rank, file, label) as f64;

                cost += label_cost;
                if label != parent_board.label_at(rank, file)
                    || label != observation.observed_label(rank, file)
                {
                    cost += label_cost;
                }
            }
        }

        let siblings = parent
            .children
            .as_ref()
            .expect("scored nodes come from a computed child list")
            .len();
        cost += (siblings as f64).ln();
        if !node.is_self_loop {
            cost += MOVE_TRANSITION_PENALTY;
        }

        cost += parent.cost;

        self.nodes[id.index()].cost = cost;
        cost
    }
}
