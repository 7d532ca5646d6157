//! Arena-backed game tree.
//!
//! Positions reachable during inference are materialised as nodes of a tree
//! whose edges are legal moves. Nodes live in an append-only arena and are
//! addressed by stable integer handles, so parent links never dangle and the
//! whole tree is dropped with the arena. A node's children are computed at
//! most once and cached.

use std::fmt::Debug;

use crate::board::{Board, FenParseError, InvalidMove, Move};

/// Stable handle to a node in a [`GameArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameNodeId(u32);

impl GameNodeId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

struct GameNode {
    board: Board,
    parent: Option<GameNodeId>,
    /// `None` until the node is first expanded; the move keys are sorted.
    children: Option<Box<[(Move, GameNodeId)]>>,
}

/// Owns every [`Board`] materialised for a session.
#[derive(Default)]
pub struct GameArena {
    nodes: Vec<GameNode>,
}

impl GameArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new root node from a FEN string.
    pub fn root_from_fen(&mut self, fen: &str) -> Result<GameNodeId, FenParseError> {
        Ok(self.root(Board::parse_fen(fen)?))
    }

    /// Creates a new root node holding the given position.
    pub fn root(&mut self, board: Board) -> GameNodeId {
        self.push(board, None)
    }

    fn push(&mut self, board: Board, parent: Option<GameNodeId>) -> GameNodeId {
        let id = GameNodeId(self.nodes.len() as u32);
        self.nodes.push(GameNode {
            board,
            parent,
            children: None,
        });
        id
    }

    /// Returns the position held by a node.
    pub fn board(&self, id: GameNodeId) -> &Board {
        &self.nodes[id.index()].board
    }

    /// Returns the parent of a node, or `None` for roots.
    pub fn parent(&self, id: GameNodeId) -> Option<GameNodeId> {
        self.nodes[id.index()].parent
    }

    /// Number of nodes allocated so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Expands a node, computing its legal children on the first call and
    /// returning the cached move-sorted slice on every later one.
    pub fn expand(&mut self, id: GameNodeId) -> &[(Move, GameNodeId)] {
        if self.nodes[id.index()].children.is_none() {
            let children_map = self.nodes[id.index()].board.legal_children();

            let children: Vec<(Move, GameNodeId)> = children_map
                .into_iter()
                .map(|(mv, board)| (mv, self.push(board, Some(id))))
                .collect();

            self.nodes[id.index()].children = Some(children.into_boxed_slice());
        }

        self.nodes[id.index()]
            .children
            .as_deref()
            .expect("children just computed")
    }

    /// Returns the cached children of a node, or `None` if it has not been
    /// expanded yet.
    pub fn children(&self, id: GameNodeId) -> Option<&[(Move, GameNodeId)]> {
        self.nodes[id.index()].children.as_deref()
    }

    /// Follows the edge for `mv` out of `id`, expanding the node if
    /// necessary.
    pub fn child(&mut self, id: GameNodeId, mv: Move) -> Result<GameNodeId, InvalidMove> {
        self.expand(id)
            .binary_search_by_key(&mv, |&(m, _)| m)
            .map(|i| self.children(id).unwrap()[i].1)
            .map_err(|_| InvalidMove(mv))
    }

    /// The move leading from this node's parent to it, recovered from the
    /// parent's child list.
    pub fn incoming_move(&self, id: GameNodeId) -> Option<Move> {
        let parent = self.parent(id)?;
        self.children(parent)?
            .iter()
            .find(|&&(_, child)| child == id)
            .map(|&(mv, _)| mv)
    }

    /// Whether the node's side to move is checkmated. Expands the node.
    pub fn is_checkmate(&mut self, id: GameNodeId) -> bool {
        let no_children = self.expand(id).is_empty();
        no_children && self.board(id).in_check()
    }

    /// Whether the node's side to move is stalemated. Expands the node.
    pub fn is_stalemate(&mut self, id: GameNodeId) -> bool {
        let no_children = self.expand(id).is_empty();
        no_children && !self.board(id).in_check()
    }
}

impl Debug for GameArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameArena")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::{Square, STARTING_POSITION_FEN};
    use pretty_assertions::assert_eq;

    #[test]
    fn expansion_is_computed_once() {
        let mut arena = GameArena::new();
        let root = arena.root_from_fen(STARTING_POSITION_FEN).unwrap();

        let first: Vec<_> = arena.expand(root).to_vec();
        let allocated = arena.len();
        let second: Vec<_> = arena.expand(root).to_vec();

        assert_eq!(first, second);
        assert_eq!(arena.len(), allocated);
        assert_eq!(first.len(), 20);
    }

    #[test]
    fn child_follows_move_edges() {
        let mut arena = GameArena::new();
        let root = arena.root(Board::starting_position());

        let e4 = arena.child(root, "e2e4".parse().unwrap()).unwrap();
        assert_eq!(arena.parent(e4), Some(root));
        assert_eq!(
            arena.board(e4).get_piece(Square::E4),
            Some(crate::board::Piece::WHITE_PAWN)
        );

        assert!(arena.child(root, "e2e5".parse().unwrap()).is_err());
    }

    #[test]
    fn incoming_move_round_trips() {
        let mut arena = GameArena::new();
        let root = arena.root(Board::starting_position());

        let mv: Move = "g1f3".parse().unwrap();
        let child = arena.child(root, mv).unwrap();
        assert_eq!(arena.incoming_move(child), Some(mv));
        assert_eq!(arena.incoming_move(root), None);
    }

    #[test]
    fn terminal_positions() {
        let mut arena = GameArena::new();

        let mate = arena.root_from_fen("R5k1/5ppp/8/8/8/8/8/K7 b - -").unwrap();
        assert!(arena.is_checkmate(mate));
        assert!(!arena.is_stalemate(mate));

        let stale = arena.root_from_fen("k7/8/1Q6/8/8/8/8/K7 b - -").unwrap();
        assert!(arena.is_stalemate(stale));
        assert!(!arena.is_checkmate(stale));
    }
}
