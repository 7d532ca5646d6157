//! Chess data model, rule engine and game-tree arena for the board-tracking
//! pipeline.
//!
//! The [`board`] module holds the position value type and the 13-label cell
//! encoding shared with the piece-classifier output; [`move_gen`] enumerates
//! legal successor positions; [`game_tree`] lazily materialises them as an
//! arena-backed tree for the inference layer to search over.

pub mod board;
pub mod game_tree;
pub mod move_gen;
pub mod perft;
