use std::time::{Duration, Instant};

use clap::Parser;
use kingsight_core::{
    board::{Board, Move},
    game_tree::GameArena,
    perft::perft,
};

/// Perft tester for the move generator.
///
/// Counts the positions reachable from a starting position to check the
/// legal-children map against the well-known perft tables, and to measure
/// its performance.
#[derive(Parser, Debug)]
struct Args {
    /// Starting position of the board.
    ///
    /// Expects either the string "startpos" or a valid position in
    /// Forsyth-Edwards Notation (FEN). Additional alterations to the
    /// position can be specified via the --moves option.
    #[arg(short, long, default_value = "startpos", value_parser = parse_position)]
    position: Board,

    /// Additional moves to play before running perft.
    ///
    /// Moves consist of the starting square in algebraic notation followed
    /// by the ending square, plus an optional promotion kind as a lowercase
    /// FEN char, e.g. `d2d4`, `e7e8q`.
    #[arg(short, long, num_args(0..))]
    moves: Vec<Move>,

    /// Exact depth to search to.
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..), default_value_t = 5)]
    depth: u8,

    /// Run in divide mode.
    ///
    /// Lists each possible move in the starting position along with the
    /// number of nodes found under that move, which helps pin down the exact
    /// sequence of moves hiding a generation bug.
    #[arg(long)]
    divide: bool,
}

fn parse_position(s: &str) -> Result<Board, String> {
    if s == "startpos" {
        Ok(Board::starting_position())
    } else {
        Board::parse_fen(s).map_err(|e| {
            format!("Expected `startpos` or a valid FEN string. FEN parsing error: {e}")
        })
    }
}

fn generic_perft(board: Board, max_depth: usize) {
    let mut arena = GameArena::new();
    let root = arena.root(board);

    let mut total_time = Duration::ZERO;
    let mut last_depth_time = Duration::ZERO;
    let mut total_nodes = 0;

    for depth in 0..max_depth {
        let start_time = Instant::now();

        let nodes = perft(&mut arena, root, depth);

        let time_taken = start_time.elapsed();

        println!(
            "Depth: {depth}\tNodes: {nodes}\tTime taken: {:.3}s",
            time_taken.as_secs_f64()
        );

        total_time += time_taken;
        last_depth_time = time_taken;
        total_nodes += nodes;
    }

    println!();

    let nodes_per_second = total_nodes as f64 / last_depth_time.as_secs_f64();

    println!(
        "Total nodes: {total_nodes}\tTotal time: {:.3}s\tNodes per second: {:.3}",
        total_time.as_secs_f64(),
        nodes_per_second
    );
}

fn specific_perft(board: Board, depth: usize) {
    assert!(depth >= 1);

    let mut arena = GameArena::new();
    let root = arena.root(board);
    let children: Vec<(Move, _)> = arena.expand(root).to_vec();

    let mut total_nodes = 0;
    for (mv, child) in children {
        let nodes = perft(&mut arena, child, depth - 1);
        total_nodes += nodes;
        println!("{mv}: {nodes}");
    }

    println!();
    println!("Nodes searched: {total_nodes}");
}

fn main() -> Result<(), String> {
    let Args {
        position,
        moves,
        depth,
        divide,
    } = Args::parse();

    let mut board = position;
    for move_spec in moves {
        board = board.apply(move_spec).map_err(|_| {
            format!(
                "Move `{move_spec}` is invalid to play in this position ({})",
                board.fen()
            )
        })?;
    }

    if divide {
        specific_perft(board, depth as _)
    } else {
        generic_perft(board, depth as _);
    }

    Ok(())
}
