mod bits;
mod board;
mod deadlock;
mod error;
mod heuristic;
mod levels;
mod position;
mod search;
mod solver;
mod zobrist;

use std::fs::File;
use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use board::{Board, Push};
use levels::Levels;
use solver::Solver;

/// Solve a Sokoban level with an A*-over-pushes search.
#[derive(Parser)]
#[command(name = "sokoban-solver")]
#[command(about = "A* Sokoban solver", long_about = None)]
struct Args {
    /// Path to a level file (XSB format; `;`-comment lines or blank lines
    /// separate multiple levels)
    #[arg(value_name = "LEVEL_FILE")]
    level_file: String,

    /// Which level in the file to solve, 1-indexed
    #[arg(long, default_value_t = 1)]
    level: usize,

    /// Maximum number of states to visit before giving up
    #[arg(long, default_value_t = 1_000_000)]
    max_states: u64,

    /// Write a per-state expansion trace to this file
    #[arg(long, value_name = "PATH")]
    debug: Option<String>,

    /// Print the push sequence step by step after solving
    #[arg(long)]
    print_solution: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let levels = Levels::from_file(&args.level_file)
        .with_context(|| format!("failed to load levels from {}", args.level_file))?;

    if args.level == 0 {
        anyhow::bail!("level numbers are 1-indexed; got 0");
    }
    let board = levels
        .get(args.level - 1)
        .with_context(|| {
            format!(
                "level {} not found ({} levels in {})",
                args.level,
                levels.len(),
                args.level_file
            )
        })?
        .clone();

    log::info!(
        "level {}: {}x{} grid, {} boxes",
        args.level,
        board.grid.width,
        board.grid.height,
        board.boxes.len()
    );

    let mut debug_file = args
        .debug
        .as_ref()
        .map(|path| File::create(path).with_context(|| format!("failed to create {path}")))
        .transpose()?;

    let starting_board = board.clone();
    let mut solver = Solver::new(board, args.max_states);
    let start = Instant::now();
    let mut trace_err = None;
    let result = solver.solve_with_trace(|event| {
        if trace_err.is_some() {
            return;
        }
        if let Some(file) = debug_file.as_mut() {
            let push = event
                .from_push
                .map(|p| p.to_string())
                .unwrap_or_else(|| "root".to_string());
            if let Err(err) = writeln!(
                file,
                "visited={} g={} h={} f={} push={}",
                event.states_visited, event.g, event.h, event.f, push
            ) {
                trace_err = Some(err);
            }
        }
    });
    let elapsed_ms = start.elapsed().as_millis();
    if let Some(err) = trace_err {
        return Err(err).with_context(|| {
            format!(
                "failed to write debug trace to {}",
                args.debug.as_deref().unwrap_or("<unknown>")
            )
        });
    }

    println!(
        "solved: {} states_visited: {} pushes_required: {} elapsed_ms: {}",
        result.solved,
        result.states_visited,
        result
            .pushes_required
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-1".to_string()),
        elapsed_ms
    );

    if args.print_solution {
        match &result.solution {
            Some(pushes) => print_solution(&starting_board, pushes),
            None => println!("no solution to print"),
        }
    }

    Ok(())
}

fn print_solution(board: &Board, pushes: &[Push]) {
    let mut board = board.clone();
    println!("starting position:\n{board}");
    for (step, &push) in pushes.iter().enumerate() {
        board.perform_push(push);
        println!("push {} ({}/{}):\n{board}", push, step + 1, pushes.len());
    }
}
