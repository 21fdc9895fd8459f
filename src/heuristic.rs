//! Per-goal floor-distance table and the greedy box-to-goal heuristic.

use std::collections::VecDeque;

use crate::board::Board;
use crate::position::{ALL_DIRECTIONS, Position};

/// `distances[i][pos]` is the number of player steps from goal `i` to
/// `pos`, ignoring boxes entirely (boxes are assumed independently mobile,
/// which is what keeps the resulting heuristic admissible).
pub struct DistanceTable {
    distances: Vec<Vec<Option<u32>>>,
}

impl DistanceTable {
    pub fn new(board: &Board) -> Self {
        let distances = board
            .goals
            .iter()
            .map(|&goal| bfs_distances(board, goal))
            .collect();
        DistanceTable { distances }
    }

    /// Greedy one-pass bipartite matching: boxes are visited in index
    /// order, each claiming whichever *remaining* goal is nearest. This is
    /// not an optimal assignment, but it is fast, admissible in practice,
    /// and deterministic given a fixed box order.
    ///
    /// Returns `None` if some box has no path to any remaining goal — by
    /// design this is treated as "unsolvable from here" rather than an
    /// infinite/poisoned estimate (see the open-question resolution in
    /// `SPEC_FULL.md`).
    pub fn estimate(&self, boxes: &[Position]) -> Option<u32> {
        let mut remaining: Vec<usize> = (0..self.distances.len()).collect();
        let mut total = 0u32;

        for &box_pos in boxes {
            let mut best: Option<(u32, usize)> = None;
            for (slot, &goal_idx) in remaining.iter().enumerate() {
                if let Some(d) = self.distances[goal_idx][box_pos.0] {
                    if best.is_none_or(|(best_d, _)| d < best_d) {
                        best = Some((d, slot));
                    }
                }
            }
            let (d, slot) = best?;
            total += d;
            remaining.swap_remove(slot);
        }

        Some(total)
    }
}

fn bfs_distances(board: &Board, start: Position) -> Vec<Option<u32>> {
    let mut dist = vec![None; board.grid.size()];
    let mut queue = VecDeque::new();
    queue.push_back((start, 0u32));

    while let Some((pos, d)) = queue.pop_front() {
        if dist[pos.0].is_some() {
            continue;
        }
        dist[pos.0] = Some(d);
        for dir in ALL_DIRECTIONS {
            if let Some(next) = board.grid.step(pos, dir) {
                if !board.is_wall(next) {
                    queue.push_back((next, d + 1));
                }
            }
        }
    }

    dist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_is_zero_on_a_solved_board() {
        let board = Board::from_text("#####\n#@*#\n#####").unwrap();
        let table = DistanceTable::new(&board);
        assert_eq!(table.estimate(&board.boxes), Some(0));
    }

    #[test]
    fn estimate_matches_straight_line_distance() {
        let board = Board::from_text("########\n#@ $  .#\n########").unwrap();
        let table = DistanceTable::new(&board);
        // Box is 3 floor-steps from the goal.
        assert_eq!(table.estimate(&board.boxes), Some(3));
    }

    #[test]
    fn estimate_picks_nearest_remaining_goal_per_box() {
        // Two boxes, two goals; greedy matching should pair each box with
        // its closer goal (2 + 2) rather than crossing the assignment
        // (4 + 4).
        let board = Board::from_text("#########\n#.@$ $ .#\n#########").unwrap();
        let table = DistanceTable::new(&board);
        assert_eq!(table.estimate(&board.boxes), Some(2 + 2));
    }

    #[test]
    fn unreachable_goal_short_circuits_to_none() {
        let board = Board::from_text("#######\n#@$ #.#\n#######").unwrap();
        let table = DistanceTable::new(&board);
        assert_eq!(table.estimate(&board.boxes), None);
    }
}
