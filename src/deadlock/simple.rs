//! Static per-cell "a box here can never reach any goal" table.

use crate::bits::CellSet;
use crate::board::Board;
use crate::position::{ALL_DIRECTIONS, Position};

/// A cell is reachable from a goal by reverse pushes (pulls) if, standing
/// two cells back, the player could pull a box one step at a time all the
/// way to the goal. Every cell not reached this way is a simple deadlock:
/// no matter the rest of the state, a box placed there cannot be rescued.
pub struct SimpleDeadlockTable {
    deadlock: Vec<bool>,
}

impl SimpleDeadlockTable {
    pub fn new(board: &Board) -> Self {
        let size = board.grid.size();
        let mut reachable = CellSet::new(size);
        let mut visited = CellSet::new(size);

        for &goal in &board.goals {
            mark_reachable(board, goal, &mut reachable, &mut visited);
        }

        let deadlock = (0..size).map(|i| !reachable.get(Position(i))).collect();
        SimpleDeadlockTable { deadlock }
    }

    pub fn is_deadlock(&self, pos: Position) -> bool {
        self.deadlock[pos.0]
    }
}

fn mark_reachable(board: &Board, pos: Position, reachable: &mut CellSet, visited: &mut CellSet) {
    let mut stack = vec![pos];
    visited.set(pos);

    while let Some(p) = stack.pop() {
        reachable.set(p);
        for dir in ALL_DIRECTIONS {
            // p2 is where the box would land if pulled one step; p3 is
            // where the player needs to stand to make that pull.
            let Some(p2) = board.grid.step(p, dir) else {
                continue;
            };
            if board.is_wall(p2) || visited.get(p2) {
                continue;
            }
            let Some(p3) = board.grid.step(p2, dir) else {
                continue;
            };
            if board.is_wall(p3) {
                continue;
            }
            visited.set(p2);
            stack.push(p2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_cell_with_no_adjacent_goal_is_a_deadlock() {
        // The bottom-right corner (3,1) cannot be pulled from along either
        // axis without a wall getting in the way: it is a simple deadlock.
        let board = Board::from_text(
            "#####
#@$ #
#  .#
#####"
                .trim_matches('\n'),
        )
        .unwrap();
        let table = SimpleDeadlockTable::new(&board);
        let corner = board.grid.from_xy(3, 1);
        assert!(table.is_deadlock(corner));
    }

    #[test]
    fn goal_cell_is_never_a_deadlock() {
        let board = Board::from_text("#####\n#@$.#\n#####").unwrap();
        let table = SimpleDeadlockTable::new(&board);
        assert!(!table.is_deadlock(board.goals[0]));
    }

    #[test]
    fn open_corridor_to_goal_is_not_a_deadlock() {
        let board = Board::from_text("########\n#@ $  .#\n########").unwrap();
        let table = SimpleDeadlockTable::new(&board);
        for &pos in &board.boxes {
            assert!(!table.is_deadlock(pos));
        }
    }
}
