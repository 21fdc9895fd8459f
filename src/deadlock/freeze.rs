//! Dynamic check that a cluster of boxes around a just-pushed box is frozen.

use crate::board::Board;
use crate::deadlock::simple::SimpleDeadlockTable;
use crate::position::{ALL_DIRECTIONS, Position};

/// Reuses a scratch visited buffer across calls rather than allocating one
/// per push, matching the steady-state allocation discipline the rest of
/// the search core follows.
pub struct FreezeDeadlockDetector {
    visited: Vec<bool>,
}

impl FreezeDeadlockDetector {
    pub fn new(size: usize) -> Self {
        FreezeDeadlockDetector {
            visited: vec![false; size],
        }
    }

    /// A fully-frozen cluster is only fatal if at least one participating
    /// box is off-goal.
    pub fn is_deadlock(
        &mut self,
        board: &Board,
        simple: &SimpleDeadlockTable,
        position: Position,
    ) -> bool {
        self.visited.iter_mut().for_each(|v| *v = false);
        let mut boxes_visited = 0usize;
        let mut goals_visited = 0usize;
        let frozen = is_frozen(
            board,
            simple,
            position,
            &mut self.visited,
            &mut boxes_visited,
            &mut goals_visited,
        );
        frozen && goals_visited < boxes_visited
    }
}

fn is_frozen(
    board: &Board,
    simple: &SimpleDeadlockTable,
    pos: Position,
    visited: &mut [bool],
    boxes_visited: &mut usize,
    goals_visited: &mut usize,
) -> bool {
    debug_assert!(board.has_box_at(pos), "frozen() called on an empty cell");
    *boxes_visited += 1;
    if board.is_goal(pos) {
        *goals_visited += 1;
    }
    visited[pos.0] = true;

    for dir in ALL_DIRECTIONS {
        let front = board.grid.step(pos, dir);
        let back = board.grid.unstep(pos, dir);
        let is_free_along_axis = match (front, back) {
            (Some(front), Some(back)) => {
                !board.is_wall(front)
                    && !board.is_wall(back)
                    && !board.has_box_at(back)
                    && !simple.is_deadlock(front)
                    && (!board.has_box_at(front)
                        || (!visited[front.0]
                            && !is_frozen(board, simple, front, visited, boxes_visited, goals_visited)))
            }
            _ => false,
        };
        if is_free_along_axis {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Push;
    use crate::position::Direction;

    #[test]
    fn single_box_against_two_walls_is_frozen_and_off_goal() {
        let board = Board::from_text(
            "#####
#@$ #
#  .#
#####"
                .trim_matches('\n'),
        )
        .unwrap();
        let simple = SimpleDeadlockTable::new(&board);
        let mut freeze = FreezeDeadlockDetector::new(board.grid.size());
        // Box sits in the top-left corner cell adjacent to walls above/left.
        let corner = board.grid.from_xy(2, 1);
        assert_eq!(board.boxes[0], corner);
        assert!(freeze.is_deadlock(&board, &simple, corner));
    }

    #[test]
    fn box_in_open_corridor_is_not_a_deadlock() {
        let mut board = Board::from_text("########\n#@ $  .#\n########").unwrap();
        let simple = SimpleDeadlockTable::new(&board);
        let mut freeze = FreezeDeadlockDetector::new(board.grid.size());
        let push = Push {
            box_position: board.boxes[0],
            direction: Direction::Right,
        };
        board.perform_push(push);
        let pos = board.boxes[0];
        assert!(!freeze.is_deadlock(&board, &simple, pos));
    }
}
