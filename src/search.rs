//! Player-reachability DFS, push enumeration, PI-corral pruning, and the
//! simple-deadlock filter: everything the solver needs per expanded state.

use crate::bits::CellSet;
use crate::board::{Board, Push};
use crate::deadlock::SimpleDeadlockTable;
use crate::position::{ALL_DIRECTIONS, Direction, Position};

/// Outcome of one `PushSearcher::search` call.
#[derive(Debug, Clone, Copy)]
pub struct SearchResult {
    pub normalized_player: Position,
    pub is_pi_corral: bool,
}

/// Owns the scratch buffers `search` needs, reused across calls so the
/// solver's inner loop does not allocate per expanded state.
pub struct PushSearcher {
    reachable: CellSet,
    stack: Vec<Position>,
    corral_seen: CellSet,
    corral_stack: Vec<Position>,
    corral_attempted: CellSet,
    edge_seen: Vec<bool>,
}

impl PushSearcher {
    pub fn new(board: &Board) -> Self {
        let size = board.grid.size();
        PushSearcher {
            reachable: CellSet::new(size),
            stack: Vec::new(),
            corral_seen: CellSet::new(size),
            corral_stack: Vec::new(),
            corral_attempted: CellSet::new(size),
            edge_seen: vec![false; board.boxes.len()],
        }
    }

    /// Fills `pushes` with the legal pushes from the board's current state
    /// (after PI-corral pruning and the simple-deadlock filter) and returns
    /// the normalized player position for this reachable region.
    pub fn search(
        &mut self,
        board: &Board,
        simple: &SimpleDeadlockTable,
        pushes: &mut Vec<Push>,
    ) -> SearchResult {
        pushes.clear();
        self.reachable.clear();
        self.stack.clear();
        self.stack.push(board.player);
        self.reachable.set(board.player);

        while let Some(pos) = self.stack.pop() {
            for dir in ALL_DIRECTIONS {
                let Some(next) = board.grid.step(pos, dir) else {
                    continue;
                };
                if board.is_wall(next) || board.has_box_at(next) {
                    continue;
                }
                if !self.reachable.get(next) {
                    self.reachable.set(next);
                    self.stack.push(next);
                }
            }
            for dir in ALL_DIRECTIONS {
                let Some(box_pos) = board.grid.step(pos, dir) else {
                    continue;
                };
                if !board.has_box_at(box_pos) {
                    continue;
                }
                let Some(landing) = board.grid.step(box_pos, dir) else {
                    continue;
                };
                if board.is_wall(landing) || board.has_box_at(landing) {
                    continue;
                }
                pushes.push(Push {
                    box_position: box_pos,
                    direction: dir,
                });
            }
        }

        let normalized_player = self
            .reachable
            .min_position()
            .expect("player's own cell is always reachable");

        let is_pi_corral = self.prune_corrals(board, pushes);

        pushes.retain(|push| {
            let landing = board
                .grid
                .step(push.box_position, push.direction)
                .expect("push landing was validated during enumeration");
            !simple.is_deadlock(landing)
        });

        SearchResult {
            normalized_player,
            is_pi_corral,
        }
    }

    /// Looks for the first corral whose edge boxes can only push back into
    /// the corral itself. If found, narrows `pushes` down to pushes of those
    /// edge boxes and returns `true`.
    fn prune_corrals(&mut self, board: &Board, pushes: &mut Vec<Push>) -> bool {
        self.corral_attempted.clear();

        for i in 0..pushes.len() {
            let push = pushes[i];
            let landing = board
                .grid
                .step(push.box_position, push.direction)
                .expect("push landing was validated during enumeration");
            if self.reachable.get(landing) || self.corral_attempted.get(landing) {
                continue;
            }

            let edge_boxes = self.flood_fill_corral(board, landing);
            self.corral_attempted.set(landing);

            if edge_boxes.is_empty() {
                continue;
            }

            let has_off_goal_edge_box = edge_boxes
                .iter()
                .any(|&idx| !board.is_goal(board.boxes[idx]));
            if !has_off_goal_edge_box {
                continue;
            }

            if self.edge_boxes_are_confined(board, pushes, &edge_boxes) {
                let edge_set = &edge_boxes;
                pushes.retain(|push| {
                    board
                        .box_index_at(push.box_position)
                        .is_some_and(|idx| edge_set.contains(&idx))
                });
                return true;
            }
        }

        false
    }

    /// Every structurally-legal push of every edge box must land inside the
    /// corral and must already be among the reachable `pushes` the player
    /// could make this turn.
    fn edge_boxes_are_confined(
        &mut self,
        board: &Board,
        pushes: &[Push],
        edge_boxes: &[usize],
    ) -> bool {
        for &idx in edge_boxes {
            let box_pos = board.boxes[idx];
            for dir in ALL_DIRECTIONS {
                if !is_structurally_legal_push(board, box_pos, dir) {
                    continue;
                }
                let landing = board
                    .grid
                    .step(box_pos, dir)
                    .expect("checked by is_structurally_legal_push");
                let push = Push {
                    box_position: box_pos,
                    direction: dir,
                };
                let lands_in_corral = self.corral_seen.get(landing);
                let player_can_make_it = pushes.contains(&push);
                if !lands_in_corral || !player_can_make_it {
                    return false;
                }
            }
        }
        true
    }

    /// Flood-fills the corral containing `start`, stopping at walls, at
    /// boxes (which become edge boxes), and at cells already in the
    /// player's reachable region. Populates `self.corral_seen` as a side
    /// effect for `edge_boxes_are_confined` to consult.
    fn flood_fill_corral(&mut self, board: &Board, start: Position) -> Vec<usize> {
        self.corral_seen.clear();
        self.corral_stack.clear();
        self.edge_seen.iter_mut().for_each(|v| *v = false);

        let mut edge_boxes = Vec::new();
        self.corral_seen.set(start);
        self.corral_stack.push(start);

        while let Some(pos) = self.corral_stack.pop() {
            for dir in ALL_DIRECTIONS {
                let Some(next) = board.grid.step(pos, dir) else {
                    continue;
                };
                if board.is_wall(next) {
                    continue;
                }
                if let Some(idx) = board.box_index_at(next) {
                    if !self.edge_seen[idx] {
                        self.edge_seen[idx] = true;
                        edge_boxes.push(idx);
                    }
                    continue;
                }
                if self.reachable.get(next) || self.corral_seen.get(next) {
                    continue;
                }
                self.corral_seen.set(next);
                self.corral_stack.push(next);
            }
        }

        edge_boxes
    }
}

/// Whether pushing the box at `box_pos` in `dir` is possible given board
/// geometry alone, ignoring whether the player can currently reach the
/// cell it would need to stand on.
fn is_structurally_legal_push(board: &Board, box_pos: Position, dir: Direction) -> bool {
    let Some(player_side) = board.grid.unstep(box_pos, dir) else {
        return false;
    };
    if board.is_wall(player_side) || board.has_box_at(player_side) {
        return false;
    }
    let Some(landing) = board.grid.step(box_pos, dir) else {
        return false;
    };
    !board.is_wall(landing) && !board.has_box_at(landing)
}
