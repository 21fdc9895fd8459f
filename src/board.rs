//! Board geometry and incremental state mutation under push/unpush.

use std::fmt;

use arrayvec::ArrayVec;

use crate::bits::CellSet;
use crate::error::LevelError;
use crate::position::{Direction, Grid, Position};
use crate::zobrist::Zobrist;

/// Upper bound on the number of boxes (and goals) a board may contain,
/// chosen so box/goal arrays stay fixed-capacity `ArrayVec`s.
pub const MAX_BOXES: usize = 64;

/// A push: the box's position *before* the push, and the direction it is
/// pushed in. `perform_unpush` reconstructs the prior state from the same
/// `box_position` field — see the module doc on `Board::perform_unpush`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Push {
    pub box_position: Position,
    pub direction: Direction,
}

impl fmt::Display for Push {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push {} {}", self.box_position, self.direction)
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    pub grid: Grid,
    wall: CellSet,
    goal: CellSet,
    /// `box_of[pos]` is the index into `boxes` of the box at `pos`, if any.
    box_of: Vec<Option<usize>>,
    pub boxes: ArrayVec<Position, MAX_BOXES>,
    pub goals: ArrayVec<Position, MAX_BOXES>,
    pub player: Position,
    goals_completed: usize,
    zobrist: Zobrist,
    pub hash: u64,
}

impl Board {
    /// Parse a Sokoban board from text format (see the crate's level format
    /// documentation): `#` wall, ` ` floor, `.` goal, `$` box, `*` box on
    /// goal, `@` player, `+` player on goal. Trailing whitespace on each
    /// line is ignored; blank lines are skipped entirely; short rows are
    /// implicitly right-padded with floor.
    pub fn from_text(text: &str) -> Result<Self, LevelError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end())
            .filter(|line| !line.is_empty())
            .collect();

        if rows.is_empty() {
            return Err(LevelError::Empty);
        }

        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let grid = Grid::new(width, height);

        let mut wall = CellSet::new(grid.size());
        let mut goal = CellSet::new(grid.size());
        let mut boxes: ArrayVec<Position, MAX_BOXES> = ArrayVec::new();
        let mut player = None;

        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let pos = grid.from_xy(col, row);
                match ch {
                    '#' => wall.set(pos),
                    ' ' => {}
                    '.' => goal.set(pos),
                    '$' => {
                        if boxes.is_full() {
                            return Err(LevelError::TooLarge {
                                boxes: boxes.len() + 1,
                                max: MAX_BOXES,
                            });
                        }
                        boxes.push(pos);
                    }
                    '*' => {
                        if boxes.is_full() {
                            return Err(LevelError::TooLarge {
                                boxes: boxes.len() + 1,
                                max: MAX_BOXES,
                            });
                        }
                        goal.set(pos);
                        boxes.push(pos);
                    }
                    '@' => {
                        if player.is_some() {
                            return Err(LevelError::MultiplePlayers);
                        }
                        player = Some(pos);
                    }
                    '+' => {
                        if player.is_some() {
                            return Err(LevelError::MultiplePlayers);
                        }
                        player = Some(pos);
                        goal.set(pos);
                    }
                    other => {
                        return Err(LevelError::UnknownCharacter {
                            ch: other,
                            row,
                            col,
                        });
                    }
                }
            }
        }

        let player = player.ok_or(LevelError::MissingPlayer)?;

        // Collect goal positions in cell order, independent of where boxes
        // happened to be parsed from.
        let mut all_goals: ArrayVec<Position, MAX_BOXES> = ArrayVec::new();
        for y in 0..height {
            for x in 0..width {
                let pos = grid.from_xy(x, y);
                if goal.get(pos) {
                    if all_goals.is_full() {
                        return Err(LevelError::TooLarge {
                            boxes: all_goals.len() + 1,
                            max: MAX_BOXES,
                        });
                    }
                    all_goals.push(pos);
                }
            }
        }

        if boxes.len() != all_goals.len() {
            return Err(LevelError::BoxGoalMismatch {
                boxes: boxes.len(),
                goals: all_goals.len(),
            });
        }

        let zobrist = Zobrist::new(grid.size());
        let mut box_of = vec![None; grid.size()];
        let mut goals_completed = 0;
        for (i, &pos) in boxes.iter().enumerate() {
            box_of[pos.0] = Some(i);
            if goal.get(pos) {
                goals_completed += 1;
            }
        }

        let mut hash = zobrist.player_key(player);
        for &pos in &boxes {
            hash ^= zobrist.box_key(pos);
        }

        Ok(Board {
            grid,
            wall,
            goal,
            box_of,
            boxes,
            goals: all_goals,
            player,
            goals_completed,
            zobrist,
            hash,
        })
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.wall.get(pos)
    }

    pub fn is_goal(&self, pos: Position) -> bool {
        self.goal.get(pos)
    }

    pub fn box_index_at(&self, pos: Position) -> Option<usize> {
        self.box_of[pos.0]
    }

    pub fn has_box_at(&self, pos: Position) -> bool {
        self.box_of[pos.0].is_some()
    }

    /// `true` when every box sits on a goal.
    pub fn is_solved(&self) -> bool {
        self.goals_completed == self.boxes.len()
    }

    /// Move a box from `from` to `to`, maintaining `box_of`, `goals_completed`
    /// and `hash`. No-op if `from == to`.
    pub fn move_box(&mut self, from: Position, to: Position) {
        if from == to {
            return;
        }
        debug_assert!(!self.wall.get(to), "cannot move box onto a wall");
        debug_assert!(self.box_of[to.0].is_none(), "destination already has a box");
        let idx = self.box_of[from.0].expect("no box at source position");
        self.box_of[from.0] = None;
        self.box_of[to.0] = Some(idx);
        self.boxes[idx] = to;

        let was_goal = self.goal.get(from);
        let now_goal = self.goal.get(to);
        if now_goal && !was_goal {
            self.goals_completed += 1;
        } else if was_goal && !now_goal {
            self.goals_completed -= 1;
        }

        self.hash ^= self.zobrist.box_key(from) ^ self.zobrist.box_key(to);
        debug_assert_eq!(self.hash, self.recompute_hash(), "hash drifted in move_box");
    }

    /// Move the player to `to`, maintaining `hash`. No-op if already there.
    pub fn move_player(&mut self, to: Position) {
        if to == self.player {
            return;
        }
        debug_assert!(!self.wall.get(to), "cannot move player onto a wall");
        self.hash ^= self.zobrist.player_key(self.player) ^ self.zobrist.player_key(to);
        self.player = to;
        debug_assert_eq!(self.hash, self.recompute_hash(), "hash drifted in move_player");
    }

    /// Apply a push: the box at `push.box_position` moves one cell in
    /// `push.direction`, and the player occupies the box's old cell.
    pub fn perform_push(&mut self, push: Push) {
        let from = push.box_position;
        let to = self
            .grid
            .step(from, push.direction)
            .expect("push destination out of bounds");
        debug_assert!(
            !self.wall.get(to) && self.box_of[to.0].is_none() && self.box_of[from.0].is_some(),
            "push destination blocked"
        );
        self.move_box(from, to);
        self.move_player(from);
    }

    /// Undo a push. `push` must be the exact value passed to the matching
    /// `perform_push`: `push.box_position` names the box's position *before*
    /// that push, so the box currently sits at
    /// `step(push.box_position, push.direction)` and must move back.
    pub fn perform_unpush(&mut self, push: Push) {
        let to = push.box_position;
        let from = self
            .grid
            .step(to, push.direction)
            .expect("unpush source out of bounds");
        let player_to = self
            .grid
            .unstep(to, push.direction)
            .expect("unpush player destination out of bounds");
        self.move_box(from, to);
        self.move_player(player_to);
    }

    /// Bulk-restore player and box positions, recomputing everything
    /// derived from scratch. Used by the solver to replay a `SearchState`.
    pub fn reset_state(&mut self, player: Position, boxes: &[Position]) {
        for &pos in &self.boxes {
            self.box_of[pos.0] = None;
        }
        self.boxes.clear();
        self.goals_completed = 0;
        self.hash = self.zobrist.player_key(player);
        for (i, &pos) in boxes.iter().enumerate() {
            self.boxes.push(pos);
            self.box_of[pos.0] = Some(i);
            if self.goal.get(pos) {
                self.goals_completed += 1;
            }
            self.hash ^= self.zobrist.box_key(pos);
        }
        self.player = player;
        debug_assert_eq!(self.hash, self.recompute_hash(), "hash drifted in reset_state");
    }

    /// Recompute the Zobrist hash from scratch; used by debug assertions to
    /// verify the incrementally-maintained `hash` field stayed correct.
    pub fn recompute_hash(&self) -> u64 {
        let mut hash = self.zobrist.player_key(self.player);
        for &pos in &self.boxes {
            hash ^= self.zobrist.box_key(pos);
        }
        hash
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.grid.height {
            let mut line = String::new();
            for x in 0..self.grid.width {
                let pos = self.grid.from_xy(x, y);
                let ch = if pos == self.player {
                    if self.goal.get(pos) { '+' } else { '@' }
                } else if self.box_of[pos.0].is_some() {
                    if self.goal.get(pos) { '*' } else { '$' }
                } else if self.wall.get(pos) {
                    '#'
                } else if self.goal.get(pos) {
                    '.'
                } else {
                    ' '
                };
                line.push(ch);
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
