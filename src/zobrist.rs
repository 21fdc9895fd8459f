//! Zobrist hash tables for board states.

use crate::position::Position;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fixed seed so that two runs, and two boards of the same dimensions,
/// agree on what any given (entity, cell) key hashes to. Changing this
/// value breaks reproducibility of recorded node counts.
const ZOBRIST_SEED: u64 = 0xDEAD_BEEF;

/// Per-cell random keys for boxes and the player, sized to a board's cells.
#[derive(Debug, Clone)]
pub struct Zobrist {
    box_keys: Vec<u64>,
    player_keys: Vec<u64>,
}

impl Zobrist {
    pub fn new(size: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(ZOBRIST_SEED);
        let box_keys = (0..size).map(|_| rng.next_u64()).collect();
        let player_keys = (0..size).map(|_| rng.next_u64()).collect();
        Zobrist {
            box_keys,
            player_keys,
        }
    }

    pub fn box_key(&self, pos: Position) -> u64 {
        self.box_keys[pos.0]
    }

    pub fn player_key(&self, pos: Position) -> u64 {
        self.player_keys[pos.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_size_boards_agree_on_keys() {
        let a = Zobrist::new(16);
        let b = Zobrist::new(16);
        for i in 0..16 {
            assert_eq!(a.box_key(Position(i)), b.box_key(Position(i)));
            assert_eq!(a.player_key(Position(i)), b.player_key(Position(i)));
        }
    }

    #[test]
    fn box_and_player_keys_differ() {
        let z = Zobrist::new(8);
        assert_ne!(z.box_key(Position(0)), z.player_key(Position(0)));
    }
}
