//! 2×2×2 cube used as the reference puzzle
//!
//! The cube is stored as a corner cubie model: for every corner slot, which
//! corner sits there and how it is twisted. Slots and corners are numbered
//! URF, UFL, ULB, UBR, DFR, DLF, DBL, DRB. Moves are quarter turns of the
//! six faces, clockwise ids `0..6` in the order U D L R F B and the
//! matching counter-clockwise turns at `6..12`.

use std::fmt;

use ndarray::Array1;
use rand::Rng;

use crate::puzzle::PuzzleState;

const CORNERS: usize = 8;
const TWISTS: usize = 3;

/// Faces of the cube, in move-id order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Top face, moves 0 and 6
    Up,
    /// Bottom face, moves 1 and 7
    Down,
    /// Left face, moves 2 and 8
    Left,
    /// Right face, moves 3 and 9
    Right,
    /// Front face, moves 4 and 10
    Front,
    /// Back face, moves 5 and 11
    Back,
}

impl Face {
    const ALL: [Face; 6] = [
        Face::Up,
        Face::Down,
        Face::Left,
        Face::Right,
        Face::Front,
        Face::Back,
    ];

    fn letter(self) -> char {
        match self {
            Face::Up => 'U',
            Face::Down => 'D',
            Face::Left => 'L',
            Face::Right => 'R',
            Face::Front => 'F',
            Face::Back => 'B',
        }
    }

    /// Corner permutation and twist of a clockwise quarter turn
    ///
    /// Slot `i` receives the corner from slot `perm[i]`, twisted by `twist[i]`.
    fn turn(self) -> ([u8; CORNERS], [u8; CORNERS]) {
        match self {
            Face::Up => ([3, 0, 1, 2, 4, 5, 6, 7], [0; CORNERS]),
            Face::Down => ([0, 1, 2, 3, 5, 6, 7, 4], [0; CORNERS]),
            Face::Left => ([0, 2, 6, 3, 4, 1, 5, 7], [0, 1, 2, 0, 0, 2, 1, 0]),
            Face::Right => ([4, 1, 2, 0, 7, 5, 6, 3], [2, 0, 0, 1, 1, 0, 0, 2]),
            Face::Front => ([1, 5, 2, 3, 0, 4, 6, 7], [1, 2, 0, 0, 2, 1, 0, 0]),
            Face::Back => ([0, 1, 3, 7, 4, 5, 2, 6], [0, 0, 1, 2, 0, 0, 2, 1]),
        }
    }
}

/// A quarter turn of one face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeMove {
    /// The face being turned
    pub face: Face,
    /// Clockwise as seen looking at the face; false for the inverse turn
    pub clockwise: bool,
}

impl CubeMove {
    /// Decodes a move id in `0..12`
    pub fn from_id(id: usize) -> Option<Self> {
        if id >= 2 * Face::ALL.len() {
            return None;
        }
        Some(CubeMove {
            face: Face::ALL[id % 6],
            clockwise: id < 6,
        })
    }

    /// Move id in `0..12`
    pub fn id(self) -> usize {
        let face = Face::ALL.iter().position(|&f| f == self.face).unwrap_or(0);
        if self.clockwise {
            face
        } else {
            face + 6
        }
    }

    /// The move undoing this one
    pub fn inverse(self) -> Self {
        CubeMove {
            face: self.face,
            clockwise: !self.clockwise,
        }
    }
}

impl fmt::Display for CubeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.face.letter())?;
        if !self.clockwise {
            write!(f, "'")?;
        }
        Ok(())
    }
}

/// State of a 2×2×2 cube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PocketCube {
    permutation: [u8; CORNERS],
    twist: [u8; CORNERS],
}

impl PocketCube {
    /// The solved cube
    pub fn solved() -> Self {
        PocketCube {
            permutation: [0, 1, 2, 3, 4, 5, 6, 7],
            twist: [0; CORNERS],
        }
    }

    /// Applies `moves` random quarter turns to the solved cube
    ///
    /// The result may happen to be solved for short scrambles.
    pub fn scrambled<R: Rng + ?Sized>(moves: usize, rng: &mut R) -> Self {
        (0..moves).fold(Self::solved(), |cube, _| {
            cube.apply_move(rng.gen_range(0..Self::MOVE_COUNT))
        })
    }

    /// Applies a sequence of move ids in order
    pub fn apply_sequence(&self, moves: &[usize]) -> Self {
        moves.iter().fold(*self, |cube, &m| cube.apply_move(m))
    }

    fn quarter_turn(&self, face: Face) -> Self {
        let (perm, twist) = face.turn();
        let mut next = *self;
        for slot in 0..CORNERS {
            let from = perm[slot] as usize;
            next.permutation[slot] = self.permutation[from];
            next.twist[slot] = (self.twist[from] + twist[slot]) % TWISTS as u8;
        }
        next
    }
}

impl Default for PocketCube {
    fn default() -> Self {
        Self::solved()
    }
}

impl PuzzleState for PocketCube {
    const MOVE_COUNT: usize = 12;
    const ENCODING_WIDTH: usize = CORNERS * CORNERS * TWISTS;

    /// One block of 24 per slot, hot at `corner * 3 + twist`
    fn one_hot_encode(&self) -> Array1<f64> {
        let mut encoded = Array1::zeros(Self::ENCODING_WIDTH);
        for slot in 0..CORNERS {
            let hot = slot * CORNERS * TWISTS
                + self.permutation[slot] as usize * TWISTS
                + self.twist[slot] as usize;
            encoded[hot] = 1.0;
        }
        encoded
    }

    fn apply_move(&self, move_id: usize) -> Self {
        let Some(mv) = CubeMove::from_id(move_id) else {
            return *self;
        };
        // Counter-clockwise is three clockwise turns
        let turns = if mv.clockwise { 1 } else { 3 };
        (0..turns).fold(*self, |cube, _| cube.quarter_turn(mv.face))
    }

    fn is_solved(&self) -> bool {
        *self == Self::solved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_four_quarter_turns_are_identity() {
        for m in 0..PocketCube::MOVE_COUNT {
            let cube = PocketCube::solved().apply_sequence(&[m, m, m, m]);
            assert!(cube.is_solved(), "move {} has order > 4", m);
            assert!(!PocketCube::solved().apply_move(m).is_solved());
        }
    }

    #[test]
    fn test_inverse_moves_cancel() {
        let mut rng = StdRng::seed_from_u64(5);
        let cube = PocketCube::scrambled(20, &mut rng);
        for id in 0..12 {
            let mv = CubeMove::from_id(id).unwrap();
            assert_eq!(mv.id(), id);
            assert_eq!(cube.apply_move(id).apply_move(mv.inverse().id()), cube);
        }
    }

    #[test]
    fn test_twist_sum_is_invariant() {
        let mut rng = StdRng::seed_from_u64(9);
        let cube = PocketCube::scrambled(50, &mut rng);
        let total: u32 = cube.twist.iter().map(|&t| t as u32).sum();
        assert_eq!(total % 3, 0);
    }

    #[test]
    fn test_encoding_has_one_hot_per_slot() {
        let cube = PocketCube::solved().apply_sequence(&[3, 4, 0]);
        let encoded = cube.one_hot_encode();
        assert_eq!(encoded.len(), PocketCube::ENCODING_WIDTH);
        assert_eq!(encoded.sum(), 8.0);
        for slot in 0..8 {
            let block = encoded.slice(ndarray::s![slot * 24..(slot + 1) * 24]);
            assert_eq!(block.sum(), 1.0);
        }
    }

    #[test]
    fn test_move_display() {
        assert_eq!(CubeMove::from_id(3).unwrap().to_string(), "R");
        assert_eq!(CubeMove::from_id(9).unwrap().to_string(), "R'");
        assert_eq!(CubeMove::from_id(12), None);

        let m = CubeMove::from_id(8).unwrap();
        assert_eq!(m.face, Face::Left);
        assert!(!m.clockwise);
        assert_eq!(m.id(), 8);
    }
}
