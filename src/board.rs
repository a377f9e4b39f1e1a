use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::BoardFull;

/// How many blind draws `sample_free` makes before enumerating the free cells.
const SAMPLE_ATTEMPTS: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }
}

/// The playing field. Its size never changes once built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: i32,
    height: i32,
}

impl Board {
    pub fn new(width: i32, height: i32) -> Self {
        Board { width, height }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn area(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    pub fn contains(&self, p: Position) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    /// Picks a cell outside of `excluded`, uniformly over the free cells.
    ///
    /// Occupancy is expected to stay far below the board area, so a handful of
    /// blind draws almost always succeeds. When they don't, the free cells are
    /// listed and one is chosen from that list, which keeps the distribution
    /// uniform and guarantees termination.
    pub fn sample_free<R: Rng + ?Sized>(
        &self,
        excluded: &HashSet<Position>,
        rng: &mut R,
    ) -> Result<Position, BoardFull> {
        if self.area() == 0 {
            return Err(BoardFull);
        }

        for _ in 0..SAMPLE_ATTEMPTS {
            let p = Position::new(rng.gen_range(0..self.width), rng.gen_range(0..self.height));
            if !excluded.contains(&p) {
                return Ok(p);
            }
        }

        let free: Vec<Position> = self.cells().filter(|p| !excluded.contains(p)).collect();
        free.choose(rng).copied().ok_or(BoardFull)
    }

    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn contains_checks_every_edge() {
        let board = Board::new(10, 8);

        for p in [(0, 0), (9, 0), (0, 7), (9, 7), (5, 0), (0, 4), (9, 4), (5, 7)] {
            assert!(board.contains(Position::new(p.0, p.1)), "{:?} should be inside", p);
        }

        for p in [(-1, 0), (0, -1), (10, 0), (0, 8), (10, 8), (-1, -1), (5, -1), (5, 8), (-1, 4), (10, 4)] {
            assert!(!board.contains(Position::new(p.0, p.1)), "{:?} should be outside", p);
        }
    }

    #[test]
    fn sample_free_avoids_excluded_cells() {
        let board = Board::new(6, 6);
        let mut rng = SmallRng::seed_from_u64(7);
        let excluded: HashSet<Position> = board.cells().filter(|p| (p.x + p.y) % 2 == 0).collect();

        for _ in 0..500 {
            let p = board.sample_free(&excluded, &mut rng).unwrap();
            assert!(board.contains(p));
            assert!(!excluded.contains(&p));
        }
    }

    #[test]
    fn sample_free_finds_the_last_free_cell() {
        let board = Board::new(5, 5);
        let mut rng = SmallRng::seed_from_u64(3);
        let only = Position::new(4, 2);
        let excluded: HashSet<Position> = board.cells().filter(|p| *p != only).collect();

        for _ in 0..20 {
            assert_eq!(board.sample_free(&excluded, &mut rng), Ok(only));
        }
    }

    #[test]
    fn sample_free_reports_full_board() {
        let board = Board::new(3, 2);
        let mut rng = SmallRng::seed_from_u64(1);
        let excluded: HashSet<Position> = board.cells().collect();

        assert_eq!(board.sample_free(&excluded, &mut rng), Err(BoardFull));
        assert_eq!(Board::new(0, 4).sample_free(&HashSet::new(), &mut rng), Err(BoardFull));
    }

    #[test]
    fn same_seed_gives_same_cells() {
        let board = Board::new(20, 20);
        let excluded = HashSet::new();
        let mut a = SmallRng::seed_from_u64(99);
        let mut b = SmallRng::seed_from_u64(99);

        for _ in 0..10 {
            assert_eq!(board.sample_free(&excluded, &mut a), board.sample_free(&excluded, &mut b));
        }
    }
}
