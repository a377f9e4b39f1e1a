use std::collections::VecDeque;

use crate::board::Position;
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }
}

impl Position {
    pub fn shifted(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx, self.y + dy)
    }
}

pub const INITIAL_LENGTH: usize = 3;

/// Body cells, head first.
#[derive(Clone, Debug)]
pub struct Snake {
    body: VecDeque<Position>,
    direction: Direction,
    grow_next_move: bool,
}

impl Snake {
    /// Lays out `INITIAL_LENGTH` cells in a line trailing behind `head`.
    pub fn new(head: Position, direction: Direction) -> Self {
        Self::with_length(head, INITIAL_LENGTH, direction)
    }

    pub fn with_length(head: Position, size: usize, direction: Direction) -> Self {
        let back = direction.opposite().delta();

        let body = (0..size.max(1) as i32)
            .map(|i| Position::new(head.x + back.0 * i, head.y + back.1 * i))
            .collect();
        Snake { body, direction, grow_next_move: false }
    }

    pub fn body(&self) -> &VecDeque<Position> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Moves one cell forward. Walls and self-overlap are the caller's business.
    pub fn step(&mut self) {
        let next = self.head().shifted(self.direction);
        self.body.push_front(next);

        if self.grow_next_move {
            self.grow_next_move = false;
        } else {
            self.body.pop_back();
        }
    }

    pub fn set_direction(&mut self, new_direction: Direction) {
        if new_direction != self.direction.opposite() {
            self.direction = new_direction;
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn request_growth(&mut self) {
        self.grow_next_move = true;
    }

    pub fn collides_with_self(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|seg| *seg == head)
    }

    pub fn head_char(&self) -> char {
        match self.direction {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snake_trails_behind_the_head() {
        let s = Snake::new(Position::new(5, 5), Right);
        let body: Vec<_> = s.body().iter().copied().collect();
        assert_eq!(body, vec![Position::new(5, 5), Position::new(4, 5), Position::new(3, 5)]);

        let s = Snake::new(Position::new(5, 5), Up);
        let body: Vec<_> = s.body().iter().copied().collect();
        assert_eq!(body, vec![Position::new(5, 5), Position::new(5, 6), Position::new(5, 7)]);
    }

    #[test]
    fn step_moves_without_growing() {
        let mut s = Snake::new(Position::new(5, 5), Right);
        s.step();
        assert_eq!(s.head(), Position::new(6, 5));
        assert_eq!(s.len(), 3);
        assert_eq!(s.body().back(), Some(&Position::new(4, 5)));
    }

    #[test]
    fn growth_adds_exactly_one_and_does_not_stack() {
        let mut s = Snake::new(Position::new(5, 5), Right);
        s.request_growth();
        s.request_growth();
        s.request_growth();
        s.step();
        assert_eq!(s.len(), 4);
        s.step();
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn reversal_is_ignored_for_every_direction() {
        for d in [Up, Down, Left, Right] {
            let mut s = Snake::new(Position::new(5, 5), d);
            s.set_direction(d.opposite());
            assert_eq!(s.direction(), d);
        }
    }

    #[test]
    fn perpendicular_turn_is_taken() {
        let mut s = Snake::new(Position::new(5, 5), Right);
        s.set_direction(Down);
        s.step();
        assert_eq!(s.head(), Position::new(5, 6));
        assert_eq!(s.head_char(), 'v');
    }

    #[test]
    fn running_into_own_body_is_detected() {
        let mut s = Snake::with_length(Position::new(5, 5), 5, Right);
        assert!(!s.collides_with_self());

        s.set_direction(Down);
        s.step();
        s.set_direction(Left);
        s.step();
        s.set_direction(Up);
        s.step();
        assert!(s.collides_with_self());
    }
}
