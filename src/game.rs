use std::collections::HashSet;
use std::fmt;

use rand::rngs::SmallRng;
use tracing::debug;

use crate::board::{Board, Position};
use crate::snake::{Direction, Snake};

pub const DEFAULT_MAX_TARGETS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub namespace: String,
    pub name: String,
}

impl Identity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Identity { namespace: namespace.into(), name: name.into() }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A pod sitting on the board, waiting to be eaten.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub pos: Position,
    pub identity: Identity,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameState {
    Running,
    Paused,
    Over,
}

/// One round of the game: board, snake and the pods currently on display.
///
/// Nothing in here talks to the outside world. The session feeds in pods
/// it fetched and acts on the ones `step` reports as eaten.
pub struct Game {
    board: Board,
    snake: Snake,
    targets: Vec<Target>,
    state: GameState,
    score: u64,
    kill_count: u64,
    max_targets: usize,
    rng: SmallRng,
}

impl Game {
    pub fn new(width: i32, height: i32, max_targets: usize, rng: SmallRng) -> Self {
        let start = Position::new(width / 4, height / 2);
        let snake = Snake::new(start, Direction::Right);
        Self::with_snake(Board::new(width, height), snake, max_targets, rng)
    }

    #[cfg(test)]
    pub fn seeded(width: i32, height: i32, seed: u64) -> Self {
        use rand::SeedableRng;
        Self::new(width, height, DEFAULT_MAX_TARGETS, SmallRng::seed_from_u64(seed))
    }

    pub fn with_snake(board: Board, snake: Snake, max_targets: usize, rng: SmallRng) -> Self {
        Game {
            board,
            snake,
            targets: vec![],
            state: GameState::Running,
            score: 0,
            kill_count: 0,
            max_targets,
            rng,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn kill_count(&self) -> u64 {
        self.kill_count
    }

    pub fn max_targets(&self) -> usize {
        self.max_targets
    }

    pub fn has_capacity(&self) -> bool {
        self.targets.len() < self.max_targets
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.targets.iter().map(|t| &t.identity)
    }

    /// Turns the snake. Ignored once the game is over.
    pub fn set_direction(&mut self, direction: Direction) {
        if self.state != GameState::Over {
            self.snake.set_direction(direction);
        }
    }

    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            GameState::Running => GameState::Paused,
            GameState::Paused => GameState::Running,
            GameState::Over => GameState::Over,
        };
    }

    /// Advances one tick and returns the pods eaten on it, in board order.
    ///
    /// Hitting a wall or the snake's own body ends the game; on that tick
    /// nothing is eaten. Does nothing unless the game is running.
    pub fn step(&mut self) -> Vec<Target> {
        if self.state != GameState::Running {
            return vec![];
        }

        self.snake.step();
        let head = self.snake.head();

        if !self.board.contains(head) {
            debug!(x = head.x, y = head.y, "snake left the board");
            self.state = GameState::Over;
            return vec![];
        }

        if self.snake.collides_with_self() {
            debug!(x = head.x, y = head.y, "snake ran into itself");
            self.state = GameState::Over;
            return vec![];
        }

        let (eaten, remaining): (Vec<Target>, Vec<Target>) =
            self.targets.drain(..).partition(|t| t.pos == head);
        self.targets = remaining;

        for _ in &eaten {
            self.snake.request_growth();
            self.score += 1;
            self.kill_count += 1;
        }

        eaten
    }

    /// Drops a new pod on a free cell. Returns `false` when the game is over,
    /// the board already shows `max_targets` pods or has no free cell left.
    pub fn place_target(&mut self, identity: Identity) -> bool {
        if self.state == GameState::Over || !self.has_capacity() {
            return false;
        }

        let occupied: HashSet<Position> = self
            .snake
            .body()
            .iter()
            .copied()
            .chain(self.targets.iter().map(|t| t.pos))
            .collect();

        match self.board.sample_free(&occupied, &mut self.rng) {
            Ok(pos) => {
                self.targets.push(Target { pos, identity });
                true
            }
            Err(_) => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_target_at(&mut self, pos: Position, identity: Identity) {
        self.targets.push(Target { pos, identity });
    }
}
