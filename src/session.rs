use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::Duration;

use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::game::{Game, GameState, Identity};
use crate::message::{Command, Exit, Key};
use crate::snake::Direction;

const ACTIVITY_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Activity {
    Killed(Identity),
    DeleteFailed { identity: Identity, reason: String },
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Killed(identity) => write!(f, "killed: {}", identity),
            Activity::DeleteFailed { identity, reason } => write!(f, "FAILED: {} -- {}", identity, reason),
        }
    }
}

/// Settings a session copies out of the config when it starts.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub width: i32,
    pub height: i32,
    pub max_targets: usize,
    pub tick_rate: Duration,
}

/// A single game in progress and the bookkeeping around its provider calls.
///
/// Pods leave the board the moment they are eaten. The delete that follows is
/// best effort and its outcome only ever reaches the activity log.
pub struct Session {
    generation: u64,
    game: Game,
    namespace: Option<String>,
    tick_rate: Duration,
    fetch_in_flight: bool,
    pending_deletes: HashSet<Identity>,
    activity: VecDeque<Activity>,
}

impl Session {
    /// Builds the session and the commands that get it going: the first
    /// fetch and the first tick. `pending_deletes` are pods an earlier game
    /// ate whose delete has not come back yet.
    pub fn start(
        generation: u64,
        settings: &SessionSettings,
        namespace: Option<String>,
        pending_deletes: HashSet<Identity>,
        rng: SmallRng,
    ) -> (Self, Vec<Command>) {
        let game = Game::new(settings.width, settings.height, settings.max_targets, rng);
        let mut session = Session {
            generation,
            game,
            namespace,
            tick_rate: settings.tick_rate,
            fetch_in_flight: false,
            pending_deletes,
            activity: VecDeque::with_capacity(ACTIVITY_CAPACITY),
        };
        info!(generation, namespace = ?session.namespace, "session started");

        let mut cmds = vec![];
        session.request_fetch(&mut cmds);
        cmds.push(session.next_tick());
        (session, cmds)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    #[cfg(test)]
    pub(crate) fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn pending_deletes(&self) -> &HashSet<Identity> {
        &self.pending_deletes
    }

    pub fn activity(&self) -> impl DoubleEndedIterator<Item = &Activity> + ExactSizeIterator {
        self.activity.iter()
    }

    pub fn on_key(&mut self, key: Key) -> Vec<Command> {
        match key {
            Key::Char('q') | Key::CtrlC => return vec![Command::Quit(Exit::Normal)],
            Key::Up | Key::Char('w') => self.game.set_direction(Direction::Up),
            Key::Down | Key::Char('s') => self.game.set_direction(Direction::Down),
            Key::Left | Key::Char('a') => self.game.set_direction(Direction::Left),
            Key::Right | Key::Char('d') => self.game.set_direction(Direction::Right),
            Key::Char(' ') | Key::Esc => self.game.toggle_pause(),
            _ => {}
        }
        vec![]
    }

    pub fn on_tick(&mut self) -> Vec<Command> {
        let mut cmds = vec![];
        let was_running = self.game.state() == GameState::Running;

        for target in self.game.step() {
            info!(pod = %target.identity, score = self.game.score(), length = self.game.snake().len(), "pod eaten");
            self.pending_deletes.insert(target.identity.clone());
            self.record(Activity::Killed(target.identity.clone()));
            cmds.push(Command::Delete { session: self.generation, identity: target.identity });
        }

        if was_running && self.game.state() == GameState::Over {
            info!(score = self.game.score(), kills = self.game.kill_count(), "game over");
        }

        if self.game.state() != GameState::Over && self.game.has_capacity() && !self.fetch_in_flight {
            self.request_fetch(&mut cmds);
        }

        cmds.push(self.next_tick());
        cmds
    }

    pub fn on_fetch(&mut self, result: Result<Option<Identity>, ProviderError>) {
        self.fetch_in_flight = false;

        match result {
            Ok(Some(identity)) => {
                if !self.game.place_target(identity.clone()) {
                    debug!(pod = %identity, "no room for fetched pod");
                }
            }
            Ok(None) => debug!("provider had no pod to offer"),
            Err(err) => warn!(%err, "pod fetch failed"),
        }
    }

    pub fn on_delete(&mut self, identity: Identity, result: Result<(), ProviderError>) {
        self.forget_delete(&identity);

        if let Err(err) = result {
            warn!(pod = %identity, %err, "pod delete failed");
            self.record(Activity::DeleteFailed { identity, reason: err.to_string() });
        }
    }

    /// Stops excluding `identity` from fetches once its delete is done.
    pub fn forget_delete(&mut self, identity: &Identity) {
        self.pending_deletes.remove(identity);
    }

    pub fn into_pending_deletes(self) -> HashSet<Identity> {
        self.pending_deletes
    }

    fn request_fetch(&mut self, cmds: &mut Vec<Command>) {
        let exclude = self
            .game
            .identities()
            .chain(self.pending_deletes.iter())
            .cloned()
            .collect();

        self.fetch_in_flight = true;
        cmds.push(Command::Fetch {
            session: self.generation,
            namespace: self.namespace.clone(),
            exclude,
        });
    }

    fn next_tick(&self) -> Command {
        Command::ScheduleTick { session: self.generation, after: self.tick_rate }
    }

    fn record(&mut self, entry: Activity) {
        if self.activity.len() == ACTIVITY_CAPACITY {
            self.activity.pop_front();
        }
        self.activity.push_back(entry);
    }
}
