use std::collections::HashSet;
use std::mem;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::Config;
use crate::game::{GameState, Identity};
use crate::menu::{Menu, MenuAction};
use crate::message::{Command, Key, Message};
use crate::provider::Provider;
use crate::session::{Session, SessionSettings};

pub enum Screen {
    Menu,
    Playing(Session),
}

/// Everything the event loop owns. Messages go in through `update`, commands
/// come out; the runtime does the rest.
pub struct App<P> {
    settings: SessionSettings,
    config_label: String,
    provider: Option<P>,
    menu: Menu,
    screen: Screen,
    generation: u64,
    /// Pods eaten by finished games whose delete is still out.
    deleting: HashSet<Identity>,
    rng: SmallRng,
}

impl<P: Provider> App<P> {
    /// Starts on the connecting screen; the returned command kicks off the
    /// connection.
    pub fn new(config: &Config, config_label: impl Into<String>) -> (Self, Vec<Command>) {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let app = App {
            settings: SessionSettings {
                width: config.board.width,
                height: config.board.height,
                max_targets: config.board.max_targets,
                tick_rate: config.tick_rate(),
            },
            config_label: config_label.into(),
            provider: None,
            menu: Menu::new(),
            screen: Screen::Menu,
            generation: 0,
            deleting: HashSet::new(),
            rng,
        };
        (app, vec![Command::Connect])
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    pub fn config_label(&self) -> &str {
        &self.config_label
    }

    pub fn update(&mut self, msg: Message<P>) -> Vec<Command> {
        match msg {
            Message::Key(key) => self.on_key(key),

            Message::Tick { session } => match self.current(session) {
                Some(s) => s.on_tick(),
                None => vec![],
            },

            Message::Connected(result) => {
                let result = result.map(|provider| {
                    let cluster = provider.cluster_name().to_owned();
                    self.provider = Some(provider);
                    cluster
                });
                self.menu.on_connected(result);
                vec![]
            }

            Message::NamespacesLoaded(result) => {
                self.menu.on_namespaces(result);
                vec![]
            }

            Message::FetchCompleted { session, result } => {
                match self.current(session) {
                    Some(s) => s.on_fetch(result),
                    None => debug!(session, "dropping fetch result from an old session"),
                }
                vec![]
            }

            Message::DeleteCompleted { session, identity, result } => {
                if let Some(s) = self.current(session) {
                    s.on_delete(identity, result);
                    return vec![];
                }

                self.deleting.remove(&identity);
                if let Screen::Playing(s) = &mut self.screen {
                    s.forget_delete(&identity);
                }
                if let Err(err) = result {
                    warn!(session, pod = %identity, %err, "pod delete failed after its game ended");
                }
                vec![]
            }
        }
    }

    /// The running session, if `generation` is still the one on screen.
    fn current(&mut self, generation: u64) -> Option<&mut Session> {
        match &mut self.screen {
            Screen::Playing(s) if s.generation() == generation => Some(s),
            _ => None,
        }
    }

    fn on_key(&mut self, key: Key) -> Vec<Command> {
        let Screen::Playing(session) = &mut self.screen else {
            return match self.menu.on_key(key) {
                MenuAction::None => vec![],
                MenuAction::Run(cmd) => vec![cmd],
                MenuAction::StartGame => self.start_session(),
            };
        };

        if session.game().state() == GameState::Over {
            match key {
                Key::Char('r') => return self.start_session(),
                Key::Char('m') => {
                    self.leave_session();
                    self.menu.return_from_game();
                    return vec![];
                }
                _ => {}
            }
        }

        session.on_key(key)
    }

    fn start_session(&mut self) -> Vec<Command> {
        if self.provider.is_none() {
            warn!("cannot start a game without a provider");
            return vec![];
        }

        self.leave_session();
        self.generation += 1;
        let rng = SmallRng::seed_from_u64(self.rng.gen());
        let namespace = self.menu.namespace().map(str::to_owned);
        let pending = mem::take(&mut self.deleting);
        let (session, cmds) = Session::start(self.generation, &self.settings, namespace, pending, rng);
        self.screen = Screen::Playing(session);
        cmds
    }

    /// Back to the menu, keeping hold of the deletes the game left running.
    fn leave_session(&mut self) {
        if let Screen::Playing(session) = mem::replace(&mut self.screen, Screen::Menu) {
            self.deleting.extend(session.into_pending_deletes());
        }
    }
}
