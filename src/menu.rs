use tracing::{info, warn};

use crate::error::ProviderError;
use crate::message::{Command, Exit, Key};

pub const MAIN_ITEMS: [&str; 3] = ["Start Game", "Select Namespace", "Exit"];

/// Rows of the namespace list shown at once.
pub const NAMESPACE_WINDOW: usize = 15;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MenuState {
    Connecting,
    Main,
    NamespaceSelect,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuAction {
    None,
    Run(Command),
    StartGame,
}

/// The screens shown before and between games.
#[derive(Clone, Debug)]
pub struct Menu {
    state: MenuState,
    cursor: usize,
    namespaces: Vec<String>,
    namespace: Option<String>,
    cluster: Option<String>,
    ever_connected: bool,
    error: Option<String>,
}

impl Menu {
    pub fn new() -> Self {
        Menu {
            state: MenuState::Connecting,
            cursor: 0,
            namespaces: vec![],
            namespace: None,
            cluster: None,
            ever_connected: false,
            error: None,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// The namespace pods are drawn from, `None` for all of them.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn on_connected(&mut self, result: Result<String, ProviderError>) {
        match result {
            Ok(cluster) => {
                info!(%cluster, "connected");
                self.cluster = Some(cluster);
                self.ever_connected = true;
                self.error = None;
                self.enter(MenuState::Main);
            }
            Err(err) => {
                warn!(%err, "connection failed");
                self.cluster = None;
                self.error = Some(err.to_string());
                self.enter(MenuState::Error);
            }
        }
    }

    pub fn on_namespaces(&mut self, result: Result<Vec<String>, ProviderError>) {
        match result {
            Ok(namespaces) => {
                self.namespaces = namespaces;
                self.enter(MenuState::NamespaceSelect);
            }
            Err(err) => {
                warn!(%err, "listing namespaces failed");
                self.error = Some(err.to_string());
                self.enter(MenuState::Error);
            }
        }
    }

    /// Back to the main screen after a game, keeping the namespace choice.
    pub fn return_from_game(&mut self) {
        self.enter(MenuState::Main);
    }

    pub fn on_key(&mut self, key: Key) -> MenuAction {
        match self.state {
            MenuState::Connecting => match key {
                Key::Char('q') | Key::CtrlC => MenuAction::Run(Command::Quit(Exit::Normal)),
                _ => MenuAction::None,
            },
            MenuState::Main => self.on_main_key(key),
            MenuState::NamespaceSelect => self.on_namespace_key(key),
            MenuState::Error => match key {
                Key::Char('r') => {
                    self.error = None;
                    self.enter(MenuState::Connecting);
                    MenuAction::Run(Command::Connect)
                }
                Key::Char('q') | Key::Esc | Key::CtrlC => {
                    let exit = if self.ever_connected { Exit::Normal } else { Exit::ConnectionFailed };
                    MenuAction::Run(Command::Quit(exit))
                }
                _ => MenuAction::None,
            },
        }
    }

    fn on_main_key(&mut self, key: Key) -> MenuAction {
        match key {
            Key::Char('q') | Key::CtrlC => MenuAction::Run(Command::Quit(Exit::Normal)),
            Key::Up | Key::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                MenuAction::None
            }
            Key::Down | Key::Char('j') => {
                self.cursor = (self.cursor + 1).min(MAIN_ITEMS.len() - 1);
                MenuAction::None
            }
            Key::Enter => match self.cursor {
                0 => MenuAction::StartGame,
                1 => MenuAction::Run(Command::ListNamespaces),
                _ => MenuAction::Run(Command::Quit(Exit::Normal)),
            },
            _ => MenuAction::None,
        }
    }

    /// Row 0 is "all namespaces", the real ones follow.
    fn on_namespace_key(&mut self, key: Key) -> MenuAction {
        let rows = self.namespaces.len() + 1;

        match key {
            Key::Up | Key::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            Key::Down | Key::Char('j') => self.cursor = (self.cursor + 1).min(rows - 1),
            Key::Enter => {
                self.namespace = match self.cursor {
                    0 => None,
                    i => self.namespaces.get(i - 1).cloned(),
                };
                info!(namespace = ?self.namespace, "namespace selected");
                self.enter(MenuState::Main);
            }
            Key::Esc | Key::Char('q') => self.enter(MenuState::Main),
            Key::CtrlC => return MenuAction::Run(Command::Quit(Exit::Normal)),
            _ => {}
        }
        MenuAction::None
    }

    /// The slice of namespace rows to draw, as a start index and a length,
    /// keeping the cursor roughly centred.
    pub fn namespace_window(&self) -> (usize, usize) {
        let rows = self.namespaces.len() + 1;
        if rows <= NAMESPACE_WINDOW {
            return (0, rows);
        }

        let start = self.cursor.saturating_sub(NAMESPACE_WINDOW / 2);
        let start = start.min(rows - NAMESPACE_WINDOW);
        (start, NAMESPACE_WINDOW)
    }

    fn enter(&mut self, state: MenuState) {
        self.state = state;
        self.cursor = 0;
    }
}
