use std::collections::HashSet;
use std::time::Duration;

use crate::error::ProviderError;
use crate::game::Identity;

/// Keys the game cares about, already decoded from the terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    CtrlC,
    Char(char),
}

#[derive(Debug)]
pub enum Message<P> {
    Key(Key),
    /// Game clock. `session` is the generation of the session that asked for it.
    Tick { session: u64 },
    Connected(Result<P, ProviderError>),
    NamespacesLoaded(Result<Vec<String>, ProviderError>),
    FetchCompleted {
        session: u64,
        result: Result<Option<Identity>, ProviderError>,
    },
    DeleteCompleted {
        session: u64,
        identity: Identity,
        result: Result<(), ProviderError>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Connect,
    ListNamespaces,
    Fetch {
        session: u64,
        namespace: Option<String>,
        exclude: HashSet<Identity>,
    },
    Delete {
        session: u64,
        identity: Identity,
    },
    ScheduleTick {
        session: u64,
        after: Duration,
    },
    Quit(Exit),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    Normal,
    /// The user gave up after the provider could not be reached.
    ConnectionFailed,
}

impl Exit {
    pub fn code(self) -> i32 {
        match self {
            Exit::Normal => 0,
            Exit::ConnectionFailed => 1,
        }
    }
}
