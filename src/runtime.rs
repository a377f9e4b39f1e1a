//! The event loop and the executor behind it.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::app::App;
use crate::config::Config;
use crate::message::{Command, Exit, Message};
use crate::provider::{with_deadline, Provider};
use crate::term::{self, TermManager};
use crate::view;

/// Runs provider calls and timers on behalf of the event loop.
pub struct Dispatcher<P> {
    tx: UnboundedSender<Message<P>>,
    config: Arc<Config>,
}

impl<P: Provider> Dispatcher<P> {
    pub fn new(tx: UnboundedSender<Message<P>>, config: Arc<Config>) -> Self {
        Dispatcher { tx, config }
    }

    /// Starts the work behind `cmd` and returns immediately. `Quit` is the
    /// caller's job and is ignored here.
    pub fn execute(&self, cmd: Command, provider: Option<&P>) {
        let tx = self.tx.clone();
        let timeout = self.config.request_timeout();

        match cmd {
            Command::Connect => {
                let config = Arc::clone(&self.config);
                tokio::spawn(async move {
                    let result = with_deadline(timeout, P::connect(&config)).await;
                    let _ = tx.send(Message::Connected(result));
                });
            }

            Command::ListNamespaces => {
                let Some(provider) = provider.cloned() else {
                    debug!("no provider, not listing namespaces");
                    return;
                };
                let timeout = self.config.namespace_timeout();
                tokio::spawn(async move {
                    let result = with_deadline(timeout, provider.list_namespaces()).await;
                    let _ = tx.send(Message::NamespacesLoaded(result));
                });
            }

            Command::Fetch { session, namespace, exclude } => {
                let Some(provider) = provider.cloned() else {
                    debug!(session, "no provider, dropping fetch");
                    return;
                };
                tokio::spawn(async move {
                    let result = with_deadline(timeout, provider.pick_random(namespace, exclude)).await;
                    let _ = tx.send(Message::FetchCompleted { session, result });
                });
            }

            Command::Delete { session, identity } => {
                let Some(provider) = provider.cloned() else {
                    debug!(session, pod = %identity, "no provider, dropping delete");
                    return;
                };
                tokio::spawn(async move {
                    let result = with_deadline(timeout, provider.delete(identity.clone())).await;
                    let _ = tx.send(Message::DeleteCompleted { session, identity, result });
                });
            }

            Command::ScheduleTick { session, after } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(Message::Tick { session });
                });
            }

            Command::Quit(_) => {}
        }
    }
}

/// Feeds messages to `app` until a `Quit` comes out, running every other
/// command through `dispatcher` and calling `draw` after each message.
pub async fn drive<P, D>(
    app: &mut App<P>,
    initial: Vec<Command>,
    dispatcher: &Dispatcher<P>,
    rx: &mut UnboundedReceiver<Message<P>>,
    mut draw: D,
) -> Result<Exit>
where
    P: Provider,
    D: FnMut(&App<P>) -> Result<()>,
{
    let mut pending = initial;

    loop {
        for cmd in pending.drain(..) {
            if let Command::Quit(exit) = cmd {
                info!(?exit, "quitting");
                return Ok(exit);
            }
            dispatcher.execute(cmd, app.provider());
        }

        draw(app)?;

        let Some(msg) = rx.recv().await else {
            // Every sender is gone, nothing can wake us up again.
            return Ok(Exit::Normal);
        };
        pending = app.update(msg);
    }
}

/// Reads terminal events on a dedicated thread and forwards the decoded keys.
fn spawn_input<P: Send + 'static>(tx: UnboundedSender<Message<P>>) {
    std::thread::spawn(move || loop {
        match crossterm::event::read() {
            Ok(event) => {
                if let Some(key) = term::decode(event) {
                    if tx.send(Message::Key(key)).is_err() {
                        break;
                    }
                }
            }
            Err(err) => {
                tracing::error!(%err, "reading terminal input failed");
                break;
            }
        }
    });
}

/// Runs the whole interactive program on the current terminal.
pub async fn run<P: Provider>(config: Config, config_label: String) -> Result<Exit> {
    let config = Arc::new(config);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(tx.clone(), Arc::clone(&config));
    let (mut app, initial) = App::<P>::new(&config, config_label);

    let mut term = TermManager::new();
    term.setup().context("failed to set up the terminal")?;
    spawn_input(tx);

    let result = drive(&mut app, initial, &dispatcher, &mut rx, |app| {
        term.draw(&view::render(app)).context("failed to draw")
    })
    .await;

    term.restore().context("failed to restore the terminal")?;
    result
}
