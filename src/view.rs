use crate::app::{App, Screen};
use crate::board::Position;
use crate::game::GameState;
use crate::menu::{Menu, MenuState, MAIN_ITEMS};
use crate::provider::Provider;
use crate::session::Session;

const SNAKE_BODY_CHAR: char = '█';
const POD_CHAR: char = 'O';
const DEAD_SNAKE_CHAR: char = 'X';
const EMPTY_CHAR: char = ' ';

const ACTIVITY_LINES: usize = 5;

pub type Frame = Vec<String>;

pub fn render<P: Provider>(app: &App<P>) -> Frame {
    match app.screen() {
        Screen::Menu => render_menu(app.menu(), app.config_label()),
        Screen::Playing(session) => {
            let cluster = app.provider().map_or("unknown", |p| p.cluster_name());
            render_game(session, cluster)
        }
    }
}

pub fn render_menu(menu: &Menu, config_label: &str) -> Frame {
    let mut lines: Frame = vec![
        "  p o d s n a k e".to_owned(),
        "  snake your way through the pods".to_owned(),
        String::new(),
    ];

    match menu.state() {
        MenuState::Connecting => {
            lines.push(format!("  connecting to cluster via {} ...", config_label));
        }
        MenuState::Error => {
            let reason = menu.error().unwrap_or("unknown error");
            let body = ["Failed to connect:", "", reason];
            lines.extend(boxed(&body));
            lines.push(String::new());
            lines.push("  [r] retry  [q] quit".to_owned());
        }
        MenuState::Main => {
            lines.push(format!("  cluster: {}", menu.cluster().unwrap_or("unknown")));
            lines.push(format!("  namespace: {}", menu.namespace().unwrap_or("all")));
            lines.push(format!("  config: {}", config_label));
            lines.push(String::new());

            let items: Vec<String> = MAIN_ITEMS
                .iter()
                .enumerate()
                .map(|(i, item)| cursor_row(i == menu.cursor(), item))
                .collect();
            lines.extend(boxed(&items));
            lines.push(String::new());
            lines.push("  [j/k] navigate  [enter] select".to_owned());
        }
        MenuState::NamespaceSelect => {
            lines.push("  Select Namespace".to_owned());
            lines.push(String::new());

            let (start, len) = menu.namespace_window();
            let rows: Vec<String> = std::iter::once("all namespaces")
                .chain(menu.namespaces().iter().map(String::as_str))
                .enumerate()
                .skip(start)
                .take(len)
                .map(|(i, ns)| cursor_row(i == menu.cursor(), ns))
                .collect();
            lines.extend(boxed(&rows));
            lines.push(String::new());
            lines.push("  [j/k] navigate  [enter] select  [esc] back".to_owned());
        }
    }

    lines
}

pub fn render_game(session: &Session, cluster: &str) -> Frame {
    let game = session.game();
    let mut lines = vec![format!(" podsnake :: cluster {}", cluster), String::new()];

    let board_top = lines.len();
    lines.extend(render_board(session));
    let board_rows = lines.len() - board_top;

    lines.push(String::new());

    let skip = session.activity().len().saturating_sub(ACTIVITY_LINES);
    lines.extend(session.activity().skip(skip).map(|a| format!("  {}", a)));
    lines.push(String::new());

    let state = match game.state() {
        GameState::Running => "running",
        GameState::Paused => "paused",
        GameState::Over => "GAME OVER",
    };
    let fetching = if session.fetch_in_flight() { " (fetching)" } else { "" };
    lines.push(format!(
        " score: {}  kills: {}  pods: {}/{}{}  deleting: {}  state: {}",
        game.score(),
        game.kill_count(),
        game.targets().len(),
        game.max_targets(),
        fetching,
        session.pending_deletes().len(),
        state
    ));
    lines.push(format!(
        " [wasd/arrows] move  [space] pause  [q] quit  ns:{}",
        session.namespace().unwrap_or("all")
    ));

    let center = (board_top + board_rows / 2, game.board().width() as usize / 2 + 1);
    match game.state() {
        GameState::Paused => {
            overlay(&mut lines, center, &["Paused", "Press space to resume", "or q to quit"]);
        }
        GameState::Over => {
            let score = format!("Score: {}", game.score());
            overlay(
                &mut lines,
                center,
                &["Game over!", &score, "", "r to play again,", "m for the menu", "or q to quit."],
            );
        }
        GameState::Running => {}
    }

    lines
}

/// The board with a one-cell border, the pods and the snake.
fn render_board(session: &Session) -> Frame {
    let game = session.game();
    let board = game.board();
    let (width, height) = (board.width() as usize, board.height() as usize);

    let mut grid = vec![vec![EMPTY_CHAR; width]; height];
    let mut put = |p: Position, ch: char| {
        if board.contains(p) {
            grid[p.y as usize][p.x as usize] = ch;
        }
    };

    for target in game.targets() {
        put(target.pos, POD_CHAR);
    }

    let snake = game.snake();
    let dead = game.state() == GameState::Over;
    for (i, pos) in snake.body().iter().enumerate().rev() {
        let ch = match (dead, i) {
            (true, _) => DEAD_SNAKE_CHAR,
            (false, 0) => snake.head_char(),
            (false, _) => SNAKE_BODY_CHAR,
        };
        put(*pos, ch);
    }

    let edge = format!("+{}+", "-".repeat(width));
    let mut lines = Vec::with_capacity(height + 2);
    lines.push(edge.clone());
    lines.extend(grid.into_iter().map(|row| {
        let mut line = String::with_capacity(width + 2);
        line.push('|');
        line.extend(row);
        line.push('|');
        line
    }));
    lines.push(edge);
    lines
}

fn cursor_row(selected: bool, label: &str) -> String {
    if selected {
        format!("> {}", label)
    } else {
        format!("  {}", label)
    }
}

/// Draws `body` inside a rounded-off frame, indented two columns.
fn boxed<S: AsRef<str>>(body: &[S]) -> Frame {
    let inner = body.iter().map(|l| l.as_ref().chars().count()).max().unwrap_or(0) + 4;
    let mut lines = Vec::with_capacity(body.len() + 4);

    lines.push(format!("  .{}.", "-".repeat(inner)));
    lines.push(format!("  |{}|", " ".repeat(inner)));
    for line in body {
        let line = line.as_ref();
        let pad = inner - 2 - line.chars().count();
        lines.push(format!("  |  {}{}|", line, " ".repeat(pad)));
    }
    lines.push(format!("  |{}|", " ".repeat(inner)));
    lines.push(format!("  '{}'", "-".repeat(inner)));
    lines
}

/// Paints a centred message box over `lines`, `center` being (row, column).
fn overlay(lines: &mut Frame, center: (usize, usize), message: &[&str]) {
    let msg_height = message.len() + 2;
    let msg_width = message.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 2;
    let top = center.0.saturating_sub(msg_height / 2);
    let left = center.1.saturating_sub(msg_width / 2);

    for row in 0..msg_height {
        let text = match row {
            0 => String::new(),
            r if r == msg_height - 1 => String::new(),
            r => message[r - 1].to_owned(),
        };
        let padded = format!("{:^width$}", text, width = msg_width);

        let y = top + row;
        while lines.len() <= y {
            lines.push(String::new());
        }

        let mut chars: Vec<char> = lines[y].chars().collect();
        if chars.len() < left + msg_width {
            chars.resize(left + msg_width, ' ');
        }
        for (dx, ch) in padded.chars().enumerate() {
            chars[left + dx] = ch;
        }
        lines[y] = chars.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Identity;
    use crate::error::ProviderError;
    use crate::message::Key;
    use crate::session::SessionSettings;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn session() -> Session {
        let settings = SessionSettings { width: 12, height: 6, max_targets: 3, tick_rate: Duration::from_millis(100) };
        Session::start(1, &settings, None, Default::default(), SmallRng::seed_from_u64(1)).0
    }

    #[test]
    fn board_has_border_and_snake() {
        let frame = render_game(&session(), "demo");

        assert_eq!(frame[0], " podsnake :: cluster demo");
        assert_eq!(frame[2], "+------------+");
        assert_eq!(frame[9], "+------------+");
        // Snake starts at (3, 3) facing right, body trailing left.
        assert_eq!(frame[6], "| ██>        |");
        assert!(frame.iter().any(|l| l.contains("score: 0  kills: 0  pods: 0/3 (fetching)  deleting: 0  state: running")));
        assert!(frame.iter().any(|l| l.ends_with("ns:all")));
    }

    #[test]
    fn pods_and_activity_show_up() {
        let mut s = session();
        s.on_fetch(Ok(Some(Identity::new("apps", "web-1"))));
        for i in 0..7 {
            s.on_delete(Identity::new("apps", format!("p{}", i)), Err(ProviderError::Unavailable("down".to_owned())));
        }

        let frame = render_game(&s, "demo");
        assert_eq!(frame.iter().map(|l| l.matches(POD_CHAR).count()).sum::<usize>(), 1);

        let failed: Vec<_> = frame.iter().filter(|l| l.contains("FAILED")).collect();
        assert_eq!(failed.len(), ACTIVITY_LINES);
        assert!(failed[0].contains("apps/p2"));
        assert!(failed[4].contains("apps/p6"));
    }

    #[test]
    fn pause_and_game_over_overlays() {
        let mut s = session();
        s.on_key(Key::Char(' '));
        let frame = render_game(&s, "demo");
        assert!(frame.iter().any(|l| l.contains("Paused")));
        assert!(frame.iter().any(|l| l.contains("state: paused")));

        s.on_key(Key::Char(' '));
        s.on_key(Key::Up);
        for _ in 0..10 {
            s.on_tick();
        }
        let frame = render_game(&s, "demo");
        assert!(frame.iter().any(|l| l.contains("Game over!")));
        assert!(frame.iter().any(|l| l.contains("GAME OVER")));
        assert!(render_board(&s).iter().any(|l| l.contains(DEAD_SNAKE_CHAR)));
    }

    #[test]
    fn overlay_is_centred_and_keeps_the_rest() {
        let mut lines: Frame = vec!["abcdefghij".to_owned(); 5];
        overlay(&mut lines, (2, 5), &["hi"]);

        assert_eq!(lines[0], "abcdefghij");
        assert_eq!(lines[1], "abc    hij");
        assert_eq!(lines[2], "abc hi hij");
        assert_eq!(lines[3], "abc    hij");
        assert_eq!(lines[4], "abcdefghij");
    }

    #[test]
    fn menu_screens() {
        let mut menu = Menu::new();
        let frame = render_menu(&menu, "/etc/podsnake.yaml");
        assert!(frame.iter().any(|l| l.contains("connecting to cluster via /etc/podsnake.yaml")));

        menu.on_connected(Ok("demo".to_owned()));
        let frame = render_menu(&menu, "defaults");
        assert!(frame.iter().any(|l| l.contains("cluster: demo")));
        assert!(frame.iter().any(|l| l.contains("namespace: all")));
        assert!(frame.iter().any(|l| l.contains("> Start Game")));
        assert!(frame.iter().any(|l| l.contains("  Exit")));

        menu.on_namespaces(Ok(vec!["apps".to_owned()]));
        let frame = render_menu(&menu, "defaults");
        assert!(frame.iter().any(|l| l.contains("> all namespaces")));
        assert!(frame.iter().any(|l| l.contains("  apps")));

        menu.on_namespaces(Err(ProviderError::Unavailable("gone".to_owned())));
        let frame = render_menu(&menu, "defaults");
        assert!(frame.iter().any(|l| l.contains("provider unavailable: gone")));
        assert!(frame.iter().any(|l| l.contains("[r] retry  [q] quit")));
    }
}
