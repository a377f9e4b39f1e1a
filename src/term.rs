use std::io::{self, Stdout, Write, stdout};

use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::message::Key;
use crate::view::Frame;

pub struct TermManager {
    stdout: Stdout,
    active: bool,
}

impl TermManager {
    pub fn new() -> Self {
        TermManager { stdout: stdout(), active: false }
    }

    pub fn setup(&mut self) -> io::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        self.active = true;
        self.set_raw_mode(true)?;
        self.set_cursor_visibility(false)?;
        self.set_cursor_blink(false)?;
        self.clear()
    }

    /// Puts the terminal back the way it was. Safe to call more than once.
    pub fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        self.set_raw_mode(false)?;
        self.set_cursor_visibility(true)?;
        self.set_cursor_blink(true)?;
        execute!(self.stdout, LeaveAlternateScreen)
    }

    /// Writes a whole frame, blanking whatever the previous one left behind.
    pub fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        for (y, line) in frame.iter().enumerate() {
            queue!(
                self.stdout,
                cursor::MoveTo(0, y as u16),
                style::Print(line),
                terminal::Clear(ClearType::UntilNewLine)
            )?;
        }
        queue!(
            self.stdout,
            cursor::MoveTo(0, frame.len() as u16),
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        self.flush()
    }

    pub fn clear(&mut self) -> io::Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn set_raw_mode(&self, option: bool) -> io::Result<()> {
        if option {
            terminal::enable_raw_mode()
        } else {
            terminal::disable_raw_mode()
        }
    }

    fn set_cursor_blink(&mut self, option: bool) -> io::Result<()> {
        if option {
            execute!(self.stdout, cursor::EnableBlinking)
        } else {
            execute!(self.stdout, cursor::DisableBlinking)
        }
    }

    fn set_cursor_visibility(&mut self, option: bool) -> io::Result<()> {
        if option {
            execute!(self.stdout, cursor::Show)
        } else {
            execute!(self.stdout, cursor::Hide)
        }
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Maps a terminal event to a key the app understands. Releases, repeats and
/// anything that isn't a key are dropped.
pub fn decode(event: Event) -> Option<Key> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => decode_key(key),
        _ => None,
    }
}

fn decode_key(ev: KeyEvent) -> Option<Key> {
    if is_ctrl_c(&ev) {
        return Some(Key::CtrlC);
    }

    match ev.code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Char(c) => Some(Key::Char(c.to_ascii_lowercase())),
        _ => None,
    }
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn decodes_arrows_letters_and_ctrl_c() {
        assert_eq!(decode(press(KeyCode::Up, KeyModifiers::NONE)), Some(Key::Up));
        assert_eq!(decode(press(KeyCode::Enter, KeyModifiers::NONE)), Some(Key::Enter));
        assert_eq!(decode(press(KeyCode::Char('W'), KeyModifiers::SHIFT)), Some(Key::Char('w')));
        assert_eq!(decode(press(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(Key::CtrlC));
        assert_eq!(decode(press(KeyCode::Char('c'), KeyModifiers::NONE)), Some(Key::Char('c')));
        assert_eq!(decode(press(KeyCode::F(1), KeyModifiers::NONE)), None);
    }

    #[test]
    fn ignores_releases_and_other_events() {
        let release = KeyEvent {
            code: KeyCode::Up,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(decode(Event::Key(release)), None);
        assert_eq!(decode(Event::Resize(80, 24)), None);
        assert_eq!(decode(Event::FocusGained), None);
    }
}
