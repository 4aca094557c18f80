use std::io::{stdin, IsTerminal};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers as Mod},
    terminal,
};

use crate::device::{Interrupt, InterruptSource};

/// Terminal keyboard, raising interrupt 1 for each key press.
///
/// The terminal is kept in raw mode for as long as this is alive, so keys arrive without waiting
/// for Enter. Raw mode is restored on drop.
#[derive(Debug)]
pub struct Keyboard {
    _raw: (),
}

/// Relevant part of a terminal event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Key {
    Byte(u8),
    CtrlC,
}

impl Keyboard {
    /// Returns `None` if stdin is not an interactive terminal or raw mode is unavailable.
    pub fn new() -> Option<Self> {
        if !stdin().is_terminal() {
            return None;
        }
        terminal::enable_raw_mode().ok()?;
        Some(Keyboard { _raw: () })
    }
}

impl Drop for Keyboard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl InterruptSource for Keyboard {
    /// Never blocks. Events which are not key presses are discarded.
    fn poll(&mut self) -> Option<Interrupt> {
        while event::poll(Duration::ZERO).ok()? {
            let Ok(event) = event::read() else {
                return None;
            };
            match Key::from_event(event) {
                Some(Key::Byte(byte)) => return Some(Interrupt::Keyboard(byte)),
                // No SIGINT in raw mode
                Some(Key::CtrlC) => {
                    let _ = terminal::disable_raw_mode();
                    println!();
                    std::process::exit(0);
                }
                None => continue,
            }
        }
        None
    }
}

impl Key {
    /// Key presses and repeats only. Anything outside ASCII has no byte to deliver.
    fn from_event(event: Event) -> Option<Key> {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press | KeyEventKind::Repeat,
            ..
        }) = event
        else {
            return None;
        };

        let byte = match code {
            KeyCode::Char('c') if modifiers == Mod::CONTROL => return Some(Key::CtrlC),
            KeyCode::Char(ch) if ch.is_ascii() && (modifiers - Mod::SHIFT).is_empty() => ch as u8,
            KeyCode::Enter => b'\n',
            KeyCode::Backspace => 0x08,
            KeyCode::Tab => b'\t',
            KeyCode::Esc => 0x1B,
            KeyCode::Delete => 0x7F,
            _ => return None,
        };
        Some(Key::Byte(byte))
    }
}
