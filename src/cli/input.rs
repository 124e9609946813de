//! Keystroke input handling using crossterm
//!
//! Features:
//! - Non-blocking keystroke polling, awaited cooperatively
//! - `1` / `3` select an interval
//! - Esc and Ctrl+C abort the session

use crate::sequencer::Interval;
use crossterm::event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::Result as IoResult;
use std::time::Duration;

/// Handles subject input from the terminal
pub struct InputHandler {
    /// Sleep between polls while waiting for a key
    poll_interval: Duration,
}

impl InputHandler {
    /// Create new input handler polling every 10ms
    pub fn new() -> Self {
        InputHandler {
            poll_interval: Duration::from_millis(10),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Enable raw mode for terminal input
    pub fn enable_raw_mode() -> IoResult<()> {
        crossterm::terminal::enable_raw_mode()
    }

    /// Disable raw mode and restore terminal
    pub fn disable_raw_mode() -> IoResult<()> {
        crossterm::terminal::disable_raw_mode()
    }

    /// Return a pending key press without blocking
    pub fn try_read_key(&self) -> IoResult<Option<KeyEvent>> {
        while event::poll(Duration::ZERO)? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(key));
                }
            }
        }
        Ok(None)
    }

    /// Discard everything typed so far
    pub fn drain(&self) -> IoResult<usize> {
        let mut dropped = 0;
        while event::poll(Duration::ZERO)? {
            event::read()?;
            dropped += 1;
        }
        Ok(dropped)
    }

    /// Check if key event is an exit signal (Ctrl+C or Escape)
    pub fn is_exit(key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => true,
            KeyCode::Esc => true,
            _ => false,
        }
    }

    /// Map a key to the interval it selects
    pub fn key_to_choice(key: &KeyEvent) -> Option<Interval> {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        match key.code {
            KeyCode::Char('1') => Some(Interval::First),
            KeyCode::Char('3') => Some(Interval::Third),
            _ => None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
