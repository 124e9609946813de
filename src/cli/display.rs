//! Terminal display and UI rendering
//!
//! Features:
//! - Trial progress for practice and main runs
//! - Playback / response status line
//! - Practice feedback and final threshold

use crate::presentation::RunKind;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{stdout, Result as IoResult, Write};

/// Text shown when the run ends
pub fn threshold_text(threshold: Option<f64>) -> String {
    match threshold {
        Some(t) => format!("Estimated threshold (mean of reversals): {:.2}", t),
        None => "Not enough reversals were obtained; no threshold was computed.".to_string(),
    }
}

/// Terminal display manager
pub struct Display {
    subject: String,
}

impl Display {
    pub fn new(subject: &str) -> Self {
        Display {
            subject: subject.to_string(),
        }
    }

    /// Clear screen
    pub fn clear(&self) -> IoResult<()> {
        let mut stdout = stdout();
        execute!(
            stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(())
    }

    /// Header line with subject and run progress
    pub fn show_progress(&self, kind: RunKind, trial: u32, trials: u32) -> IoResult<()> {
        let mut stdout = stdout();
        let label = match kind {
            RunKind::Practice => "Practice",
            RunKind::Main => "Test",
        };

        execute!(
            stdout,
            cursor::MoveTo(0, 1),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Cyan),
            Print(format!("Subject: {}", self.subject)),
            ResetColor,
            Print("  |  "),
            SetForegroundColor(Color::Magenta),
            Print(format!("{} trial {}/{}", label, trial, trials)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Single status line below the header
    pub fn show_status(&self, message: &str, color: Color) -> IoResult<()> {
        let mut stdout = stdout();
        execute!(
            stdout,
            cursor::MoveTo(0, 3),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(color),
            Print(message),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Practice feedback
    pub fn show_feedback(&self, correct: bool) -> IoResult<()> {
        let mut stdout = stdout();
        let (text, color) = if correct {
            ("Correct", Color::Green)
        } else {
            ("Incorrect", Color::Red)
        };
        execute!(
            stdout,
            cursor::MoveTo(0, 4),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(color),
            Print(text),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn clear_feedback(&self) -> IoResult<()> {
        let mut stdout = stdout();
        execute!(
            stdout,
            cursor::MoveTo(0, 4),
            terminal::Clear(ClearType::CurrentLine)
        )?;
        Ok(())
    }

    /// Final threshold summary
    pub fn show_threshold(&self, threshold: Option<f64>, reversals: u32) -> IoResult<()> {
        let mut stdout = stdout();
        execute!(
            stdout,
            cursor::MoveTo(0, 6),
            SetForegroundColor(Color::Blue),
            Print("─".repeat(50)),
            Print("\r\n"),
            ResetColor,
            SetForegroundColor(if threshold.is_some() {
                Color::Green
            } else {
                Color::Yellow
            }),
            Print(threshold_text(threshold)),
            ResetColor,
            Print(format!("\r\nReversals: {}\r\n", reversals)),
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Show help text
    pub fn show_help(&self) -> IoResult<()> {
        let mut stdout = stdout();

        execute!(
            stdout,
            cursor::MoveTo(0, 10),
            SetForegroundColor(Color::DarkGrey),
            Print("Press 1 or 3 for the odd tone  |  Esc to abort\r\n"),
            ResetColor
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Restore terminal state
    pub fn shutdown(&self) -> IoResult<()> {
        let mut stdout = stdout();
        execute!(stdout, cursor::MoveTo(0, 12), cursor::Show)?;
        terminal::disable_raw_mode()
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.shutdown();
    }
}
