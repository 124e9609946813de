//! CLI Interface: terminal presentation of the experiment
//!
//! # Components
//! - `input.rs`: Keystroke capture using crossterm
//! - `display.rs`: Terminal rendering
//! - `player.rs`: TerminalPresenter (external player + keyboard)

pub mod display;
pub mod input;
pub mod player;

pub use display::Display;
pub use input::InputHandler;
pub use player::TerminalPresenter;
