//! Adaptive staircase: two-down/one-up step control
//!
//! # Components
//! - `state.rs`: StaircaseState owned by the controller
//! - `controller.rs`: StaircaseController, reversal detection and termination

pub mod controller;
pub mod state;

pub use controller::{StaircaseController, StaircaseParams, StepOutcome};
pub use state::{Outcome, StaircaseState};
