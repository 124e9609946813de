//! Session Management: trial loop, response capture and record keeping
//!
//! # Components
//! - `orchestrator.rs`: SessionOrchestrator driving practice and main runs
//! - `record.rs`: TrialRecord and SubjectId
//! - `sink.rs`: DataSink trait, RecordTable and CSV export
//! - `window.rs`: ResponseWindow guard and latency measurement

pub mod orchestrator;
pub mod record;
pub mod sink;
pub mod window;

pub use orchestrator::{SessionOrchestrator, SessionPhase, SessionSummary};
pub use record::{SubjectId, TrialRecord, CSV_HEADER};
pub use sink::{export_file_name, DataSink, RecordTable};
pub use window::{Response, ResponseWindow};
