//! Agent host - the conversation-and-tool-dispatch core.
//!
//! This crate owns the cycle: assemble bounded history plus the new message
//! into one model request, parse the response into text and tool
//! invocations, execute each invocation in order against the right executor,
//! and log everything to the transcript, action log, and durable history.

pub mod context;
pub mod dispatcher;
pub mod history;
pub mod session;
pub mod transcript;

pub use context::ContextBuilder;
pub use dispatcher::{CycleOutcome, CycleReport, Dispatcher};
pub use history::{ExportFormat, HistoryError, HistoryStore};
pub use session::{Session, SessionError};
pub use transcript::{ActionLog, ActionLogEntry, Transcript};
