//! Session state machine, replay, events and the async driver

pub mod controller;
pub mod events;
pub mod logger;
pub mod phase;
pub mod replay;
pub mod runtime;

pub use controller::{ApplyOutcome, SessionController};
pub use events::{EventRecorder, SessionEvent, SessionObserver};
pub use logger::{LogEntry, OutputMode, SessionLogger, VerbosityLevel, LOG_BUFFER_CAPACITY};
pub use phase::{ReplayState, SessionPhase};
pub use runtime::{SessionCommand, SessionRuntime};
