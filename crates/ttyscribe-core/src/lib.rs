//! ttyscribe-core: clean transcripts from interactive terminal programs.
//!
//! Architecture: portable-pty (process) + alacritty_terminal (emulation) +
//! capture engine (churn-suppressed transcript extraction)
//!
//! Raw PTY bytes flow into a terminal model that maintains screen and
//! scrollback state; each feed raises a damage notification; the capture
//! engine turns damage into append-only transcript events, emitting history
//! lines immediately and screen rows once they stop changing, while
//! suppressing spinner/progress churn.
//!
//! # Components
//! - `term`: terminal model, scrollback view, damage protocol
//! - `capture`: capture engine and churn filter
//! - `session`: PTY child + worker wiring + transcript queue

pub mod capture;
pub mod error;
pub mod events;
pub mod pty;
pub mod queue;
pub mod session;
pub mod term;

pub use capture::{
    CaptureConfig, CaptureEngine, CaptureEngineState, ChurnFilterPolicy, DefaultChurnFilter,
};
pub use error::{Error, Result};
pub use events::{EventKind, EventSource, TranscriptEvent, WireEvent, WireMeta};
pub use pty::{PtyProcess, PtyProcessConfig};
pub use queue::TranscriptQueue;
pub use session::{CapturePump, Session, SessionOptions};
pub use term::{
    AlacrittyModel, DamageEvent, DamageListener, ScrollbackView, TerminalModel, TerminalSnapshot,
};
