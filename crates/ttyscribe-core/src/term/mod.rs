//! Terminal model: raw PTY bytes in, screen + scrollback state out
//!
//! Architecture: alacritty_terminal (VT parsing, grid, history) + damage
//! fan-out to registered listeners. The capture engine consumes damage
//! notifications synchronously; views handed to listeners borrow the model
//! and cannot outlive the dispatch.

mod backend;
mod damage;
mod scanner;
mod view;

pub use backend::AlacrittyModel;
pub use damage::{DamageEvent, DamageListener};
pub use view::ScrollbackView;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// Immutable snapshot of terminal state for capture decisions.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cols: u16,
    pub rows: u16,
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub alternate_screen: bool,
}

/// Terminal model contract.
///
/// Isolates the capture layer from the emulation backend; an alternative
/// engine can be substituted by implementing this trait. All calls must be
/// serialized on a single worker (see the session module).
pub trait TerminalModel: Send {
    /// Consume a chunk of the PTY byte stream. Arbitrary chunking is
    /// tolerated, including escape sequences split across calls. Fires at
    /// most one damage notification. Parse failures are recovered
    /// internally, never surfaced.
    fn feed(&mut self, bytes: &[u8]);

    /// Current geometry, cursor and buffer mode.
    fn snapshot(&self) -> TerminalSnapshot;

    /// Read-only view over history and screen content.
    fn scrollback(&self) -> Box<dyn ScrollbackView + '_>;

    /// Reflow to a new geometry. No-op (and no damage) when unchanged;
    /// otherwise fires a full-redraw damage event.
    fn resize(&mut self, cols: u16, rows: u16) -> Result<()>;

    /// Register a damage listener. Delivery follows registration order.
    fn subscribe(&mut self, listener: Box<dyn DamageListener + Send>);
}
