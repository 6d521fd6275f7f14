//! Damage notification protocol between the terminal model and listeners

use chrono::{DateTime, Utc};

use crate::term::view::ScrollbackView;
use crate::term::TerminalSnapshot;

/// Notification that terminal state changed and listeners should re-read
/// the view. The row range is coarse: it covers at least the touched rows
/// and may conservatively cover the whole screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    pub timestamp: DateTime<Utc>,
    /// First changed row (inclusive)
    pub changed_row_start: usize,
    /// Last changed row (exclusive)
    pub changed_row_end: usize,
    /// True for full screen clears, buffer switches and resizes
    pub full_redraw: bool,
}

impl DamageEvent {
    /// Full-redraw damage covering the whole screen.
    pub fn full(rows: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            changed_row_start: 0,
            changed_row_end: rows,
            full_redraw: true,
        }
    }

    /// Partial damage for the given row range.
    pub fn partial(start: usize, end: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            changed_row_start: start,
            changed_row_end: end,
            full_redraw: false,
        }
    }
}

/// Listener invoked after each terminal state change.
///
/// The view and snapshot are only valid for the duration of the call. A
/// returned error is logged by the model and does not stop delivery to the
/// remaining listeners.
pub trait DamageListener {
    fn on_damage(
        &mut self,
        view: &dyn ScrollbackView,
        snapshot: &TerminalSnapshot,
        damage: &DamageEvent,
    ) -> anyhow::Result<()>;
}
