//! Read-only projection over terminal history and screen content

use crate::error::{Error, Result};

/// Plain-text view of the terminal buffer.
///
/// History lines are scrolled-off content and immutable; screen lines are
/// the current display and may still be rewritten in place. All lines are
/// right-trimmed of ASCII space, horizontal tab and NUL.
pub trait ScrollbackView {
    /// Number of history lines (scrolled off the top of the screen).
    fn history_line_count(&self) -> usize;

    /// Number of visible screen rows.
    fn screen_row_count(&self) -> usize;

    /// History lines for `[start, end)`, oldest first.
    fn read_history_lines(&self, start: usize, end: usize) -> Result<Vec<String>>;

    /// Screen lines for `[start, end)`, top row first.
    fn read_screen_lines(&self, start: usize, end: usize) -> Result<Vec<String>>;
}

pub(crate) fn check_range(start: usize, end: usize, len: usize, what: &str) -> Result<()> {
    if start > end || end > len {
        return Err(Error::InvalidArgument(format!(
            "{what} range {start}..{end} outside 0..{len}"
        )));
    }
    Ok(())
}
