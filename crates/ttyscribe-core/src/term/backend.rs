//! Terminal model backed by alacritty_terminal.
//!
//! ANSI/VT parsing is done by the vte `Processor`; screen, cursor and
//! scrollback live in alacritty's `Term` grid (negative line indices are
//! history). SGR styling is parsed by the emulator and discarded here; the
//! capture layer only ever sees plain text.

use alacritty_terminal::event::{Event as TermEvent, EventListener};
use alacritty_terminal::grid::Dimensions;
use alacritty_terminal::index::Line;
use alacritty_terminal::term::cell::Flags;
use alacritty_terminal::term::{Config as TermConfig, Term, TermMode};
use alacritty_terminal::vte::ansi::Processor;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::term::damage::{DamageEvent, DamageListener};
use crate::term::scanner::RedrawScanner;
use crate::term::view::{check_range, ScrollbackView};
use crate::term::{TerminalModel, TerminalSnapshot};

/// Screen geometry handed to `Term::new` / `Term::resize`.
///
/// `total_lines` is screen plus scrollback capacity; alacritty sizes its
/// history ring from the difference.
struct TermSize {
    cols: usize,
    rows: usize,
    history: usize,
}

impl Dimensions for TermSize {
    fn total_lines(&self) -> usize {
        self.rows + self.history
    }

    fn screen_lines(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.cols
    }
}

/// Listener for events raised by the emulator (bell, title, clipboard).
/// The capture pipeline has no use for them; they are drained after each
/// feed so the channel never grows.
struct EventProxy {
    sender: mpsc::UnboundedSender<TermEvent>,
}

impl EventListener for EventProxy {
    fn send_event(&self, event: TermEvent) {
        let _ = self.sender.send(event);
    }
}

/// Terminal model over an alacritty `Term`.
pub struct AlacrittyModel {
    term: Term<EventProxy>,
    parser: Processor,
    scanner: RedrawScanner,
    term_events: mpsc::UnboundedReceiver<TermEvent>,
    listeners: Vec<Box<dyn DamageListener + Send>>,
    cols: u16,
    rows: u16,
    max_history: usize,
}

impl AlacrittyModel {
    /// Create a model with the given screen size and scrollback capacity.
    pub fn new(cols: u16, rows: u16, max_history: usize) -> Result<Self> {
        if cols == 0 || rows == 0 {
            return Err(Error::InvalidArgument(format!(
                "cols/rows must be positive, got {cols}x{rows}"
            )));
        }
        if max_history == 0 {
            return Err(Error::InvalidArgument(
                "max_history must be positive".to_string(),
            ));
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut config = TermConfig::default();
        config.scrolling_history = max_history;
        let size = TermSize {
            cols: cols as usize,
            rows: rows as usize,
            history: max_history,
        };
        let term = Term::new(config, &size, EventProxy { sender: event_tx });

        Ok(Self {
            term,
            parser: Processor::new(),
            scanner: RedrawScanner::new(),
            term_events: event_rx,
            listeners: Vec::new(),
            cols,
            rows,
            max_history,
        })
    }

    fn alternate_screen(&self) -> bool {
        self.term.mode().contains(TermMode::ALT_SCREEN)
    }

    /// Deliver one damage event to every listener in registration order.
    /// A failing listener is logged and does not block the others.
    fn dispatch(&mut self, damage: DamageEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        let mut listeners = std::mem::take(&mut self.listeners);
        {
            let view = GridScrollback { term: &self.term };
            for listener in listeners.iter_mut() {
                if let Err(err) = listener.on_damage(&view, &snapshot, &damage) {
                    warn!(error = %err, "damage listener failed");
                }
            }
        }
        self.listeners = listeners;
    }
}

impl TerminalModel for AlacrittyModel {
    fn feed(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let flags = self.scanner.scan(bytes);
        let was_alt = self.alternate_screen();

        self.parser.advance(&mut self.term, bytes);

        // Emulator-side events (bell, title, clipboard) have no transcript
        // meaning; drain them so the channel stays empty.
        let mut drained = 0usize;
        while self.term_events.try_recv().is_ok() {
            drained += 1;
        }
        if drained > 0 {
            debug!(count = drained, "discarded emulator events");
        }

        let full_redraw =
            flags.full_clear || flags.buffer_switch || was_alt != self.alternate_screen();
        let rows = self.rows as usize;
        let damage = if full_redraw {
            DamageEvent::full(rows)
        } else {
            DamageEvent::partial(0, rows)
        };
        self.dispatch(damage);
    }

    fn snapshot(&self) -> TerminalSnapshot {
        let cursor = self.term.grid().cursor.point;
        TerminalSnapshot {
            timestamp: Utc::now(),
            cols: self.cols,
            rows: self.rows,
            cursor_row: cursor.line.0.max(0) as usize,
            cursor_col: cursor.column.0,
            alternate_screen: self.alternate_screen(),
        }
    }

    fn scrollback(&self) -> Box<dyn ScrollbackView + '_> {
        Box::new(GridScrollback { term: &self.term })
    }

    fn resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        if cols == 0 || rows == 0 {
            return Err(Error::InvalidArgument(format!(
                "cols/rows must be positive, got {cols}x{rows}"
            )));
        }
        if cols == self.cols && rows == self.rows {
            return Ok(());
        }

        self.cols = cols;
        self.rows = rows;
        self.term.resize(TermSize {
            cols: cols as usize,
            rows: rows as usize,
            history: self.max_history,
        });
        debug!(cols, rows, "terminal resized");

        let rows = rows as usize;
        self.dispatch(DamageEvent::full(rows));
        Ok(())
    }

    fn subscribe(&mut self, listener: Box<dyn DamageListener + Send>) {
        self.listeners.push(listener);
    }
}

/// Plain-text projection of the grid. History lines map to negative buffer
/// indices (`-history .. -1`), screen rows to `0 .. rows-1`.
struct GridScrollback<'a> {
    term: &'a Term<EventProxy>,
}

impl GridScrollback<'_> {
    fn line_text(&self, line: Line) -> String {
        let row = &self.term.grid()[line];
        // Wide chars (CJK, emoji) occupy two cells; the spacer cell would
        // inject a stray character into the text.
        let text: String = row
            .into_iter()
            .filter(|cell| !cell.flags.contains(Flags::WIDE_CHAR_SPACER))
            .map(|cell| cell.c)
            .collect();
        text.trim_end_matches([' ', '\t', '\0']).to_string()
    }
}

impl ScrollbackView for GridScrollback<'_> {
    fn history_line_count(&self) -> usize {
        self.term.grid().history_size()
    }

    fn screen_row_count(&self) -> usize {
        self.term.grid().screen_lines()
    }

    fn read_history_lines(&self, start: usize, end: usize) -> Result<Vec<String>> {
        let history = self.history_line_count();
        check_range(start, end, history, "history")?;
        let mut out = Vec::with_capacity(end - start);
        for index in start..end {
            // index 0 is the oldest history line
            out.push(self.line_text(Line(index as i32 - history as i32)));
        }
        Ok(out)
    }

    fn read_screen_lines(&self, start: usize, end: usize) -> Result<Vec<String>> {
        check_range(start, end, self.screen_row_count(), "screen")?;
        let mut out = Vec::with_capacity(end - start);
        for index in start..end {
            out.push(self.line_text(Line(index as i32)));
        }
        Ok(out)
    }
}
