//! Capture engine: converts damage notifications into transcript events.
//!
//! Two signals feed the transcript:
//! - history lines (scrolled off the top, committed) are emitted immediately
//! - screen rows are emitted once unchanged for the stability window
//!
//! A churn filter drops spinner/progress animation, and 64-bit line
//! fingerprints deduplicate content across both signals. The engine is
//! purely reactive: it owns no timers and measures stability in wall-clock
//! time at each `on_damage` invocation.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::capture::churn::ChurnFilterPolicy;
use crate::error::Result;
use crate::events::{EventSource, TranscriptEvent};
use crate::term::{DamageEvent, ScrollbackView, TerminalSnapshot};

/// Capture tuning. Values are fixed for the life of a session.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Bottom screen rows excluded from stability emission (the
    /// status/spinner band most TUIs pin there).
    pub volatile_row_count: usize,
    /// How long a screen row must stay unchanged before it is emitted.
    pub stability_window: Duration,
    /// Inhibit screen-stability emission while the alternate buffer is
    /// active; history emission is unaffected.
    pub suppress_alternate_screen: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            volatile_row_count: 2,
            stability_window: Duration::from_millis(350),
            suppress_alternate_screen: true,
        }
    }
}

/// Observable engine state for tests and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEngineState {
    /// Next history line index to consider for emission
    pub last_emitted_history_index: usize,
    /// Bumped on every full-redraw damage; namespaces row bookkeeping
    pub epoch: u64,
    /// Screen rows currently tracked for stability
    pub tracked_rows: usize,
    /// Distinct line fingerprints emitted so far
    pub emitted_fingerprints: usize,
}

/// How many recent values to remember per row for the churn filter's
/// update-frequency heuristic.
const ROW_SAMPLE_CAPACITY: usize = 8;

struct RowState {
    content: String,
    first_seen: Instant,
    emitted: bool,
    samples: Vec<String>,
}

impl RowState {
    fn new(content: String, now: Instant) -> Self {
        Self {
            samples: vec![content.clone()],
            content,
            first_seen: now,
            emitted: false,
        }
    }

    fn replace(&mut self, content: String, now: Instant) {
        self.samples.push(content.clone());
        if self.samples.len() > ROW_SAMPLE_CAPACITY {
            self.samples.remove(0);
        }
        self.content = content;
        self.first_seen = now;
        self.emitted = false;
    }
}

/// Stateful transformer from damage notifications to transcript events.
pub struct CaptureEngine {
    config: CaptureConfig,
    churn: Box<dyn ChurnFilterPolicy>,
    last_emitted_history_index: usize,
    epoch: u64,
    row_state: HashMap<(u64, usize), RowState>,
    emitted_hashes: HashSet<u64>,
}

impl CaptureEngine {
    pub fn new(config: CaptureConfig, churn: Box<dyn ChurnFilterPolicy>) -> Self {
        Self {
            config,
            churn,
            last_emitted_history_index: 0,
            epoch: 0,
            row_state: HashMap::new(),
            emitted_hashes: HashSet::new(),
        }
    }

    /// Handle a damage notification and produce transcript events, history
    /// first, then stabilized screen rows top to bottom.
    pub fn on_damage(
        &mut self,
        view: &dyn ScrollbackView,
        snapshot: &TerminalSnapshot,
        damage: &DamageEvent,
    ) -> Result<Vec<TranscriptEvent>> {
        self.on_damage_at(view, snapshot, damage, Instant::now())
    }

    /// Snapshot of the engine's bookkeeping.
    pub fn current_state(&self) -> CaptureEngineState {
        CaptureEngineState {
            last_emitted_history_index: self.last_emitted_history_index,
            epoch: self.epoch,
            tracked_rows: self.row_state.len(),
            emitted_fingerprints: self.emitted_hashes.len(),
        }
    }

    pub(crate) fn on_damage_at(
        &mut self,
        view: &dyn ScrollbackView,
        snapshot: &TerminalSnapshot,
        damage: &DamageEvent,
        now: Instant,
    ) -> Result<Vec<TranscriptEvent>> {
        let mut out = Vec::new();

        // Geometry changes and full repaints invalidate all per-row
        // bookkeeping; bumping the epoch orphans the old entries.
        if damage.full_redraw {
            self.epoch += 1;
            let epoch = self.epoch;
            self.row_state.retain(|(e, _), _| *e == epoch);
        }

        // Primary signal: newly committed history lines. The clamp tolerates
        // history truncation (buffer switch, eviction).
        let count = view.history_line_count();
        self.last_emitted_history_index = self.last_emitted_history_index.min(count);
        if self.last_emitted_history_index < count {
            let lines = view.read_history_lines(self.last_emitted_history_index, count)?;
            for line in lines {
                let normalized = normalize(&line);
                // blank padding from the screen buffer, not content
                if normalized.is_empty() {
                    continue;
                }
                if self.churn.should_suppress(normalized, &[]) {
                    trace!(line = normalized, "history line suppressed as churn");
                    continue;
                }
                let fingerprint = fnv1a64(normalized.as_bytes());
                if !self.emitted_hashes.insert(fingerprint) {
                    continue;
                }
                out.push(TranscriptEvent::append(
                    format!("{normalized}\n"),
                    EventSource::History,
                ));
            }
        }
        self.last_emitted_history_index = count;

        // Full-screen UIs repaint constantly; while the alternate buffer is
        // active only history (which it does not write) can be trusted.
        if snapshot.alternate_screen && self.config.suppress_alternate_screen {
            let epoch = self.epoch;
            self.row_state.retain(|(e, _), _| *e != epoch);
            return Ok(out);
        }

        // Secondary signal: screen rows that have stopped changing.
        let screen_rows = view.screen_row_count();
        let stable_end = screen_rows.saturating_sub(self.config.volatile_row_count);
        if stable_end > 0 {
            let lines = view.read_screen_lines(0, stable_end)?;
            for (row, line) in lines.iter().enumerate() {
                let content = normalize(line);
                let key = (self.epoch, row);
                let state = match self.row_state.entry(key) {
                    Entry::Vacant(slot) => slot.insert(RowState::new(content.to_string(), now)),
                    Entry::Occupied(slot) => {
                        let state = slot.into_mut();
                        if state.content != content {
                            state.replace(content.to_string(), now);
                        }
                        state
                    }
                };

                if state.emitted
                    || now.duration_since(state.first_seen) < self.config.stability_window
                {
                    continue;
                }
                // Stable long enough. Mark emitted either way so the row is
                // only considered once per content value.
                state.emitted = true;
                if content.is_empty() {
                    continue;
                }
                if self.churn.should_suppress(content, &state.samples) {
                    trace!(row, line = content, "screen row suppressed as churn");
                    continue;
                }
                let fingerprint = fnv1a64(content.as_bytes());
                if self.emitted_hashes.insert(fingerprint) {
                    out.push(TranscriptEvent::append(
                        format!("{content}\n"),
                        EventSource::ScreenStable,
                    ));
                }
            }
        }

        // Rows beyond the current geometry no longer exist.
        let epoch = self.epoch;
        self.row_state
            .retain(|(e, row), _| *e != epoch || *row < screen_rows);

        Ok(out)
    }
}

/// Right-trim trailing ASCII space, horizontal tab and NUL (emulators mark
/// untouched cells with these). Leading whitespace is content.
fn normalize(line: &str) -> &str {
    line.trim_end_matches([' ', '\t', '\0'])
}

/// FNV-1a 64-bit fingerprint of a normalized line, used for emit dedup.
fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
