//! Churn suppression heuristics for spinner/progress animation output.
//!
//! Conservative string checks only: no regex, no locale-dependent
//! operations. False negatives (an animation frame leaking through) are
//! preferred over false positives (real output swallowed).

use std::collections::HashSet;

/// Policy deciding whether a row of text is animation churn.
///
/// `recent_samples` holds recently observed values for the same row,
/// oldest first; it may be empty and is only consulted by the
/// update-frequency heuristic. Implementations must be pure functions.
pub trait ChurnFilterPolicy: Send {
    fn should_suppress(&self, row_text: &str, recent_samples: &[String]) -> bool;
}

/// Default suppression heuristics: spinner glyphs, progress bars, percent
/// tails, "Loading..." status prefixes, and short lines that churn through
/// many distinct values.
pub struct DefaultChurnFilter;

impl ChurnFilterPolicy for DefaultChurnFilter {
    fn should_suppress(&self, row_text: &str, recent_samples: &[String]) -> bool {
        let s = row_text.trim_end_matches([' ', '\t', '\0']);
        if s.is_empty() {
            return false;
        }
        is_spinner_line(s)
            || is_progress_line(s)
            || is_status_line(s)
            || is_high_churn_line(s, recent_samples)
    }
}

/// Glyphs that stand alone as a whole-line spinner frame.
fn is_solo_spinner_glyph(c: char) -> bool {
    matches!(c, '|' | '/' | '\\' | '-' | '*' | '.') || is_braille(c)
}

/// Glyphs that animate at the tail of a "Working X" style line. `.` and `*`
/// are excluded here: a sentence ending in a period is not a spinner.
fn is_trailing_spinner_glyph(c: char) -> bool {
    matches!(c, '|' | '/' | '\\' | '-') || is_braille(c)
}

fn is_braille(c: char) -> bool {
    ('\u{2800}'..='\u{28FF}').contains(&c)
}

fn is_spinner_line(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();

    if n == 1 {
        return is_solo_spinner_glyph(chars[0]);
    }
    // ".", "..", "..." loading indicators
    if n <= 3 && chars.iter().all(|&c| c == '.') {
        return true;
    }
    // an indented bare glyph, e.g. "  ⠋"
    if chars[n - 1..].iter().all(|&c| is_trailing_spinner_glyph(c))
        && chars[..n - 1].iter().all(|&c| c == ' ')
    {
        return true;
    }

    // "Working |" style: animated glyph somewhere at the tail, label of
    // letters and spaces in front. In-place rewrites can leave residue from
    // a longer previous line after the glyph ("spinner |tart"); tolerate a
    // letters-only tail.
    if n >= 3 {
        if let Some(glyph_at) = chars
            .iter()
            .rposition(|&c| is_trailing_spinner_glyph(c))
        {
            let prefix = &chars[..glyph_at];
            let suffix = &chars[glyph_at + 1..];
            let prefix_ok = prefix.iter().all(|&c| c.is_ascii_alphabetic() || c == ' ')
                && prefix.iter().any(|&c| c.is_ascii_alphabetic());
            let suffix_ok = suffix.iter().all(|&c| c.is_ascii_alphabetic());
            if prefix_ok && suffix_ok {
                return true;
            }
        }
    }

    false
}

fn is_progress_line(s: &str) -> bool {
    if ends_with_percent(s) {
        return true;
    }

    // "[=====>    ]" bar: a bracketed run of fill characters
    if let Some(open) = s.find('[') {
        if let Some(close_off) = s[open + 1..].find(']') {
            let interior = &s[open + 1..open + 1 + close_off];
            let len = interior.chars().count();
            if len >= 10 {
                let oddballs = interior
                    .chars()
                    .filter(|c| !matches!(c, '=' | '-' | '#' | '>' | ' '))
                    .count();
                if oddballs <= 1 {
                    return true;
                }
            }
        }
    }

    false
}

fn ends_with_percent(s: &str) -> bool {
    let mut chars = s.chars().rev();
    if chars.next() != Some('%') {
        return false;
    }
    matches!(chars.next(), Some(c) if c.is_ascii_digit())
}

const STATUS_PREFIXES: &[&str] = &["loading", "thinking", "working", "waiting", "analyzing"];

fn is_status_line(s: &str) -> bool {
    if !s.ends_with("...") {
        return false;
    }
    STATUS_PREFIXES.iter().any(|prefix| {
        // checked slice: a multi-byte char at the boundary is not a match
        s.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// A short row that ran through five or more distinct values recently is
/// being animated, whatever the individual frames look like.
fn is_high_churn_line(s: &str, recent_samples: &[String]) -> bool {
    if recent_samples.len() < 6 || s.chars().count() > 40 {
        return false;
    }
    let mut distinct: HashSet<&str> = HashSet::new();
    let mut prev: Option<&str> = None;
    for sample in recent_samples {
        let value = sample.as_str();
        // run-length reduce: consecutive repeats count once
        if prev == Some(value) {
            continue;
        }
        distinct.insert(value);
        prev = Some(value);
    }
    distinct.len() >= 5
}
