//! Deterministic terminal-output fixture for demo and manual verification.
//!
//! Emits committed lines, carriage-return spinner rewrites, a progress bar
//! sweep, and a final committed line. Run it under `ttyscribe` to see the
//! animations disappear from the transcript:
//!
//! ```text
//! ttyscribe --plain -- ttyscribe-fixture
//! ```

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

fn main() -> io::Result<()> {
    let mut out = io::stdout();

    writeln!(out, "fixture: start")?;
    writeln!(out, "fixture: line 1")?;
    writeln!(out, "fixture: line 2")?;

    let spinner = ['|', '/', '-', '\\'];
    for i in 0..40 {
        write!(out, "\rspinner {}", spinner[i % spinner.len()])?;
        out.flush()?;
        thread::sleep(Duration::from_millis(20));
    }
    write!(out, "\r\x1b[K")?;
    writeln!(out, "fixture: after spinner")?;

    for percent in (0..=100).step_by(5) {
        write!(out, "\r[==========          ] {percent}%")?;
        out.flush()?;
        thread::sleep(Duration::from_millis(15));
    }
    write!(out, "\r\x1b[K")?;
    writeln!(out, "fixture: done")?;

    out.flush()
}
