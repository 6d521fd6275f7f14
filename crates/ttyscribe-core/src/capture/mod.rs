//! Capture layer: damage notifications in, transcript events out
//!
//! # Components
//! - `CaptureEngine`: history-delta + screen-stability emission with dedup
//! - `ChurnFilterPolicy` / `DefaultChurnFilter`: spinner and progress
//!   suppression heuristics

mod churn;
mod engine;

pub use churn::{ChurnFilterPolicy, DefaultChurnFilter};
pub use engine::{CaptureConfig, CaptureEngine, CaptureEngineState};
