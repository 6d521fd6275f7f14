//! Transcript events emitted by the capture engine

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Event kind. Only `Append` exists today; the enum reserves room for
/// future kinds (retraction, replacement) without a wire format break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Append,
}

/// Which capture signal produced the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventSource {
    /// Line scrolled off the top of the screen into history (committed).
    #[serde(rename = "SCROLLBACK")]
    History,
    /// Screen row that stayed unchanged for the full stability window.
    #[serde(rename = "SCREEN_STABLE")]
    ScreenStable,
}

/// One committed line of program output.
///
/// `text` is the normalized line plus exactly one trailing `\n`; it contains
/// no other control characters.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub kind: EventKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub source: EventSource,
}

impl TranscriptEvent {
    /// Create an append event stamped with the current UTC time.
    pub fn append(text: String, source: EventSource) -> Self {
        Self {
            kind: EventKind::Append,
            text,
            timestamp: Utc::now(),
            source,
        }
    }

    /// Wire-level representation for JSON consumers.
    pub fn to_wire(&self) -> WireEvent {
        match self.kind {
            EventKind::Append => WireEvent::Append {
                text: self.text.clone(),
                meta: WireMeta {
                    timestamp_utc: self.timestamp,
                    source: self.source,
                },
            },
        }
    }
}

/// JSON encoding of a transcript event:
///
/// ```json
/// { "type": "append",
///   "text": "<line>\n",
///   "meta": { "timestampUtc": "<RFC3339>", "source": "SCROLLBACK" } }
/// ```
///
/// Consumers must treat unknown `type` values as opaque.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEvent {
    Append { text: String, meta: WireMeta },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMeta {
    pub timestamp_utc: DateTime<Utc>,
    pub source: EventSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_encoding_shape() {
        let event = TranscriptEvent::append("hello\n".to_string(), EventSource::History);
        let value = serde_json::to_value(event.to_wire()).unwrap();

        assert_eq!(value["type"], "append");
        assert_eq!(value["text"], "hello\n");
        assert_eq!(value["meta"]["source"], "SCROLLBACK");
        // RFC3339 timestamps parse back losslessly
        let ts = value["meta"]["timestampUtc"].as_str().unwrap();
        assert!(ts.parse::<DateTime<Utc>>().is_ok());
    }

    #[test]
    fn screen_stable_source_name() {
        let event = TranscriptEvent::append("x\n".to_string(), EventSource::ScreenStable);
        let value = serde_json::to_value(event.to_wire()).unwrap();
        assert_eq!(value["meta"]["source"], "SCREEN_STABLE");
    }
}
