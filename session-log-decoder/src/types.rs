//! Core types for the session log decoder library
//!
//! This module defines the fundamental values the decoder produces while it
//! walks a session record: absolute times reconstructed by summation, the
//! event tags carried by each token, and the per-channel event records.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Event tag ("Fraction") derived from the fractional part of a token
pub type EventTag = u8;

/// Per-channel event record: absolute time -> event observed at that time
pub type EventRecord = BTreeMap<AbsoluteTime, ChannelEvent>;

/// Absolute time in minutes since the start of a channel's recording.
///
/// Times are floats reconstructed by cumulative summation, so they are used
/// as map keys through a total order. Two times are equal only when they are
/// the exact same float.
#[derive(Debug, Clone, Copy)]
pub struct AbsoluteTime(f64);

impl AbsoluteTime {
    /// Start of every channel's time axis
    pub const ZERO: AbsoluteTime = AbsoluteTime(0.0);

    /// Wrap a value in minutes
    pub fn from_minutes(minutes: f64) -> Self {
        Self(minutes)
    }

    /// Value in minutes
    pub fn minutes(self) -> f64 {
        self.0
    }
}

impl PartialEq for AbsoluteTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AbsoluteTime {}

impl Hash for AbsoluteTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for AbsoluteTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AbsoluteTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for AbsoluteTime {
    /// Shortest round-trip rendering, always with a decimal point (`1.0`, `0.05`)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0.to_string();
        if self.0.is_finite() && !text.contains('.') {
            write!(f, "{}.0", text)
        } else {
            f.write_str(&text)
        }
    }
}

/// One event recorded for a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    /// Token text exactly as it appeared in the record
    pub raw: String,
    /// Event tag decoded from the token
    pub tag: EventTag,
}

impl ChannelEvent {
    pub fn new(raw: impl Into<String>, tag: EventTag) -> Self {
        Self {
            raw: raw.into(),
            tag,
        }
    }
}

/// Errors that can occur while decoding records or handling tables
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to convert input file: {0}")]
    ConversionError(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed table: {0}")]
    TableError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_time_ordering() {
        let mut times = vec![
            AbsoluteTime::from_minutes(2.5),
            AbsoluteTime::from_minutes(0.1),
            AbsoluteTime::from_minutes(1.0),
        ];
        times.sort();
        let minutes: Vec<f64> = times.iter().map(|t| t.minutes()).collect();
        assert_eq!(minutes, vec![0.1, 1.0, 2.5]);
    }

    #[test]
    fn test_absolute_time_exact_equality() {
        let a = AbsoluteTime::from_minutes(0.1 + 0.2);
        let b = AbsoluteTime::from_minutes(0.3);
        assert_ne!(a, b);
        assert_eq!(a, AbsoluteTime::from_minutes(0.1 + 0.2));
    }

    #[test]
    fn test_absolute_time_display() {
        assert_eq!(AbsoluteTime::from_minutes(1.0).to_string(), "1.0");
        assert_eq!(AbsoluteTime::from_minutes(0.05).to_string(), "0.05");
        assert_eq!(AbsoluteTime::ZERO.to_string(), "0.0");
        assert_eq!(
            AbsoluteTime::from_minutes(1.0 / 60.0).to_string(),
            "0.016666666666666666"
        );
    }
}
