//! Channel accumulation
//!
//! Each channel keeps a running cursor: the sum of the elapsed times of all
//! recognized tokens seen so far. Every recognized token is recorded at the
//! cursor value reached after adding its own elapsed time.

use crate::token_decoder::TokenDecoder;
use crate::types::{AbsoluteTime, ChannelEvent, EventRecord, EventTag};

/// Accumulates the tokens of one channel of one record
#[derive(Debug, Clone)]
pub struct ChannelAccumulator<'a> {
    recognized: &'a [EventTag],
    cursor: f64,
    events: EventRecord,
    rejected: usize,
}

impl<'a> ChannelAccumulator<'a> {
    /// Create an accumulator with its cursor at zero
    pub fn new(recognized: &'a [EventTag]) -> Self {
        Self {
            recognized,
            cursor: 0.0,
            events: EventRecord::new(),
            rejected: 0,
        }
    }

    /// Feed one token
    ///
    /// Recognized tokens advance the cursor and are recorded at the new
    /// cursor value. A token landing on a time already recorded replaces the
    /// earlier event. Anything else leaves the accumulator unchanged.
    pub fn observe(&mut self, token: &str) {
        match TokenDecoder::decode(token, self.recognized) {
            Some(decoded) => {
                self.cursor += decoded.elapsed_minutes;
                let time = AbsoluteTime::from_minutes(self.cursor);
                let event = ChannelEvent::new(token, decoded.tag);
                if let Some(previous) = self.events.insert(time, event) {
                    log::debug!(
                        "Token {:?} collides with {:?} at {} min; keeping the later one",
                        token,
                        previous.raw,
                        time
                    );
                }
            }
            None => self.rejected += 1,
        }
    }

    /// Current cursor value
    pub fn cursor(&self) -> AbsoluteTime {
        AbsoluteTime::from_minutes(self.cursor)
    }

    /// Number of tokens that did not decode
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Events recorded so far
    pub fn events(&self) -> &EventRecord {
        &self.events
    }

    /// Consume the accumulator and return its event record
    pub fn into_events(self) -> EventRecord {
        self.events
    }
}
