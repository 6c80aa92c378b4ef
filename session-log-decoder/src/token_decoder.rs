//! Token Decoding
//!
//! A token is packed decimal text `INTEGER.FRACTION`. The integer part is the
//! number of hundredths of a second elapsed since the previous recognized
//! token of the same channel; the leading digits of the fractional part carry
//! the event tag.

use crate::types::EventTag;

/// Hundredths of a second -> minutes
const HUNDREDTHS_TO_SECONDS: f64 = 0.01;
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Result of decoding one recognized token
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedToken {
    /// Time elapsed since the previous recognized token, in minutes
    pub elapsed_minutes: f64,
    /// Event tag
    pub tag: EventTag,
}

/// Token decoder - turns packed decimal tokens into elapsed time and tag
pub struct TokenDecoder;

impl TokenDecoder {
    /// Decode a token against a set of recognized tags
    ///
    /// # Returns
    /// * `Some(DecodedToken)` if the token parses and its tag is recognized
    /// * `None` otherwise; the caller must not advance its cursor
    pub fn decode(token: &str, recognized: &[EventTag]) -> Option<DecodedToken> {
        let (integer, fraction) = Self::split_packed(token)?;

        let tag = EventTag::try_from(fraction / 100).ok()?;
        if !recognized.contains(&tag) {
            log::trace!("Dropping token {:?}: tag {} not recognized", token, tag);
            return None;
        }

        Some(DecodedToken {
            elapsed_minutes: integer as f64 * HUNDREDTHS_TO_SECONDS / SECONDS_PER_MINUTE,
            tag,
        })
    }

    /// Split a token on its first `.` into integer and fractional values
    ///
    /// An empty fractional part counts as 0. Anything that is not a whole
    /// number on either side is rejected.
    fn split_packed(token: &str) -> Option<(u64, u64)> {
        let (integer_part, fractional_part) = token.split_once('.')?;

        let integer = integer_part.parse::<u64>().ok()?;
        let fraction = if fractional_part.is_empty() {
            0
        } else {
            fractional_part.parse::<u64>().ok()?
        };

        Some((integer, fraction))
    }
}
