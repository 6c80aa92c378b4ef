//! Section scanning
//!
//! A converted record is a sequence of labeled sections. Every `C:` label
//! opens the token block of the next channel; any other single-letter label
//! (or a blank line) closes it. Lines of a channel block hold a line-local
//! index followed by tokens.

use crate::accumulator::ChannelAccumulator;
use crate::config::DecoderConfig;
use crate::types::EventRecord;

/// Labels that close a channel section
pub const TERMINATOR_LABELS: [char; 11] = ['A', 'E', 'F', 'I', 'L', 'R', 'S', 'T', 'V', 'J', 'W'];

/// Label that opens a channel section
pub const CHANNEL_LABEL: char = 'C';

/// A section label found at the start of a trimmed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionMarker {
    /// `C:` - start of the next channel's token block
    Channel,
    /// One of the other labels (`A:`, `E:`, ...)
    Terminator(char),
}

impl SectionMarker {
    /// Classify a trimmed line by its leading `X:` label
    pub fn classify(trimmed: &str) -> Option<Self> {
        let mut chars = trimmed.chars();
        let label = chars.next()?;
        if chars.next() != Some(':') {
            return None;
        }

        if label == CHANNEL_LABEL {
            Some(SectionMarker::Channel)
        } else if TERMINATOR_LABELS.contains(&label) {
            Some(SectionMarker::Terminator(label))
        } else {
            None
        }
    }
}

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Outside,
    InChannelSection,
}

/// Everything one scan produced
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Event records, one per channel section, in marker order
    pub channels: Vec<EventRecord>,
    /// Recovered problems worth reporting
    pub warnings: Vec<String>,
    /// Tokens dropped because they did not decode
    pub rejected_tokens: usize,
}

impl ScanOutcome {
    /// True if the record had more channel sections than the cap
    pub fn was_truncated(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Walks the lines of one record and feeds each channel's accumulator
pub struct SectionScanner<'a> {
    config: &'a DecoderConfig,
}

impl<'a> SectionScanner<'a> {
    pub fn new(config: &'a DecoderConfig) -> Self {
        Self { config }
    }

    /// Scan a whole record given as text
    pub fn scan_text(&self, text: &str) -> ScanOutcome {
        self.scan(text.lines())
    }

    /// Scan a record line by line
    ///
    /// Stops early (with a warning, keeping what was parsed) when a channel
    /// marker beyond the configured cap shows up.
    pub fn scan<'l, I>(&self, lines: I) -> ScanOutcome
    where
        I: IntoIterator<Item = &'l str>,
    {
        let mut state = ScanState::Outside;
        let mut accumulators: Vec<ChannelAccumulator<'_>> = Vec::new();
        let mut warnings = Vec::new();

        for line in lines {
            let trimmed = line.trim();
            let marker = SectionMarker::classify(trimmed);

            if marker == Some(SectionMarker::Channel) {
                if accumulators.len() >= self.config.channel_cap {
                    let warning = format!(
                        "More than {} channel sections detected; ignoring extras",
                        self.config.channel_cap
                    );
                    log::warn!("{}", warning);
                    warnings.push(warning);
                    break;
                }
                accumulators.push(ChannelAccumulator::new(&self.config.recognized_tags));
                state = ScanState::InChannelSection;
                continue;
            }

            if state == ScanState::Outside {
                continue;
            }

            if trimmed.is_empty() || matches!(marker, Some(SectionMarker::Terminator(_))) {
                state = ScanState::Outside;
                continue;
            }

            // InChannelSection always has a current accumulator
            if let Some(current) = accumulators.last_mut() {
                for token in trimmed.split_whitespace().skip(1) {
                    current.observe(token);
                }
            }
        }

        let rejected_tokens = accumulators.iter().map(|acc| acc.rejected()).sum();
        let channels: Vec<EventRecord> = accumulators
            .into_iter()
            .map(ChannelAccumulator::into_events)
            .collect();

        log::debug!(
            "Scanned {} channel section(s), {} event(s), {} rejected token(s)",
            channels.len(),
            channels.iter().map(|c| c.len()).sum::<usize>(),
            rejected_tokens
        );

        ScanOutcome {
            channels,
            warnings,
            rejected_tokens,
        }
    }
}
