//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct is the entry point for turning one session record into
//! its aligned and indicator tables.

use crate::config::{DecoderConfig, ProcessingMode};
use crate::expander;
use crate::formats::convert_file;
use crate::merger::AlignedTable;
use crate::scanner::{ScanOutcome, SectionScanner};
use crate::table::IndicatorTable;
use crate::types::{EventTag, Result};
use std::path::Path;

/// Everything decoded from one record
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    /// Processing mode the record was decoded in
    pub mode: ProcessingMode,
    /// Per-channel events and scan warnings
    pub scan: ScanOutcome,
    /// All channels over one time axis
    pub aligned: AlignedTable,
}

impl DecodedRecord {
    /// Indicator table for this record
    ///
    /// Multi-tag records are expanded to one column per (channel, tag);
    /// single-tag records get one `Box N` column per channel.
    pub fn indicators(&self, recognized: &[EventTag]) -> IndicatorTable {
        match self.mode {
            ProcessingMode::MultiTag => expander::expand(&self.aligned, recognized),
            ProcessingMode::SingleTag => self.aligned.to_hit_table(),
        }
    }

    /// Number of channel sections found in the record
    pub fn channel_sections(&self) -> usize {
        self.scan.channels.len()
    }
}

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a record given as tab-delimited text
    ///
    /// # Example
    /// ```
    /// use session_log_decoder::{Decoder, DecoderConfig};
    ///
    /// let decoder = Decoder::new(DecoderConfig::new());
    /// let record = decoder.decode_text("C:\n 0: 6000.0100 3000.0600\n");
    ///
    /// assert_eq!(record.channel_sections(), 1);
    /// assert_eq!(record.aligned.len(), 2);
    /// ```
    pub fn decode_text(&self, text: &str) -> DecodedRecord {
        let scan = SectionScanner::new(&self.config).scan_text(text);
        let aligned = AlignedTable::merge(&scan.channels, self.config.channel_cap);

        DecodedRecord {
            mode: self.config.mode,
            scan,
            aligned,
        }
    }

    /// Convert a file to tab-delimited text and decode it
    pub fn decode_file(&self, path: &Path) -> Result<DecodedRecord> {
        log::info!("Decoding record: {:?}", path);
        let text = convert_file(path)?;
        Ok(self.decode_text(&text))
    }

    /// Indicator table of a decoded record under this decoder's tag set
    pub fn indicators(&self, record: &DecodedRecord) -> IndicatorTable {
        record.indicators(&self.config.recognized_tags)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}
