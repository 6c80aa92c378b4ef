//! Session Log Decoder Library
//!
//! A stateless, reusable library for decoding operant-chamber session
//! records into per-box event time series.
//!
//! # Architecture
//!
//! A record is a line-oriented export in which every `C:` section holds the
//! event tokens of one box. This library:
//! - Decodes packed `INTEGER.FRACTION` tokens into elapsed time and event tag
//! - Rebuilds each box's absolute time axis by cumulative summation
//! - Aligns all boxes of a record on one time axis
//! - Expands event tags into per-tag indicator columns
//! - Bridges the two channel-group files (boxes 1-8 and 9-16) of a session
//!
//! The library does NOT walk directories, name output files or decide where
//! results are written. That is the job of the application layer
//! (session-log-cli).
//!
//! # Example Usage
//!
//! ```
//! use session_log_decoder::{Decoder, DecoderConfig, ProcessingMode};
//!
//! let decoder = Decoder::new(DecoderConfig::for_mode(ProcessingMode::MultiTag));
//! let record = decoder.decode_text("C:\n 0: 6000.0100 6000.0200\nC:\n 0: 6000.0600\n");
//!
//! for row in &record.aligned.rows {
//!     println!("{} min: {:?}", row.time, row.events);
//! }
//!
//! let indicators = decoder.indicators(&record);
//! assert_eq!(indicators.len(), 2);
//! ```

// Public modules
pub mod accumulator;
pub mod bridge;
pub mod config;
pub mod decoder;
pub mod expander;
pub mod formats;
pub mod merger;
pub mod scanner;
pub mod table;
pub mod token_decoder;
pub mod types;

// Re-export main types for convenience
pub use accumulator::ChannelAccumulator;
pub use bridge::{pair_group_files, Bridger, CountedBridge, GroupPair, Pairing, PairingSkip};
pub use config::{BridgeConfig, BridgePolicy, CountWindow, DecoderConfig, ProcessingMode};
pub use decoder::{DecodedRecord, Decoder};
pub use merger::{AlignedRow, AlignedTable};
pub use scanner::{ScanOutcome, SectionMarker, SectionScanner};
pub use table::{IndicatorColumn, IndicatorRow, IndicatorTable, INDICATOR_HIT};
pub use token_decoder::{DecodedToken, TokenDecoder};
pub use types::{AbsoluteTime, ChannelEvent, DecoderError, EventRecord, EventTag, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
