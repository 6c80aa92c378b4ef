//! Decoder configuration types
//!
//! This module defines the configuration the library needs: the processing
//! mode (which decides the recognized event tags and the channel cap) and the
//! bridging settings used when two channel-group files are combined.
//! Directory layout and file naming live in the application layer.

use crate::types::EventTag;
use serde::{Deserialize, Serialize};

/// Tags recognized in multi-tag mode
pub const MULTI_TAG_SET: [EventTag; 3] = [1, 2, 6];

/// Tags recognized in single-tag mode
pub const SINGLE_TAG_SET: [EventTag; 1] = [1];

/// How tokens are decoded and which table shapes are produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingMode {
    /// Tags {1, 2, 6}, up to 8 channels, raw+fraction aligned table
    #[default]
    MultiTag,
    /// Tag {1} only, up to 16 channels, one indicator column per channel
    SingleTag,
}

impl ProcessingMode {
    /// Tags whose tokens advance the channel cursor in this mode
    pub fn recognized_tags(self) -> &'static [EventTag] {
        match self {
            ProcessingMode::MultiTag => &MULTI_TAG_SET,
            ProcessingMode::SingleTag => &SINGLE_TAG_SET,
        }
    }

    /// Maximum number of channel sections parsed from one record
    pub fn channel_cap(self) -> usize {
        match self {
            ProcessingMode::MultiTag => 8,
            ProcessingMode::SingleTag => 16,
        }
    }
}

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Processing mode
    #[serde(default)]
    pub mode: ProcessingMode,

    /// Number of channel sections kept before scanning stops
    #[serde(default = "default_channel_cap")]
    pub channel_cap: usize,

    /// Recognized event tags
    #[serde(default = "default_recognized_tags")]
    pub recognized_tags: Vec<EventTag>,
}

fn default_channel_cap() -> usize {
    ProcessingMode::MultiTag.channel_cap()
}

fn default_recognized_tags() -> Vec<EventTag> {
    MULTI_TAG_SET.to_vec()
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::for_mode(ProcessingMode::default())
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings (multi-tag)
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with the cap and tag set of the given mode
    pub fn for_mode(mode: ProcessingMode) -> Self {
        Self {
            mode,
            channel_cap: mode.channel_cap(),
            recognized_tags: mode.recognized_tags().to_vec(),
        }
    }

    /// Builder method: override the channel cap
    pub fn with_channel_cap(mut self, cap: usize) -> Self {
        self.channel_cap = cap;
        self
    }

    /// Builder method: override the recognized tag set
    pub fn with_recognized_tags(mut self, tags: Vec<EventTag>) -> Self {
        self.recognized_tags = tags;
        self
    }

    /// Check if a tag advances the cursor
    pub fn is_recognized(&self, tag: EventTag) -> bool {
        self.recognized_tags.contains(&tag)
    }
}

/// How two channel-group tables of one session are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgePolicy {
    /// Outer-join on time, deduplicate, count indicator hits per channel
    #[default]
    Count,
    /// Concatenate both row sets without joining, sorted by time
    Stacked,
    /// Do not bridge
    None,
}

/// Closed counting window in minutes, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountWindow {
    pub start: f64,
    pub end: f64,
}

impl Default for CountWindow {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 180.0,
        }
    }
}

impl CountWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Check if a time (minutes) falls inside the window
    pub fn contains(&self, minutes: f64) -> bool {
        minutes >= self.start && minutes <= self.end
    }
}

/// Bridging settings for two-group sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub policy: BridgePolicy,

    /// Marker in a file name identifying the high channel range
    #[serde(default = "default_suffix_marker")]
    pub suffix_marker: String,

    /// Counting window (count policy only)
    #[serde(default)]
    pub window: CountWindow,

    /// Channels per group file; the high range is renumbered after these
    #[serde(default = "default_group_width")]
    pub group_width: usize,

    /// Tag column taken from channels that have several tag columns
    #[serde(default = "default_bridged_tag")]
    pub bridged_tag: EventTag,
}

fn default_suffix_marker() -> String {
    "_9-16".to_string()
}

fn default_group_width() -> usize {
    8
}

fn default_bridged_tag() -> EventTag {
    1
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            policy: BridgePolicy::default(),
            suffix_marker: default_suffix_marker(),
            window: CountWindow::default(),
            group_width: default_group_width(),
            bridged_tag: default_bridged_tag(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the bridging policy
    pub fn with_policy(mut self, policy: BridgePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder method: set the high-range suffix marker
    pub fn with_suffix_marker(mut self, marker: impl Into<String>) -> Self {
        self.suffix_marker = marker.into();
        self
    }

    /// Builder method: set the counting window
    pub fn with_window(mut self, start: f64, end: f64) -> Self {
        self.window = CountWindow::new(start, end);
        self
    }
}
