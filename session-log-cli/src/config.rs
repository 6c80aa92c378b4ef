//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use session_log_decoder::{
    BridgeConfig, BridgePolicy, CountWindow, DecoderConfig, EventTag, ProcessingMode,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub bridge: BridgeSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Directory with the low-range (or only) group of raw records
    #[serde(default = "default_input_dir")]
    pub dir: PathBuf,
    /// Directory with the high-range group of raw records
    pub high_range_dir: Option<PathBuf>,
    /// Label of the high range, appended to output names as `_<label>`
    #[serde(default = "default_range_label")]
    pub range_label: String,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("files")
}

fn default_range_label() -> String {
    "9-16".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: default_input_dir(),
            high_range_dir: None,
            range_label: default_range_label(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Root of the output layout
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub mode: ProcessingMode,
    /// Tags whose indicator columns go to the final per-group files
    #[serde(default = "default_final_tags")]
    pub final_tags: Vec<EventTag>,
}

fn default_final_tags() -> Vec<EventTag> {
    vec![1]
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::default(),
            final_tags: default_final_tags(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BridgeSection {
    #[serde(default)]
    pub policy: BridgePolicy,
    /// Defaults to `_<range_label>`
    pub suffix_marker: Option<String>,
    pub window_start: Option<f64>,
    pub window_end: Option<f64>,
}

impl AppConfig {
    /// Library decoder configuration for the configured mode
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig::for_mode(self.processing.mode)
    }

    /// Library bridging configuration
    pub fn bridge_config(&self) -> BridgeConfig {
        let defaults = CountWindow::default();
        let window = CountWindow::new(
            self.bridge.window_start.unwrap_or(defaults.start),
            self.bridge.window_end.unwrap_or(defaults.end),
        );

        BridgeConfig {
            policy: self.bridge.policy,
            suffix_marker: self.suffix_marker(),
            window,
            bridged_tag: self.bridged_tag(),
            ..BridgeConfig::default()
        }
    }

    /// Tag column bridged when the final files keep several tags per box
    ///
    /// Tag 1 when it is kept, else the first kept tag.
    pub fn bridged_tag(&self) -> EventTag {
        let tags = &self.processing.final_tags;
        if tags.contains(&1) {
            1
        } else {
            tags.first().copied().unwrap_or(1)
        }
    }

    /// Suffix appended to high-range output names
    pub fn suffix_marker(&self) -> String {
        self.bridge
            .suffix_marker
            .clone()
            .unwrap_or_else(|| format!("_{}", self.input.range_label))
    }

    /// True if the two channel groups should be bridged after processing
    pub fn bridging_enabled(&self) -> bool {
        self.input.high_range_dir.is_some() && self.bridge.policy != BridgePolicy::None
    }

    /// Check settings that would otherwise fail halfway through a run
    pub fn validate(&self) -> Result<()> {
        let window = self.bridge_config().window;
        if !window.start.is_finite() || !window.end.is_finite() {
            anyhow::bail!(
                "Count window bounds must be finite numbers (start {}, end {})",
                window.start,
                window.end
            );
        }
        if window.start > window.end {
            anyhow::bail!(
                "Count window start ({}) is after its end ({})",
                window.start,
                window.end
            );
        }
        if self.input.high_range_dir.is_some() && self.suffix_marker().is_empty() {
            anyhow::bail!("A high-range input directory needs a non-empty suffix marker");
        }
        if self.bridging_enabled() && self.processing.mode == ProcessingMode::SingleTag {
            anyhow::bail!(
                "Single-tag files already hold all {} boxes and cannot be bridged; \
                 drop the high-range input or set the bridge policy to \"none\"",
                ProcessingMode::SingleTag.channel_cap()
            );
        }
        if self.processing.final_tags.is_empty() {
            anyhow::bail!("processing.final_tags must list at least one tag");
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config.validate()?;
    Ok(config)
}
