//! Engine configuration
//!
//! A [`Config`] value is handed to a [`crate::Session`] at construction time
//! and never mutated behind the engine's back.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::canvas::DrawingStrategy;
use crate::click::ClickStrategy;
use crate::error::Result;

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Baseline library layout
    pub baselines: BaselineConfig,

    /// Search and polling budgets
    pub timing: TimingConfig,

    /// Input pacing
    pub input: InputConfig,
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            debug!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Put `root` in front of the baseline search roots
    pub fn with_search_path(mut self, root: impl Into<PathBuf>) -> Self {
        self.baselines.search_paths.insert(0, root.into());
        self
    }

    /// Zero every input delay; handy for scripted backends
    pub fn without_input_delays(mut self) -> Self {
        self.input.settle_ms = 0;
        self.input.hold_ms = 0;
        self.input.drag_hold_ms = 0;
        self.input.drop_settle_ms = 0;
        self.input.visual_change_settle_ms = 0;
        self.input.keystroke_settle_ms = 0;
        self
    }
}

/// Baseline library layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Search roots, most specific first
    pub search_paths: Vec<PathBuf>,

    /// Image file extension including the dot
    pub image_suffix: String,

    /// Extension of sidecar transform descriptors
    pub descriptor_suffix: String,

    /// Where region assertion images live
    pub assert_dir: PathBuf,

    /// Platform subdirectory for assertion images
    pub platform: String,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from("resources/baseline")],
            image_suffix: ".png".to_string(),
            descriptor_suffix: ".yaml".to_string(),
            assert_dir: PathBuf::from("resources/assert"),
            platform: std::env::consts::OS.to_string(),
        }
    }
}

/// Search and polling budgets, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Backend wait per baseline file
    pub wait_timeout_ms: u64,
    /// Default entity resolution budget
    pub entity_timeout_ms: u64,
    /// Budget for post-interaction state assertions
    pub state_timeout_ms: u64,
    /// Pause between failed finder attempts
    pub retry_backoff_ms: u64,
    /// Vanish/appear/progress polling period
    pub poll_interval_ms: u64,
    /// Progress bar is complete once it stops changing for this long
    pub idle_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 3000,
            entity_timeout_ms: 60_000,
            state_timeout_ms: 5000,
            retry_backoff_ms: 100,
            poll_interval_ms: 1000,
            idle_timeout_ms: 5000,
        }
    }
}

impl TimingConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn entity_timeout(&self) -> Duration {
        Duration::from_millis(self.entity_timeout_ms)
    }

    pub fn state_timeout(&self) -> Duration {
        Duration::from_millis(self.state_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Input pacing, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Pause after moving the pointer
    pub settle_ms: u64,
    /// How long a standard click holds the button
    pub hold_ms: u64,
    pub drag_hold_ms: u64,
    pub drop_settle_ms: u64,
    /// Budget for a pressed target to change appearance
    pub visual_change_budget_ms: u64,
    pub visual_change_settle_ms: u64,
    /// Fail instead of warn when a press does not change the target
    pub strict_visual_change: bool,
    pub keystroke_settle_ms: u64,
    pub default_click_strategy: ClickStrategy,
    pub default_drawing_strategy: DrawingStrategy,
    /// Modifier used for select-all/copy chords
    pub command_key: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            settle_ms: 100,
            hold_ms: 1000,
            drag_hold_ms: 400,
            drop_settle_ms: 300,
            visual_change_budget_ms: 700,
            visual_change_settle_ms: 500,
            strict_visual_change: false,
            keystroke_settle_ms: 500,
            default_click_strategy: ClickStrategy::Standard,
            default_drawing_strategy: DrawingStrategy::Segment,
            command_key: if cfg!(target_os = "macos") { "cmd" } else { "ctrl" }.to_string(),
        }
    }
}
