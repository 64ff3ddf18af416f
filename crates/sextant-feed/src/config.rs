// File: crates/sextant-feed/src/config.rs
// Summary: TOML configuration with per-section defaults, search-path loading and an
// environment override for the service URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sextant_core::forecast::ForecastStyle;
use sextant_core::{BuildOptions, ContainerId, OverlayKind, PanelDescriptor, PanelKind, Size};

use crate::error::ConfigError;
use crate::poller::PollerSettings;

/// Overrides `api.base_url` when set.
pub const API_URL_ENV: &str = "SEXTANT_API_URL";
pub const FILE_NAME: &str = "sextant.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SextantConfig {
    pub api: ApiConfig,
    pub panels: PanelsConfig,
    pub forecast: ForecastConfig,
    pub poller: PollerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:5000".to_string(), timeout_ms: 10_000 }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelsConfig {
    /// Delay between data arrival and panel construction.
    pub settle_ms: u64,
    pub width: u32,
    pub price_height: u32,
    pub oscillator_height: u32,
    pub volume_height: u32,
    pub reference_lines: bool,
    pub theme: String,
    /// Overlays enabled when the dashboard starts.
    pub overlays: Vec<OverlayKind>,
}

impl Default for PanelsConfig {
    fn default() -> Self {
        Self {
            settle_ms: 150,
            width: 960,
            price_height: 320,
            oscillator_height: 120,
            volume_height: 100,
            reference_lines: true,
            theme: "dark".to_string(),
            overlays: Vec::new(),
        }
    }
}

impl PanelsConfig {
    pub const PRICE: ContainerId = ContainerId(1);
    pub const RSI: ContainerId = ContainerId(2);
    pub const MACD: ContainerId = ContainerId(3);
    pub const VOLUME: ContainerId = ContainerId(4);

    /// The standard stack: price, RSI, MACD, volume.
    pub fn descriptors(&self) -> Vec<PanelDescriptor> {
        vec![
            PanelDescriptor::new(PanelKind::Price, Self::PRICE, self.price_height),
            PanelDescriptor::new(PanelKind::OscillatorRsi, Self::RSI, self.oscillator_height),
            PanelDescriptor::new(PanelKind::OscillatorMacd, Self::MACD, self.oscillator_height),
            PanelDescriptor::new(PanelKind::Volume, Self::VOLUME, self.volume_height),
        ]
    }

    /// Initial container sizes for `descriptors`, all at the configured width.
    pub fn initial_layout(&self, descriptors: &[PanelDescriptor]) -> sextant_core::LayoutSnapshot {
        descriptors.iter().fold(sextant_core::LayoutSnapshot::new(), |layout, d| {
            layout.with(d.container, Size::new(self.width, d.height_hint))
        })
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            theme: sextant_core::theme::find(&self.theme),
            overlays: self.overlays.iter().copied().collect(),
            reference_lines: self.reference_lines,
            ..BuildOptions::default()
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub width: u32,
    pub height: u32,
    pub pad_below: f64,
    pub pad_above: f64,
    pub gauge_width: u32,
    pub gauge_height: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        let style = ForecastStyle::default();
        Self {
            width: style.width,
            height: style.height,
            pad_below: style.pad_below,
            pad_above: style.pad_above,
            gauge_width: 240,
            gauge_height: 150,
        }
    }
}

impl ForecastConfig {
    pub fn style(&self, theme: &str) -> ForecastStyle {
        ForecastStyle {
            width: self.width,
            height: self.height,
            pad_below: self.pad_below,
            pad_above: self.pad_above,
            theme: sextant_core::theme::find(theme),
            ..ForecastStyle::default()
        }
    }

    pub fn gauge_size(&self) -> Size {
        Size::new(self.gauge_width, self.gauge_height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub base_backoff_ms: u64,
    pub max_backoff_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { enabled: true, interval_secs: 30, base_backoff_ms: 1_000, max_backoff_secs: 60 }
    }
}

impl PollerConfig {
    pub fn settings(&self) -> PollerSettings {
        PollerSettings {
            interval: Duration::from_secs(self.interval_secs),
            base_backoff: Duration::from_millis(self.base_backoff_ms),
            max_backoff: Duration::from_secs(self.max_backoff_secs),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Daily-rotated log files go here; stderr when unset.
    pub log_dir: Option<PathBuf>,
    /// Filter directives used when `SEXTANT_LOG` is not set.
    pub filter: Option<String>,
}

impl SextantConfig {
    /// Load configuration from a file path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Default search locations, in order: `./sextant.toml`, then
    /// `<config dir>/sextant/sextant.toml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sextant").join(FILE_NAME));
        }
        paths
    }

    /// Load `explicit` if given (it must exist), else the first search path that exists,
    /// else defaults. Then apply environment overrides and validate.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match Self::search_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "loading config");
                    Self::load(path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!("api.base_url must be an http(s) URL, got `{}`", self.api.base_url)));
        }
        if self.panels.width == 0 || self.forecast.width == 0 || self.forecast.height == 0 {
            return Err(ConfigError::Invalid("surface dimensions must be non-zero".into()));
        }
        for (name, pad) in [("forecast.pad_below", self.forecast.pad_below), ("forecast.pad_above", self.forecast.pad_above)] {
            if !(0.0..1.0).contains(&pad) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1), got {pad}")));
            }
        }
        if self.poller.max_backoff_secs == 0 {
            return Err(ConfigError::Invalid("poller.max_backoff_secs must be positive".into()));
        }
        Ok(())
    }
}
