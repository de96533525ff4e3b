use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::deck::loader::DEFAULT_SLIDE_COUNT;
use crate::input::DEFAULT_SWIPE_THRESHOLD;
use crate::locate::DEFAULT_REVEAL_DELAY;
use crate::map::geocode::DEFAULT_GEOCODER_URL;
use crate::map::tiles::DEFAULT_TILE_URL;
use crate::session::DEFAULT_AUTOPLAY_DELAY;

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "slidemap";

const VALID_KEYS: &str = "defaults.theme, defaults.source, defaults.slide_count, defaults.map_slide, \
    defaults.backend, map.tile_url, map.geocoder_url, map.reveal_delay_ms, input.swipe_threshold, \
    autoplay.delay_secs";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<AutoplayConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Slide page, fragment directory, or base URL opened when none is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_count: Option<usize>,

    /// 1-indexed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_slide: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapConfig {
    /// Empty disables tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoder_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swipe_threshold: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoplayConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_secs: Option<u64>,
}

/// Where location names are looked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    FixedRoute,
    Geocoding,
}

impl Backend {
    /// Name as written in the config file and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FixedRoute => "fixed-route",
            Self::Geocoding => "geocoding",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "fixed-route" => Some(Self::FixedRoute),
            "geocoding" => Some(Self::Geocoding),
            _ => None,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `slidemap config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# slidemap configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.theme" => {
                match value {
                    "light" | "dark" => {}
                    _ => anyhow::bail!("Invalid theme: {value}. Must be 'light' or 'dark'."),
                }
                self.defaults_mut().theme = Some(value.to_string());
            }
            "defaults.source" => {
                if value.trim().is_empty() {
                    anyhow::bail!("Invalid source: must not be empty.");
                }
                self.defaults_mut().source = Some(value.to_string());
            }
            "defaults.slide_count" => {
                let count = positive(key, value)?;
                self.defaults_mut().slide_count = Some(count);
            }
            "defaults.map_slide" => {
                let slide = positive(key, value)?;
                self.defaults_mut().map_slide = Some(slide);
            }
            "defaults.backend" => {
                let backend = Backend::parse(value).ok_or_else(|| {
                    anyhow::anyhow!("Invalid backend: {value}. Must be 'fixed-route' or 'geocoding'.")
                })?;
                self.defaults_mut().backend = Some(backend);
            }
            "map.tile_url" => {
                if !value.is_empty() && !(value.contains("{z}") && value.contains("{x}") && value.contains("{y}")) {
                    anyhow::bail!(
                        "Invalid tile_url: {value}. Must contain {{z}}, {{x}} and {{y}}, or be empty to disable tiles."
                    );
                }
                self.map_mut().tile_url = Some(value.to_string());
            }
            "map.geocoder_url" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    anyhow::bail!("Invalid geocoder_url: {value}. Must be an http(s) URL.");
                }
                self.map_mut().geocoder_url = Some(value.to_string());
            }
            "map.reveal_delay_ms" => {
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("Invalid reveal_delay_ms: {value}. Must be a whole number of milliseconds."))?;
                self.map_mut().reveal_delay_ms = Some(ms);
            }
            "input.swipe_threshold" => {
                let threshold = value
                    .parse::<f32>()
                    .ok()
                    .filter(|t| t.is_finite() && *t >= 0.0)
                    .ok_or_else(|| anyhow::anyhow!("Invalid swipe_threshold: {value}. Must be a non-negative number."))?;
                self.input
                    .get_or_insert_with(InputConfig::default)
                    .swipe_threshold = Some(threshold);
            }
            "autoplay.delay_secs" => {
                let secs = positive(key, value)? as u64;
                self.autoplay
                    .get_or_insert_with(AutoplayConfig::default)
                    .delay_secs = Some(secs);
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {VALID_KEYS}"),
        }
        Ok(())
    }

    fn defaults_mut(&mut self) -> &mut DefaultsConfig {
        self.defaults.get_or_insert_with(DefaultsConfig::default)
    }

    fn map_mut(&mut self) -> &mut MapConfig {
        self.map.get_or_insert_with(MapConfig::default)
    }

    pub fn theme(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.theme.as_deref())
            .unwrap_or("light")
    }

    pub fn source(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.source.as_deref())
    }

    pub fn slide_count(&self) -> usize {
        self.defaults
            .as_ref()
            .and_then(|d| d.slide_count)
            .unwrap_or(DEFAULT_SLIDE_COUNT)
    }

    /// 1-indexed, as written in the file.
    pub fn map_slide(&self) -> Option<usize> {
        self.defaults.as_ref().and_then(|d| d.map_slide)
    }

    pub fn backend(&self) -> Backend {
        self.defaults
            .as_ref()
            .and_then(|d| d.backend)
            .unwrap_or_default()
    }

    pub fn tile_url(&self) -> &str {
        self.map
            .as_ref()
            .and_then(|m| m.tile_url.as_deref())
            .unwrap_or(DEFAULT_TILE_URL)
    }

    pub fn geocoder_url(&self) -> &str {
        self.map
            .as_ref()
            .and_then(|m| m.geocoder_url.as_deref())
            .unwrap_or(DEFAULT_GEOCODER_URL)
    }

    pub fn reveal_delay(&self) -> Duration {
        self.map
            .as_ref()
            .and_then(|m| m.reveal_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REVEAL_DELAY)
    }

    pub fn swipe_threshold(&self) -> f32 {
        self.input
            .as_ref()
            .and_then(|i| i.swipe_threshold)
            .unwrap_or(DEFAULT_SWIPE_THRESHOLD)
    }

    pub fn autoplay_delay(&self) -> Duration {
        self.autoplay
            .as_ref()
            .and_then(|a| a.delay_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_AUTOPLAY_DELAY)
    }
}

fn positive(key: &str, value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid {key}: {value}. Must be a positive whole number."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::default();
        assert_eq!(config.theme(), "light");
        assert_eq!(config.slide_count(), 19);
        assert_eq!(config.map_slide(), None);
        assert_eq!(config.backend(), Backend::FixedRoute);
        assert_eq!(config.tile_url(), DEFAULT_TILE_URL);
        assert_eq!(config.reveal_delay(), Duration::from_millis(600));
        assert_eq!(config.swipe_threshold(), 50.0);
        assert_eq!(config.autoplay_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_set_valid_values() {
        let mut config = Config::default();
        config.set("defaults.theme", "dark").unwrap();
        config.set("defaults.slide_count", "12").unwrap();
        config.set("defaults.map_slide", "7").unwrap();
        config.set("defaults.backend", "geocoding").unwrap();
        config.set("map.tile_url", "").unwrap();
        config.set("map.reveal_delay_ms", "250").unwrap();
        config.set("input.swipe_threshold", "80").unwrap();
        config.set("autoplay.delay_secs", "8").unwrap();

        assert_eq!(config.theme(), "dark");
        assert_eq!(config.slide_count(), 12);
        assert_eq!(config.map_slide(), Some(7));
        assert_eq!(config.backend(), Backend::Geocoding);
        assert_eq!(config.tile_url(), "");
        assert_eq!(config.reveal_delay(), Duration::from_millis(250));
        assert_eq!(config.swipe_threshold(), 80.0);
        assert_eq!(config.autoplay_delay(), Duration::from_secs(8));
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("defaults.theme", "sepia").is_err());
        assert!(config.set("defaults.slide_count", "0").is_err());
        assert!(config.set("defaults.map_slide", "two").is_err());
        assert!(config.set("defaults.backend", "google").is_err());
        assert!(config.set("map.tile_url", "https://example.org/tile.png").is_err());
        assert!(config.set("map.geocoder_url", "nominatim").is_err());
        assert!(config.set("input.swipe_threshold", "-5").is_err());
        let err = config.set("defaults.transition", "fade").unwrap_err();
        assert!(err.to_string().contains("Valid keys"));
        assert!(config.defaults.is_none());
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("slidemap-config-{}.yaml", std::process::id()));
        let mut config = Config::default();
        config.set("defaults.backend", "fixed-route").unwrap();
        config.set("map.geocoder_url", "https://geo.example.org/search").unwrap();
        config.save_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("backend: fixed-route"));
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.geocoder_url(), "https://geo.example.org/search");
        assert_eq!(loaded.backend(), Backend::FixedRoute);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_message() {
        let err = Config::load_from(Path::new("/nonexistent/slidemap/config.yaml")).unwrap_err();
        assert!(err.to_string().contains("No config found"));
    }
}
