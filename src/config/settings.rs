use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use toml;

const CONFIG_FILE: &str = "plaza.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceSettings {
    /// Topic feed endpoint.
    pub feed_url: String,
    /// Delay between availability polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Polls before giving up with a data-unavailable error.
    pub max_poll_attempts: u32,
}

impl Default for DataSourceSettings {
    fn default() -> Self {
        Self {
            feed_url: "http://api.olv.pretendo.cc/v1/topics".to_string(),
            poll_interval_ms: 2000,
            max_poll_attempts: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSettings {
    /// Base URL assets are fetched under, as `{base_url}/{id}`.
    pub base_url: String,
    /// HTTP timeout for a single asset fetch, in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Serve assets from this directory instead of HTTP when set.
    pub local_dir: Option<PathBuf>,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            base_url: "http://assets.plaza.local/parts/".to_string(),
            fetch_timeout_ms: 30_000,
            local_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Crowd/animation tick rate.
    pub tick_hz: f32,
    pub max_speed: f32,
    pub arrival_radius: f32,
    pub min_separation: f32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self { tick_hz: 60.0, max_speed: 0.08, arrival_radius: 10.0, min_separation: 1.0 }
    }
}

impl SimulationSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.tick_hz.max(1.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Radius of the ring community anchors sit on.
    pub community_ring_radius: f32,
    /// Radius of the scatter ring around each community anchor.
    pub avatar_ring_radius: f32,
    /// Cap on people placed per community.
    pub max_people_per_community: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self { community_ring_radius: 60.0, avatar_ring_radius: 14.0, max_people_per_community: 12 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlazaSettings {
    pub data_source: DataSourceSettings,
    pub assets: AssetSettings,
    pub simulation: SimulationSettings,
    pub layout: LayoutSettings,
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "plaza-rust").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Load settings from the platform config directory; `None` when the file
/// is absent or unreadable.
pub fn load_settings() -> Option<PlazaSettings> {
    let path = config_path()?;
    let raw = fs::read_to_string(path).ok()?;
    match toml::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!("ignoring malformed config: {e}");
            None
        }
    }
}

/// Persist settings to the platform config directory.
pub fn save_settings(settings: &PlazaSettings) -> Result<(), std::io::Error> {
    let path = config_path().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory available")
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = toml::to_string_pretty(settings)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(path, raw)
}
