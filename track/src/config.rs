use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::countdown::DisplayZone;
use crate::tile::{ContentMode, TileDescriptor};

pub const CONFIG_PATH_ENV: &str = "REVEAL_TRACK_CONFIG";
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

const BUILTIN_TRACK: &str = include_str!("../assets/default_track.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read track config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid track config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("track config has no tiles")]
    Empty,
    #[error("duplicate tile id {0:?}")]
    DuplicateId(String),
    #[error("tile at position {0} has an empty id")]
    BlankId(usize),
}

/// Deployment-time description of the track. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackConfig {
    #[serde(default)]
    pub content_mode: ContentMode,
    #[serde(default)]
    pub display_zone: DisplayZone,
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    pub tiles: Vec<TileDescriptor>,
}

fn default_tick_millis() -> u64 {
    DEFAULT_TICK_MILLIS
}

impl TrackConfig {
    pub fn new(content_mode: ContentMode, tiles: Vec<TileDescriptor>) -> Self {
        Self {
            content_mode,
            display_zone: DisplayZone::default(),
            tick_millis: DEFAULT_TICK_MILLIS,
            tiles,
        }
    }

    pub fn builtin() -> Self {
        // The bundled document is covered by tests; a failure here is a build defect.
        Self::from_json_str(BUILTIN_TRACK).unwrap_or_else(|err| {
            tracing::error!(%err, "bundled track config is invalid");
            Self::new(ContentMode::IconOnly, Vec::new())
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Loads `explicit`, else the file named by `REVEAL_TRACK_CONFIG`, else the bundled track.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading track config");
                Self::load(&path)
            }
            None => {
                tracing::info!("using bundled track config");
                Ok(Self::builtin())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiles.is_empty() {
            return Err(ConfigError::Empty);
        }
        let mut seen = HashSet::new();
        for (i, tile) in self.tiles.iter().enumerate() {
            if tile.id.trim().is_empty() {
                return Err(ConfigError::BlankId(i));
            }
            if !seen.insert(tile.id.as_str()) {
                return Err(ConfigError::DuplicateId(tile.id.clone()));
            }
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}
