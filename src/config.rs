use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::world::generation::DEFAULT_MAX_PLACEMENT_ATTEMPTS;

/// Game settings loaded from a TOML file.
///
/// Every field has a default, so a partial (or missing) file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Where saves are written and read.
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Pin the world seed instead of generating one per new game.
    #[serde(default)]
    pub seed: Option<String>,

    /// Cap on rejection-sampling attempts for spawn and item cells.
    #[serde(default = "default_max_placement_attempts")]
    pub max_placement_attempts: u32,
}

fn default_save_path() -> String {
    "game.save".to_string()
}

fn default_max_placement_attempts() -> u32 {
    DEFAULT_MAX_PLACEMENT_ATTEMPTS
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            save_path: default_save_path(),
            seed: None,
            max_placement_attempts: default_max_placement_attempts(),
        }
    }
}

impl GameConfig {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate setting ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.save_path.is_empty() {
            return Err("save_path must not be empty".to_string());
        }
        if self.max_placement_attempts == 0 {
            return Err("max_placement_attempts must be >= 1".to_string());
        }
        Ok(())
    }
}
