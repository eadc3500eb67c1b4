use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::watermark::{
    Anchor, MAX_FONT_SIZE, MIN_FONT_SIZE, PresetId, WatermarkConfig, WatermarkMode, apply_preset,
};

/// Key the preferences payload is stored under
pub const STORAGE_KEY: &str = "watermark-preferences";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Per-user watermark settings that survive between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(rename = "type")]
    pub mode: WatermarkMode,
    pub preset_type: PresetId,
    pub opacity: f32,
    pub font_size: u32,
    #[serde(deserialize_with = "lenient_anchor")]
    pub position: Anchor,
}

/// Unknown anchor names load as bottom-right instead of failing the whole payload
fn lenient_anchor<'de, D>(deserializer: D) -> Result<Anchor, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Ok(Anchor::from_name_or_default(&name))
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            mode: WatermarkMode::Preset,
            preset_type: PresetId::IdentityVerification,
            opacity: 0.5,
            font_size: 24,
            position: Anchor::BottomRight,
        }
    }
}

impl Preferences {
    /// Snapshot of `config`, with opacity and font size coerced into their valid ranges
    pub fn from_config(config: &WatermarkConfig) -> Self {
        Self {
            mode: config.mode,
            preset_type: config.preset_id,
            opacity: config.clamped_opacity(),
            font_size: config.clamped_font_size(),
            position: config.anchor,
        }
    }

    /// Build a config from these preferences. Preset text and color come from the
    /// preset table; opacity, font size and position come from the saved values.
    pub fn to_config(&self) -> WatermarkConfig {
        let mut config = WatermarkConfig::default();
        apply_preset(&mut config, self.preset_type);
        config.mode = self.mode;
        if self.mode == WatermarkMode::Custom {
            config.text.clear();
        }
        config.opacity = self.opacity;
        config.font_size_px = self.font_size;
        config.set_anchor(self.position);
        config
    }

    /// Parse a stored payload and check it before trusting it
    pub fn parse(raw: &str) -> Result<Preferences, PreferenceError> {
        let preferences = serde_json::from_str::<Preferences>(raw)?;
        preferences.validate()?;
        Ok(preferences)
    }

    pub fn validate(&self) -> Result<(), PreferenceError> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(PreferenceError::InvalidValue {
                key: "opacity",
                reason: format!("{} is outside [0, 1]", self.opacity),
            });
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(PreferenceError::InvalidValue {
                key: "fontSize",
                reason: format!(
                    "{} is outside [{}, {}]",
                    self.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE
                ),
            });
        }
        Ok(())
    }
}

/// Key-value storage for serialized preferences
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Stores each key as `<directory>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        std::fs::create_dir_all(&self.directory)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Load saved preferences, falling back to defaults for anything missing or invalid
pub fn load_preferences(store: &dyn PreferenceStore) -> Preferences {
    let raw = match store.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No saved preferences, using defaults");
            return Preferences::default();
        }
        Err(e) => {
            warn!("Failed to read preferences, using defaults: {}", e);
            return Preferences::default();
        }
    };

    match Preferences::parse(&raw) {
        Ok(preferences) => {
            debug!("Loaded preferences: {:?}", preferences);
            preferences
        }
        Err(e) => {
            warn!("Ignoring saved preferences: {}", e);
            Preferences::default()
        }
    }
}

pub fn save_preferences(
    store: &mut dyn PreferenceStore,
    preferences: &Preferences,
) -> Result<(), PreferenceError> {
    let json = serde_json::to_string(preferences)?;
    store.set(STORAGE_KEY, &json)?;
    debug!("Saved preferences: {}", json);
    Ok(())
}
