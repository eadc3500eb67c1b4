use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub mod filename;
pub mod preferences;
pub mod schedule;
pub mod session;
pub mod startup_checks;
pub mod upload;
pub mod watermark;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub app: AppConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Must cover CJK: the built-in identity and document presets are Traditional Chinese
    pub font_path: PathBuf,
    /// Tried in order when `font_path` doesn't exist
    #[serde(default = "default_font_fallbacks")]
    pub font_fallbacks: Vec<PathBuf>,
    pub preview_max_width: u32,
    pub preview_max_height: u32,
    pub jpeg_quality: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    pub max_file_size: u64,
    pub decode_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreferencesConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub output_directory: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ParseError(#[from] toml_edit::de::Error),
}

fn default_font_fallbacks() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
        "/System/Library/Fonts/PingFang.ttc",
        "C:\\Windows\\Fonts\\msjh.ttc",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

impl RenderConfig {
    /// First existing font among `font_path` and the fallbacks
    pub fn resolve_font_path(&self) -> Option<&Path> {
        std::iter::once(&self.font_path)
            .chain(self.font_fallbacks.iter())
            .map(PathBuf::as_path)
            .find(|path| path.is_file())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from("fonts/NotoSansTC-Regular.ttf"),
            font_fallbacks: default_font_fallbacks(),
            preview_max_width: 800,
            preview_max_height: 600,
            jpeg_quality: Some(watermark::DEFAULT_JPEG_QUALITY),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: upload::DEFAULT_MAX_FILE_SIZE,
            decode_timeout_secs: upload::DEFAULT_DECODE_TIMEOUT_SECS,
        }
    }
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".inkmark"),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                name: "Inkmark".to_string(),
                log_level: "info".to_string(),
            },
            render: RenderConfig::default(),
            upload: UploadConfig::default(),
            preferences: PreferencesConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Read a TOML config file, or use defaults when it doesn't exist
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }
        let config_content = std::fs::read_to_string(path)?;
        let config = toml_edit::de::from_str::<Config>(&config_content)?;
        info!("Configuration loaded from: {:?}", path);
        Ok(config)
    }

    pub fn upload_limits(&self) -> upload::UploadLimits {
        upload::UploadLimits {
            max_file_size: self.upload.max_file_size,
            decode_timeout: std::time::Duration::from_secs(self.upload.decode_timeout_secs),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.render
            .jpeg_quality
            .unwrap_or(watermark::DEFAULT_JPEG_QUALITY)
            .clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(&temp_dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.app.name, "Inkmark");
        assert_eq!(config.render.preview_max_width, 800);
        assert_eq!(config.jpeg_quality(), 95);
        assert_eq!(config.upload_limits().max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_partial_config_fills_sections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[app]
name = "Stamps"
log_level = "debug"

[render]
font_path = "fonts/NotoSansTC.ttf"
preview_max_width = 1024
preview_max_height = 768
jpeg_quality = 90
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.app.name, "Stamps");
        assert_eq!(config.render.font_path, PathBuf::from("fonts/NotoSansTC.ttf"));
        assert_eq!(config.render.preview_max_height, 768);
        assert_eq!(config.jpeg_quality(), 90);
        assert_eq!(config.preferences.directory, PathBuf::from(".inkmark"));
        assert_eq!(config.render.font_fallbacks, default_font_fallbacks());
    }

    #[test]
    fn test_font_resolution_prefers_configured_path() {
        let temp_dir = TempDir::new().unwrap();
        let configured = temp_dir.path().join("configured.ttf");
        let fallback = temp_dir.path().join("fallback.ttc");
        std::fs::write(&fallback, b"font").unwrap();

        let mut render = RenderConfig {
            font_path: configured.clone(),
            font_fallbacks: vec![temp_dir.path().join("absent.ttf"), fallback.clone()],
            ..RenderConfig::default()
        };
        assert_eq!(render.resolve_font_path(), Some(fallback.as_path()));

        std::fs::write(&configured, b"font").unwrap();
        assert_eq!(render.resolve_font_path(), Some(configured.as_path()));

        render.font_fallbacks.clear();
        std::fs::remove_file(&configured).unwrap();
        assert_eq!(render.resolve_font_path(), None);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[app\nname = 3").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::ParseError(_))));
    }
}
