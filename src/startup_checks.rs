use crate::Config;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create directory {0}: {1}")]
    DirectoryCreationFailed(String, std::io::Error),

    #[error("Font file missing: {0}")]
    FontMissing(String),

    #[error("Font file unreadable: {0}")]
    FontUnreadable(String),
}

impl StartupCheckError {
    /// Failures that make watermarking impossible rather than degraded
    pub fn is_critical(&self) -> bool {
        matches!(self, StartupCheckError::DirectoryCreationFailed(..))
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    for directory in [
        &config.preferences.directory,
        &config.export.output_directory,
    ] {
        if let Err(e) = ensure_directory(directory).await {
            errors.push(e);
        }
    }

    // Without the font the preview still shows the image, just no watermark
    match config.render.resolve_font_path() {
        None => {
            warn!(
                "No font found at {:?} or any fallback",
                config.render.font_path
            );
            errors.push(StartupCheckError::FontMissing(
                config.render.font_path.display().to_string(),
            ));
        }
        Some(font_path) => match tokio::fs::metadata(font_path).await {
            Ok(metadata) if metadata.len() > 0 => info!("Font file found: {:?}", font_path),
            _ => {
                warn!("Font file is empty or unreadable: {:?}", font_path);
                errors.push(StartupCheckError::FontUnreadable(
                    font_path.display().to_string(),
                ));
            }
        },
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}

async fn ensure_directory(directory: &Path) -> Result<(), StartupCheckError> {
    if directory.exists() {
        info!("Directory exists: {:?}", directory);
        return Ok(());
    }

    info!("Directory does not exist, creating: {:?}", directory);
    tokio::fs::create_dir_all(directory).await.map_err(|e| {
        error!("Failed to create directory {:?}: {}", directory, e);
        StartupCheckError::DirectoryCreationFailed(directory.display().to_string(), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.preferences.directory = temp_dir.path().join("prefs");
        config.export.output_directory = temp_dir.path().join("out");
        config.render.font_path = temp_dir.path().join("font.ttf");
        config.render.font_fallbacks.clear();
        config
    }

    #[tokio::test]
    async fn test_creates_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        std::fs::write(&config.render.font_path, b"not really a font").unwrap();

        perform_startup_checks(&config).await.unwrap();

        assert!(config.preferences.directory.is_dir());
        assert!(config.export.output_directory.is_dir());
    }

    #[tokio::test]
    async fn test_missing_font_is_reported_but_not_critical() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        let errors = perform_startup_checks(&config).await.unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StartupCheckError::FontMissing(_)));
        assert!(!errors[0].is_critical());
    }

    #[tokio::test]
    async fn test_fallback_font_satisfies_check() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_in(&temp_dir);
        let fallback = temp_dir.path().join("NotoSansCJK-Regular.ttc");
        std::fs::write(&fallback, b"not really a font").unwrap();
        config.render.font_fallbacks = vec![fallback];

        perform_startup_checks(&config).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_font_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        std::fs::write(&config.render.font_path, b"").unwrap();

        let errors = perform_startup_checks(&config).await.unwrap_err();
        assert!(matches!(errors[0], StartupCheckError::FontUnreadable(_)));
    }
}
