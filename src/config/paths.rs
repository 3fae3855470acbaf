//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\crop-advisor\
//!   macOS:   ~/Library/Application Support/crop-advisor/
//!   Linux:   ~/.config/crop-advisor/
//!
//! Data dir (trained artifacts, whisper models):
//!   Windows: %LOCALAPPDATA%\crop-advisor\
//!   macOS:   ~/Library/Application Support/crop-advisor/
//!   Linux:   ~/.local/share/crop-advisor/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory holding `label_encoders.json`, `scaler.json` and
    /// `crop_model.json`.
    pub artifacts_dir: PathBuf,
    /// Directory for GGML whisper model files (offline recognition).
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "crop-advisor";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            artifacts_dir: data_dir.join("artifacts"),
            models_dir: data_dir.join("models"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.models_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .artifacts_dir
            .file_name()
            .is_some_and(|n| n == "artifacts"));
    }
}
