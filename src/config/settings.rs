//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ArtifactConfig
// ---------------------------------------------------------------------------

/// Where the trained artifacts live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Artifact directory.  `None` means the platform data directory, or
    /// `./artifacts` when that has not been populated.
    pub dir: Option<PathBuf>,
    /// Category encoder tables, one per field.
    pub encoders_file: String,
    /// Water-usage scaler parameters.
    pub scaler_file: String,
    /// Trained classifier.
    pub model_file: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: None,
            encoders_file: "label_encoders.json".into(),
            scaler_file: "scaler.json".into(),
            model_file: "crop_model.json".into(),
        }
    }
}

impl ArtifactConfig {
    /// The directory artifacts are loaded from.
    pub fn resolve_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        let data_dir = AppPaths::new().artifacts_dir;
        if data_dir.exists() {
            data_dir
        } else {
            PathBuf::from("artifacts")
        }
    }
}

// ---------------------------------------------------------------------------
// SttBackend
// ---------------------------------------------------------------------------

/// Which speech recognizer turns recordings into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SttBackend {
    /// Web speech recognition service (needs network access).
    Web,
    /// Local whisper model from the models directory.
    Whisper,
    /// Voice input disabled; the microphone buttons are hidden.
    Disabled,
}

impl Default for SttBackend {
    fn default() -> Self {
        Self::Web
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Settings for voice capture and recognition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Recognition backend.
    pub backend: SttBackend,
    /// Seconds to wait for speech to start before giving up.
    pub listen_timeout_secs: u64,
    /// Longest single answer in seconds; recording stops automatically.
    pub phrase_limit_secs: f32,
    /// Trailing silence in seconds that ends an answer.
    pub silence_secs: f32,
    /// RMS amplitude above which a 30 ms frame counts as speech.
    pub vad_threshold: f32,
    /// BCP-47 language tag sent to the web recognizer.
    pub language: String,
    /// Web recognizer endpoint.
    pub endpoint: String,
    /// API key for the web recognizer, if it requires one.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for a recognition response.
    pub request_timeout_secs: u64,
    /// GGML model file stem for the whisper backend (e.g. `"base.en"`).
    pub whisper_model: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            backend: SttBackend::default(),
            listen_timeout_secs: 5,
            phrase_limit_secs: 10.0,
            silence_secs: 0.8,
            vad_threshold: 0.01,
            language: "en-US".into(),
            endpoint: "http://www.google.com/speech-api/v2/recognize".into(),
            api_key: None,
            request_timeout_secs: 10,
            whisper_model: "base.en".into(),
        }
    }
}

impl VoiceConfig {
    /// The web backend is selected but no API key is configured.  Most
    /// public endpoints reject such requests.
    pub fn missing_api_key(&self) -> bool {
        self.backend == SttBackend::Web
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for spoken prompts and results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speak prompts and recommendations aloud.
    pub enabled: bool,
    /// Text-to-speech program.  `None` picks the platform default
    /// (`espeak-ng`, `say`, or PowerShell).
    pub command: Option<String>,
    /// Speaking rate in words per minute, when the program supports it.
    pub rate: Option<u32>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
            rate: None,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window and presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Length of the "Thinking..." pause before a result, in milliseconds.
    pub thinking_ms: u64,
    /// Delay between revealed characters of the result, in milliseconds.
    /// `0` shows the result at once.
    pub typing_delay_ms: u64,
    /// Initial window size `(width, height)` in points.
    pub window_size: (f32, f32),
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            thinking_ms: 2_000,
            typing_delay_ms: 50,
            window_size: (520.0, 640.0),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use crop_advisor::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Trained artifact locations.
    pub artifacts: ArtifactConfig,
    /// Voice capture / recognition settings.
    pub voice: VoiceConfig,
    /// Text-to-speech settings.
    pub speech: SpeechConfig,
    /// Window / presentation settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
