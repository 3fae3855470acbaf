//! Speech-to-text backends.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              Transcriber (trait)             │
//! │                                              │
//! │   WebTranscriber      HTTP recognizer        │
//! │   WhisperTranscriber  local GGML model       │
//! │   UnavailableTranscriber  backend failed     │
//! │                           to initialise      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Every backend takes 16 kHz mono `f32` audio and reports failures as
//! [`VoiceError`]: an unreachable or broken backend is
//! `TranscriptionUnavailable`, unintelligible audio is `TranscriptionFailed`.

pub mod web;
pub mod whisper;

use crate::config::{AppPaths, SttBackend, VoiceConfig};
use crate::voice::VoiceError;

pub use web::WebTranscriber;
pub use whisper::{SttError, WhisperTranscriber};

/// Object-safe, thread-safe speech recognizer.
///
/// Calls block; run them on a blocking thread.
pub trait Transcriber: Send + Sync {
    /// Transcribe 16 kHz mono audio into text.
    fn transcribe(&self, audio: &[f32]) -> Result<String, VoiceError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Transcriber>) {}
};

/// Stands in for a backend that could not be initialised, so voice entry
/// reports the problem on each attempt instead of disappearing.
#[derive(Debug, Clone)]
pub struct UnavailableTranscriber {
    reason: String,
}

impl UnavailableTranscriber {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Transcriber for UnavailableTranscriber {
    fn transcribe(&self, _audio: &[f32]) -> Result<String, VoiceError> {
        Err(VoiceError::TranscriptionUnavailable(self.reason.clone()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Build the configured backend.  Returns `None` when voice input is
/// disabled.
pub fn from_config(voice: &VoiceConfig, paths: &AppPaths) -> Option<Box<dyn Transcriber>> {
    match voice.backend {
        SttBackend::Disabled => None,
        SttBackend::Web => {
            if voice.missing_api_key() {
                log::warn!(
                    "web recognizer has no api_key in settings.toml; requests will \
                     likely be refused (set [voice] api_key, or backend = \"Whisper\" or \"Disabled\")"
                );
            }
            web_backend(voice)
        }
        SttBackend::Whisper => {
            let path = whisper::model_path(&paths.models_dir, &voice.whisper_model);
            match WhisperTranscriber::load(&path, &voice.language) {
                Ok(t) => Some(Box::new(t)),
                Err(e) => {
                    log::warn!("whisper recognizer unavailable: {e}");
                    Some(Box::new(UnavailableTranscriber::new(e.to_string())))
                }
            }
        }
    }
}

fn web_backend(voice: &VoiceConfig) -> Option<Box<dyn Transcriber>> {
    match WebTranscriber::from_config(voice) {
        Ok(t) => Some(Box::new(t)),
        Err(e) => {
            log::warn!("web recognizer unavailable: {e}");
            Some(Box::new(UnavailableTranscriber::new(e.to_string())))
        }
    }
}

// ---------------------------------------------------------------------------
// MockTranscriber  (test-only)
// ---------------------------------------------------------------------------

/// Returns a pre-configured response and counts calls.
#[cfg(test)]
pub struct MockTranscriber {
    response: Result<String, VoiceError>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockTranscriber {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            calls: Default::default(),
        }
    }

    pub fn err(error: VoiceError) -> Self {
        Self {
            response: Err(error),
            calls: Default::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl Transcriber for MockTranscriber {
    fn transcribe(&self, _audio: &[f32]) -> Result<String, VoiceError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.response.clone()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
