//! Offline recognition with a local whisper GGML model.
//!
//! Models live in the application models directory as `ggml-<name>.bin`
//! (e.g. `ggml-base.en.bin`).  A new `WhisperState` is created for every
//! call so one [`WhisperTranscriber`] can be shared across threads.

use std::path::{Path, PathBuf};

use thiserror::Error;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::Transcriber;
use crate::voice::VoiceError;

/// Whisper rejects clips under one second; shorter answers are padded.
const MIN_AUDIO_SAMPLES: usize = 16_000;

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum SttError {
    #[error("whisper model not found: {0}")]
    ModelNotFound(String),

    #[error("whisper context initialisation failed: {0}")]
    ContextInit(String),

    #[error("whisper inference failed: {0}")]
    Inference(String),
}

impl From<SttError> for VoiceError {
    fn from(e: SttError) -> Self {
        VoiceError::TranscriptionUnavailable(e.to_string())
    }
}

/// `<models_dir>/ggml-<name>.bin`
pub fn model_path(models_dir: &Path, name: &str) -> PathBuf {
    models_dir.join(format!("ggml-{name}.bin"))
}

/// Whisper wants an ISO-639-1 code; `"en-US"` becomes `"en"`.
pub fn whisper_language(tag: &str) -> Option<String> {
    let primary = tag.split(['-', '_']).next().unwrap_or("").trim();
    if primary.is_empty() || primary.eq_ignore_ascii_case("auto") {
        None
    } else {
        Some(primary.to_ascii_lowercase())
    }
}

fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// WhisperTranscriber
// ---------------------------------------------------------------------------

pub struct WhisperTranscriber {
    ctx: WhisperContext,
    language: Option<String>,
    n_threads: i32,
}

impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("language", &self.language)
            .field("n_threads", &self.n_threads)
            .finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; the model
// weights are read-only after loading.
unsafe impl Send for WhisperTranscriber {}
unsafe impl Sync for WhisperTranscriber {}

impl WhisperTranscriber {
    pub fn load(model_path: impl AsRef<Path>, language: &str) -> Result<Self, SttError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }
        let path_str = path.to_str().ok_or_else(|| {
            SttError::ModelNotFound(format!("non-UTF-8 model path: {}", path.display()))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        log::info!("loaded whisper model {}", path.display());
        Ok(Self {
            ctx,
            language: whisper_language(language),
            n_threads: optimal_threads(),
        })
    }

    fn run(&self, audio: &[f32]) -> Result<String, SttError> {
        let mut padded: Vec<f32>;
        let audio = if audio.len() < MIN_AUDIO_SAMPLES {
            padded = audio.to_vec();
            padded.resize(MIN_AUDIO_SAMPLES, 0.0);
            padded.as_slice()
        } else {
            audio
        };

        let mut fp = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        fp.set_language(self.language.as_deref());
        fp.set_n_threads(self.n_threads);
        fp.set_single_segment(true);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;
        state
            .full(fp, audio)
            .map_err(|e| SttError::Inference(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Inference(e.to_string()))?;
        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Inference(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
        }
        Ok(text.trim().to_string())
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, audio: &[f32]) -> Result<String, VoiceError> {
        if audio.is_empty() {
            return Err(VoiceError::TranscriptionFailed);
        }
        let text = self.run(audio)?;
        let text = text.trim_end_matches(['.', '!', '?', ',']).trim();
        // Non-speech comes back as a tag like "[BLANK_AUDIO]" or "(silence)".
        if text.is_empty() || text.starts_with(['[', '(']) {
            return Err(VoiceError::TranscriptionFailed);
        }
        Ok(text.to_string())
    }

    fn name(&self) -> &'static str {
        "whisper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_path_uses_ggml_naming() {
        let p = model_path(Path::new("/models"), "base.en");
        assert_eq!(p, PathBuf::from("/models/ggml-base.en.bin"));
    }

    #[test]
    fn language_tag_to_whisper_code() {
        assert_eq!(whisper_language("en-US").as_deref(), Some("en"));
        assert_eq!(whisper_language("hi_IN").as_deref(), Some("hi"));
        assert_eq!(whisper_language("auto"), None);
        assert_eq!(whisper_language(""), None);
    }

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let result = WhisperTranscriber::load("/nonexistent/ggml-base.en.bin", "en-US");
        assert!(
            matches!(result, Err(SttError::ModelNotFound(_))),
            "expected ModelNotFound, got: {result:?}"
        );
    }

    #[test]
    fn stt_errors_become_unavailable() {
        let e: VoiceError = SttError::ContextInit("bad file".into()).into();
        assert!(matches!(e, VoiceError::TranscriptionUnavailable(m) if m.contains("bad file")));
    }
}
