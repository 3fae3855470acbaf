//! One voice-entry attempt: prompt, record, transcribe.

use std::sync::Arc;

use super::VoiceError;
use crate::audio::{ListenLimits, Recorder};
use crate::stt::Transcriber;
use crate::tts::Speaker;

/// Captures a single spoken answer.
///
/// [`capture`](VoiceCapture::capture) blocks for up to the listen timeout
/// plus the phrase limit plus the recognizer round trip, so call it from a
/// blocking task.
pub struct VoiceCapture {
    recorder: Box<dyn Recorder>,
    transcriber: Box<dyn Transcriber>,
    speaker: Arc<dyn Speaker>,
    limits: ListenLimits,
}

impl std::fmt::Debug for VoiceCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceCapture")
            .field("transcriber", &self.transcriber.name())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl VoiceCapture {
    pub fn new(
        recorder: Box<dyn Recorder>,
        transcriber: Box<dyn Transcriber>,
        speaker: Arc<dyn Speaker>,
        limits: ListenLimits,
    ) -> Self {
        Self {
            recorder,
            transcriber,
            speaker,
            limits,
        }
    }

    /// Speak `prompt`, listen for an answer and return its transcript.
    ///
    /// The prompt is not awaited.  The returned text is trimmed and never
    /// empty.
    pub fn capture(&self, prompt: &str) -> Result<String, VoiceError> {
        self.speaker.speak(prompt);

        let audio = self.recorder.record(&self.limits)?;
        if audio.is_empty() {
            return Err(VoiceError::TranscriptionFailed);
        }

        let text = self.transcriber.transcribe(&audio)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(VoiceError::TranscriptionFailed);
        }
        log::info!("heard {text:?} via {}", self.transcriber.name());
        Ok(text.to_string())
    }
}
