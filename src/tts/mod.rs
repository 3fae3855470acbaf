//! Spoken prompts and results.
//!
//! Speech is fire-and-forget: [`Speaker::speak`] returns immediately and
//! the utterance plays on a detached thread.  A failure to speak is logged
//! and never reaches the form.  Callers that want to know when an
//! utterance ends can subscribe to [`SpeechEvent`]s; nothing in the form
//! waits on them.

pub mod command;

use std::sync::mpsc;

use crate::config::SpeechConfig;

pub use command::CommandSpeaker;

/// Progress of one utterance, sent one-way to an optional listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started(String),
    Finished(String),
    Failed { text: String, reason: String },
}

/// Text-to-speech sink.
pub trait Speaker: Send + Sync {
    /// Queue `text` for speaking and return without waiting.
    fn speak(&self, text: &str);
}

/// Speaks nothing.  Used when speech is disabled in settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, text: &str) {
        log::trace!("speech disabled, not speaking {text:?}");
    }
}

/// Build the configured speaker.  `events` receives [`SpeechEvent`]s when
/// given.
pub fn from_config(
    speech: &SpeechConfig,
    events: Option<mpsc::Sender<SpeechEvent>>,
) -> Box<dyn Speaker> {
    if !speech.enabled {
        return Box::new(SilentSpeaker);
    }
    let mut speaker = CommandSpeaker::from_config(speech);
    log::info!("speaking prompts with {}", speaker.program());
    if let Some(tx) = events {
        speaker = speaker.with_events(tx);
    }
    Box::new(speaker)
}

// ---------------------------------------------------------------------------
// RecordingSpeaker  (test-only)
// ---------------------------------------------------------------------------

/// Remembers everything it was asked to say.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSpeaker {
    spoken: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().expect("speaker lock").clone()
    }
}

#[cfg(test)]
impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) {
        self.spoken.lock().expect("speaker lock").push(text.to_string());
    }
}
