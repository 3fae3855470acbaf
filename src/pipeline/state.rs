//! Per-window session state, independent of the UI toolkit.
//!
//! [`Session`] holds the form values (through its [`InputCollector`]), the
//! current [`SessionPhase`], the status line and the result reveal.  The UI
//! turns clicks into [`SessionCommand`]s via [`Session::start_listen`] /
//! [`Session::start_predict`] and feeds every [`SessionEvent`] back through
//! [`Session::apply`].
//!
//! ```text
//! Idle ──mic button──▶ Listening(field) ──Heard / VoiceFailed──▶ Idle
//! Idle ──Predict─────▶ Thinking ──Predicted──▶ Result
//!                               ──PredictFailed──▶ Idle
//! Result ──mic / Predict──▶ as from Idle
//! ```

use std::time::{Duration, Instant};

use crate::collect::{FormField, InputCollector};

use super::reveal::{recommendation_message, TypingReveal};
use super::runner::{SessionCommand, SessionEvent};

// ---------------------------------------------------------------------------
// SessionPhase / Notice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    /// Waiting for a spoken answer for this field.
    Listening(FormField),
    /// The cosmetic pause before a result.
    Thinking,
    /// A recommendation is being revealed or shown.
    Result,
}

impl SessionPhase {
    /// `true` while a voice capture or prediction is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, SessionPhase::Listening(_) | SessionPhase::Thinking)
    }
}

/// The status line under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(t) | Notice::Success(t) | Notice::Error(t) => t,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Session {
    collector: InputCollector,
    phase: SessionPhase,
    notice: Option<Notice>,
    reveal: Option<(TypingReveal, Instant)>,
    crop: Option<String>,
    typing_delay: Duration,
}

impl Session {
    pub fn new(collector: InputCollector, typing_delay: Duration) -> Self {
        Self {
            collector,
            phase: SessionPhase::Idle,
            notice: None,
            reveal: None,
            crop: None,
            typing_delay,
        }
    }

    pub fn collector(&self) -> &InputCollector {
        &self.collector
    }

    /// Manual edits go straight to the collector.
    pub fn collector_mut(&mut self) -> &mut InputCollector {
        &mut self.collector
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// The last recommended crop, if any.
    pub fn crop(&self) -> Option<&str> {
        self.crop.as_deref()
    }

    /// Begin a voice capture for `field`.  Returns `None` while busy.
    pub fn start_listen(&mut self, field: FormField) -> Option<SessionCommand> {
        if self.is_busy() {
            return None;
        }
        self.phase = SessionPhase::Listening(field);
        self.notice = Some(Notice::Info(field.voice_prompt().to_string()));
        Some(SessionCommand::Listen { field })
    }

    /// Begin a prediction from the current values.  Returns `None` while
    /// busy.
    pub fn start_predict(&mut self) -> Option<SessionCommand> {
        if self.is_busy() {
            return None;
        }
        self.phase = SessionPhase::Thinking;
        self.notice = None;
        self.reveal = None;
        self.crop = None;
        Some(SessionCommand::Predict {
            fields: self.collector.fields().clone(),
        })
    }

    /// Fold a worker event into the session.  `now` anchors the reveal.
    pub fn apply(&mut self, event: SessionEvent, now: Instant) {
        match event {
            SessionEvent::Listening { field } => {
                self.phase = SessionPhase::Listening(field);
            }
            SessionEvent::Heard { field, transcript } => {
                self.phase = SessionPhase::Idle;
                self.notice = Some(match self.collector.accept_transcript(field, &transcript) {
                    Ok(value) if field == FormField::WaterUsage => {
                        Notice::Success(format!("Water usage set to {value} cubic meters"))
                    }
                    Ok(value) => Notice::Success(format!("You said: {value}")),
                    Err(e) => {
                        log::info!("rejected voice input: {e}");
                        Notice::Error(e.user_message())
                    }
                });
            }
            SessionEvent::VoiceFailed { error, .. } => {
                self.phase = SessionPhase::Idle;
                self.notice = Some(Notice::Error(error.user_message()));
            }
            SessionEvent::Predicted { crop } => {
                self.phase = SessionPhase::Result;
                self.notice = None;
                self.reveal = Some((
                    TypingReveal::new(recommendation_message(&crop), self.typing_delay),
                    now,
                ));
                self.crop = Some(crop);
            }
            SessionEvent::PredictFailed { message } => {
                self.phase = SessionPhase::Idle;
                self.notice = Some(Notice::Error(message));
            }
        }
    }

    /// The part of the recommendation visible at `now`.
    pub fn revealed(&self, now: Instant) -> Option<&str> {
        self.reveal
            .as_ref()
            .map(|(reveal, start)| reveal.visible(now.saturating_duration_since(*start)))
    }

    /// `true` once the whole recommendation is visible.
    pub fn reveal_complete(&self, now: Instant) -> bool {
        self.reveal
            .as_ref()
            .is_some_and(|(reveal, start)| reveal.is_complete(now.saturating_duration_since(*start)))
    }

    /// "Recommended Crop: X", shown after the reveal finishes.
    pub fn confirmation(&self, now: Instant) -> Option<String> {
        if !self.reveal_complete(now) {
            return None;
        }
        self.crop.as_ref().map(|c| format!("Recommended Crop: {c}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
