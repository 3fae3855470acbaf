//! Background session worker: voice capture and prediction off the UI thread.
//!
//! The UI sends [`SessionCommand`]s over a `tokio::sync::mpsc` channel and
//! drains [`SessionEvent`]s every frame.
//!
//! # Flow
//!
//! ```text
//! SessionCommand::Listen { field }
//!   └─▶ Listening → spawn_blocking(VoiceCapture::capture)
//!         ├─ Ok  → Heard { field, transcript }
//!         └─ Err → VoiceFailed { field, error }
//!
//! SessionCommand::Predict { fields }
//!   └─▶ sleep(thinking) → CropPredictor::predict_fields
//!         ├─ Ok  → speak result, Predicted { crop }
//!         └─ Err → PredictFailed { message }
//! ```
//!
//! Commands are handled one at a time, in arrival order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::predictor::CropPredictor;
use super::reveal::spoken_recommendation;
use crate::collect::{FormField, RequestFields};
use crate::tts::Speaker;
use crate::voice::{VoiceCapture, VoiceError};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Requests from the UI.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Capture a spoken answer for `field`.
    Listen { field: FormField },
    /// Predict a crop for the given values.
    Predict { fields: RequestFields },
}

/// Progress and results delivered back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The prompt has been queued and the microphone is open.
    Listening { field: FormField },
    /// A transcript is ready; the UI validates it against the field.
    Heard { field: FormField, transcript: String },
    /// The attempt failed before a transcript was available.
    VoiceFailed { field: FormField, error: VoiceError },
    /// A crop was recommended.
    Predicted { crop: String },
    /// Prediction failed; `message` is safe to show.
    PredictFailed { message: String },
}

// ---------------------------------------------------------------------------
// SessionWorker
// ---------------------------------------------------------------------------

/// Runs commands from one form session.
///
/// Create with [`SessionWorker::new`] and spawn [`run`](Self::run) on the
/// tokio runtime.
pub struct SessionWorker {
    predictor: CropPredictor,
    voice: Option<Arc<VoiceCapture>>,
    speaker: Arc<dyn Speaker>,
    thinking: Duration,
}

impl SessionWorker {
    /// * `voice`   : `None` when voice input is disabled.
    /// * `speaker` : speaks the recommendation.
    /// * `thinking`: cosmetic pause before each prediction.
    pub fn new(
        predictor: CropPredictor,
        voice: Option<Arc<VoiceCapture>>,
        speaker: Arc<dyn Speaker>,
        thinking: Duration,
    ) -> Self {
        Self {
            predictor,
            voice,
            speaker,
            thinking,
        }
    }

    /// Process commands until `command_rx` closes or the UI stops
    /// listening for events.
    pub async fn run(
        self,
        mut command_rx: mpsc::Receiver<SessionCommand>,
        event_tx: mpsc::Sender<SessionEvent>,
    ) {
        while let Some(command) = command_rx.recv().await {
            let delivered = match command {
                SessionCommand::Listen { field } => self.listen(field, &event_tx).await,
                SessionCommand::Predict { fields } => self.predict(fields, &event_tx).await,
            };
            if !delivered {
                break;
            }
        }
        log::info!("session: command channel closed, worker shutting down");
    }

    /// Returns `false` once the UI has gone away.
    async fn listen(&self, field: FormField, event_tx: &mpsc::Sender<SessionEvent>) -> bool {
        let Some(voice) = self.voice.clone() else {
            let error = VoiceError::TranscriptionUnavailable("voice input is disabled".into());
            return send(event_tx, SessionEvent::VoiceFailed { field, error }).await;
        };

        if !send(event_tx, SessionEvent::Listening { field }).await {
            return false;
        }

        let prompt = field.voice_prompt();
        let outcome = tokio::task::spawn_blocking(move || voice.capture(prompt))
            .await
            .unwrap_or_else(|e| Err(VoiceError::Microphone(format!("capture task failed: {e}"))));

        let event = match outcome {
            Ok(transcript) => SessionEvent::Heard { field, transcript },
            Err(error) => {
                log::warn!("session: voice entry for {field} failed: {error}");
                SessionEvent::VoiceFailed { field, error }
            }
        };
        send(event_tx, event).await
    }

    async fn predict(&self, fields: RequestFields, event_tx: &mpsc::Sender<SessionEvent>) -> bool {
        if !self.thinking.is_zero() {
            tokio::time::sleep(self.thinking).await;
        }

        let event = match self.predictor.predict_fields(&fields) {
            Ok(crop) => {
                log::info!("session: recommended {crop}");
                self.speaker.speak(&spoken_recommendation(&crop));
                SessionEvent::Predicted { crop }
            }
            Err(e) => {
                if e.is_configuration_defect() {
                    log::error!("session: artifacts disagree: {e}");
                } else {
                    log::warn!("session: prediction rejected: {e}");
                }
                SessionEvent::PredictFailed {
                    message: e.user_message().to_string(),
                }
            }
        };
        send(event_tx, event).await
    }
}

async fn send(event_tx: &mpsc::Sender<SessionEvent>, event: SessionEvent) -> bool {
    event_tx.send(event).await.is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ListenLimits, ScriptedRecorder};
    use crate::model::Field;
    use crate::stt::MockTranscriber;
    use crate::test_support::sample_store;
    use crate::tts::RecordingSpeaker;

    struct Harness {
        command_tx: mpsc::Sender<SessionCommand>,
        event_rx: mpsc::Receiver<SessionEvent>,
        speaker: Arc<RecordingSpeaker>,
    }

    fn spawn(voice: Option<VoiceCapture>) -> Harness {
        let store = Arc::new(sample_store());
        let speaker = Arc::new(RecordingSpeaker::default());
        let worker = SessionWorker::new(
            CropPredictor::new(store),
            voice.map(Arc::new),
            speaker.clone(),
            Duration::ZERO,
        );
        let (command_tx, command_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(8);
        tokio::spawn(worker.run(command_rx, event_tx));
        Harness {
            command_tx,
            event_rx,
            speaker,
        }
    }

    fn voice(recorder: ScriptedRecorder, transcriber: MockTranscriber) -> VoiceCapture {
        VoiceCapture::new(
            Box::new(recorder),
            Box::new(transcriber),
            Arc::new(RecordingSpeaker::default()),
            ListenLimits::default(),
        )
    }

    fn fields(soil: &str) -> RequestFields {
        RequestFields {
            soil_type: soil.into(),
            season: "Rabi".into(),
            irrigation_type: "Drip".into(),
            water_usage: 80.0,
        }
    }

    #[tokio::test]
    async fn listen_reports_listening_then_heard() {
        let mut h = spawn(Some(voice(ScriptedRecorder::speech(), MockTranscriber::ok("clay"))));
        let field = FormField::Category(Field::SoilType);
        h.command_tx.send(SessionCommand::Listen { field }).await.unwrap();

        assert_eq!(h.event_rx.recv().await, Some(SessionEvent::Listening { field }));
        assert_eq!(
            h.event_rx.recv().await,
            Some(SessionEvent::Heard {
                field,
                transcript: "clay".into()
            })
        );
    }

    #[tokio::test]
    async fn silence_is_reported_as_listen_timeout() {
        let mut h = spawn(Some(voice(ScriptedRecorder::silence(), MockTranscriber::ok("x"))));
        let field = FormField::WaterUsage;
        h.command_tx.send(SessionCommand::Listen { field }).await.unwrap();

        h.event_rx.recv().await; // Listening
        assert_eq!(
            h.event_rx.recv().await,
            Some(SessionEvent::VoiceFailed {
                field,
                error: VoiceError::ListenTimeout
            })
        );
    }

    #[tokio::test]
    async fn listen_without_voice_backend_fails_immediately() {
        let mut h = spawn(None);
        let field = FormField::Category(Field::Season);
        h.command_tx.send(SessionCommand::Listen { field }).await.unwrap();

        match h.event_rx.recv().await {
            Some(SessionEvent::VoiceFailed {
                error: VoiceError::TranscriptionUnavailable(_),
                ..
            }) => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn predict_reports_and_speaks_crop() {
        let mut h = spawn(None);
        h.command_tx
            .send(SessionCommand::Predict {
                fields: fields("Clay"),
            })
            .await
            .unwrap();

        let Some(SessionEvent::Predicted { crop }) = h.event_rx.recv().await else {
            panic!("expected a prediction");
        };
        assert!(["Maize", "Rice", "Wheat"].contains(&crop.as_str()));
        assert_eq!(
            h.speaker.spoken(),
            vec![format!("The recommended crop is {crop}.")]
        );
    }

    #[tokio::test]
    async fn predict_with_unknown_label_fails_without_speaking() {
        let mut h = spawn(None);
        h.command_tx
            .send(SessionCommand::Predict {
                fields: fields("Gravel"),
            })
            .await
            .unwrap();

        assert!(matches!(
            h.event_rx.recv().await,
            Some(SessionEvent::PredictFailed { .. })
        ));
        assert!(h.speaker.spoken().is_empty());
    }

    #[tokio::test]
    async fn worker_stops_when_commands_close() {
        let Harness {
            command_tx,
            mut event_rx,
            ..
        } = spawn(None);
        drop(command_tx);
        assert_eq!(event_rx.recv().await, None);
    }
}
