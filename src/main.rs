//! Application entry point for the crop advisor.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Load the trained artifacts into an [`AppContext`].
//! 5. Build the speaker, recorder and recognizer from config.
//! 6. Spawn the [`SessionWorker`] on the runtime.
//! 7. Run [`eframe::run_native`], which blocks the main thread until the window
//!    is closed.
//!
//! If step 4 fails the window opens on an error screen instead of the form.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crop_advisor::{
    app::{CropAdvisorApp, FormView},
    audio::{ListenLimits, MicRecorder},
    config::{AppConfig, AppPaths},
    pipeline::{AppContext, Session, SessionCommand, SessionEvent, SessionWorker},
    stt,
    tts::{self, SpeechEvent, Speaker},
    voice::VoiceCapture,
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let viewport = egui::ViewportBuilder::default()
        .with_title("AI Crop Recommendation")
        .with_inner_size([width, height])
        .with_min_inner_size([420.0, 480.0]);

    eframe::NativeOptions {
        viewport,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Speech event log
// ---------------------------------------------------------------------------

/// Forward speech progress to the log on a small background thread.
fn speech_event_logger() -> Option<std::sync::mpsc::Sender<SpeechEvent>> {
    let (tx, rx) = std::sync::mpsc::channel::<SpeechEvent>();
    let spawned = std::thread::Builder::new()
        .name("tts-events".into())
        .spawn(move || {
            while let Ok(event) = rx.recv() {
                match event {
                    SpeechEvent::Started(text) => log::debug!("speaking {text:?}"),
                    SpeechEvent::Finished(text) => log::debug!("spoke {text:?}"),
                    SpeechEvent::Failed { text, reason } => {
                        log::debug!("could not speak {text:?}: {reason}")
                    }
                }
            }
        });
    match spawned {
        Ok(_) => Some(tx),
        Err(e) => {
            log::warn!("speech events will not be logged: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Session wiring
// ---------------------------------------------------------------------------

fn start_session(
    rt: &tokio::runtime::Runtime,
    context: &AppContext,
    config: &AppConfig,
) -> FormView {
    let speaker: Arc<dyn Speaker> = Arc::from(tts::from_config(&config.speech, speech_event_logger()));

    let voice = stt::from_config(&config.voice, &AppPaths::new()).map(|transcriber| {
        log::info!("voice input via {} recognizer", transcriber.name());
        Arc::new(VoiceCapture::new(
            Box::new(MicRecorder),
            transcriber,
            Arc::clone(&speaker),
            ListenLimits::from_config(&config.voice),
        ))
    });
    if voice.is_none() {
        log::info!("voice input disabled");
    }

    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(32);

    let worker = SessionWorker::new(
        context.predictor(),
        voice.clone(),
        speaker,
        Duration::from_millis(config.ui.thinking_ms),
    );
    rt.spawn(worker.run(command_rx, event_tx));

    let session = Session::new(
        context.collector(),
        Duration::from_millis(config.ui.typing_delay_ms),
    );
    FormView::new(session, voice.is_some(), command_tx, event_rx)
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("crop advisor starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads; voice capture runs on the blocking pool)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4–6. Artifacts, backends, worker
    let app = match AppContext::load(&config) {
        Ok(context) => CropAdvisorApp::new(start_session(&rt, &context, &config)),
        Err(e) => {
            log::error!("could not load artifacts: {e}");
            CropAdvisorApp::failed(e.to_string())
        }
    };

    // 7. Run the window (blocks until closed)
    let options = native_options(&config);
    eframe::run_native(
        "AI Crop Recommendation",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
