//! Inference pipeline and the session that drives it.
//!
//! # Architecture
//!
//! ```text
//! egui update() ──SessionCommand (mpsc)──▶ SessionWorker::run()   ← tokio task
//!       ▲                                    ├─ Listen  → spawn_blocking(VoiceCapture)
//!       │                                    └─ Predict → CropPredictor (encode → scale
//!       │                                                 → classify → decode)
//!       └────────SessionEvent (mpsc)─────────┘
//!
//! Session (form values, phase, status line, reveal) ← owned by the UI
//! AppContext (Arc<ArtifactStore>)                   ← shared, read-only
//! ```

pub mod context;
pub mod predictor;
pub mod reveal;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use context::AppContext;
pub use predictor::{CropPredictor, PredictError};
pub use reveal::{recommendation_message, spoken_recommendation, TypingReveal};
pub use runner::{SessionCommand, SessionEvent, SessionWorker};
pub use state::{Notice, Session, SessionPhase};
