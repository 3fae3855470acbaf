//! Microphone capture for spoken answers.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → MonoResampler (16 kHz mono)
//!           → Endpointer (VAD: wait for speech, stop on silence) → Vec<f32>
//! ```
//!
//! [`Recorder`] is the seam the voice layer depends on; [`MicRecorder`] is
//! the production implementation.

pub mod capture;
pub mod recorder;
pub mod resample;
pub mod vad;

pub use capture::{AudioCapture, AudioChunk, CaptureError, StreamHandle};
pub use recorder::{ListenLimits, MicRecorder, Recorder};
pub use resample::{downmix, MonoResampler, ResamplerError, TARGET_RATE};
pub use vad::{EndpointStatus, Endpointer, VadDetector};

#[cfg(test)]
pub use recorder::ScriptedRecorder;
