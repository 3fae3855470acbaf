//! Voice entry for form fields.
//!
//! ```text
//! VoiceCapture::capture(prompt)
//!     ├─ Speaker::speak(prompt)        fire-and-forget
//!     ├─ Recorder::record(limits)      ListenTimeout if nobody speaks
//!     └─ Transcriber::transcribe(pcm)  TranscriptionUnavailable / TranscriptionFailed
//! ```
//!
//! Turning the transcript into a field value is the collector's job
//! (`InputCollector::accept_transcript`).

pub mod capture;
pub mod error;

pub use capture::VoiceCapture;
pub use error::VoiceError;
