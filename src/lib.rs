//! Crop advisor: recommends a crop from soil type, season, irrigation type
//! and water usage, entered through a form or by voice.
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | trained artifacts: encoders, scaler, classifier |
//! | [`collect`] | form values and their validation |
//! | [`pipeline`] | encode → scale → classify → decode, session state, worker |
//! | [`audio`] | microphone capture and speech endpointing |
//! | [`stt`] | speech recognizers |
//! | [`tts`] | spoken prompts and results |
//! | [`voice`] | one voice-entry attempt |
//! | [`config`] | `settings.toml` and platform paths |
//! | [`app`] | the egui window |

pub mod app;
pub mod audio;
pub mod collect;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod stt;
pub mod tts;
pub mod voice;

#[cfg(test)]
mod test_support;
