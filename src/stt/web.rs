//! HTTP speech recognizer.
//!
//! Audio is posted as raw 16-bit big-endian PCM (`audio/l16; rate=16000`).
//! The service answers with newline-delimited JSON objects; the first one
//! with a non-empty `result` carries the alternatives:
//!
//! ```text
//! {"result":[]}
//! {"result":[{"alternative":[{"transcript":"clay","confidence":0.92}],"final":true}],"result_index":0}
//! ```

use std::time::Duration;

use serde::Deserialize;

use super::Transcriber;
use crate::audio::TARGET_RATE;
use crate::config::VoiceConfig;
use crate::voice::VoiceError;

pub struct WebTranscriber {
    client: reqwest::blocking::Client,
    endpoint: String,
    language: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for WebTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebTranscriber")
            .field("endpoint", &self.endpoint)
            .field("language", &self.language)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl WebTranscriber {
    pub fn from_config(voice: &VoiceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(voice.request_timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: voice.endpoint.clone(),
            language: voice.language.clone(),
            api_key: voice.api_key.clone(),
        })
    }

    fn query(&self) -> Vec<(&'static str, &str)> {
        let mut query = vec![("client", "chromium"), ("lang", self.language.as_str())];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }
        query
    }
}

impl Transcriber for WebTranscriber {
    fn transcribe(&self, audio: &[f32]) -> Result<String, VoiceError> {
        if audio.is_empty() {
            return Err(VoiceError::TranscriptionFailed);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .query(&self.query())
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("audio/l16; rate={TARGET_RATE};"),
            )
            .body(to_l16_be(audio))
            .send()
            .map_err(|e| VoiceError::TranscriptionUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoiceError::TranscriptionUnavailable(format!(
                "recognizer returned {status}"
            )));
        }

        let body = response
            .text()
            .map_err(|e| VoiceError::TranscriptionUnavailable(e.to_string()))?;
        parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "web"
    }
}

/// `f32` samples to 16-bit big-endian PCM bytes.
pub fn to_l16_be(audio: &[f32]) -> Vec<u8> {
    audio
        .iter()
        .flat_map(|&s| {
            let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
            v.to_be_bytes()
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ResponseLine {
    #[serde(default)]
    result: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternative: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f64>,
}

/// Pick the transcript out of a recognizer response body.
///
/// Lines that are blank or not JSON are skipped.  Within the first
/// non-empty result the alternative carrying a confidence score wins,
/// otherwise the first one.
pub fn parse_response(body: &str) -> Result<String, VoiceError> {
    let result = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<ResponseLine>(line).ok())
        .flat_map(|line| line.result)
        .find(|r| !r.alternative.is_empty())
        .ok_or(VoiceError::TranscriptionFailed)?;

    let best = result
        .alternative
        .iter()
        .find(|a| a.confidence.is_some())
        .or_else(|| result.alternative.first())
        .map(|a| a.transcript.trim())
        .unwrap_or_default();

    if best.is_empty() {
        return Err(VoiceError::TranscriptionFailed);
    }
    Ok(best.to_string())
}
