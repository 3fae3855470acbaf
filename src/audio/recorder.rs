//! Recording one spoken answer from the microphone.
//!
//! A [`Recorder`] blocks until the speaker finishes (or never starts) and
//! returns 16 kHz mono samples.  It is meant to be called from a blocking
//! thread (`tokio::task::spawn_blocking`), never from the UI thread.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use super::capture::{AudioCapture, AudioChunk};
use super::resample::MonoResampler;
use super::vad::{EndpointStatus, Endpointer, VadDetector};
use crate::config::VoiceConfig;
use crate::voice::VoiceError;

/// How long one listen attempt may take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenLimits {
    /// Wait this long for speech to start.
    pub timeout: Duration,
    /// Stop recording after this much speech.
    pub phrase_limit: Duration,
    /// Trailing silence that ends the answer.
    pub silence: Duration,
    /// Frame RMS above which audio counts as speech.
    pub vad_threshold: f32,
}

impl Default for ListenLimits {
    fn default() -> Self {
        Self::from_config(&VoiceConfig::default())
    }
}

impl ListenLimits {
    pub fn from_config(voice: &VoiceConfig) -> Self {
        Self {
            timeout: Duration::from_secs(voice.listen_timeout_secs),
            phrase_limit: Duration::from_secs_f32(voice.phrase_limit_secs.max(0.1)),
            silence: Duration::from_secs_f32(voice.silence_secs.max(0.03)),
            vad_threshold: voice.vad_threshold,
        }
    }

    /// Fresh endpointer for one attempt.
    pub fn endpointer(&self) -> Endpointer {
        Endpointer::new(
            VadDetector::new(self.vad_threshold),
            self.timeout,
            self.phrase_limit,
            self.silence,
        )
    }

    /// Upper bound on wall-clock time for one attempt, in case the device
    /// stalls and stops delivering audio.
    pub fn deadline(&self) -> Duration {
        self.timeout + self.phrase_limit + Duration::from_secs(1)
    }
}

/// Source of recorded answers.
pub trait Recorder: Send + Sync {
    /// Record one answer.
    ///
    /// Fails with [`VoiceError::ListenTimeout`] when no speech starts within
    /// `limits.timeout`.
    fn record(&self, limits: &ListenLimits) -> Result<Vec<f32>, VoiceError>;
}

/// Records from the default input device.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicRecorder;

impl Recorder for MicRecorder {
    fn record(&self, limits: &ListenLimits) -> Result<Vec<f32>, VoiceError> {
        let capture = AudioCapture::open().map_err(|e| VoiceError::Microphone(e.to_string()))?;
        let (tx, rx) = mpsc::channel::<AudioChunk>();
        let handle = capture
            .start(tx)
            .map_err(|e| VoiceError::Microphone(e.to_string()))?;

        let mut resampler = MonoResampler::new(capture.sample_rate(), capture.channels())
            .map_err(|e| VoiceError::Microphone(e.to_string()))?;
        let mut endpointer = limits.endpointer();
        let started = Instant::now();
        let deadline = limits.deadline();

        let status = loop {
            let remaining = deadline.saturating_sub(started.elapsed());
            match rx.recv_timeout(remaining.max(Duration::from_millis(1))) {
                Ok(chunk) => {
                    let audio = resampler
                        .process(&chunk.samples)
                        .map_err(|e| VoiceError::Microphone(e.to_string()))?;
                    match endpointer.push(&audio) {
                        EndpointStatus::Waiting | EndpointStatus::Capturing => {}
                        done => break done,
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    log::warn!("microphone stalled after {:?}", started.elapsed());
                    break endpointer.finish();
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(VoiceError::Microphone("audio stream closed".into()));
                }
            }
        };
        drop(handle);

        match status {
            EndpointStatus::TimedOut => Err(VoiceError::ListenTimeout),
            _ => {
                let audio = endpointer.into_audio();
                log::debug!(
                    "recorded {:.2} s of speech",
                    audio.len() as f32 / super::TARGET_RATE as f32
                );
                Ok(audio)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedRecorder  (test-only)
// ---------------------------------------------------------------------------

/// Replays fixed 16 kHz audio through the same endpointing as the
/// microphone.
#[cfg(test)]
pub struct ScriptedRecorder {
    audio: Vec<f32>,
}

#[cfg(test)]
impl ScriptedRecorder {
    pub fn new(audio: Vec<f32>) -> Self {
        Self { audio }
    }

    /// One second of a steady tone after a short silence.
    pub fn speech() -> Self {
        let mut audio = vec![0.0; 1_600];
        audio.extend(std::iter::repeat(0.3).take(16_000));
        audio.extend(std::iter::repeat(0.0).take(16_000));
        Self::new(audio)
    }

    pub fn silence() -> Self {
        Self::new(vec![0.0; 16_000 * 10])
    }
}

#[cfg(test)]
impl Recorder for ScriptedRecorder {
    fn record(&self, limits: &ListenLimits) -> Result<Vec<f32>, VoiceError> {
        let mut endpointer = limits.endpointer();
        let status = match endpointer.push(&self.audio) {
            EndpointStatus::Waiting | EndpointStatus::Capturing => endpointer.finish(),
            done => done,
        };
        match status {
            EndpointStatus::TimedOut => Err(VoiceError::ListenTimeout),
            _ => Ok(endpointer.into_audio()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_follow_voice_config() {
        let mut voice = VoiceConfig::default();
        voice.listen_timeout_secs = 3;
        voice.phrase_limit_secs = 4.5;
        let limits = ListenLimits::from_config(&voice);
        assert_eq!(limits.timeout, Duration::from_secs(3));
        assert_eq!(limits.phrase_limit, Duration::from_millis(4_500));
        assert_eq!(limits.deadline(), Duration::from_millis(8_500));
    }

    #[test]
    fn scripted_speech_is_recorded() {
        let audio = ScriptedRecorder::speech()
            .record(&ListenLimits::default())
            .expect("speech");
        // At least the tone itself, at most the whole script.
        assert!(audio.len() >= 16_000);
        assert!(audio.len() <= 33_600);
    }

    #[test]
    fn scripted_silence_times_out() {
        let err = ScriptedRecorder::silence()
            .record(&ListenLimits::default())
            .unwrap_err();
        assert_eq!(err, VoiceError::ListenTimeout);
    }

    #[test]
    fn short_silence_before_the_window_closes_is_still_a_timeout() {
        // Stream ends while waiting.
        let err = ScriptedRecorder::new(vec![0.0; 4_800])
            .record(&ListenLimits::default())
            .unwrap_err();
        assert_eq!(err, VoiceError::ListenTimeout);
    }
}
