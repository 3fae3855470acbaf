//! Energy-based voice activity detection and answer endpointing.
//!
//! Audio is split into 30 ms frames (480 samples @ 16 kHz).  A frame is
//! *voice* when its RMS amplitude exceeds the configured threshold.
//!
//! [`Endpointer`] turns the per-frame decision into the listen contract:
//! wait a bounded time for speech to start, then keep recording until the
//! speaker pauses or the phrase limit is hit.

use std::collections::VecDeque;
use std::time::Duration;

use super::resample::TARGET_RATE;

/// 30 ms at 16 kHz.
const FRAME_SIZE: usize = 480;

/// Frames kept from before speech onset so soft first syllables survive.
const PRE_ROLL_FRAMES: usize = 10;

// ---------------------------------------------------------------------------
// VadDetector
// ---------------------------------------------------------------------------

/// Per-frame energy classifier.
///
/// ```rust
/// use crop_advisor::audio::VadDetector;
///
/// let vad = VadDetector::new(0.01);
/// assert!(!vad.is_voice(&[0.0; 480]));
/// assert!(vad.is_voice(&[0.5; 480]));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VadDetector {
    rms_threshold: f32,
}

impl VadDetector {
    /// `rms_threshold` should be in `[0.0, 1.0]`.  `0.01` suits a quiet
    /// room; use `0.02`–`0.05` in noisy environments.
    pub fn new(rms_threshold: f32) -> Self {
        Self { rms_threshold }
    }

    /// Returns `true` when the frame contains voice activity.
    pub fn is_voice(&self, frame: &[f32]) -> bool {
        if frame.is_empty() {
            return false;
        }
        let mean_sq: f32 = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
        mean_sq.sqrt() > self.rms_threshold
    }
}

// ---------------------------------------------------------------------------
// Endpointer
// ---------------------------------------------------------------------------

/// Where a listen attempt stands after the latest samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStatus {
    /// No speech yet, still inside the listen window.
    Waiting,
    /// Speech started; recording.
    Capturing,
    /// The answer is complete.
    Complete,
    /// The listen window closed without speech.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting { frames: usize },
    Capturing { frames: usize, silent_run: usize },
    Complete,
    TimedOut,
}

/// Frame-counting state machine over a 16 kHz mono stream.
///
/// Timing is measured in audio frames, not wall-clock time, so the result
/// depends only on the samples fed in.
#[derive(Debug, Clone)]
pub struct Endpointer {
    vad: VadDetector,
    timeout_frames: usize,
    phrase_frames: usize,
    silence_frames: usize,
    phase: Phase,
    partial: Vec<f32>,
    pre_roll: VecDeque<Vec<f32>>,
    captured: Vec<f32>,
}

fn frames_in(d: Duration) -> usize {
    let samples = d.as_micros() * u128::from(TARGET_RATE);
    let frames = samples.div_ceil(1_000_000 * FRAME_SIZE as u128);
    (frames as usize).max(1)
}

impl Endpointer {
    pub fn new(vad: VadDetector, timeout: Duration, phrase_limit: Duration, silence: Duration) -> Self {
        Self {
            vad,
            timeout_frames: frames_in(timeout),
            phrase_frames: frames_in(phrase_limit),
            silence_frames: frames_in(silence),
            phase: Phase::Waiting { frames: 0 },
            partial: Vec::with_capacity(FRAME_SIZE),
            pre_roll: VecDeque::with_capacity(PRE_ROLL_FRAMES),
            captured: Vec::new(),
        }
    }

    pub fn status(&self) -> EndpointStatus {
        match self.phase {
            Phase::Waiting { .. } => EndpointStatus::Waiting,
            Phase::Capturing { .. } => EndpointStatus::Capturing,
            Phase::Complete => EndpointStatus::Complete,
            Phase::TimedOut => EndpointStatus::TimedOut,
        }
    }

    /// Feed 16 kHz mono samples.  Samples arriving after the attempt has
    /// finished are ignored.
    pub fn push(&mut self, samples: &[f32]) -> EndpointStatus {
        for &s in samples {
            self.partial.push(s);
            if self.partial.len() == FRAME_SIZE {
                let frame = std::mem::replace(&mut self.partial, Vec::with_capacity(FRAME_SIZE));
                self.push_frame(frame);
                if matches!(self.phase, Phase::Complete | Phase::TimedOut) {
                    break;
                }
            }
        }
        self.status()
    }

    /// End the stream early (device stopped delivering).  A capture in
    /// progress becomes complete; waiting becomes a timeout.
    pub fn finish(&mut self) -> EndpointStatus {
        self.phase = match self.phase {
            Phase::Capturing { .. } => {
                self.captured.append(&mut self.partial);
                Phase::Complete
            }
            Phase::Waiting { .. } => Phase::TimedOut,
            done => done,
        };
        self.status()
    }

    /// The recorded answer, including a short pre-roll before onset.
    pub fn into_audio(self) -> Vec<f32> {
        self.captured
    }

    fn push_frame(&mut self, frame: Vec<f32>) {
        let voice = self.vad.is_voice(&frame);
        self.phase = match self.phase {
            Phase::Waiting { .. } if voice => {
                for earlier in self.pre_roll.drain(..) {
                    self.captured.extend_from_slice(&earlier);
                }
                self.captured.extend_from_slice(&frame);
                self.capturing(1, 0)
            }
            Phase::Waiting { frames } => {
                if self.pre_roll.len() == PRE_ROLL_FRAMES {
                    self.pre_roll.pop_front();
                }
                self.pre_roll.push_back(frame);
                if frames + 1 >= self.timeout_frames {
                    Phase::TimedOut
                } else {
                    Phase::Waiting { frames: frames + 1 }
                }
            }
            Phase::Capturing { frames, silent_run } => {
                self.captured.extend_from_slice(&frame);
                let silent_run = if voice { 0 } else { silent_run + 1 };
                self.capturing(frames + 1, silent_run)
            }
            done => done,
        };
    }

    fn capturing(&self, frames: usize, silent_run: usize) -> Phase {
        if silent_run >= self.silence_frames || frames >= self.phrase_frames {
            Phase::Complete
        } else {
            Phase::Capturing { frames, silent_run }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SILENCE: [f32; FRAME_SIZE] = [0.0; FRAME_SIZE];
    const VOICE: [f32; FRAME_SIZE] = [0.5; FRAME_SIZE];

    fn endpointer() -> Endpointer {
        // 5 s window, 10 s phrase limit, 90 ms (3 frames) of silence ends it.
        Endpointer::new(
            VadDetector::new(0.01),
            Duration::from_secs(5),
            Duration::from_secs(10),
            Duration::from_millis(90),
        )
    }

    #[test]
    fn silent_frame_is_not_voice() {
        let vad = VadDetector::new(0.01);
        assert!(!vad.is_voice(&SILENCE));
        assert!(vad.is_voice(&VOICE));
        assert!(!vad.is_voice(&[]));
    }

    #[test]
    fn waits_then_times_out_on_silence() {
        let mut ep = endpointer();
        // 5 s = 166.67 frames → 167 frames.
        for _ in 0..166 {
            assert_eq!(ep.push(&SILENCE), EndpointStatus::Waiting);
        }
        assert_eq!(ep.push(&SILENCE), EndpointStatus::TimedOut);
        assert!(ep.into_audio().is_empty());
    }

    #[test]
    fn captures_until_trailing_silence() {
        let mut ep = endpointer();
        ep.push(&SILENCE);
        assert_eq!(ep.push(&VOICE), EndpointStatus::Capturing);
        ep.push(&VOICE);
        ep.push(&SILENCE);
        ep.push(&SILENCE);
        assert_eq!(ep.push(&SILENCE), EndpointStatus::Complete);

        // one pre-roll frame + 2 voice + 3 silence
        assert_eq!(ep.into_audio().len(), 6 * FRAME_SIZE);
    }

    #[test]
    fn pause_shorter_than_silence_window_keeps_recording() {
        let mut ep = endpointer();
        ep.push(&VOICE);
        ep.push(&SILENCE);
        ep.push(&SILENCE);
        assert_eq!(ep.push(&VOICE), EndpointStatus::Capturing);
    }

    #[test]
    fn phrase_limit_stops_continuous_speech() {
        let mut ep = Endpointer::new(
            VadDetector::new(0.01),
            Duration::from_secs(5),
            Duration::from_millis(300),
            Duration::from_secs(1),
        );
        let mut status = EndpointStatus::Waiting;
        let mut frames = 0;
        while status != EndpointStatus::Complete {
            status = ep.push(&VOICE);
            frames += 1;
        }
        assert_eq!(frames, 10);
    }

    #[test]
    fn pre_roll_is_bounded() {
        let mut ep = endpointer();
        for _ in 0..50 {
            ep.push(&SILENCE);
        }
        ep.push(&VOICE);
        ep.finish();
        assert_eq!(ep.into_audio().len(), (PRE_ROLL_FRAMES + 1) * FRAME_SIZE);
    }

    #[test]
    fn samples_split_across_pushes_form_frames() {
        let mut ep = endpointer();
        ep.push(&VOICE[..200]);
        assert_eq!(ep.status(), EndpointStatus::Waiting);
        assert_eq!(ep.push(&VOICE[200..]), EndpointStatus::Capturing);
    }

    #[test]
    fn finish_while_waiting_is_timeout() {
        let mut ep = endpointer();
        ep.push(&SILENCE);
        assert_eq!(ep.finish(), EndpointStatus::TimedOut);
    }

    #[test]
    fn finish_while_capturing_keeps_partial_frame() {
        let mut ep = endpointer();
        ep.push(&VOICE);
        ep.push(&VOICE[..100]);
        assert_eq!(ep.finish(), EndpointStatus::Complete);
        assert_eq!(ep.into_audio().len(), FRAME_SIZE + 100);
    }
}
