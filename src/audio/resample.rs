//! Streaming conversion of device audio to 16 kHz mono.
//!
//! Microphones deliver interleaved audio at their native rate (commonly
//! 44.1 or 48 kHz) in chunks of whatever size the driver picks.
//! [`MonoResampler`] downmixes each chunk, queues the mono samples and feeds
//! them to a `rubato` sinc resampler in fixed 10 ms blocks.  The resampler
//! keeps its filter history between blocks, so chunk boundaries do not
//! introduce clicks or drift.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use thiserror::Error;

/// Sample rate every recognizer in this crate expects.
pub const TARGET_RATE: u32 = 16_000;

/// Average interleaved channels into one.
///
/// Trailing samples that do not form a whole frame are dropped.
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => samples
            .chunks_exact(n as usize)
            .map(|frame| frame.iter().sum::<f32>() / f32::from(n))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ResamplerError {
    #[error("device reported a sample rate of 0 Hz")]
    ZeroRate,

    #[error("cannot build resampler: {0}")]
    Construction(#[from] rubato::ResamplerConstructionError),

    #[error("resampling failed: {0}")]
    Process(#[from] rubato::ResampleError),
}

// ---------------------------------------------------------------------------
// MonoResampler
// ---------------------------------------------------------------------------

/// Stateful downmix + resample to [`TARGET_RATE`].
pub struct MonoResampler {
    channels: u16,
    /// `None` when the device already runs at [`TARGET_RATE`].
    sinc: Option<SincFixedIn<f32>>,
    /// Mono samples waiting for a full input block.
    pending: Vec<f32>,
}

impl MonoResampler {
    pub fn new(source_rate: u32, channels: u16) -> Result<Self, ResamplerError> {
        if source_rate == 0 {
            return Err(ResamplerError::ZeroRate);
        }
        let sinc = if source_rate == TARGET_RATE {
            None
        } else {
            let params = SincInterpolationParameters {
                sinc_len: 128,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 128,
                window: WindowFunction::BlackmanHarris2,
            };
            // 10 ms of source audio per block
            let block = (source_rate as usize / 100).max(1);
            Some(SincFixedIn::<f32>::new(
                f64::from(TARGET_RATE) / f64::from(source_rate),
                2.0,
                params,
                block,
                1,
            )?)
        };
        Ok(Self {
            channels,
            sinc,
            pending: Vec::new(),
        })
    }

    /// `true` when no rate conversion is needed.
    pub fn is_passthrough(&self) -> bool {
        self.sinc.is_none()
    }

    /// Convert one interleaved chunk.
    ///
    /// Samples that do not fill a whole input block are held back until the
    /// next call.
    pub fn process(&mut self, interleaved: &[f32]) -> Result<Vec<f32>, ResamplerError> {
        let mono = downmix(interleaved, self.channels);
        let Some(sinc) = self.sinc.as_mut() else {
            return Ok(mono);
        };

        self.pending.extend_from_slice(&mono);
        let mut out = Vec::new();
        let mut consumed = 0;
        loop {
            let need = sinc.input_frames_next();
            if self.pending.len() - consumed < need {
                break;
            }
            let block = &self.pending[consumed..consumed + need];
            let resampled = sinc.process(&[block], None)?;
            out.extend_from_slice(&resampled[0]);
            consumed += need;
        }
        self.pending.drain(..consumed);
        Ok(out)
    }
}

impl std::fmt::Debug for MonoResampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonoResampler")
            .field("channels", &self.channels)
            .field("passthrough", &self.is_passthrough())
            .field("pending", &self.pending.len())
            .finish()
    }
}
