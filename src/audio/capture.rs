//! Microphone access via `cpal`.
//!
//! [`AudioCapture::open`] picks the default input device and its preferred
//! stream format.  [`AudioCapture::start`] streams interleaved [`AudioChunk`]s
//! over an mpsc channel for as long as the returned [`StreamHandle`] lives.
//!
//! `cpal::Stream` is not `Send` on every platform, so a capture is opened,
//! used and dropped on the thread that records.

use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

/// One hardware buffer, interleaved `f32` in `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
}

/// Keeps the input stream running; dropping it stops the device.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no microphone found")]
    NoDevice,

    #[error("microphone format unavailable: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("could not open microphone: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("could not start microphone: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("microphone sample format {0:?} is not supported")]
    SampleFormat(cpal::SampleFormat),
}

/// The default input device, ready to stream.
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: cpal::SampleFormat,
}

impl AudioCapture {
    /// Open the system default input device.
    pub fn open() -> Result<Self, CaptureError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;
        let supported = device.default_input_config()?;
        let format = supported.sample_format();

        if let Ok(name) = device.name() {
            log::debug!(
                "microphone: {name} ({} Hz, {} ch, {format:?})",
                supported.sample_rate().0,
                supported.channels()
            );
        }

        Ok(Self {
            device,
            config: supported.into(),
            format,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Start streaming into `tx`.  Integer devices are converted to `f32`.
    pub fn start(&self, tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, CaptureError> {
        let on_error = |err: cpal::StreamError| log::error!("microphone stream error: {err}");

        let stream = match self.format {
            cpal::SampleFormat::F32 => self.device.build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Receiver gone means recording finished.
                    let _ = tx.send(AudioChunk {
                        samples: data.to_vec(),
                    });
                },
                on_error,
                None,
            )?,
            cpal::SampleFormat::I16 => self.device.build_input_stream(
                &self.config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(AudioChunk {
                        samples: data.iter().map(|&s| f32::from(s) / 32_768.0).collect(),
                    });
                },
                on_error,
                None,
            )?,
            other => return Err(CaptureError::SampleFormat(other)),
        };

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_chunk_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AudioChunk>();
    }

    #[test]
    fn errors_read_as_microphone_problems() {
        assert_eq!(CaptureError::NoDevice.to_string(), "no microphone found");
        assert!(CaptureError::SampleFormat(cpal::SampleFormat::U8)
            .to_string()
            .contains("U8"));
    }
}
