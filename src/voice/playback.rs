//! Audio playback to speakers
//!
//! Playback is synchronous: a call returns only once the audio has played
//! out (or a duration-derived timeout fires), so the caller never starts the
//! next capture over its own voice.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Plays audio to the default output device
pub struct AudioPlayback {
    device: Device,
}

impl AudioPlayback {
    /// Create a new audio playback instance
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            "audio playback initialized"
        );

        Ok(Self { device })
    }

    /// Decode an in-memory MPEG stream and play it to completion
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    #[allow(clippy::unused_async)]
    pub async fn play_mp3(&mut self, mp3_data: &[u8]) -> Result<()> {
        let (samples, sample_rate) = decode_mp3(mp3_data)?;
        self.play_blocking(&samples, sample_rate)
    }

    /// Play raw mono samples to completion
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    #[allow(clippy::unused_async)]
    pub async fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<()> {
        self.play_blocking(samples, sample_rate)
    }

    fn play_blocking(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let config = self.output_config(sample_rate)?;
        let channels = config.channels as usize;

        let source: Arc<[f32]> = Arc::from(samples);
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let cb_source = Arc::clone(&source);
        let cb_position = Arc::clone(&position);
        let cb_finished = Arc::clone(&finished);

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let pos = cb_position.load(Ordering::Relaxed);
                        let sample = if pos < cb_source.len() {
                            cb_position.store(pos + 1, Ordering::Relaxed);
                            cb_source[pos]
                        } else {
                            cb_finished.store(true, Ordering::Relaxed);
                            0.0
                        };
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Bounded wait: expected duration plus a small margin
        let duration_ms = (samples.len() as u64 * 1000) / u64::from(sample_rate);
        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(duration_ms + 500);

        while !finished.load(Ordering::Relaxed) {
            if std::time::Instant::now() > deadline {
                tracing::warn!("playback timed out before draining");
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        // Let the device drain its last buffer
        std::thread::sleep(std::time::Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = samples.len(), "playback complete");

        Ok(())
    }

    /// Find a mono (or stereo fallback) output config at the given rate
    fn output_config(&self, sample_rate: u32) -> Result<StreamConfig> {
        let at_rate = |channels: u16| {
            self.device
                .supported_output_configs()
                .ok()?
                .find(|c| {
                    c.channels() == channels
                        && c.min_sample_rate() <= SampleRate(sample_rate)
                        && c.max_sample_rate() >= SampleRate(sample_rate)
                })
                .map(|c| c.with_sample_rate(SampleRate(sample_rate)).config())
        };

        at_rate(1)
            .or_else(|| at_rate(2))
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))
    }
}

/// Decode MPEG bytes to mono f32 samples plus the stream's sample rate
fn decode_mp3(mp3_data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                #[allow(clippy::cast_sign_loss)]
                sample_rate.get_or_insert(frame.sample_rate as u32);

                if frame.channels == 2 {
                    // Stereo: average channels down to mono
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        (left + right) / 2.0
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| Error::Audio("MP3 stream contained no frames".to_string()))?;
    Ok((samples, sample_rate))
}
