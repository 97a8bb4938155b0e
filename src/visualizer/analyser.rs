use realfft::num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::warn;

use crate::capture::{AudioFrame, CaptureStream};
use crate::error::{CaptureError, CaptureResult};

/// Frequency analysis node attached to a stream
pub trait AudioAnalyser: Send {
    /// Number of magnitude bins (half the FFT size)
    fn frequency_bin_count(&self) -> usize;

    /// Copy the current magnitudes, scaled to 0..=255, into `out`
    fn byte_frequency_data(&mut self, out: &mut [u8]);

    /// Detach from the source. Further samples read as silence.
    fn disconnect(&mut self);
}

/// Builds an analysis graph `stream -> analyser`
pub trait AnalyserFactory: Send + Sync {
    fn connect(&self, stream: &CaptureStream, fft_size: usize) -> CaptureResult<Box<dyn AudioAnalyser>>;
}

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

#[derive(Debug, Default, Clone)]
pub struct SpectrumAnalyserFactory;

impl AnalyserFactory for SpectrumAnalyserFactory {
    fn connect(&self, stream: &CaptureStream, fft_size: usize) -> CaptureResult<Box<dyn AudioAnalyser>> {
        Ok(Box::new(SpectrumAnalyser::new(stream, fft_size)?))
    }
}

/// Hann-windowed real FFT over the most recent `fft_size` samples of the
/// first channel.
///
/// The forward transform is planned once; every frame reuses the same
/// input, output and scratch buffers.
pub struct SpectrumAnalyser {
    frames: Option<broadcast::Receiver<AudioFrame>>,
    window: VecDeque<f32>,
    fft_size: usize,
    channels: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    hann: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl SpectrumAnalyser {
    pub fn new(stream: &CaptureStream, fft_size: usize) -> CaptureResult<Self> {
        if !fft_size.is_power_of_two() || !(32..=32768).contains(&fft_size) {
            return Err(CaptureError::Visualizer(format!(
                "FFT size must be a power of two between 32 and 32768, got {}",
                fft_size
            )));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let hann = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Ok(Self {
            frames: Some(stream.subscribe()),
            window: VecDeque::from(vec![0.0; fft_size]),
            fft_size,
            channels: stream.channels().max(1) as usize,
            input: r2c.make_input_vec(),
            spectrum: r2c.make_output_vec(),
            scratch: r2c.make_scratch_vec(),
            hann,
            r2c,
        })
    }

    fn drain(&mut self) {
        let Some(frames) = self.frames.as_mut() else {
            return;
        };

        loop {
            match frames.try_recv() {
                Ok(frame) => {
                    for sample in frame.samples.iter().step_by(self.channels) {
                        if self.window.len() == self.fft_size {
                            self.window.pop_front();
                        }
                        self.window.push_back(*sample as f32 / i16::MAX as f32);
                    }
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

impl AudioAnalyser for SpectrumAnalyser {
    fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.drain();

        for ((slot, sample), coeff) in self.input.iter_mut().zip(&self.window).zip(&self.hann) {
            *slot = sample * coeff;
        }

        if let Err(e) = self
            .r2c
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
        {
            warn!("Spectrum transform failed: {}", e);
            out.iter_mut().for_each(|v| *v = 0);
            return;
        }

        let n = self.fft_size as f32;
        for (slot, bin) in out.iter_mut().zip(&self.spectrum).take(self.fft_size / 2) {
            let magnitude = bin.norm() / n;
            let db = if magnitude > 0.0 {
                20.0 * magnitude.log10()
            } else {
                MIN_DECIBELS
            };
            let scaled = 255.0 * (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
            *slot = scaled.clamp(0.0, 255.0) as u8;
        }
    }

    fn disconnect(&mut self) {
        self.frames = None;
        self.window.iter_mut().for_each(|s| *s = 0.0);
    }
}
