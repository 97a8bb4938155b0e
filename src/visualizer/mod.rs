//! Channel visualizer
//!
//! Draws a live frequency trace of a capture stream. It shares only the
//! stream and the start/stop timing with the recorder; recording never
//! depends on it.

mod analyser;
mod channel;
mod surface;

pub use analyser::{AnalyserFactory, AudioAnalyser, SpectrumAnalyser, SpectrumAnalyserFactory};
pub use channel::{trace_outline, ChannelVisualizer};
pub use surface::{RenderSurface, Trace, TraceSurface};
