use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::analyser::{AnalyserFactory, AudioAnalyser};
use super::surface::RenderSurface;
use crate::capture::{CaptureStream, Channel};
use crate::error::CaptureResult;

struct RenderLoop {
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Live frequency trace of one channel. Purely cosmetic.
pub struct ChannelVisualizer {
    channel: Channel,
    surface: Arc<dyn RenderSurface>,
    color: String,
    factory: Arc<dyn AnalyserFactory>,
    fft_size: usize,
    frame_interval: Duration,
    running: Option<RenderLoop>,
}

impl ChannelVisualizer {
    pub fn new(
        channel: Channel,
        surface: Arc<dyn RenderSurface>,
        color: impl Into<String>,
        factory: Arc<dyn AnalyserFactory>,
        fft_size: usize,
        frame_interval: Duration,
    ) -> Self {
        Self {
            channel,
            surface,
            color: color.into(),
            factory,
            fft_size,
            frame_interval,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Attach to `stream` and redraw once per frame until stopped
    pub fn start(&mut self, stream: &CaptureStream) -> CaptureResult<()> {
        if self.running.is_some() {
            debug!("[{}] Visualizer already running", self.channel.label());
            return Ok(());
        }

        let analyser = self.factory.connect(stream, self.fft_size)?;
        let active = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(render(
            analyser,
            Arc::clone(&self.surface),
            self.color.clone(),
            self.frame_interval,
            Arc::clone(&active),
        ));

        self.running = Some(RenderLoop { active, task });
        debug!("[{}] Start audio painting.", self.channel.label());

        Ok(())
    }

    /// Cancel the render loop; the final frame clears the surface.
    /// Safe to call repeatedly.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.active.store(false, Ordering::SeqCst);
        if let Err(e) = running.task.await {
            warn!("[{}] Render loop failed: {}", self.channel.label(), e);
            self.surface.clear();
        }

        debug!("[{}] Stop audio painting.", self.channel.label());
    }
}

async fn render(
    mut analyser: Box<dyn AudioAnalyser>,
    surface: Arc<dyn RenderSurface>,
    color: String,
    frame_interval: Duration,
    active: Arc<AtomicBool>,
) {
    let mut data = vec![0u8; analyser.frequency_bin_count()];
    let mut ticker = tokio::time::interval(frame_interval);

    loop {
        ticker.tick().await;

        if !active.load(Ordering::SeqCst) {
            surface.clear();
            break;
        }

        analyser.byte_frequency_data(&mut data);
        let (width, height) = surface.size();
        let outline = trace_outline(&data, width as f32, height as f32);
        surface.fill_outline(&outline, &color);
    }

    analyser.disconnect();
}

/// Closed outline of a magnitude trace: bottom-left corner, one point per
/// bin, bottom-right corner.
pub fn trace_outline(data: &[u8], width: f32, height: f32) -> Vec<(f32, f32)> {
    let mut outline = Vec::with_capacity(data.len() + 2);
    outline.push((0.0, height));

    let len = data.len().max(1) as f32;
    for (index, value) in data.iter().enumerate() {
        let x = (index as f32 / len) * width;
        let y = height - (*value as f32 / 255.0) * height;
        outline.push((x, y));
    }

    outline.push((width, height));
    outline
}
