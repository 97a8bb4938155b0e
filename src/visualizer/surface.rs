use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Drawing target of a channel visualizer
pub trait RenderSurface: Send + Sync {
    /// Width and height in pixels
    fn size(&self) -> (u32, u32);

    /// Replace the drawing with a filled outline
    fn fill_outline(&self, outline: &[(f32, f32)], color: &str);

    fn clear(&self);
}

/// Last outline drawn on a `TraceSurface`
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub color: String,
    pub width: u32,
    pub height: u32,
    pub points: Vec<(f32, f32)>,
    pub drawn_at: DateTime<Utc>,
}

/// In-memory surface keeping only the latest frame
pub struct TraceSurface {
    width: u32,
    height: u32,
    last: RwLock<Option<Trace>>,
    frames: AtomicU64,
}

impl TraceSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            last: RwLock::new(None),
            frames: AtomicU64::new(0),
        }
    }

    /// The current drawing, `None` when blank
    pub fn snapshot(&self) -> Option<Trace> {
        self.last.read().ok()?.clone()
    }

    /// Number of outlines drawn so far
    pub fn frames_drawn(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }
}

impl RenderSurface for TraceSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_outline(&self, outline: &[(f32, f32)], color: &str) {
        if let Ok(mut last) = self.last.write() {
            *last = Some(Trace {
                color: color.to_string(),
                width: self.width,
                height: self.height,
                points: outline.to_vec(),
                drawn_at: Utc::now(),
            });
        }
        self.frames.fetch_add(1, Ordering::SeqCst);
    }

    fn clear(&self) {
        if let Ok(mut last) = self.last.write() {
            *last = None;
        }
    }
}
