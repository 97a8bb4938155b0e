//! Binding points between the recorder core and the surrounding page.
//!
//! Elements are registered under identifiers by the UI glue and looked up
//! by the identifiers in `ElementsConfig`. Lookups validate the element
//! kind, so a canvas registered under a playback id is treated as absent.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::capture::RemoteAudioSource;
use crate::visualizer::RenderSurface;

/// Holder of the URL currently assigned to a playback or download element
#[derive(Debug, Default)]
pub struct UrlSlot {
    url: RwLock<Option<String>>,
}

impl UrlSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, url: &str) {
        if let Ok(mut slot) = self.url.write() {
            *slot = Some(url.to_string());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.url.write() {
            *slot = None;
        }
    }

    pub fn get(&self) -> Option<String> {
        self.url.read().ok()?.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Playback,
    Download,
    Canvas,
    RemoteAudio,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Playback => "playback",
            ElementKind::Download => "download",
            ElementKind::Canvas => "canvas",
            ElementKind::RemoteAudio => "remote-audio",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub enum Element {
    Playback(Arc<UrlSlot>),
    Download(Arc<UrlSlot>),
    Canvas(Arc<dyn RenderSurface>),
    RemoteAudio(Arc<dyn RemoteAudioSource>),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Playback(_) => ElementKind::Playback,
            Element::Download(_) => ElementKind::Download,
            Element::Canvas(_) => ElementKind::Canvas,
            Element::RemoteAudio(_) => ElementKind::RemoteAudio,
        }
    }
}

#[derive(Default)]
pub struct ElementRegistry {
    elements: RwLock<HashMap<String, Element>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: impl Into<String>, element: Element) {
        if let Ok(mut elements) = self.elements.write() {
            elements.insert(id.into(), element);
        }
    }

    pub fn remove(&self, id: &str) -> Option<Element> {
        self.elements.write().ok()?.remove(id)
    }

    /// Look up an element, checking that it has the expected kind
    pub fn validated(&self, id: Option<&str>, kind: ElementKind) -> Option<Element> {
        let id = id?;
        let element = self.elements.read().ok()?.get(id).cloned();

        let Some(element) = element else {
            debug!("Not found element. (ID: {})", id);
            return None;
        };

        if element.kind() != kind {
            debug!(
                "Not match element kind. (ID: {}, Expected: {}, Actual: {})",
                id,
                kind,
                element.kind()
            );
            return None;
        }

        Some(element)
    }

    pub fn playback(&self, id: Option<&str>) -> Option<Arc<UrlSlot>> {
        match self.validated(id, ElementKind::Playback)? {
            Element::Playback(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn download(&self, id: Option<&str>) -> Option<Arc<UrlSlot>> {
        match self.validated(id, ElementKind::Download)? {
            Element::Download(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn canvas(&self, id: Option<&str>) -> Option<Arc<dyn RenderSurface>> {
        match self.validated(id, ElementKind::Canvas)? {
            Element::Canvas(surface) => Some(surface),
            _ => None,
        }
    }

    pub fn remote_audio(&self, id: Option<&str>) -> Option<Arc<dyn RemoteAudioSource>> {
        match self.validated(id, ElementKind::RemoteAudio)? {
            Element::RemoteAudio(source) => Some(source),
            _ => None,
        }
    }
}
