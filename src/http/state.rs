use std::collections::HashMap;
use std::sync::Arc;

use crate::capture::Channel;
use crate::contact::ContactEventAdapter;
use crate::recorder::ObjectUrls;
use crate::session::CoordinatorHandle;
use crate::visualizer::TraceSurface;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Entry point for host events posted over HTTP
    pub adapter: Arc<ContactEventAdapter>,

    /// Running session coordinator (status snapshots)
    pub coordinator: CoordinatorHandle,

    /// Resolves artifact URLs to their bytes
    pub object_urls: Arc<dyn ObjectUrls>,

    /// Trace surfaces of channels with a configured canvas
    pub traces: Arc<HashMap<Channel, Arc<TraceSurface>>>,
}

impl AppState {
    pub fn new(
        adapter: Arc<ContactEventAdapter>,
        coordinator: CoordinatorHandle,
        object_urls: Arc<dyn ObjectUrls>,
        traces: HashMap<Channel, Arc<TraceSurface>>,
    ) -> Self {
        Self {
            adapter,
            coordinator,
            object_urls,
            traces: Arc::new(traces),
        }
    }
}
