pub mod app;
pub mod capture;
pub mod config;
pub mod contact;
pub mod elements;
pub mod error;
pub mod http;
pub mod nats;
pub mod recorder;
pub mod session;
pub mod visualizer;

pub use app::{register_native_elements, App, Capabilities};
pub use capture::{
    AcquisitionState, AudioFrame, CaptureDevices, CaptureStream, Channel, DeviceAcquirer,
    RemoteAudioSource,
};
pub use config::Config;
pub use contact::{ContactEventAdapter, ContactSignal, ContactType, HostEvent};
pub use elements::{Element, ElementKind, ElementRegistry, UrlSlot};
pub use error::{CaptureError, CaptureResult};
pub use http::{create_router, AppState};
pub use nats::ContactEventSubscriber;
pub use recorder::{Artifact, ChannelRecorder, MediaRecorder, ObjectUrls, RecorderFactory};
pub use session::{SessionConfig, SessionCoordinator, SessionEvent, SessionState, SessionStatus};
pub use visualizer::{ChannelVisualizer, RenderSurface, TraceSurface};
