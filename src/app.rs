//! Assembly of the recorder from configuration.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::capture::{CaptureDevices, Channel, DeviceAcquirer, FileCaptureDevices, FileRemoteAudio};
use crate::config::{ArtifactStoreKind, Config};
use crate::contact::{ContactEventAdapter, Subscription};
use crate::elements::{Element, ElementRegistry, UrlSlot};
use crate::recorder::{
    ChannelBindings, ChannelRecorder, FileObjectUrls, MemoryObjectUrls, ObjectUrls,
    PcmRecorderFactory, RecorderFactory,
};
use crate::session::{ChannelPipeline, CoordinatorHandle, SessionConfig, SessionCoordinator};
use crate::visualizer::{AnalyserFactory, ChannelVisualizer, SpectrumAnalyserFactory, TraceSurface};

/// Platform capabilities the recorder is built on
#[derive(Clone)]
pub struct Capabilities {
    pub devices: Arc<dyn CaptureDevices>,
    pub recorders: Arc<dyn RecorderFactory>,
    pub analysers: Arc<dyn AnalyserFactory>,
    pub object_urls: Arc<dyn ObjectUrls>,
}

impl Capabilities {
    /// File-backed devices, PCM recorders, spectrum analysers and the
    /// configured artifact store
    pub fn native(config: &Config) -> Result<Self> {
        let object_urls: Arc<dyn ObjectUrls> = match config.artifacts.store {
            ArtifactStoreKind::Memory => Arc::new(MemoryObjectUrls::new()),
            ArtifactStoreKind::Disk => Arc::new(
                FileObjectUrls::new(config.artifacts.recordings_dir())
                    .context("Failed to prepare artifact store")?,
            ),
        };

        let microphone = config
            .devices
            .microphone_path
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()));

        Ok(Self {
            devices: Arc::new(FileCaptureDevices::new(microphone, config.devices.frame_ms)),
            recorders: Arc::new(PcmRecorderFactory),
            analysers: Arc::new(SpectrumAnalyserFactory),
            object_urls,
        })
    }
}

/// Register in-memory elements for every configured identifier.
///
/// Returns the trace surfaces created for configured canvases.
pub fn register_native_elements(
    config: &Config,
    registry: &ElementRegistry,
) -> HashMap<Channel, Arc<TraceSurface>> {
    let ids = &config.elements;

    for id in [&ids.local_record_audio_id, &ids.remote_record_audio_id]
        .into_iter()
        .flatten()
    {
        registry.register(id.clone(), Element::Playback(Arc::new(UrlSlot::new())));
    }

    for id in [&ids.local_record_download_id, &ids.remote_record_download_id]
        .into_iter()
        .flatten()
    {
        registry.register(id.clone(), Element::Download(Arc::new(UrlSlot::new())));
    }

    let mut traces = HashMap::new();
    for (channel, id) in [
        (Channel::Operator, &ids.local_record_canvas_id),
        (Channel::Customer, &ids.remote_record_canvas_id),
    ] {
        if let Some(id) = id {
            let surface = Arc::new(TraceSurface::new(config.visualizer.width, config.visualizer.height));
            registry.register(id.clone(), Element::Canvas(surface.clone()));
            traces.insert(channel, surface);
        }
    }

    if let (Some(id), Some(path)) = (&ids.remote_audio_id, &config.devices.remote_audio_path) {
        let path = PathBuf::from(shellexpand::tilde(path).into_owned());
        registry.register(
            id.clone(),
            Element::RemoteAudio(Arc::new(FileRemoteAudio::new(path, config.devices.frame_ms))),
        );
    }

    traces
}

/// A running recorder: device acquisition, coordinator task and the
/// adapter subscription feeding it
pub struct App {
    pub adapter: Arc<ContactEventAdapter>,
    pub coordinator: CoordinatorHandle,
    pub elements: Arc<ElementRegistry>,
    pub object_urls: Arc<dyn ObjectUrls>,
    acquirer: DeviceAcquirer,
    coordinator_task: JoinHandle<()>,
    subscription: Option<Subscription>,
}

impl App {
    /// Wire everything together. Must be called inside a tokio runtime.
    pub fn start(config: &Config, capabilities: Capabilities, elements: Arc<ElementRegistry>) -> Self {
        let ids = &config.elements;
        let mut acquirer = DeviceAcquirer::new();

        let remote = elements.remote_audio(ids.remote_audio_id.as_deref());
        match &remote {
            Some(_) => acquirer.start(
                Arc::clone(&capabilities.devices),
                config.recording.device_acquisition_interval(),
            ),
            None => warn!(
                "Not found remote audio element, recording disabled. (ID: {})",
                ids.remote_audio_id.as_deref().unwrap_or("-")
            ),
        }

        let pipeline = |channel: Channel,
                        audio_id: &Option<String>,
                        download_id: &Option<String>,
                        canvas_id: &Option<String>,
                        color: &str| {
            let bindings = ChannelBindings {
                playback: elements.playback(audio_id.as_deref()),
                download: elements.download(download_id.as_deref()),
            };
            let recorder = ChannelRecorder::new(
                channel,
                Arc::clone(&capabilities.recorders),
                Arc::clone(&capabilities.object_urls),
                bindings,
            );
            let visualizer = elements.canvas(canvas_id.as_deref()).map(|surface| {
                ChannelVisualizer::new(
                    channel,
                    surface,
                    color,
                    Arc::clone(&capabilities.analysers),
                    config.visualizer.fft_size,
                    config.visualizer.frame_interval(),
                )
            });
            ChannelPipeline::new(recorder, visualizer)
        };

        let operator = pipeline(
            Channel::Operator,
            &ids.local_record_audio_id,
            &ids.local_record_download_id,
            &ids.local_record_canvas_id,
            ids.local_record_canvas_color.as_str(),
        );
        let customer = pipeline(
            Channel::Customer,
            &ids.remote_record_audio_id,
            &ids.remote_record_download_id,
            &ids.remote_record_canvas_id,
            ids.remote_record_canvas_color.as_str(),
        );

        let coordinator = SessionCoordinator::new(
            SessionConfig::from(&config.recording),
            acquirer.subscribe(),
            remote,
            operator,
            customer,
        );
        let (handle, coordinator_task) = coordinator.spawn();

        let adapter = Arc::new(ContactEventAdapter::new());
        let forward = handle.clone();
        let subscription = adapter.subscribe(move |signal| {
            if !forward.send(signal.clone()) {
                warn!("Session coordinator stopped, dropped {:?}", signal);
            }
        });

        info!("Recorder assembled ({} adapter subscribers)", adapter.subscriber_count());

        Self {
            adapter,
            coordinator: handle,
            elements,
            object_urls: capabilities.object_urls,
            acquirer,
            coordinator_task,
            subscription: Some(subscription),
        }
    }

    /// Stop acquisition retries, finish any active recording and wait for
    /// the coordinator to exit
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(subscription) = self.subscription.take() {
            self.adapter.unsubscribe(subscription);
        }
        self.acquirer.shutdown();

        let Self {
            coordinator,
            coordinator_task,
            ..
        } = self;
        drop(coordinator);

        coordinator_task.await.context("Session coordinator panicked")?;
        info!("Recorder shut down");
        Ok(())
    }
}
