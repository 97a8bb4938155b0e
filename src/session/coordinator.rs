use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::state::{IgnoreReason, SessionEvent, SessionState, SessionStatus};
use crate::capture::{AcquisitionState, CaptureStream, Channel, RemoteAudioSource};
use crate::contact::{ContactSignal, ContactType};
use crate::recorder::{Artifact, ChannelRecorder};
use crate::visualizer::ChannelVisualizer;

/// Recorder and optional visualizer of one channel, started and stopped
/// together
pub struct ChannelPipeline {
    recorder: ChannelRecorder,
    visualizer: Option<ChannelVisualizer>,
}

impl ChannelPipeline {
    pub fn new(recorder: ChannelRecorder, visualizer: Option<ChannelVisualizer>) -> Self {
        Self {
            recorder,
            visualizer,
        }
    }

    pub fn channel(&self) -> Channel {
        self.recorder.channel()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.recorder.artifact()
    }

    async fn start(&mut self, stream: &CaptureStream, config: &SessionConfig) -> bool {
        let label = self.channel().label();

        if let Err(e) = self.recorder.start(stream, config.timeslice).await {
            warn!("[{}] Failed to start audio recording: {}", label, e);
            return false;
        }

        if let Some(visualizer) = &mut self.visualizer {
            if let Err(e) = visualizer.start(stream) {
                warn!("[{}] Failed to start audio painting: {}", label, e);
            }
        }

        true
    }

    async fn stop(&mut self) -> Option<Artifact> {
        if let Some(visualizer) = &mut self.visualizer {
            visualizer.stop().await;
        }
        self.recorder.stop().await
    }
}

/// Owns "the contact currently being recorded" and drives both channel
/// pipelines from call lifecycle signals.
///
/// At most one session exists at a time. A stop signal for any contact
/// other than the active one is ignored, so a late `ended` from an old
/// call can never cut a newer recording short.
pub struct SessionCoordinator {
    config: SessionConfig,
    device: watch::Receiver<AcquisitionState>,
    remote: Option<Arc<dyn RemoteAudioSource>>,
    operator: ChannelPipeline,
    customer: ChannelPipeline,
    state: SessionState,
    sessions_started: u64,
    status_tx: watch::Sender<SessionStatus>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl SessionCoordinator {
    pub fn new(
        config: SessionConfig,
        device: watch::Receiver<AcquisitionState>,
        remote: Option<Arc<dyn RemoteAudioSource>>,
        operator: ChannelPipeline,
        customer: ChannelPipeline,
    ) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::default());
        let (events_tx, _) = broadcast::channel(100);

        let coordinator = Self {
            config,
            device,
            remote,
            operator,
            customer,
            state: SessionState::Idle,
            sessions_started: 0,
            status_tx,
            events_tx,
        };
        coordinator.publish_status();
        coordinator
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.status_tx.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Subscribe to session notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub fn pipeline(&self, channel: Channel) -> &ChannelPipeline {
        match channel {
            Channel::Operator => &self.operator,
            Channel::Customer => &self.customer,
        }
    }

    /// Apply one lifecycle signal. Never fails: every problem ends up as a
    /// log line and, at worst, a missing recording.
    pub async fn handle(&mut self, signal: ContactSignal) {
        match signal {
            ContactSignal::CallConnected {
                contact_id,
                contact_type,
            } => self.call_connected(&contact_id, contact_type).await,
            ContactSignal::CallEnded {
                contact_id,
                contact_type,
            } => self.call_ended(&contact_id, contact_type).await,
        }

        self.publish_status();
    }

    async fn call_connected(&mut self, contact_id: &str, contact_type: ContactType) {
        if contact_type != ContactType::Voice {
            debug!(
                "Not recording non-voice contact. (Contact ID: {}, Type: {:?})",
                contact_id, contact_type
            );
            self.ignore(contact_id, IgnoreReason::NotVoice);
            return;
        }

        let operator_stream = self.device.borrow().stream().cloned();
        let Some(operator_stream) = operator_stream else {
            warn!("Can't start recording because local media stream is disabled.");
            self.ignore(contact_id, IgnoreReason::RecordingDisabled);
            return;
        };

        if contact_id.is_empty() {
            warn!("Can't start recording because not found contact ID.");
            return;
        }

        match self.state.contact_id().map(str::to_string) {
            None => {}
            Some(active) if active == contact_id => {
                warn!("Already started recording. (Contact ID: {})", contact_id);
                self.ignore(contact_id, IgnoreReason::AlreadyRecording);
                return;
            }
            Some(active) => {
                debug!(
                    "Stop previous recording. (Previous contact ID: {}, New contact ID: {})",
                    active, contact_id
                );
                self.stop_session(&active).await;
            }
        }

        self.start_session(contact_id, &operator_stream).await;
    }

    async fn call_ended(&mut self, contact_id: &str, contact_type: ContactType) {
        if contact_type != ContactType::Voice {
            self.ignore(contact_id, IgnoreReason::NotVoice);
            return;
        }

        if !self.device.borrow().is_recording_enabled() {
            self.ignore(contact_id, IgnoreReason::RecordingDisabled);
            return;
        }

        if contact_id.is_empty() {
            warn!("Can't stop recording because not found contact ID.");
            return;
        }

        match self.state.contact_id().map(str::to_string) {
            None => {
                debug!("No active recording to stop. (Contact ID: {})", contact_id);
                self.ignore(contact_id, IgnoreReason::NotRecording);
            }
            Some(active) if active != contact_id => {
                warn!(
                    "Can't stop recording because not match contact ID. (Current contact ID: {}, Target contact ID: {})",
                    active, contact_id
                );
                self.ignore(
                    contact_id,
                    IgnoreReason::ContactMismatch {
                        active_contact_id: active,
                    },
                );
            }
            Some(_) => self.stop_session(contact_id).await,
        }
    }

    async fn start_session(&mut self, contact_id: &str, operator_stream: &CaptureStream) {
        self.state = SessionState::Recording {
            contact_id: contact_id.to_string(),
            started_at: Utc::now(),
        };
        self.sessions_started += 1;

        let mut channels = Vec::with_capacity(2);

        if self.operator.start(operator_stream, &self.config).await {
            channels.push(Channel::Operator);
        }

        match self.customer_stream().await {
            Some(stream) => {
                if self.customer.start(&stream, &self.config).await {
                    channels.push(Channel::Customer);
                }
            }
            None => warn!(
                "[{}] Remote stream not attached, recording without customer audio. (Contact ID: {})",
                Channel::Customer.label(),
                contact_id
            ),
        }

        info!(
            "Recording started. (Contact ID: {}, Channels: {:?})",
            contact_id, channels
        );

        self.emit(SessionEvent::Started {
            contact_id: contact_id.to_string(),
            channels,
        });
    }

    async fn stop_session(&mut self, contact_id: &str) {
        self.state = SessionState::Idle;

        for channel in Channel::ALL {
            let artifact = match channel {
                Channel::Operator => self.operator.stop().await,
                Channel::Customer => self.customer.stop().await,
            };

            self.emit(SessionEvent::ChannelStopped {
                contact_id: contact_id.to_string(),
                channel,
                artifact,
            });
        }

        info!("Recording stopped. (Contact ID: {})", contact_id);
        self.emit(SessionEvent::Stopped {
            contact_id: contact_id.to_string(),
        });
    }

    /// Read the remote playback source, waiting briefly for the call media
    /// path to attach it
    async fn customer_stream(&self) -> Option<CaptureStream> {
        let remote = self.remote.as_ref()?;
        let deadline = Instant::now() + self.config.remote_stream_wait;

        loop {
            if let Some(stream) = remote.current_stream().await {
                return Some(stream);
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            let pause = self.config.remote_stream_poll.min(deadline - now);
            tokio::time::sleep(pause).await;
        }
    }

    /// Stop whatever is recording, e.g. on shutdown
    pub async fn shutdown(&mut self) {
        if let Some(active) = self.state.contact_id().map(str::to_string) {
            info!("Shutting down, stopping recording. (Contact ID: {})", active);
            self.stop_session(&active).await;
            self.publish_status();
        }
    }

    fn ignore(&self, contact_id: &str, reason: IgnoreReason) {
        self.emit(SessionEvent::Ignored {
            contact_id: contact_id.to_string(),
            reason,
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    fn publish_status(&self) {
        let device = self.device.borrow();
        self.status_tx.send_replace(SessionStatus {
            session: self.state.clone(),
            recording_enabled: device.is_recording_enabled(),
            device_state: device.label().to_string(),
            sessions_started: self.sessions_started,
            operator_artifact: self.operator.artifact().cloned(),
            customer_artifact: self.customer.artifact().cloned(),
        });
    }

    /// Run as the single owner of session state, consuming signals until
    /// every handle is dropped
    pub fn spawn(self) -> (CoordinatorHandle, JoinHandle<()>) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let handle = CoordinatorHandle {
            signal_tx,
            status: self.watch_status(),
            events: self.events_tx.clone(),
        };

        let task = tokio::spawn(self.run(signal_rx));
        (handle, task)
    }

    async fn run(mut self, mut signal_rx: mpsc::UnboundedReceiver<ContactSignal>) {
        info!("Session coordinator started");
        let mut device = self.device.clone();
        let mut device_live = true;

        loop {
            tokio::select! {
                signal = signal_rx.recv() => match signal {
                    Some(signal) => self.handle(signal).await,
                    None => break,
                },
                changed = device.changed(), if device_live => {
                    // Acquirer gone; the last state stays in effect
                    if changed.is_err() {
                        device_live = false;
                    }
                    self.publish_status();
                }
            }
        }

        self.shutdown().await;
        info!("Session coordinator stopped");
    }
}

/// Cloneable sender side of a running coordinator
#[derive(Clone)]
pub struct CoordinatorHandle {
    signal_tx: mpsc::UnboundedSender<ContactSignal>,
    status: watch::Receiver<SessionStatus>,
    events: broadcast::Sender<SessionEvent>,
}

impl CoordinatorHandle {
    /// Queue a signal. Returns false once the coordinator has stopped.
    pub fn send(&self, signal: ContactSignal) -> bool {
        self.signal_tx.send(signal).is_ok()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
