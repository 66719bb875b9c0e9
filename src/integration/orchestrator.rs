//! Orchestrator for the gesture-to-render pipeline
//!
//! Connects all components: Detector -> Classifier -> Integrator -> Render,
//! with the sync client deciding whose state gets rendered:
//!
//! - standalone or master: the local integrator's state (published when master)
//! - slave: the last state received from the server, never the local one

use crate::gesture::{
    DetectorFrame, GestureClassifier, GestureLabel, LandmarkSample, SimulatedDetector,
};
use crate::integration::config::SilkConfig;
use crate::integration::render::RenderSink;
use crate::physics::{MomentumIntegrator, PhysicalState};
use crate::sync::{Role, SyncClient, SyncLink, SyncStatus};
use crate::{Result, SilkError};
use crossbeam_channel::{bounded, never, select, tick, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Commands that can be sent to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorCommand {
    /// Ask the sync server to make this device master
    ApplyMaster,

    /// Shutdown the orchestrator
    Shutdown,
}

/// Events emitted by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorEvent {
    /// Debounced gesture label changed
    GestureChanged(GestureLabel),

    /// A hand appeared after being absent
    HandAcquired,

    /// No hand for longer than the grace period
    HandLost,

    /// Sync role changed
    RoleChanged(Role),

    /// Orchestrator has shut down
    Shutdown,
}

/// Handle for controlling the orchestrator from the outside
#[derive(Clone)]
pub struct OrchestratorHandle {
    /// Command sender
    command_tx: Sender<OrchestratorCommand>,

    /// Event receiver
    event_rx: Receiver<OrchestratorEvent>,

    /// Detector frame sender
    frame_tx: Sender<DetectorFrame>,

    /// Last rendered state
    rendered: Arc<RwLock<PhysicalState>>,

    /// Sync link, if syncing is enabled
    sync: Option<SyncLink>,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: OrchestratorCommand) -> Result<()> {
        self.command_tx.send(cmd).map_err(|e| {
            SilkError::ChannelError(format!("Failed to send command: {}", e))
        })
    }

    /// Try to receive an event from the orchestrator
    pub fn try_recv_event(&self) -> Option<OrchestratorEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get the event receiver
    pub fn event_receiver(&self) -> Receiver<OrchestratorEvent> {
        self.event_rx.clone()
    }

    /// Get the sender external detectors push frames into
    pub fn detector_sender(&self) -> Sender<DetectorFrame> {
        self.frame_tx.clone()
    }

    /// Last state handed to the renderer
    pub fn snapshot(&self) -> PhysicalState {
        *self.rendered.read()
    }

    /// Current sync status; `None` when running standalone
    pub fn sync_status(&self) -> Option<SyncStatus> {
        self.sync.as_ref().map(SyncLink::status)
    }
}

/// Main orchestrator that coordinates all components
pub struct Orchestrator {
    /// Configuration
    config: SilkConfig,

    /// Command receiver
    command_rx: Receiver<OrchestratorCommand>,

    /// Event sender
    event_tx: Sender<OrchestratorEvent>,

    /// Detector frame channel
    frame_tx: Sender<DetectorFrame>,
    frame_rx: Receiver<DetectorFrame>,

    /// Last rendered state
    rendered: Arc<RwLock<PhysicalState>>,

    /// Sync client, started with the orchestrator
    sync_client: Option<SyncClient>,
    sync_link: Option<SyncLink>,

    /// Renderer
    sink: Box<dyn RenderSink>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given configuration
    pub fn new(
        config: SilkConfig,
        sink: impl RenderSink + 'static,
    ) -> Result<(Self, OrchestratorHandle)> {
        config.validate()?;

        let (command_tx, command_rx) = bounded(100);
        let (event_tx, event_rx) = bounded(100);
        let (frame_tx, frame_rx) = bounded(config.orchestrator.frame_queue);
        let rendered = Arc::new(RwLock::new(PhysicalState::default()));

        let (sync_client, sync_link) = if config.sync.enabled {
            let (client, link) = SyncClient::new(config.sync.clone());
            (Some(client), Some(link))
        } else {
            (None, None)
        };

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            frame_tx: frame_tx.clone(),
            rendered: Arc::clone(&rendered),
            sync: sync_link.clone(),
        };

        let orchestrator = Self {
            config,
            command_rx,
            event_tx,
            frame_tx,
            frame_rx,
            rendered,
            sync_client,
            sync_link,
            sink: Box::new(sink),
        };

        Ok((orchestrator, handle))
    }

    /// Start the frame loop, the sync worker and (if configured) the
    /// simulated detector
    ///
    /// This consumes the orchestrator and returns join handles for the worker threads.
    pub fn start(mut self) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::new();

        // Start sync client
        if let Some(client) = self.sync_client.take() {
            handles.push(client.start_worker()?);
            info!("Sync client started against {}", self.config.sync.server_url);
        } else {
            info!("Sync disabled, running standalone");
        }

        // Start simulated detector
        if self.config.orchestrator.simulate {
            let detector = SimulatedDetector::new(self.config.orchestrator.simulation_phase_ms);
            let detector_handle = detector
                .spawn(
                    self.frame_tx.clone(),
                    self.config.orchestrator.detector_fps,
                    Instant::now(),
                )
                .map_err(|e| {
                    SilkError::OrchestratorError(format!("Failed to spawn detector: {}", e))
                })?;
            handles.push(detector_handle);
        }

        // Start the main frame loop
        let command_rx = self.command_rx.clone();
        let frame_rx = self.frame_rx.clone();
        let interval = self.config.orchestrator.frame_interval();
        let mut frame_loop = FrameLoop {
            classifier: GestureClassifier::new(self.config.gesture.clone()),
            integrator: MomentumIntegrator::new(self.config.integrator.clone()),
            sync: self.sync_link.take(),
            role: Role::Slave,
            last_label: GestureLabel::Idle,
            last_frame: None,
            sink: self.sink,
            event_tx: self.event_tx.clone(),
            rendered: Arc::clone(&self.rendered),
        };
        let event_tx = self.event_tx;
        drop(self.frame_tx);

        let orchestrator_handle = thread::Builder::new()
            .name("orchestrator".to_string())
            .spawn(move || {
                info!("Orchestrator started at {:?} per frame", interval);

                let ticker = tick(interval);
                let idle = never();
                let mut frames_open = true;

                loop {
                    let frames = if frames_open { &frame_rx } else { &idle };
                    select! {
                        recv(command_rx) -> cmd => match cmd {
                            Ok(OrchestratorCommand::ApplyMaster) => frame_loop.apply_master(),
                            Ok(OrchestratorCommand::Shutdown) => {
                                info!("Orchestrator shutdown requested");
                                break;
                            }
                            Err(_) => {
                                warn!("Command channel disconnected");
                                break;
                            }
                        },
                        recv(frames) -> frame => match frame {
                            Ok(frame) => frame_loop.on_frame(frame),
                            Err(_) => {
                                debug!("Detector channel closed");
                                frames_open = false;
                            }
                        },
                        recv(ticker) -> _ => frame_loop.on_tick(),
                    }
                }

                frame_loop.shutdown();
                let _ = event_tx.try_send(OrchestratorEvent::Shutdown);
                info!("Orchestrator stopped");
            })
            .map_err(|e| {
                SilkError::OrchestratorError(format!("Failed to spawn frame loop: {}", e))
            })?;

        handles.push(orchestrator_handle);

        Ok(handles)
    }
}

/// State owned by the frame loop thread
struct FrameLoop {
    classifier: GestureClassifier,
    integrator: MomentumIntegrator,
    sync: Option<SyncLink>,
    role: Role,
    last_label: GestureLabel,
    /// Detector timestamp of the last frame and when it arrived
    last_frame: Option<(u64, Instant)>,
    sink: Box<dyn RenderSink>,
    event_tx: Sender<OrchestratorEvent>,
    rendered: Arc<RwLock<PhysicalState>>,
}

impl FrameLoop {
    fn on_frame(&mut self, frame: DetectorFrame) {
        let now_ms = frame.timestamp_ms();
        self.last_frame = Some((now_ms, Instant::now()));
        match frame {
            DetectorFrame::Hand(sample) => self.on_sample(&sample),
            DetectorFrame::NoHand { timestamp_ms } => self.on_absence(timestamp_ms),
        }
    }

    fn on_sample(&mut self, sample: &LandmarkSample) {
        let was_present = self.classifier.hand_present();
        let event = self.classifier.classify(sample);
        if !sample.is_well_formed() {
            return;
        }
        if !was_present && self.classifier.hand_present() {
            self.emit(OrchestratorEvent::HandAcquired);
        }
        let changed = event.label != self.last_label;
        if changed {
            self.last_label = event.label;
            self.emit(OrchestratorEvent::GestureChanged(event.label));
        }
        self.integrator.apply(&event);

        // A new gesture reaches the renderer without waiting for the next tick
        if changed && self.is_authoritative() {
            let state = *self.integrator.state();
            self.present(state);
        }
    }

    fn on_absence(&mut self, now_ms: u64) {
        let was_present = self.classifier.hand_present();
        if was_present && !self.classifier.observe_absence(now_ms) {
            self.emit(OrchestratorEvent::HandLost);
        }
    }

    fn on_tick(&mut self) {
        // A detector that stops calling at all also counts as absence
        if let Some((ts, arrived)) = self.last_frame {
            self.on_absence(ts + arrived.elapsed().as_millis() as u64);
        }

        let status = self.sync.as_ref().map(SyncLink::status);
        if let Some(status) = status {
            self.observe_role(&status);
        }

        let local = self.integrator.tick();
        let state = match status {
            None => local,
            Some(status) if status.is_master() => {
                if let Some(link) = &self.sync {
                    link.publish(local);
                }
                local
            }
            Some(status) => status.shadow.unwrap_or_default(),
        };
        self.present(state);
    }

    /// Whether local gestures drive what is rendered
    fn is_authoritative(&self) -> bool {
        self.sync.is_none() || self.role == Role::Master
    }

    fn present(&mut self, state: PhysicalState) {
        *self.rendered.write() = state;
        self.sink.render(&state);
    }

    fn observe_role(&mut self, status: &SyncStatus) {
        if status.role == self.role {
            return;
        }
        info!("Role {} -> {}", self.role, status.role);
        self.role = status.role;
        if status.is_master() {
            if let Some(shadow) = status.shadow {
                self.integrator.reset_to(shadow);
            }
        }
        self.emit(OrchestratorEvent::RoleChanged(status.role));
    }

    fn apply_master(&self) {
        match &self.sync {
            Some(link) => {
                if let Err(e) = link.apply_master() {
                    warn!("Could not request mastership: {}", e);
                }
            }
            None => debug!("Standalone, ignoring apply-master"),
        }
    }

    fn shutdown(&self) {
        if let Some(link) = &self.sync {
            let _ = link.shutdown();
        }
    }

    fn emit(&self, event: OrchestratorEvent) {
        if let Err(TrySendError::Full(event)) = self.event_tx.try_send(event) {
            debug!("Event queue full, dropping {:?}", event);
        }
    }
}

/// Builder for creating an orchestrator
pub struct OrchestratorBuilder {
    config: SilkConfig,
}

impl OrchestratorBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: SilkConfig::default(),
        }
    }

    /// Set the complete configuration
    pub fn with_config(mut self, config: SilkConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the sync server URL
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.config.sync.server_url = url.into();
        self
    }

    /// Run without a sync server
    pub fn standalone(mut self) -> Self {
        self.config.sync.enabled = false;
        self
    }

    /// Disable the simulated detector
    pub fn without_simulation(mut self) -> Self {
        self.config.orchestrator.simulate = false;
        self
    }

    /// Set the frame rate
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.config.orchestrator.frame_rate = frame_rate;
        self
    }

    /// Build the orchestrator
    pub fn build(
        self,
        sink: impl RenderSink + 'static,
    ) -> Result<(Orchestrator, OrchestratorHandle)> {
        Orchestrator::new(self.config, sink)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
