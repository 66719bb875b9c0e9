//! Integration tests for the Liquid Silk orchestrator
//!
//! These tests feed synthetic detector frames through the full pipeline and
//! watch what reaches the renderer.

use crossbeam_channel::{bounded, Receiver};
use liquid_silk::gesture::simulate::{hand_pose, Pose};
use liquid_silk::gesture::{DetectorFrame, GestureLabel};
use liquid_silk::integration::{
    Orchestrator, OrchestratorBuilder, OrchestratorCommand, OrchestratorEvent, OrchestratorHandle,
    SilkConfig,
};
use liquid_silk::physics::PhysicalState;
use liquid_silk::sync::{Role, SyncConfig, SyncHub, SyncServer};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

fn feed(handle: &OrchestratorHandle, pose: Pose, frames: u64, start_ms: u64) -> u64 {
    let tx = handle.detector_sender();
    for i in 0..frames {
        let ts = start_ms + i * 33;
        tx.send(DetectorFrame::Hand(hand_pose(pose, 0.5, 0.5, 0.0, ts)))
            .unwrap();
        thread::sleep(Duration::from_millis(5));
    }
    start_ms + frames * 33
}

fn wait_for_event(handle: &OrchestratorHandle, wanted: OrchestratorEvent) {
    let events = handle.event_receiver();
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Ok(event) = events.recv_timeout(Duration::from_millis(50)) {
            if event == wanted {
                return;
            }
        }
    }
    panic!("timed out waiting for {:?}", wanted);
}

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("timed out waiting for {}", what);
}

fn shutdown(handle: &OrchestratorHandle, workers: Vec<JoinHandle<()>>) {
    handle.send_command(OrchestratorCommand::Shutdown).unwrap();
    wait_for_event(handle, OrchestratorEvent::Shutdown);
    for worker in workers {
        worker.join().unwrap();
    }
}

fn standalone() -> (OrchestratorHandle, Receiver<PhysicalState>, Vec<JoinHandle<()>>) {
    let (render_tx, render_rx) = bounded(10_000);
    let (orchestrator, handle) = OrchestratorBuilder::new()
        .standalone()
        .without_simulation()
        .build(render_tx)
        .unwrap();
    let workers = orchestrator.start().unwrap();
    (handle, render_rx, workers)
}

/// An open palm held long enough expands the rendered state
#[test]
fn test_open_palm_expands_rendered_state() {
    let (handle, renders, workers) = standalone();

    feed(&handle, Pose::Open, 20, 0);
    wait_for_event(&handle, OrchestratorEvent::GestureChanged(GestureLabel::OpenPalm));
    wait_until("expanded", || handle.snapshot().expansion > 1.2);

    let frames: Vec<PhysicalState> = renders.try_iter().collect();
    assert!(!frames.is_empty(), "renderer received nothing");
    assert!(frames.iter().all(|s| s.expansion <= 3.0));

    shutdown(&handle, workers);
}

/// A gesture change is rendered at once, not on the next tick
#[test]
fn test_gesture_change_renders_before_next_tick() {
    let (render_tx, renders) = bounded::<PhysicalState>(10_000);
    let (orchestrator, handle) = OrchestratorBuilder::new()
        .standalone()
        .without_simulation()
        .with_frame_rate(1)
        .build(render_tx)
        .unwrap();
    let workers = orchestrator.start().unwrap();

    // The first tick is a full second away
    feed(&handle, Pose::Open, 6, 0);
    let state = renders
        .recv_timeout(Duration::from_millis(500))
        .expect("no render before the first tick");
    assert_eq!(handle.snapshot(), state);
    wait_for_event(&handle, OrchestratorEvent::GestureChanged(GestureLabel::OpenPalm));

    shutdown(&handle, workers);
}

/// Hand loss fires only after the grace period and the state returns to rest
#[test]
fn test_hand_lost_then_state_relaxes() {
    let (handle, _renders, workers) = standalone();
    let events = handle.event_receiver();

    let end = feed(&handle, Pose::Fist, 10, 0);
    wait_for_event(&handle, OrchestratorEvent::HandAcquired);
    wait_for_event(&handle, OrchestratorEvent::GestureChanged(GestureLabel::Fist));

    // One missing frame inside the grace period does not count
    handle
        .detector_sender()
        .send(DetectorFrame::NoHand { timestamp_ms: end + 50 })
        .unwrap();
    thread::sleep(Duration::from_millis(30));
    assert!(!events.try_iter().any(|e| e == OrchestratorEvent::HandLost));

    handle
        .detector_sender()
        .send(DetectorFrame::NoHand { timestamp_ms: end + 1000 })
        .unwrap();
    wait_for_event(&handle, OrchestratorEvent::HandLost);

    wait_until("focus relaxes", || handle.snapshot().focus < 0.05);
    shutdown(&handle, workers);
}

/// Malformed samples neither crash the loop nor move the state
#[test]
fn test_malformed_samples_are_absorbed() {
    let (handle, _renders, workers) = standalone();
    let tx = handle.detector_sender();
    for ts in 0..20 {
        let mut sample = hand_pose(Pose::Open, 0.5, 0.5, 0.0, ts * 33);
        sample.landmarks.truncate(5);
        tx.send(DetectorFrame::Hand(sample)).unwrap();
    }
    thread::sleep(Duration::from_millis(100));
    assert_eq!(handle.snapshot().expansion, 1.0);
    shutdown(&handle, workers);
}

/// The slave renders the master's state, never its own gestures
#[test]
fn test_slave_renders_master_state() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let hub = SyncHub::default();
    let server = runtime
        .block_on(SyncServer::bind("127.0.0.1:0", hub.clone()))
        .unwrap();
    let url = format!("ws://{}", server.local_addr().unwrap());
    runtime.spawn(server.run());

    let sync = SyncConfig::default()
        .with_server_url(url)
        .with_reconnect_delay_ms(50);
    let master_config = SilkConfig::default()
        .with_sync(sync.clone().claiming_master())
        .without_simulation();
    let slave_config = SilkConfig::default().with_sync(sync).without_simulation();

    let (master_sink, _) = bounded::<PhysicalState>(10_000);
    let (slave_sink, _) = bounded::<PhysicalState>(10_000);
    let (master, master_handle) = Orchestrator::new(master_config, master_sink).unwrap();
    let (slave, slave_handle) = Orchestrator::new(slave_config, slave_sink).unwrap();
    let master_workers = master.start().unwrap();
    let slave_workers = slave.start().unwrap();

    wait_for_event(&master_handle, OrchestratorEvent::RoleChanged(Role::Master));
    wait_until("slave connected", || {
        slave_handle.sync_status().is_some_and(|s| s.connected)
    });

    // Master opens its hand while the slave makes a fist
    let feeder = {
        let slave_handle = slave_handle.clone();
        thread::spawn(move || feed(&slave_handle, Pose::Fist, 60, 0))
    };
    feed(&master_handle, Pose::Open, 60, 0);
    feeder.join().unwrap();

    wait_until("slave mirrors expansion", || {
        slave_handle.snapshot().expansion > 1.2
    });
    assert!(slave_handle.snapshot().focus < 0.05);
    assert!(hub.authoritative_state().expansion > 1.2);
    assert_eq!(
        slave_handle.sync_status().map(|s| s.role),
        Some(Role::Slave)
    );

    shutdown(&master_handle, master_workers);
    shutdown(&slave_handle, slave_workers);
}
