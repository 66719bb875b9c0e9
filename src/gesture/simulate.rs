//! Synthetic detector feed
//!
//! Stands in for the hand-landmark detector when no camera is attached. It
//! cycles through the poses the classifier knows about, with a short gap
//! where no hand is reported.

use super::landmarks::{
    DetectorFrame, Landmark, LandmarkSample, FINGERS, LANDMARK_COUNT, PALM_CENTER,
};
use crossbeam_channel::Sender;
use std::f32::consts::TAU;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Static hand shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pose {
    /// All fingers extended
    Open,
    /// All fingers curled
    Fist,
    /// Index extended, others curled
    Point,
    /// Half open
    Relaxed,
}

impl Pose {
    /// Tip-to-base extension per finger, thumb first
    fn extensions(self) -> [f32; 5] {
        match self {
            Pose::Open => [0.3; 5],
            Pose::Fist => [0.08; 5],
            Pose::Point => [0.05, 0.3, 0.05, 0.05, 0.05],
            Pose::Relaxed => [0.2; 5],
        }
    }
}

/// Build a 21-point hand with its palm centre at (x, y, z)
///
/// Fingers point straight up the image; every point shares the palm depth.
pub fn hand_pose(pose: Pose, x: f32, y: f32, z: f32, timestamp_ms: u64) -> LandmarkSample {
    let mut landmarks = vec![Landmark::new(x, y + 0.1, z); LANDMARK_COUNT];
    landmarks[PALM_CENTER] = Landmark::new(x, y, z);

    for (i, (&(tip, base), ext)) in FINGERS.iter().zip(pose.extensions()).enumerate() {
        let bx = x + (i as f32 - 2.0) * 0.03;
        let by = if base == PALM_CENTER { y } else { y + 0.01 };
        landmarks[base] = Landmark::new(bx, by, z);
        landmarks[tip] = Landmark::new(bx, by - ext, z);
    }

    LandmarkSample::new(landmarks, timestamp_ms)
}

/// Phases of the simulated routine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Stop,
    Expand,
    Focus,
    Swipe,
    Punch,
    Move,
    Gone,
}

const PHASES: [Phase; 7] = [
    Phase::Stop,
    Phase::Expand,
    Phase::Focus,
    Phase::Swipe,
    Phase::Punch,
    Phase::Move,
    Phase::Gone,
];

/// Deterministic gesture routine over time
#[derive(Clone, Debug)]
pub struct SimulatedDetector {
    phase_ms: u64,
}

impl SimulatedDetector {
    pub fn new(phase_ms: u64) -> Self {
        Self {
            phase_ms: phase_ms.max(1),
        }
    }

    /// Frame the detector would report at `t_ms`
    pub fn frame_at(&self, t_ms: u64) -> DetectorFrame {
        let index = (t_ms / self.phase_ms) as usize % PHASES.len();
        let t = t_ms as f32 / 1000.0;

        let sample = match PHASES[index] {
            Phase::Stop => hand_pose(Pose::Point, 0.5, 0.5, 0.0, t_ms),
            Phase::Expand => hand_pose(Pose::Open, 0.5, 0.5, 0.0, t_ms),
            Phase::Focus => hand_pose(Pose::Fist, 0.5, 0.5, 0.0, t_ms),
            Phase::Swipe => {
                let x = 0.5 + 0.3 * (TAU * t / 0.5).sin();
                hand_pose(Pose::Relaxed, x, 0.5, 0.0, t_ms)
            }
            Phase::Punch => {
                let thrust = (t_ms % 400) as f32 / 400.0;
                hand_pose(Pose::Fist, 0.5, 0.5, 0.2 - 0.4 * thrust, t_ms)
            }
            Phase::Move => {
                let x = 0.5 + 0.2 * (TAU * t / 3.0).cos();
                let y = 0.5 + 0.2 * (TAU * t / 3.0).sin();
                hand_pose(Pose::Relaxed, x, y, 0.0, t_ms)
            }
            Phase::Gone => return DetectorFrame::NoHand { timestamp_ms: t_ms },
        };
        DetectorFrame::Hand(sample)
    }

    /// Run the routine on its own thread at `fps`
    ///
    /// Timestamps are milliseconds since `epoch`. The thread exits when the
    /// receiving side of `tx` is dropped.
    pub fn spawn(
        self,
        tx: Sender<DetectorFrame>,
        fps: u32,
        epoch: Instant,
    ) -> std::io::Result<JoinHandle<()>> {
        let period = Duration::from_secs_f32(1.0 / fps.max(1) as f32);
        thread::Builder::new()
            .name("simulated-detector".to_string())
            .spawn(move || {
                info!("Simulated detector started at {} fps", fps);
                loop {
                    let t_ms = epoch.elapsed().as_millis() as u64;
                    if tx.send(self.frame_at(t_ms)).is_err() {
                        debug!("Detector channel closed");
                        break;
                    }
                    thread::sleep(period);
                }
                info!("Simulated detector stopped");
            })
    }
}

impl Default for SimulatedDetector {
    fn default() -> Self {
        Self::new(4000)
    }
}
