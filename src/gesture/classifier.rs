//! Gesture classification from raw landmark samples
//!
//! Each sample goes through three stages:
//! 1. Feature extraction: openness, clamped planar velocity, depth and
//!    approach speed (rolling averages)
//! 2. Raw labelling with fixed thresholds
//! 3. The count + time [`DebounceGate`], which decides the reported label
//!
//! Losing the hand never produces an event. After the grace period the
//! `hand_present` flag drops and velocity history is cleared, but the last
//! reported label is held so the effect does not snap.

use super::config::GestureConfig;
use super::debounce::DebounceGate;
use super::history::{ScalarWindow, VelocityWindow};
use super::landmarks::LandmarkSample;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Labels kept for intent prediction
const INTENT_WINDOW: usize = 3;

/// Categorical gesture label
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    #[default]
    Idle,
    Fist,
    OpenPalm,
    Swipe,
    Punch,
    Move,
    Hold,
    Stop,
}

impl std::fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GestureLabel::Idle => "idle",
            GestureLabel::Fist => "fist",
            GestureLabel::OpenPalm => "open_palm",
            GestureLabel::Swipe => "swipe",
            GestureLabel::Punch => "punch",
            GestureLabel::Move => "move",
            GestureLabel::Hold => "hold",
            GestureLabel::Stop => "stop",
        };
        write!(f, "{}", name)
    }
}

/// What the recent label sequence suggests the user is doing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[default]
    Unknown,
    /// Repeated swipes
    ContinuousFlow,
    /// Alternating fist and open palm
    Resize,
    /// A fist or stop pose in the recent window
    Stop,
}

/// One classified sample
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    /// Debounced label
    pub label: GestureLabel,
    /// Undebounced label for this sample
    pub raw_label: GestureLabel,
    /// Average finger extension
    pub openness: f32,
    /// Averaged planar speed (normalized units per sample)
    pub speed: f32,
    /// Averaged planar direction, y up
    pub direction: [f32; 2],
    /// Palm centre in normalized image coordinates
    pub position: [f32; 2],
    /// 1.0 near, 0.0 far
    pub depth: f32,
    /// Averaged depth change per sample, positive towards the sensor
    pub approach_speed: f32,
    pub is_static: bool,
    /// Fraction of visible landmarks
    pub confidence: f32,
    pub intent: Intent,
    pub timestamp_ms: u64,
}

impl GestureEvent {
    /// Zero-confidence idle event for unusable input
    pub fn neutral(timestamp_ms: u64) -> Self {
        Self {
            label: GestureLabel::Idle,
            raw_label: GestureLabel::Idle,
            openness: 0.0,
            speed: 0.0,
            direction: [0.0, 0.0],
            position: [0.5, 0.5],
            depth: 0.0,
            approach_speed: 0.0,
            is_static: true,
            confidence: 0.0,
            intent: Intent::Unknown,
            timestamp_ms,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PalmPoint {
    x: f32,
    y: f32,
    depth: f32,
}

/// Turns landmark samples into debounced gesture events
pub struct GestureClassifier {
    config: GestureConfig,
    gate: DebounceGate<GestureLabel>,
    velocity: VelocityWindow,
    approach: ScalarWindow,
    previous: Option<PalmPoint>,
    recent: VecDeque<GestureLabel>,
    hand_present: bool,
    last_seen_ms: Option<u64>,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            gate: DebounceGate::new(
                GestureLabel::Idle,
                config.stability_count,
                config.min_debounce_ms,
            ),
            velocity: VelocityWindow::new(config.velocity_history),
            approach: ScalarWindow::new(config.depth_history),
            previous: None,
            recent: VecDeque::with_capacity(INTENT_WINDOW),
            hand_present: false,
            last_seen_ms: None,
            config,
        }
    }

    /// Classify one detector sample
    pub fn classify(&mut self, sample: &LandmarkSample) -> GestureEvent {
        let now = sample.timestamp_ms;
        let Some(palm) = sample.palm_center() else {
            warn!(
                "Malformed landmark sample ({} points), emitting neutral event",
                sample.landmarks.len()
            );
            return GestureEvent::neutral(now);
        };

        if !self.hand_present {
            info!("Hand acquired");
            self.hand_present = true;
        }
        self.last_seen_ms = Some(now);

        let current = PalmPoint {
            x: palm.x,
            y: palm.y,
            depth: self.depth_of(palm.z),
        };
        if let Some(prev) = self.previous {
            let (dx, dy) = clamp_step(current.x - prev.x, current.y - prev.y, self.config.max_step);
            self.velocity.record(dx, dy);
            self.approach.record(current.depth - prev.depth);
        }
        self.previous = Some(current);

        let motion = self.velocity.average();
        let approach_speed = self.approach.average();
        let openness = sample.openness();
        let is_static = motion.speed < self.config.static_speed
            && approach_speed.abs() < self.config.static_approach;

        let raw_label = self.raw_label(sample, openness, motion.speed, approach_speed, is_static);
        if let Some(label) = self.gate.observe(raw_label, now) {
            debug!("Gesture changed to {}", label);
        }
        let label = self.gate.reported();

        if self.recent.len() >= INTENT_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(label);

        GestureEvent {
            label,
            raw_label,
            openness,
            speed: motion.speed,
            direction: [motion.dx, -motion.dy],
            position: [current.x, current.y],
            depth: current.depth,
            approach_speed,
            is_static,
            confidence: sample.confidence(),
            intent: self.predict_intent(),
            timestamp_ms: now,
        }
    }

    /// Report a frame without a hand
    ///
    /// Returns whether the hand is still considered present. The flag drops
    /// only once `hand_lost_grace_ms` has passed since the last sample.
    pub fn observe_absence(&mut self, now_ms: u64) -> bool {
        if !self.hand_present {
            return false;
        }
        let missing_for = self
            .last_seen_ms
            .map_or(u64::MAX, |seen| now_ms.saturating_sub(seen));
        if missing_for >= self.config.hand_lost_grace_ms {
            info!("Hand lost after {}ms, holding last gesture", missing_for);
            self.hand_present = false;
            self.previous = None;
            self.velocity.clear();
            self.approach.clear();
        }
        self.hand_present
    }

    pub fn hand_present(&self) -> bool {
        self.hand_present
    }

    /// Currently reported label
    pub fn current_label(&self) -> GestureLabel {
        self.gate.reported()
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    fn depth_of(&self, z: f32) -> f32 {
        let span = self.config.far_z - self.config.near_z;
        ((self.config.far_z - z) / span).clamp(0.0, 1.0)
    }

    fn raw_label(
        &self,
        sample: &LandmarkSample,
        openness: f32,
        speed: f32,
        approach_speed: f32,
        is_static: bool,
    ) -> GestureLabel {
        let c = &self.config;
        if c.detect_stop && sample.is_index_pointing(c.finger_extended_threshold) {
            return GestureLabel::Stop;
        }
        if speed > c.swipe_speed_threshold {
            return GestureLabel::Swipe;
        }
        if openness < c.open_threshold && approach_speed > c.punch_approach_threshold {
            return GestureLabel::Punch;
        }
        if speed > c.move_speed_threshold {
            return GestureLabel::Move;
        }
        if openness < c.fist_threshold {
            GestureLabel::Fist
        } else if openness > c.open_threshold {
            GestureLabel::OpenPalm
        } else if is_static {
            GestureLabel::Hold
        } else {
            GestureLabel::Idle
        }
    }

    fn predict_intent(&self) -> Intent {
        if self.recent.len() < INTENT_WINDOW {
            return Intent::Unknown;
        }
        if self.recent.iter().all(|&l| l == GestureLabel::Swipe) {
            return Intent::ContinuousFlow;
        }
        let has = |label| self.recent.contains(&label);
        if has(GestureLabel::Fist) && has(GestureLabel::OpenPalm) {
            Intent::Resize
        } else if has(GestureLabel::Fist) || has(GestureLabel::Stop) {
            Intent::Stop
        } else {
            Intent::Unknown
        }
    }
}

/// Scale a displacement down to at most `max_step` in length
fn clamp_step(dx: f32, dy: f32, max_step: f32) -> (f32, f32) {
    let len = (dx * dx + dy * dy).sqrt();
    if len > max_step && len > 0.0 {
        let k = max_step / len;
        (dx * k, dy * k)
    } else {
        (dx, dy)
    }
}
