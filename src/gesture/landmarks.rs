//! Hand landmark samples as delivered by the external detector
//!
//! A sample is 21 points in MediaPipe order. Coordinates are normalized to
//! roughly [0, 1] on x/y; z is relative depth (smaller is nearer).

use serde::{Deserialize, Serialize};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_MCP: usize = 2;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

/// Palm centre reference point used for velocity and depth
pub const PALM_CENTER: usize = MIDDLE_MCP;

/// (tip, base) pairs for the five fingers, thumb first
pub const FINGERS: [(usize, usize); 5] = [
    (THUMB_TIP, THUMB_MCP),
    (INDEX_TIP, INDEX_MCP),
    (MIDDLE_TIP, MIDDLE_MCP),
    (RING_TIP, RING_MCP),
    (PINKY_TIP, PINKY_MCP),
];

/// Visibility above which a landmark counts towards confidence
const VISIBLE: f32 = 0.5;

/// One detected point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// 3-D Euclidean distance
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One detector frame worth of landmarks
///
/// `timestamp_ms` is milliseconds on a monotonic clock shared with the
/// caller of the classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSample {
    pub landmarks: Vec<Landmark>,
    pub timestamp_ms: u64,
}

impl LandmarkSample {
    pub fn new(landmarks: Vec<Landmark>, timestamp_ms: u64) -> Self {
        Self {
            landmarks,
            timestamp_ms,
        }
    }

    /// Exactly 21 finite points
    pub fn is_well_formed(&self) -> bool {
        self.landmarks.len() == LANDMARK_COUNT && self.landmarks.iter().all(Landmark::is_finite)
    }

    /// Palm centre, or `None` for a malformed sample
    pub fn palm_center(&self) -> Option<Landmark> {
        if self.is_well_formed() {
            Some(self.landmarks[PALM_CENTER])
        } else {
            None
        }
    }

    /// Tip-to-base extension of one finger
    pub fn finger_extension(&self, tip: usize, base: usize) -> f32 {
        match (self.landmarks.get(tip), self.landmarks.get(base)) {
            (Some(t), Some(b)) => t.distance(b),
            _ => 0.0,
        }
    }

    /// Average tip-to-base extension across all five fingers
    pub fn openness(&self) -> f32 {
        if !self.is_well_formed() {
            return 0.0;
        }
        let total: f32 = FINGERS
            .iter()
            .map(|&(tip, base)| self.finger_extension(tip, base))
            .sum();
        total / FINGERS.len() as f32
    }

    /// Index extended while at most one of middle/ring/pinky is
    pub fn is_index_pointing(&self, extended_threshold: f32) -> bool {
        if !self.is_well_formed() {
            return false;
        }
        let index = self.finger_extension(INDEX_TIP, INDEX_MCP);
        let others_extended = FINGERS[2..]
            .iter()
            .filter(|&&(tip, base)| self.finger_extension(tip, base) > extended_threshold)
            .count();
        index > extended_threshold && others_extended <= 1
    }

    /// Fraction of landmarks with visibility above 0.5
    ///
    /// Landmarks without a visibility value count as visible.
    pub fn confidence(&self) -> f32 {
        if !self.is_well_formed() {
            return 0.0;
        }
        let visible = self
            .landmarks
            .iter()
            .filter(|l| l.visibility.map_or(true, |v| v > VISIBLE))
            .count();
        visible as f32 / LANDMARK_COUNT as f32
    }
}

/// What the detector delivered for one frame
#[derive(Clone, Debug, PartialEq)]
pub enum DetectorFrame {
    /// A hand was tracked
    Hand(LandmarkSample),
    /// The detector ran but found no hand
    NoHand { timestamp_ms: u64 },
}

impl DetectorFrame {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            DetectorFrame::Hand(sample) => sample.timestamp_ms,
            DetectorFrame::NoHand { timestamp_ms } => *timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hand(spread: f32) -> LandmarkSample {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        for &(tip, _) in FINGERS.iter() {
            landmarks[tip] = Landmark::new(0.5, 0.5 - spread, 0.0);
        }
        LandmarkSample::new(landmarks, 0)
    }

    #[test]
    fn test_openness_is_average_extension() {
        let sample = flat_hand(0.2);
        assert!((sample.openness() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_sample() {
        let sample = LandmarkSample::new(vec![Landmark::default(); 5], 0);
        assert!(!sample.is_well_formed());
        assert_eq!(sample.openness(), 0.0);
        assert_eq!(sample.confidence(), 0.0);
        assert!(sample.palm_center().is_none());

        let mut nan = flat_hand(0.2);
        nan.landmarks[3].x = f32::NAN;
        assert!(!nan.is_well_formed());
    }

    #[test]
    fn test_index_pointing() {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        landmarks[INDEX_TIP] = Landmark::new(0.5, 0.3, 0.0);
        let sample = LandmarkSample::new(landmarks, 0);
        assert!(sample.is_index_pointing(0.15));
        assert!(!flat_hand(0.2).is_index_pointing(0.15));
    }

    #[test]
    fn test_confidence_counts_visibility() {
        let mut sample = flat_hand(0.2);
        for l in sample.landmarks.iter_mut().take(7) {
            l.visibility = Some(0.1);
        }
        assert!((sample.confidence() - 14.0 / 21.0).abs() < 1e-6);
    }

    #[test]
    fn test_deserialize_detector_json() {
        let json = r#"{"landmarks":[{"x":0.1,"y":0.2,"z":0.0,"visibility":0.9}],"timestamp_ms":5}"#;
        let sample: LandmarkSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.landmarks[0].visibility, Some(0.9));
    }
}
