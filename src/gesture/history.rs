//! Sliding windows for velocity and depth averaging

use std::collections::VecDeque;

/// One planar motion sample
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionSample {
    pub dx: f32,
    pub dy: f32,
    pub speed: f32,
}

/// Averaged planar motion
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionAverage {
    pub dx: f32,
    pub dy: f32,
    pub speed: f32,
}

/// Fixed-size window of planar displacements
#[derive(Debug)]
pub struct VelocityWindow {
    samples: VecDeque<MotionSample>,
    max_samples: usize,
}

impl VelocityWindow {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    /// Record a displacement, evicting the oldest when full
    pub fn record(&mut self, dx: f32, dy: f32) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(MotionSample {
            dx,
            dy,
            speed: (dx * dx + dy * dy).sqrt(),
        });
    }

    /// Mean displacement and speed; zero when empty
    pub fn average(&self) -> MotionAverage {
        if self.samples.is_empty() {
            return MotionAverage::default();
        }
        let n = self.samples.len() as f32;
        let (dx, dy, speed) = self
            .samples
            .iter()
            .fold((0.0, 0.0, 0.0), |(x, y, s), m| (x + m.dx, y + m.dy, s + m.speed));
        MotionAverage {
            dx: dx / n,
            dy: dy / n,
            speed: speed / n,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Short window of scalar deltas (depth is noisier than x/y)
#[derive(Debug)]
pub struct ScalarWindow {
    values: VecDeque<f32>,
    max_samples: usize,
}

impl ScalarWindow {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            values: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn record(&mut self, value: f32) {
        if self.values.len() >= self.max_samples {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Mean value; zero when empty
    pub fn average(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
