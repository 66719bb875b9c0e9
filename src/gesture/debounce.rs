//! Count + time debounce gate
//!
//! A raw label is reported only once it has been seen on `stability_count`
//! consecutive samples AND `min_interval_ms` has passed since the previous
//! reported change. The count suppresses flicker, the interval suppresses
//! re-triggering within a burst of frames.

/// Debounce/hysteresis state machine over any label type
#[derive(Debug, Clone)]
pub struct DebounceGate<L> {
    reported: L,
    raw: L,
    stable_count: u32,
    last_change_ms: Option<u64>,
    stability_count: u32,
    min_interval_ms: u64,
}

impl<L: Copy + PartialEq> DebounceGate<L> {
    /// Create a gate reporting `initial` until something else stabilises
    pub fn new(initial: L, stability_count: u32, min_interval_ms: u64) -> Self {
        Self {
            reported: initial,
            raw: initial,
            stable_count: 0,
            last_change_ms: None,
            stability_count: stability_count.max(1),
            min_interval_ms,
        }
    }

    /// Feed one raw label; returns the new label if the reported one changed
    pub fn observe(&mut self, raw: L, now_ms: u64) -> Option<L> {
        if raw == self.raw {
            self.stable_count = self.stable_count.saturating_add(1);
        } else {
            self.raw = raw;
            self.stable_count = 1;
        }

        if self.raw == self.reported || self.stable_count < self.stability_count {
            return None;
        }

        let interval_ok = match self.last_change_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.min_interval_ms,
            None => true,
        };
        if !interval_ok {
            return None;
        }

        self.reported = self.raw;
        self.last_change_ms = Some(now_ms);
        Some(self.reported)
    }

    /// Currently reported label
    pub fn reported(&self) -> L {
        self.reported
    }

    /// Last raw label seen
    pub fn raw(&self) -> L {
        self.raw
    }

    /// Consecutive samples of the current raw label
    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }
}
