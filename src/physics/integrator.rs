//! Momentum integration
//!
//! Gesture events nudge the [`PhysicalState`] through per-label rules;
//! [`MomentumIntegrator::tick`] runs once per render frame and applies
//! damping and interpolation. Damping is per tick, not scaled by elapsed
//! time, assuming a fixed target frame rate.
//!
//! Return to equilibrium uses the slow `rest_lerp` factor and happens when
//! the last label was `idle`, or when no event has arrived for
//! `stale_ticks` ticks. `hold` and `stop` never decay.

use super::config::IntegratorConfig;
use super::state::{lerp, PhysicalState, Vec3};
use crate::gesture::{GestureEvent, GestureLabel};
use tracing::debug;

/// Owns and advances the authoritative physical state
pub struct MomentumIntegrator {
    config: IntegratorConfig,
    state: PhysicalState,
    mode: GestureLabel,
    ticks_since_event: u32,
}

impl MomentumIntegrator {
    pub fn new(config: IntegratorConfig) -> Self {
        Self {
            config,
            state: PhysicalState::default(),
            mode: GestureLabel::Idle,
            ticks_since_event: 0,
        }
    }

    /// Apply one gesture event
    pub fn apply(&mut self, event: &GestureEvent) {
        if event.label != self.mode {
            debug!("Integrator mode {} -> {}", self.mode, event.label);
        }
        self.mode = event.label;
        self.ticks_since_event = 0;

        let depth = finite(event.depth).clamp(0.0, 1.0);
        let approach = finite(event.approach_speed);

        match event.label {
            GestureLabel::OpenPalm => self.expand(depth, approach),
            GestureLabel::Fist => self.focus(event.is_static),
            GestureLabel::Swipe => {
                self.swipe([finite(event.direction[0]), finite(event.direction[1])])
            }
            GestureLabel::Punch => self.punch(),
            GestureLabel::Move => {
                self.move_to([finite(event.position[0]), finite(event.position[1])])
            }
            GestureLabel::Stop => {
                self.state.is_stopped = true;
                self.state.hue = self.config.hues.stop;
            }
            GestureLabel::Hold => {}
            GestureLabel::Idle => {
                self.state.is_stopped = false;
            }
        }
    }

    /// Advance one frame and return the resulting state
    pub fn tick(&mut self) -> PhysicalState {
        self.ticks_since_event = self.ticks_since_event.saturating_add(1);
        let c = &self.config;
        let s = &mut self.state;

        let returning = match self.mode {
            GestureLabel::Hold | GestureLabel::Stop => false,
            GestureLabel::Idle => true,
            _ => self.ticks_since_event > c.stale_ticks,
        };
        if returning {
            s.expansion = lerp(s.expansion, 1.0, c.rest_lerp);
            s.focus = lerp(s.focus, 0.0, c.rest_lerp);
            s.hue = lerp(s.hue, c.hues.rest, c.rest_lerp);
            s.camera_target = lerp(s.camera_target, c.camera_base, c.rest_lerp);
            s.warp_speed = lerp(s.warp_speed, 0.0, c.warp_rest_lerp);
        }

        s.momentum = s.momentum.scale(c.momentum_damping);
        s.angular_velocity = s.angular_velocity.scale(c.angular_damping);
        s.rotation = s.rotation.add(s.angular_velocity);

        s.current_position = s.current_position.lerp(s.target_position, c.position_lerp);

        let remaining = (s.camera_target - s.camera_depth).abs();
        let factor = (c.camera_lerp_min + c.camera_lerp_gain * remaining)
            .clamp(c.camera_lerp_min, c.camera_lerp_max);
        s.camera_depth = lerp(s.camera_depth, s.camera_target, factor);

        *s
    }

    /// Current state without advancing
    pub fn state(&self) -> &PhysicalState {
        &self.state
    }

    /// Label of the last applied event
    pub fn mode(&self) -> GestureLabel {
        self.mode
    }

    /// Replace the state wholesale, e.g. when taking over from a remote master
    pub fn reset_to(&mut self, state: PhysicalState) {
        self.state = state;
        self.mode = GestureLabel::Idle;
        self.ticks_since_event = 0;
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    fn expand(&mut self, depth: f32, approach: f32) {
        let c = &self.config;
        let s = &mut self.state;
        let step = c.expand_rate + c.depth_bonus * depth + c.approach_bonus * approach.max(0.0);

        s.is_stopped = false;
        s.expansion = (s.expansion + step).min(c.expansion_cap);
        s.focus = (s.focus - step).max(0.0);
        s.camera_target = (c.camera_base
            - c.camera_expansion_gain * (s.expansion - 1.0)
            - c.camera_approach_gain * approach
            - c.camera_depth_gain * depth)
            .clamp(c.camera_min, c.camera_max);
        s.hue = c.hues.expand;
    }

    fn focus(&mut self, is_static: bool) {
        let c = &self.config;
        let s = &mut self.state;
        let rate = if is_static {
            c.focus_rate_static
        } else {
            c.focus_rate_moving
        };

        s.is_stopped = false;
        s.focus = (s.focus + rate).min(c.focus_cap);
        s.expansion = (s.expansion - rate).max(c.expansion_floor);
        s.camera_target =
            (c.camera_base + c.camera_focus_gain * s.focus).clamp(c.camera_min, c.camera_max);
        s.hue = c.hues.focus;
    }

    fn swipe(&mut self, direction: [f32; 2]) {
        let c = &self.config;
        let s = &mut self.state;

        let mut momentum = Vec3::new(
            direction[0] * c.swipe_momentum_gain,
            direction[1] * c.swipe_momentum_gain,
            0.0,
        );
        let len = momentum.length();
        if len > c.max_momentum {
            momentum = momentum.scale(c.max_momentum / len);
        }

        s.is_stopped = false;
        s.momentum = momentum;
        if momentum.x.abs() > momentum.y.abs() {
            s.angular_velocity.y = momentum.x * c.swipe_angular_gain;
        } else {
            s.angular_velocity.x = momentum.y * c.swipe_angular_gain;
        }
        s.hue = c.hues.swipe;
    }

    fn punch(&mut self) {
        let c = &self.config;
        let s = &mut self.state;
        s.is_stopped = false;
        s.warp_speed = (s.warp_speed + c.warp_step).min(c.warp_cap);
        s.hue = c.hues.punch;
    }

    fn move_to(&mut self, position: [f32; 2]) {
        let c = &self.config;
        let s = &mut self.state;
        let limit = c.position_limit;
        s.is_stopped = false;
        s.target_position.x = ((position[0] - 0.5) * c.position_range).clamp(-limit, limit);
        s.target_position.y = (-(position[1] - 0.5) * c.position_range).clamp(-limit, limit);
        s.hue = c.hues.moving;
    }
}

impl Default for MomentumIntegrator {
    fn default() -> Self {
        Self::new(IntegratorConfig::default())
    }
}

fn finite(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(label: GestureLabel) -> GestureEvent {
        GestureEvent {
            label,
            raw_label: label,
            is_static: false,
            confidence: 1.0,
            ..GestureEvent::neutral(0)
        }
    }

    #[test]
    fn test_expand_raises_expansion_and_lowers_focus() {
        let mut integrator = MomentumIntegrator::default();
        integrator.apply(&event(GestureLabel::Fist));
        let focus_before = integrator.state().focus;
        integrator.apply(&event(GestureLabel::OpenPalm));
        assert!(integrator.state().focus < focus_before);

        for _ in 0..200 {
            integrator.apply(&event(GestureLabel::OpenPalm));
        }
        assert_eq!(integrator.state().expansion, integrator.config().expansion_cap);
        assert_eq!(integrator.state().focus, 0.0);
        assert!(integrator.state().camera_target < integrator.config().camera_base);
    }

    #[test]
    fn test_focus_rate_depends_on_stillness() {
        let mut moving = MomentumIntegrator::default();
        moving.apply(&event(GestureLabel::Fist));

        let mut still = MomentumIntegrator::default();
        still.apply(&GestureEvent {
            is_static: true,
            ..event(GestureLabel::Fist)
        });

        assert!(moving.state().focus > still.state().focus);
        assert!(moving.state().camera_target > moving.config().camera_base);
    }

    #[test]
    fn test_focus_respects_floor_and_cap() {
        let mut integrator = MomentumIntegrator::default();
        for _ in 0..100 {
            integrator.apply(&event(GestureLabel::Fist));
        }
        assert_eq!(integrator.state().focus, 1.0);
        assert_eq!(integrator.state().expansion, 0.5);
    }

    #[test]
    fn test_hold_is_a_no_op() {
        let mut integrator = MomentumIntegrator::default();
        integrator.apply(&event(GestureLabel::OpenPalm));
        let before = *integrator.state();
        integrator.apply(&event(GestureLabel::Hold));
        assert_eq!(*integrator.state(), before);

        for _ in 0..200 {
            integrator.tick();
        }
        assert_eq!(integrator.state().expansion, before.expansion);
    }

    #[test]
    fn test_swipe_sets_momentum_not_expansion() {
        let mut integrator = MomentumIntegrator::default();
        integrator.apply(&GestureEvent {
            direction: [0.04, 0.0],
            ..event(GestureLabel::Swipe)
        });
        let s = integrator.state();
        assert!(s.momentum.x > 0.0);
        assert!(s.angular_velocity.y > 0.0);
        assert_eq!(s.expansion, 1.0);
        assert_eq!(s.focus, 0.0);
        assert_eq!(s.hue, integrator.config().hues.swipe);
    }

    #[test]
    fn test_swipe_momentum_is_capped() {
        let mut integrator = MomentumIntegrator::default();
        integrator.apply(&GestureEvent {
            direction: [10.0, 10.0],
            ..event(GestureLabel::Swipe)
        });
        assert!(integrator.state().momentum.length() <= integrator.config().max_momentum + 1e-4);
    }

    #[test]
    fn test_punch_caps_warp() {
        let mut integrator = MomentumIntegrator::default();
        for _ in 0..10 {
            integrator.apply(&event(GestureLabel::Punch));
        }
        assert_eq!(integrator.state().warp_speed, 1.0);
    }

    #[test]
    fn test_move_target_is_clamped() {
        let mut integrator = MomentumIntegrator::default();
        integrator.apply(&GestureEvent {
            position: [0.7, 0.3],
            ..event(GestureLabel::Move)
        });
        let t = integrator.state().target_position;
        assert!((t.x - 20.0).abs() < 1e-4);
        assert!((t.y - 20.0).abs() < 1e-4);

        integrator.apply(&GestureEvent {
            position: [50.0, -50.0],
            ..event(GestureLabel::Move)
        });
        let t = integrator.state().target_position;
        assert_eq!(t.x, 50.0);
        assert_eq!(t.y, 50.0);
    }

    #[test]
    fn test_stop_sets_flag_and_other_labels_clear_it() {
        let mut integrator = MomentumIntegrator::default();
        integrator.apply(&event(GestureLabel::Stop));
        assert!(integrator.state().is_stopped);
        integrator.apply(&event(GestureLabel::Hold));
        assert!(integrator.state().is_stopped);
        integrator.apply(&event(GestureLabel::Punch));
        assert!(!integrator.state().is_stopped);
    }

    #[test]
    fn test_idle_converges_monotonically() {
        let mut integrator = MomentumIntegrator::default();
        for _ in 0..20 {
            integrator.apply(&event(GestureLabel::OpenPalm));
            integrator.apply(&event(GestureLabel::Punch));
        }
        integrator.apply(&event(GestureLabel::Idle));

        let mut prev = *integrator.state();
        for _ in 0..2000 {
            let next = integrator.tick();
            assert!(next.expansion <= prev.expansion && next.expansion >= 1.0);
            assert!(next.warp_speed <= prev.warp_speed && next.warp_speed >= 0.0);
            assert!(next.focus >= 0.0);
            prev = next;
        }
        assert!((prev.expansion - 1.0).abs() < 1e-3);
        assert!(prev.warp_speed < 1e-3);

        let settled = integrator.tick();
        assert!((settled.expansion - prev.expansion).abs() < 1e-4);
    }

    #[test]
    fn test_stale_events_return_to_rest() {
        let mut integrator =
            MomentumIntegrator::new(IntegratorConfig::default().with_stale_ticks(5));
        for _ in 0..20 {
            integrator.apply(&event(GestureLabel::Fist));
        }
        let peak = integrator.state().focus;
        for _ in 0..5 {
            integrator.tick();
        }
        assert_eq!(integrator.state().focus, peak);
        for _ in 0..2000 {
            integrator.tick();
        }
        assert!(integrator.state().focus < 1e-3);
        assert!((integrator.state().expansion - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_damping_is_pure_decay() {
        let mut integrator = MomentumIntegrator::default();
        integrator.apply(&GestureEvent {
            direction: [0.05, -0.02],
            ..event(GestureLabel::Swipe)
        });
        let mut momentum = integrator.state().momentum.length();
        let mut angular = integrator.state().angular_velocity.length();
        for _ in 0..500 {
            let s = integrator.tick();
            assert!(s.momentum.length() <= momentum);
            assert!(s.angular_velocity.length() <= angular);
            momentum = s.momentum.length();
            angular = s.angular_velocity.length();
        }
        assert!(momentum < 1e-3);
    }

    #[test]
    fn test_camera_target_clamped_for_extreme_input() {
        let mut integrator = MomentumIntegrator::default();
        let (min, max) = (integrator.config().camera_min, integrator.config().camera_max);
        for (depth, approach) in [(1.0, 100.0), (0.0, -100.0), (f32::NAN, f32::INFINITY)] {
            integrator.apply(&GestureEvent {
                depth,
                approach_speed: approach,
                ..event(GestureLabel::OpenPalm)
            });
            let target = integrator.state().camera_target;
            assert!(target >= min && target <= max, "target {} out of range", target);
        }
        for _ in 0..50 {
            integrator.apply(&event(GestureLabel::Fist));
            let target = integrator.state().camera_target;
            assert!(target >= min && target <= max);
        }
    }

    #[test]
    fn test_camera_catches_up_without_overshoot() {
        let mut integrator = MomentumIntegrator::default();
        for _ in 0..50 {
            integrator.apply(&GestureEvent {
                depth: 1.0,
                approach_speed: 1.0,
                ..event(GestureLabel::OpenPalm)
            });
        }
        let target = integrator.state().camera_target;
        let start = integrator.state().camera_depth;
        assert!(target < start);

        let first_step = start - integrator.tick().camera_depth;
        let mut depth = integrator.state().camera_depth;
        for _ in 0..20 {
            let next = integrator.tick().camera_depth;
            assert!(next >= target && next <= depth);
            assert!(depth - next <= first_step + 1e-4);
            depth = next;
        }
    }

    #[test]
    fn test_position_interpolates_toward_target() {
        let mut integrator = MomentumIntegrator::default();
        integrator.apply(&GestureEvent {
            position: [1.0, 0.5],
            ..event(GestureLabel::Move)
        });
        let mut x = 0.0;
        for _ in 0..100 {
            let next = integrator.tick().current_position.x;
            assert!(next > x && next <= 50.0);
            x = next;
        }
    }

    #[test]
    fn test_reset_to_replaces_state() {
        let mut integrator = MomentumIntegrator::default();
        integrator.apply(&event(GestureLabel::Punch));
        let remote = PhysicalState::default().with_expansion(2.0);
        integrator.reset_to(remote);
        assert_eq!(*integrator.state(), remote);
        assert_eq!(integrator.mode(), GestureLabel::Idle);
    }
}
