//! Two-mass spring-damper integrator
//!
//! The top and bottom edges of the sprite are point masses joined by a spring
//! of stiffness `k` and a damper `c`, both pulled down by gravity, with the
//! bottom mass bouncing elastically off a floor. Each interval is advanced with
//! constant accelerations evaluated at its start, so an interval is sliced
//! wherever a velocity changes sign or the bottom mass reaches the floor.
//! Slicing runs off an explicit work stack bounded by `min_interval` and
//! `max_slices`.

use crate::params::OscillatorParams;
use smile_core::GeomInstance;

/// A mass moving vertically, with a horizontal offset used for squash-and-stretch
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointMass {
    pub x: f64,
    pub y: f64,
    pub velocity: f64,
}

/// Counters from one `integrate` call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Work items processed, including the initial interval
    pub slices: u32,
    /// Floor contacts resolved
    pub collisions: u32,
}

/// State reached after advancing an interval under constant accelerations
#[derive(Clone, Copy, Debug)]
struct Motion {
    top_accel: f64,
    bottom_accel: f64,
    top_velocity: f64,
    bottom_velocity: f64,
    top_y: f64,
    bottom_y: f64,
}

#[derive(Clone, Debug)]
pub struct Oscillator {
    pub top: PointMass,
    pub bottom: PointMass,
    /// `top.y - bottom.y`; negative while the spring is compressed
    pub spring_extension: f64,
    params: OscillatorParams,
}

impl Oscillator {
    /// Both masses resting on the floor with the spring relaxed
    pub fn at_rest(params: OscillatorParams) -> Self {
        let floor = PointMass {
            x: 0.0,
            y: params.floor_y,
            velocity: 0.0,
        };
        Self {
            top: floor,
            bottom: floor,
            spring_extension: 0.0,
            params,
        }
    }

    pub fn params(&self) -> &OscillatorParams {
        &self.params
    }

    fn is_zero(&self, value: f64) -> bool {
        value.abs() <= self.params.tolerance
    }

    /// Accelerations of the top and bottom masses in the current state
    pub fn accelerations(&self) -> (f64, f64) {
        let p = &self.params;
        let spring = p.stiffness * self.spring_extension;
        let damper = p.damping * (self.top.velocity - self.bottom.velocity);
        (
            -(p.gravity + spring + damper),
            -(p.gravity - spring - damper),
        )
    }

    fn motion(&self, dt: f64) -> Motion {
        let (top_accel, bottom_accel) = self.accelerations();
        let advance = |m: &PointMass, a: f64| m.y + m.velocity * dt + 0.5 * a * dt * dt;
        Motion {
            top_accel,
            bottom_accel,
            top_velocity: self.top.velocity + top_accel * dt,
            bottom_velocity: self.bottom.velocity + bottom_accel * dt,
            top_y: advance(&self.top, top_accel),
            bottom_y: advance(&self.bottom, bottom_accel),
        }
    }

    fn apply(&mut self, m: &Motion) {
        self.top.y = m.top_y;
        self.top.velocity = m.top_velocity;
        self.bottom.y = m.bottom_y;
        self.bottom.velocity = m.bottom_velocity;
        self.spring_extension = self.top.y - self.bottom.y;
    }

    /// Instant within `dt` at which velocity `v0` reaches zero, or `dt` if it does not
    fn zero_crossing(&self, v0: f64, v1: f64, accel: f64, dt: f64) -> f64 {
        if !self.is_zero(v1) && v0 * v1 < 0.0 && !self.is_zero(accel) {
            (-v0 / accel).clamp(0.0, dt)
        } else {
            dt
        }
    }

    /// Time for the bottom mass to reach the floor, clamped to `[0, dt]`
    fn floor_contact(&self, accel: f64, dt: f64) -> f64 {
        let p = &self.params;
        let height = (self.bottom.y - p.floor_y).max(0.0);
        let v0 = self.bottom.velocity;

        let t = if self.is_zero(v0) {
            if self.is_zero(accel) {
                dt
            } else {
                (2.0 * height / -accel).max(0.0).sqrt()
            }
        } else if self.is_zero(accel) {
            -height / v0
        } else {
            // height + v0 t + a t^2 / 2 = 0
            let disc = v0 * v0 - 2.0 * accel * height;
            if disc < 0.0 {
                dt
            } else {
                let root = disc.sqrt();
                let mut roots = [(-v0 - root) / accel, (-v0 + root) / accel];
                roots.sort_by(f64::total_cmp);
                // A root at zero is the contact already in progress; prefer the next one.
                roots
                    .iter()
                    .copied()
                    .find(|&t| t > p.min_interval)
                    .or_else(|| roots.iter().copied().find(|&t| t >= 0.0))
                    .unwrap_or(dt)
            }
        };

        if t.is_finite() {
            t.clamp(0.0, dt)
        } else {
            dt
        }
    }

    /// Commit an interval without slicing, keeping the bottom mass above the floor
    fn commit_clamped(&mut self, dt: f64) {
        let m = self.motion(dt);
        self.apply(&m);
        if self.bottom.y < self.params.floor_y {
            self.bottom.y = self.params.floor_y;
            self.bottom.velocity = self.bottom.velocity.abs();
            self.spring_extension = self.top.y - self.bottom.y;
        }
    }

    /// Advance the oscillator by `dt` seconds
    pub fn integrate(&mut self, dt: f64) -> StepReport {
        let mut report = StepReport::default();
        if !(dt > 0.0 && dt.is_finite()) {
            return report;
        }

        let mut pending = vec![dt];
        while let Some(interval) = pending.pop() {
            report.slices += 1;

            if report.slices > self.params.max_slices || interval <= self.params.min_interval {
                self.commit_clamped(interval);
                continue;
            }

            let m = self.motion(interval);

            let top_cross =
                self.zero_crossing(self.top.velocity, m.top_velocity, m.top_accel, interval);
            let bottom_cross = self.zero_crossing(
                self.bottom.velocity,
                m.bottom_velocity,
                m.bottom_accel,
                interval,
            );
            let first = top_cross.min(bottom_cross);
            let second = top_cross.max(bottom_cross);
            if first < interval {
                // Stack order: the earliest slice is processed next.
                for slice in [interval - second, second - first, first] {
                    if slice > 0.0 {
                        pending.push(slice);
                    }
                }
                continue;
            }

            if m.bottom_y < self.params.floor_y {
                report.collisions += 1;
                let contact = self.floor_contact(m.bottom_accel, interval);

                if contact <= self.params.min_interval {
                    // Already touching: the floor holds the bottom mass while the top moves on.
                    let bottom_velocity = self.bottom.velocity.abs();
                    self.top.y = m.top_y;
                    self.top.velocity = m.top_velocity;
                    self.bottom.y = self.params.floor_y;
                    self.bottom.velocity = bottom_velocity;
                    self.spring_extension = self.top.y - self.bottom.y;
                    continue;
                }

                let at_contact = self.motion(contact);
                self.apply(&at_contact);
                self.bottom.y = self.params.floor_y;
                self.bottom.velocity = -self.bottom.velocity;
                self.spring_extension = self.top.y - self.bottom.y;

                let rest = interval - contact;
                if rest > 0.0 {
                    pending.push(rest);
                }
                continue;
            }

            self.apply(&m);
        }

        if report.slices > self.params.max_slices {
            log::warn!(
                "Integration of {:.3e}s hit the {}-slice budget",
                dt,
                self.params.max_slices
            );
        }
        report
    }

    /// Bottom mass on the floor and both masses nearly still
    pub fn is_resting(&self) -> bool {
        let tol = self.params.rest_tolerance;
        (self.bottom.y - self.params.floor_y).abs() <= self.params.tolerance
            && self.top.velocity.abs() <= tol
            && self.bottom.velocity.abs() <= tol
    }

    /// Throw the sprite again by kicking the top mass
    pub fn relaunch(&mut self) {
        self.top.velocity = self.params.launch_velocity;
        self.bottom.velocity = 0.0;
    }

    /// Spread the horizontal edges so the quad keeps roughly constant area
    pub fn apply_squish(&mut self) {
        let size = self.params.size;
        let span = (size - self.spring_extension).max(size * 1e-3);
        let squish = size * size / span - size;
        self.bottom.x = squish * 0.5;
        self.top.x = -squish * 0.5;
    }

    /// Per-instance offsets for the sprite's top and bottom edges
    pub fn instance(&self) -> GeomInstance {
        GeomInstance {
            top: [self.top.x as f32, self.top.y as f32],
            bottom: [self.bottom.x as f32, self.bottom.y as f32],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oscillator() -> Oscillator {
        Oscillator::at_rest(OscillatorParams::default())
    }

    #[test]
    fn test_floor_crossing_bounces() {
        let mut osc = oscillator();
        let floor = osc.params().floor_y;
        osc.bottom.y = floor + 0.001;
        osc.top.y = floor + 0.001;
        osc.bottom.velocity = -1.0;
        osc.top.velocity = -1.0;
        osc.spring_extension = 0.0;

        let report = osc.integrate(0.01);

        assert!(report.collisions >= 1);
        assert!(osc.bottom.y >= floor);
        assert!(osc.bottom.velocity > 0.0);
    }

    #[test]
    fn test_free_fall_matches_closed_form() {
        let mut osc = oscillator();
        osc.top.y = 1.0;
        osc.bottom.y = 1.0;
        osc.integrate(0.1);

        let expected = 1.0 - 0.5 * 9.81 * 0.01;
        assert!((osc.bottom.y - expected).abs() < 1e-9);
        assert!((osc.top.y - expected).abs() < 1e-9);
        assert!((osc.bottom.velocity + 0.981).abs() < 1e-9);
    }

    #[test]
    fn test_zero_crossing_splits_interval() {
        let mut osc = oscillator();
        osc.top.y = 2.0;
        osc.bottom.y = 2.0;
        osc.top.velocity = 0.5;
        osc.bottom.velocity = 0.5;

        let report = osc.integrate(0.2);

        // Both masses peak at t = 0.5 / g and the slice boundary lands there.
        assert!(report.slices >= 2);
        assert_eq!(report.collisions, 0);
        let t = 0.2;
        let expected_y = 2.0 + 0.5 * t - 0.5 * 9.81 * t * t;
        assert!((osc.top.y - expected_y).abs() < 1e-9);
        assert!(osc.top.velocity < 0.0);
    }

    #[test]
    fn test_never_tunnels_through_floor() {
        let mut osc = oscillator();
        osc.relaunch();
        let floor = osc.params().floor_y;
        for _ in 0..5000 {
            osc.integrate(1.0 / 60_000.0);
            assert!(osc.bottom.y >= floor);
        }
    }

    #[test]
    fn test_terminates_under_adversarial_input() {
        let params = OscillatorParams {
            stiffness: 1e9,
            ..OscillatorParams::default()
        };
        let mut osc = Oscillator::at_rest(params);
        osc.top.velocity = -1e4;
        let report = osc.integrate(1e3);
        // Every item under budget pushes at most three more.
        assert!(report.slices <= 3 * osc.params().max_slices + 1);
    }

    #[test]
    fn test_huge_interval_returns() {
        let mut osc = oscillator();
        let report = osc.integrate(100.0);
        assert!(report.slices >= 1);
        assert_eq!(osc.bottom.y, osc.params().floor_y);
    }

    #[test]
    fn test_resting_contact_keeps_bottom_on_floor() {
        let mut osc = oscillator();
        let report = osc.integrate(1e-4);
        assert!(report.collisions >= 1);
        assert_eq!(osc.bottom.y, osc.params().floor_y);
        assert!(osc.top.y < osc.params().floor_y);
        assert!(osc.spring_extension < 0.0);
    }

    #[test]
    fn test_non_positive_dt_is_noop() {
        let mut osc = oscillator();
        let before = osc.clone();
        assert_eq!(osc.integrate(0.0), StepReport::default());
        assert_eq!(osc.integrate(-1.0), StepReport::default());
        assert_eq!(osc.integrate(f64::NAN), StepReport::default());
        assert_eq!(osc.top, before.top);
    }

    #[test]
    fn test_relaunch_from_rest() {
        let mut osc = oscillator();
        assert!(osc.is_resting());
        osc.relaunch();
        assert_eq!(osc.top.velocity, -12.0);
        assert_eq!(osc.bottom.velocity, 0.0);
        assert!(!osc.is_resting());
    }

    #[test]
    fn test_squish_widens_when_compressed() {
        let mut osc = oscillator();
        osc.top.y = osc.bottom.y - 0.1;
        osc.spring_extension = -0.1;
        osc.apply_squish();
        assert!(osc.bottom.x < 0.0);
        assert!((osc.bottom.x + osc.top.x).abs() < 1e-12);

        let expected = 0.25 / 0.6 - 0.5;
        assert!((osc.bottom.x - expected / 2.0).abs() < 1e-12);

        let inst = osc.instance();
        assert_eq!(inst.bottom[0], osc.bottom.x as f32);
        assert_eq!(inst.top[1], osc.top.y as f32);
    }
}
