//! Warm-up gate and fixed sub-stepping for frame deltas

use serde::Deserialize;

/// How frame deltas are fed to the integrator
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CadenceParams {
    /// Seconds of accumulated frame time before the first integration
    pub warmup: f64,
    /// Equal sub-steps each frame delta is split into once warm
    pub substeps: u32,
}

impl Default for CadenceParams {
    fn default() -> Self {
        Self {
            warmup: 1.0,
            substeps: 1000,
        }
    }
}

/// Accumulates frame time and decides how each frame is integrated
#[derive(Clone, Debug, Default)]
pub struct Cadence {
    pub params: CadenceParams,
    /// Accumulated frame time, capped at the warm-up threshold
    elapsed: f64,
}

impl Cadence {
    pub fn new(params: CadenceParams) -> Self {
        Self {
            params,
            elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_warm(&self) -> bool {
        self.elapsed >= self.params.warmup
    }

    /// Account for a frame of `dt` seconds.
    ///
    /// Returns the number of sub-steps and their length once the warm-up has
    /// elapsed, or `None` while still warming up or when there is nothing to integrate.
    pub fn advance(&mut self, dt: f64) -> Option<(u32, f64)> {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.params.warmup.max(0.0));
        }
        if !self.is_warm() || !(dt > 0.0 && dt.is_finite()) {
            return None;
        }
        let substeps = self.params.substeps.max(1);
        Some((substeps, dt / substeps as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_defaults() {
        let cadence = Cadence::default();
        assert_eq!(cadence.params.warmup, 1.0);
        assert_eq!(cadence.params.substeps, 1000);
        assert_eq!(cadence.elapsed(), 0.0);
    }

    #[test]
    fn test_warmup_gate() {
        let mut cadence = Cadence::new(CadenceParams::default());
        for _ in 0..3 {
            assert!(cadence.advance(0.25).is_none());
        }
        let (steps, step) = cadence.advance(0.25).unwrap();
        assert_eq!(steps, 1000);
        assert!((step - 0.25e-3).abs() < 1e-15);
    }

    #[test]
    fn test_stays_warm_and_uses_current_delta() {
        let mut cadence = Cadence::new(CadenceParams {
            warmup: 0.5,
            substeps: 10,
        });
        assert!(cadence.advance(0.6).is_some());
        let (steps, step) = cadence.advance(0.02).unwrap();
        assert_eq!(steps, 10);
        assert!((step - 0.002).abs() < 1e-15);
        assert_eq!(cadence.elapsed(), 0.5);
    }

    #[test]
    fn test_zero_delta_never_integrates() {
        let mut cadence = Cadence::new(CadenceParams::default());
        assert!(cadence.advance(0.0).is_none());
        cadence.advance(2.0);
        assert!(cadence.is_warm());
        assert!(cadence.advance(0.0).is_none());
    }
}
