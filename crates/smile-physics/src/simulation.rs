//! Per-frame simulation driver

use crate::cadence::{Cadence, CadenceParams};
use crate::oscillator::{Oscillator, StepReport};
use crate::params::OscillatorParams;
use smile_core::GeomInstance;

/// What one call to `Simulation::advance` did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationEvent {
    /// The frame was skipped because resources were just (re)loaded
    Suppressed,
    /// Frame time accumulated without integrating
    WarmingUp,
    /// The frame delta was integrated
    Integrated(StepReport),
    /// The sprite had settled and was thrown again
    Relaunched,
}

/// Oscillator plus the frame bookkeeping around it
#[derive(Clone, Debug)]
pub struct Simulation {
    pub oscillator: Oscillator,
    pub cadence: Cadence,
    /// Cleared to skip the next frame
    ready: bool,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(OscillatorParams::default(), CadenceParams::default())
    }
}

impl Simulation {
    /// Start at rest on the floor
    pub fn new(params: OscillatorParams, cadence: CadenceParams) -> Self {
        Self {
            oscillator: Oscillator::at_rest(params),
            cadence: Cadence::new(cadence),
            ready: true,
        }
    }

    /// Ignore the next `advance` call
    pub fn suppress_next_frame(&mut self) {
        self.ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Advance by one frame of `dt` seconds
    pub fn advance(&mut self, dt: f64) -> SimulationEvent {
        if !self.ready {
            self.ready = true;
            return SimulationEvent::Suppressed;
        }

        let Some((substeps, step)) = self.cadence.advance(dt) else {
            return SimulationEvent::WarmingUp;
        };
        let mut total = StepReport::default();
        for _ in 0..substeps {
            let report = self.oscillator.integrate(step);
            total.slices += report.slices;
            total.collisions += report.collisions;
        }

        if self.oscillator.is_resting() {
            self.oscillator.relaunch();
            log::debug!("Sprite settled, relaunching");
            return SimulationEvent::Relaunched;
        }

        self.oscillator.apply_squish();
        SimulationEvent::Integrated(total)
    }

    pub fn instance(&self) -> GeomInstance {
        self.oscillator.instance()
    }
}
