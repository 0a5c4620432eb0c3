//! Smile Physics - Bouncing sprite simulation
//!
//! Two point masses joined by a damped spring fall onto a floor and bounce:
//! - `Oscillator` - the integrator, sliced at velocity zero-crossings and floor contacts
//! - `Cadence` - warm-up gate and fixed sub-stepping of frame deltas
//! - `Simulation` - per-frame driver with relaunch and squash-and-stretch

mod cadence;
mod oscillator;
mod params;
mod simulation;

pub use cadence::{Cadence, CadenceParams};
pub use oscillator::{Oscillator, PointMass, StepReport};
pub use params::OscillatorParams;
pub use simulation::{Simulation, SimulationEvent};
