//! Oscillator tuning

use serde::Deserialize;

/// Physical constants and numeric tolerances of the oscillator
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OscillatorParams {
    /// Gravitational acceleration, positive downwards
    pub gravity: f64,
    /// Spring constant `k`
    pub stiffness: f64,
    /// Damper coefficient `c`
    pub damping: f64,
    pub floor_y: f64,
    /// Side of the sprite quad, used for squash-and-stretch
    pub size: f64,
    /// Velocity given to the top mass when the sprite comes to rest
    pub launch_velocity: f64,
    /// Threshold below which velocities, accelerations and heights count as zero
    pub tolerance: f64,
    /// Looser threshold for deciding the sprite has settled
    pub rest_tolerance: f64,
    /// Intervals this short are committed without further slicing
    pub min_interval: f64,
    /// Work items one `integrate` call may process before committing directly
    pub max_slices: u32,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            stiffness: 5000.0,
            damping: 3.0,
            floor_y: -0.75,
            size: 0.5,
            launch_velocity: -12.0,
            tolerance: 1e-5,
            rest_tolerance: 0.01,
            min_interval: 1e-9,
            max_slices: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let params: OscillatorParams = toml::from_str("stiffness = 800.0\nfloor_y = -0.5").unwrap();
        assert_eq!(params.stiffness, 800.0);
        assert_eq!(params.floor_y, -0.5);
        assert_eq!(params.gravity, 9.81);
        assert_eq!(params.max_slices, 4096);
    }
}
