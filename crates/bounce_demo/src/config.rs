//! Demo configuration

use frame_scheduler::config::{Config, Deserialize, SchedulerConfig, Serialize};

/// Demo configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Frame driver settings
    pub scheduler: SchedulerConfig,

    /// Play field size
    pub display: DisplayConfig,

    /// Simulation settings
    pub simulation: SimulationConfig,
}

impl Config for DemoConfig {}

/// Play field size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width in pixels
    pub width: f64,

    /// Height in pixels
    pub height: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Frames to run; `0` runs until interrupted
    pub frames: u64,

    /// Box speed in pixels per 60 Hz frame
    pub speed: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frames: 300,
            speed: 4.0,
        }
    }
}
