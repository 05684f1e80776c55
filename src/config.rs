//! Scenario and tuning configuration.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_dt_ms() -> f64 {
    16.0
}

fn default_slow_interval_ms() -> f64 {
    50.0
}

fn default_speed() -> f32 {
    3.0
}

fn default_turn_rate() -> f32 {
    8.0
}

fn default_arrival_threshold() -> f32 {
    0.25
}

fn default_angle_tolerance() -> f32 {
    0.15
}

fn default_max_expansions() -> usize {
    2048
}

fn default_roam_radius() -> i32 {
    8
}

fn default_roam_weight() -> u32 {
    3
}

fn default_idle_weight() -> u32 {
    1
}

fn default_idle_ms() -> f64 {
    1200.0
}

fn default_stall_timeout_ms() -> f64 {
    8000.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub name: String,
    pub seed: u64,
    #[serde(default)]
    pub tick: TickConfig,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub pathfinder: PathfinderConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickConfig {
    /// Fast-tick duration driving every updateable behaviour.
    #[serde(default = "default_dt_ms")]
    pub dt_ms: f64,
    /// Target cadence for the coarse `update50` pass.
    #[serde(default = "default_slow_interval_ms")]
    pub slow_interval_ms: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            dt_ms: default_dt_ms(),
            slow_interval_ms: default_slow_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Walk speed, units per second.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Yaw rate while turning toward a target, radians per second.
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f32,
    /// Arrival distance; compared squared against squared distance.
    #[serde(default = "default_arrival_threshold")]
    pub arrival_threshold: f32,
    /// Heading alignment tolerance, radians. Exact equality would
    /// oscillate.
    #[serde(default = "default_angle_tolerance")]
    pub angle_tolerance: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            turn_rate: default_turn_rate(),
            arrival_threshold: default_arrival_threshold(),
            angle_tolerance: default_angle_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PathfinderConfig {
    /// Search-radius cap: a route is abandoned after this many node
    /// expansions.
    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            max_expansions: default_max_expansions(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AiConfig {
    /// Maximum roam destination offset, in cells, per axis.
    #[serde(default = "default_roam_radius")]
    pub roam_radius: i32,
    #[serde(default = "default_roam_weight")]
    pub roam_weight: u32,
    #[serde(default = "default_idle_weight")]
    pub idle_weight: u32,
    /// Idle pause length when Think picks idling.
    #[serde(default = "default_idle_ms")]
    pub idle_ms: f64,
    /// Actions older than this are swept by the slow-tick sanity pass.
    /// Zero disables the sweep.
    #[serde(default = "default_stall_timeout_ms")]
    pub stall_timeout_ms: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            roam_radius: default_roam_radius(),
            roam_weight: default_roam_weight(),
            idle_weight: default_idle_weight(),
            idle_ms: default_idle_ms(),
            stall_timeout_ms: default_stall_timeout_ms(),
        }
    }
}

impl SimConfig {
    /// Built-in default scenario used by the runner and the tests.
    pub fn sandbox() -> Self {
        Self {
            name: "sandbox".to_string(),
            seed: 7,
            tick: TickConfig::default(),
            movement: MovementConfig::default(),
            pathfinder: PathfinderConfig::default(),
            ai: AiConfig::default(),
        }
    }

    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        Ok(config)
    }

    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("serializing scenario")?;
        fs::write(path, yaml).with_context(|| format!("writing scenario {}", path.display()))?;
        Ok(())
    }
}
