//! Chain Reaction - a 2D nuclear chain-reaction particle simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (particles, reactions, merging, metrics, effects)
//! - `simulation`: Controller driven by an external shell (configure/start/pause/tick)
//! - `config`: Simulation configuration and named presets
//! - `render`: GPU-ready snapshot of the visual state
//! - `error`: Crate error type

pub mod config;
pub mod error;
pub mod render;
pub mod sim;
pub mod simulation;

pub use config::{Config, Preset};
pub use error::{SimError, SimResult};
pub use simulation::{FramePacer, Simulation};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Minimum interval between ticks (50 updates per second)
    pub const FRAME_MS: f64 = 20.0;
    /// Maximum ticks run for one wall-clock frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Default arena dimensions
    pub const ARENA_WIDTH: f32 = 500.0;
    pub const ARENA_HEIGHT: f32 = 350.0;
    /// Initial nuclei are kept this far from the arena edges
    pub const SEED_MARGIN: f32 = 30.0;
    /// Initial nuclei are scattered within this fraction of the short arena side
    pub const SEED_RADIUS_FRACTION: f32 = 0.35;
    /// Free neutrons are seeded within this square around the arena centre
    pub const NEUTRON_SEED_SPREAD: f32 = 80.0;
    /// Hard cap on free neutrons seeded by `start()`
    pub const MAX_INITIAL_NEUTRONS: usize = 20;

    /// Per-frame velocity damping (shallow so neutrons travel far)
    pub const VELOCITY_DAMPING: f32 = 0.998;
    /// Velocity factor applied on wall reflection
    pub const WALL_RESTITUTION: f32 = -0.9;
    /// Chance an energy particle sparks on a wall hit (per axis)
    pub const SPARK_CHANCE: f64 = 0.3;
    /// Sparks spawned per wall hit
    pub const SPARKS_PER_HIT: usize = 2;

    /// Particles with life at or below this are removed
    pub const LIFE_EPSILON: f32 = 0.05;
    /// Energy particle life decay per frame
    pub const ENERGY_LIFE_DECAY: f32 = 0.003;
    /// Energy particle shrink factor per frame
    pub const ENERGY_SHRINK: f32 = 0.999;
    /// Per-frame chance an energetic particle bursts into an explosion wave
    pub const ENERGY_BURST_CHANCE: f64 = 0.005;
    /// Minimum aggregate count for an energy particle to burst
    pub const ENERGY_BURST_MIN_COUNT: u64 = 100;

    /// Trail length and fade per frame
    pub const TRAIL_LENGTH: usize = 8;
    pub const TRAIL_FADE: f32 = 0.15;

    /// Fission tuning
    pub const BASE_FISSION_PROBABILITY: f64 = 0.3;
    pub const MAX_FISSION_PROBABILITY: f64 = 0.98;
    pub const ENERGY_PER_FISSION: f64 = 0.0025;
    pub const MAX_VISUAL_NEUTRONS: u64 = 12;
    pub const NEUTRONS_PER_VISUAL: u64 = 50;
    pub const MAX_NEUTRON_PARTICLE_COUNT: u64 = 10;
    pub const MAX_VISUAL_ENERGY: u64 = 10;
    pub const FISSIONS_PER_VISUAL_ENERGY: u64 = 20;
    pub const MAX_EXPLOSION_INTENSITY: f32 = 3.0;

    /// Population control
    pub const MAX_MERGE_GROUP: usize = 6;
    pub const MERGE_DISTANCE_FACTOR: f32 = 1.5;

    /// Stats and damage zones are republished every N frames
    pub const METRICS_INTERVAL: u64 = 3;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
