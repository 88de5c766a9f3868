//! Simulation configuration and named presets
//!
//! The core only reads the configuration. Any change goes through
//! `Simulation::configure`, which resets the simulation.

use serde::{Deserialize, Serialize};

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH, SEED_MARGIN};
use crate::error::{SimError, SimResult};

/// Default RNG seed when none is supplied
pub const DEFAULT_SEED: u64 = 12345;

/// Named warhead presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    #[default]
    Custom,
    NorthKorea,
    Usa,
    China,
    Russia,
    Iran,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Custom,
        Preset::NorthKorea,
        Preset::Usa,
        Preset::China,
        Preset::Russia,
        Preset::Iran,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Custom => "custom",
            Preset::NorthKorea => "north-korea",
            Preset::Usa => "usa",
            Preset::China => "china",
            Preset::Russia => "russia",
            Preset::Iran => "iran",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "custom" => Some(Preset::Custom),
            "north-korea" | "northkorea" | "dprk" => Some(Preset::NorthKorea),
            "usa" | "us" => Some(Preset::Usa),
            "china" => Some(Preset::China),
            "russia" => Some(Preset::Russia),
            "iran" => Some(Preset::Iran),
            _ => None,
        }
    }

    /// Like `from_str`, but unknown names are an error
    pub fn parse(s: &str) -> SimResult<Self> {
        Self::from_str(s).ok_or_else(|| SimError::UnknownPreset(s.to_string()))
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Preset::Custom => "Custom settings",
            Preset::NorthKorea => "North Korean device",
            Preset::Usa => "US W88 warhead",
            Preset::China => "Chinese DF-41 warhead",
            Preset::Russia => "Russian Sarmat warhead",
            Preset::Iran => "Iranian development scenario",
        }
    }

    /// One-line description shown next to the preset
    pub fn info(&self) -> &'static str {
        match self {
            Preset::Custom => "User-defined settings",
            Preset::NorthKorea => "Estimated 20-30kt, mixed plutonium/uranium design",
            Preset::Usa => "475kt, two-stage thermonuclear",
            Preset::China => "200-300kt, MIRV warhead",
            Preset::Russia => "750kt, latest ICBM warhead",
            Preset::Iran => "Estimated 20kt, enriched uranium (hypothetical)",
        }
    }

    /// (initial fissile, initial neutrons, criticality multiplier)
    pub fn parameters(&self) -> (usize, usize, f32) {
        match self {
            Preset::Custom => (500, 5, 2.0),
            Preset::NorthKorea => (800, 8, 3.0),
            Preset::Usa => (2000, 25, 8.0),
            Preset::China => (1500, 20, 6.0),
            Preset::Russia => (2500, 30, 10.0),
            Preset::Iran => (700, 7, 3.0),
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preset these values were taken from
    pub preset: Preset,

    // === Population ===
    /// Number of fissile nuclei seeded on reset (aggregated into visual particles)
    pub initial_fissile: usize,
    /// Number of free neutrons seeded on start (capped at 20)
    pub initial_neutrons: usize,
    /// Visual particle budget; initial nuclei use at most half of it
    pub max_visual_particles: usize,
    /// Population above which the merge pass runs
    pub merge_threshold: usize,

    // === Reaction ===
    /// Reaction aggressiveness (>= 0): probability, yield and spawn speed
    pub criticality: f32,

    // === Effects ===
    /// Effect duration in seconds; also sets energy particle lifetimes
    pub effect_duration_scale: f32,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,

    /// RNG seed for reproducible runs
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_preset(Preset::Custom)
    }
}

impl Config {
    /// Create a configuration from a preset (other fields at their defaults)
    pub fn from_preset(preset: Preset) -> Self {
        let (initial_fissile, initial_neutrons, criticality) = preset.parameters();
        Self {
            preset,
            initial_fissile,
            initial_neutrons,
            max_visual_particles: 2000,
            merge_threshold: 1000,
            criticality,
            effect_duration_scale: 0.5,
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            seed: DEFAULT_SEED,
        }
    }

    /// Apply a preset's population and criticality values
    pub fn apply_preset(&mut self, preset: Preset) {
        let (initial_fissile, initial_neutrons, criticality) = preset.parameters();
        self.preset = preset;
        self.initial_fissile = initial_fissile;
        self.initial_neutrons = initial_neutrons;
        self.criticality = criticality;
    }

    /// Effect duration in milliseconds
    pub fn effect_duration_ms(&self) -> f64 {
        self.effect_duration_scale as f64 * 1000.0
    }

    /// Check every field against its documented range
    pub fn validate(&self) -> SimResult<()> {
        if !self.criticality.is_finite() || self.criticality < 0.0 {
            return Err(invalid("criticality", self.criticality, "must be finite and >= 0"));
        }
        if !self.effect_duration_scale.is_finite() || self.effect_duration_scale < 0.0 {
            return Err(invalid(
                "effect_duration_scale",
                self.effect_duration_scale,
                "must be finite and >= 0",
            ));
        }
        if self.max_visual_particles < 2 {
            return Err(invalid("max_visual_particles", self.max_visual_particles, "must be >= 2"));
        }
        if self.merge_threshold == 0 {
            return Err(invalid("merge_threshold", self.merge_threshold, "must be >= 1"));
        }
        let min_extent = SEED_MARGIN * 2.0;
        if !self.arena_width.is_finite() || self.arena_width <= min_extent {
            return Err(invalid("arena_width", self.arena_width, "must exceed twice the seed margin"));
        }
        if !self.arena_height.is_finite() || self.arena_height <= min_extent {
            return Err(invalid("arena_height", self.arena_height, "must exceed twice the seed margin"));
        }
        Ok(())
    }

    /// Clamp out-of-range fields instead of rejecting them, logging each clamp
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::from_preset(self.preset);

        if !self.criticality.is_finite() || self.criticality < 0.0 {
            log::warn!("criticality {} out of range, clamped to 0", self.criticality);
            self.criticality = 0.0;
        }
        if !self.effect_duration_scale.is_finite() || self.effect_duration_scale < 0.0 {
            log::warn!(
                "effect_duration_scale {} out of range, clamped to 0",
                self.effect_duration_scale
            );
            self.effect_duration_scale = 0.0;
        }
        if self.max_visual_particles < 2 {
            log::warn!("max_visual_particles {} raised to 2", self.max_visual_particles);
            self.max_visual_particles = 2;
        }
        if self.merge_threshold == 0 {
            log::warn!("merge_threshold 0 raised to 1");
            self.merge_threshold = 1;
        }
        let min_extent = SEED_MARGIN * 2.0;
        if !self.arena_width.is_finite() || self.arena_width <= min_extent {
            log::warn!(
                "arena_width {} out of range, reset to {}",
                self.arena_width,
                defaults.arena_width
            );
            self.arena_width = defaults.arena_width;
        }
        if !self.arena_height.is_finite() || self.arena_height <= min_extent {
            log::warn!(
                "arena_height {} out of range, reset to {}",
                self.arena_height,
                defaults.arena_height
            );
            self.arena_height = defaults.arena_height;
        }
        self
    }

    /// Parse and validate a JSON configuration (missing fields take defaults)
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn invalid(field: &'static str, value: impl ToString, reason: &'static str) -> SimError {
    SimError::InvalidConfig {
        field,
        value: value.to_string(),
        reason,
    }
}
