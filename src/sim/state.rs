//! Simulation state and statistics
//!
//! Everything a tick reads or mutates lives in `SimulationState`. The
//! controller owns it exclusively; the shell only sees drained events and
//! read-only snapshots.

use std::num::NonZeroU64;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::ActiveEffects;
use super::events::{EventQueue, SimEvent, StatsSnapshot};
use super::metrics::{self, DamageZones};
use super::particle::{ExplosionWave, FalloutParticle, Particle, ParticleKind};
use crate::config::Config;
use crate::consts::*;
use crate::polar_to_cartesian;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    /// Nuclei seeded, waiting for `start()`
    Idle,
    Running,
    Paused,
}

/// Cumulative statistics, zeroed on every reset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub fissions: u64,
    /// Sum of counts over live neutron particles
    pub active_neutrons: u64,
    /// Neutrons released by fission since reset
    pub total_neutrons: u64,
    /// Accumulated yield (kt TNT)
    pub energy: f64,
    pub start_time_ms: f64,
    pub temperature: f64,
    pub reaction_rate: f64,
    /// Resolved fission events
    pub generation: u64,
    pub last_reaction_ms: f64,
    /// Heat gauge, 0-100
    pub heat_level: f32,
    /// Peak-hold effect intensity, decays each frame
    pub explosion_intensity: f32,
}

impl SimulationStats {
    pub fn new(now_ms: f64) -> Self {
        Self {
            start_time_ms: now_ms,
            last_reaction_ms: now_ms,
            ..Default::default()
        }
    }

    pub fn snapshot(&self, now_ms: f64) -> StatsSnapshot {
        StatsSnapshot {
            fissions: self.fissions,
            active_neutrons: self.active_neutrons,
            total_neutrons: self.total_neutrons,
            energy: self.energy,
            reaction_rate: self.reaction_rate,
            temperature: self.temperature,
            generation: self.generation,
            heat_level: self.heat_level,
            energy_percent: metrics::energy_percent(self.energy),
            elapsed_ms: now_ms - self.start_time_ms,
        }
    }
}

/// Complete simulation state (deterministic for a given seed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: SimPhase,
    /// Simulation clock (ms); advances by `FRAME_MS` per tick
    pub time_ms: f64,
    /// Ticks since reset
    pub frame: u64,
    /// Arena extent (width, height)
    pub arena: Vec2,
    pub particles: Vec<Particle>,
    pub waves: Vec<ExplosionWave>,
    pub fallout: Vec<FalloutParticle>,
    pub stats: SimulationStats,
    pub effects: ActiveEffects,
    /// Pending notifications for the shell
    #[serde(skip)]
    pub events: EventQueue,
    next_id: u32,
}

impl SimulationState {
    /// Fresh state with the initial fissile population seeded
    pub fn new(config: &Config) -> Self {
        let mut state = Self {
            seed: config.seed,
            rng: Pcg32::seed_from_u64(config.seed),
            phase: SimPhase::Idle,
            time_ms: 0.0,
            frame: 0,
            arena: Vec2::new(config.arena_width, config.arena_height),
            particles: Vec::new(),
            waves: Vec::new(),
            fallout: Vec::new(),
            stats: SimulationStats::new(0.0),
            effects: ActiveEffects::default(),
            events: EventQueue::default(),
            next_id: 1,
        };

        state.seed_fissile(config);
        state.publish_metrics();

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn center(&self) -> Vec2 {
        self.arena * 0.5
    }

    /// Scatter the configured nuclei around the arena centre.
    ///
    /// At most half the visual budget is used; each visual particle carries
    /// an equal share of the nuclei.
    fn seed_fissile(&mut self, config: &Config) {
        let visual = config
            .initial_fissile
            .min(config.max_visual_particles / 2);
        if visual == 0 {
            return;
        }
        let per_particle = config.initial_fissile.div_ceil(visual) as u64;
        let Some(count) = NonZeroU64::new(per_particle) else {
            return;
        };

        let center = self.center();
        let scatter = self.arena.x.min(self.arena.y) * SEED_RADIUS_FRACTION;
        let min = Vec2::splat(SEED_MARGIN);
        let max = self.arena - SEED_MARGIN;

        for _ in 0..visual {
            let angle = self.rng.random::<f32>() * std::f32::consts::TAU;
            let radius = self.rng.random::<f32>() * scatter;
            let pos = (center + polar_to_cartesian(radius, angle)).clamp(min, max);
            let glow = self.rng.random::<f32>() * std::f32::consts::TAU;
            let id = self.next_entity_id();
            self.particles.push(
                Particle::spawned(
                    id,
                    ParticleKind::Fissile,
                    pos,
                    Vec2::ZERO,
                    count,
                    1.0,
                    self.time_ms,
                )
                .with_glow_phase(glow),
            );
        }

        log::info!(
            "Seeded {} nuclei as {} particles (x{})",
            config.initial_fissile,
            visual,
            per_particle
        );
    }

    /// Release the initial free neutrons near the arena centre
    pub fn seed_neutrons(&mut self, config: &Config) {
        let neutrons = config.initial_neutrons.min(MAX_INITIAL_NEUTRONS);
        let speed_scale = config.criticality.max(0.0).sqrt();
        let center = self.center();

        for _ in 0..neutrons {
            let angle = self.rng.random::<f32>() * std::f32::consts::TAU;
            let speed = (3.0 + self.rng.random::<f32>() * 4.0) * speed_scale;
            let offset = Vec2::new(
                (self.rng.random::<f32>() - 0.5) * NEUTRON_SEED_SPREAD,
                (self.rng.random::<f32>() - 0.5) * NEUTRON_SEED_SPREAD,
            );
            let glow = self.rng.random::<f32>() * std::f32::consts::TAU;
            let id = self.next_entity_id();
            self.particles.push(
                Particle::spawned(
                    id,
                    ParticleKind::Neutron,
                    center + offset,
                    polar_to_cartesian(speed, angle),
                    NonZeroU64::MIN,
                    0.8,
                    self.time_ms,
                )
                .with_glow_phase(glow),
            );
        }

        log::info!("Released {} neutrons", neutrons);
    }

    /// Sum of `count` over particles of one kind
    pub fn aggregate_count(&self, kind: ParticleKind) -> u64 {
        self.particles
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.count)
            .sum()
    }

    /// Number of particle objects of one kind
    pub fn particle_count(&self, kind: ParticleKind) -> usize {
        self.particles.iter().filter(|p| p.kind == kind).count()
    }

    /// Recompute temperature and queue stats and damage zones
    pub fn publish_metrics(&mut self) {
        let zones = DamageZones::from_energy(self.stats.energy);
        self.stats.temperature = zones.center_temp_c;
        self.events
            .push(SimEvent::Stats(self.stats.snapshot(self.time_ms)));
        self.events.push(SimEvent::DamageZones(zones));
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }
}
