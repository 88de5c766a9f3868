//! Deterministic simulation module
//!
//! All reaction logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, on a simulation clock
//! - Seeded RNG only
//! - Stable iteration order (list order)
//! - No rendering or platform dependencies

pub mod effects;
pub mod events;
pub mod integrate;
pub mod merge;
pub mod metrics;
pub mod particle;
pub mod reaction;
pub mod state;
pub mod tick;

pub use effects::{ActiveEffects, EffectKind, EffectRequest, trigger_explosion_effect};
pub use events::{EventQueue, Observer, Severity, SimEvent, StatsSnapshot, dispatch};
pub use integrate::integrate;
pub use merge::merge_nearby;
pub use metrics::{DamageZones, format_count};
pub use particle::{
    ExplosionWave, FalloutParticle, KindTraits, Particle, ParticleKind, TrailPoint, derived_size,
};
pub use reaction::{classify, fission_probability, resolve_collisions, status};
pub use state::{SimPhase, SimulationState, SimulationStats};
pub use tick::tick;
