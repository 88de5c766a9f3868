//! Effect dispatcher
//!
//! Turns a scalar effect intensity into debounced requests for the shell.
//! Every request carries an absolute deadline on the simulation clock; the
//! shell compares deadlines instead of registering timers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::events::SimEvent;
use super::particle::FalloutParticle;
use super::state::{SimulationState, SimulationStats};

/// Intensity thresholds
pub const SHAKE_THRESHOLD: f32 = 0.5;
pub const GLOW_THRESHOLD: f32 = 0.3;
pub const HEAT_THRESHOLD: f32 = 0.2;
pub const FALLOUT_THRESHOLD: f32 = 0.8;

/// Duration ceilings (ms)
pub const MAX_SHAKE_MS: f64 = 800.0;
pub const MAX_GLOW_MS: f64 = 500.0;

/// Fallout specks released when an episode starts
pub const FALLOUT_BATCH: usize = 50;
/// Per-frame chance of another speck while an episode is active
pub const FALLOUT_TRICKLE_CHANCE: f64 = 0.3;

const HEAT_PER_INTENSITY: f32 = 20.0;
const MAX_HEAT_LEVEL: f32 = 100.0;
const HEAT_DECAY: f32 = 0.995;
const INTENSITY_DECAY: f32 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Shake,
    Glow,
    Heat,
    Fallout,
}

/// A request for the shell to render an effect until `until_ms`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectRequest {
    pub kind: EffectKind,
    pub intensity: f32,
    pub duration_ms: f64,
    /// Deadline on the simulation clock (`SimulationState::time_ms`), not
    /// wall time. Compare it against the state's clock, never a system timer.
    pub until_ms: f64,
}

/// Effects that must not stack, with their deadlines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub heat_until_ms: Option<f64>,
    pub fallout_until_ms: Option<f64>,
}

impl ActiveEffects {
    #[inline]
    pub fn heat_active(&self) -> bool {
        self.heat_until_ms.is_some()
    }

    #[inline]
    pub fn fallout_active(&self) -> bool {
        self.fallout_until_ms.is_some()
    }

    /// Clear effects whose deadline has passed
    pub fn expire(&mut self, now_ms: f64) {
        if self.heat_until_ms.is_some_and(|until| now_ms >= until) {
            self.heat_until_ms = None;
        }
        if self.fallout_until_ms.is_some_and(|until| now_ms >= until) {
            self.fallout_until_ms = None;
            log::debug!("Fallout episode ended at {:.0}ms", now_ms);
        }
    }
}

/// Decide which effects an intensity triggers, marking non-stacking ones active
pub fn plan(
    active: &mut ActiveEffects,
    intensity: f32,
    duration_ms: f64,
    now_ms: f64,
) -> Vec<EffectRequest> {
    let mut requests = Vec::new();
    let request = |kind, duration_ms: f64| EffectRequest {
        kind,
        intensity,
        duration_ms,
        until_ms: now_ms + duration_ms,
    };

    if intensity > SHAKE_THRESHOLD {
        requests.push(request(EffectKind::Shake, duration_ms.min(MAX_SHAKE_MS)));
    }
    if intensity > GLOW_THRESHOLD {
        requests.push(request(EffectKind::Glow, (duration_ms / 2.0).min(MAX_GLOW_MS)));
    }
    if intensity > HEAT_THRESHOLD && !active.heat_active() {
        let heat = request(EffectKind::Heat, duration_ms);
        active.heat_until_ms = Some(heat.until_ms);
        requests.push(heat);
    }
    if intensity > FALLOUT_THRESHOLD && !active.fallout_active() {
        let fallout = request(EffectKind::Fallout, duration_ms);
        active.fallout_until_ms = Some(fallout.until_ms);
        requests.push(fallout);
    }

    requests
}

/// Raise the gauges, queue effect requests and start fallout if requested
pub fn trigger_explosion_effect(state: &mut SimulationState, intensity: f32, duration_ms: f64) {
    state.stats.explosion_intensity = state.stats.explosion_intensity.max(intensity);
    state.stats.heat_level =
        (state.stats.heat_level + intensity * HEAT_PER_INTENSITY).min(MAX_HEAT_LEVEL);

    let requests = plan(&mut state.effects, intensity, duration_ms, state.time_ms);
    for request in requests {
        if request.kind == EffectKind::Fallout {
            start_fallout(state);
        }
        state.events.push(SimEvent::Effect(request));
    }
}

fn start_fallout(state: &mut SimulationState) {
    let width = state.arena.x;
    for _ in 0..FALLOUT_BATCH {
        let speck = FalloutParticle::spawn(&mut state.rng, width);
        state.fallout.push(speck);
    }
    log::debug!("Fallout episode started at {:.0}ms", state.time_ms);
}

/// Advance fallout specks; trickle new ones while an episode is active
pub fn update_fallout(state: &mut SimulationState) {
    let (width, height) = (state.arena.x, state.arena.y);
    state.fallout.retain_mut(|speck| speck.update(width, height));

    if state.effects.fallout_active() && state.rng.random_bool(FALLOUT_TRICKLE_CHANCE) {
        let speck = FalloutParticle::spawn(&mut state.rng, width);
        state.fallout.push(speck);
    }
}

/// Per-frame gauge decay
pub fn decay_gauges(stats: &mut SimulationStats) {
    stats.heat_level *= HEAT_DECAY;
    stats.explosion_intensity *= INTENSITY_DECAY;
}
