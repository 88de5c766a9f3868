//! Outputs from the core to the rendering/UI shell
//!
//! The core never calls into the shell while a tick is running. It queues
//! `SimEvent`s and the shell drains them, either directly or through an
//! `Observer`. The queue is bounded, so a shell that never drains it only
//! loses stale snapshots and the oldest effect requests.

use std::collections::VecDeque;
use std::mem::discriminant;

use serde::{Deserialize, Serialize};

use super::effects::EffectRequest;
use super::metrics::DamageZones;

/// Overall reaction state, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Nothing left to react
    Quiescent,
    /// Free neutrons or energy remain but the chain is winding down
    Stabilizing,
    Active,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Quiescent => "quiescent",
            Severity::Stabilizing => "stabilizing",
            Severity::Active => "active",
            Severity::Critical => "critical",
        }
    }
}

/// Published statistics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub fissions: u64,
    pub active_neutrons: u64,
    pub total_neutrons: u64,
    /// Accumulated yield (kt TNT)
    pub energy: f64,
    /// Fissions per second at the last reaction
    pub reaction_rate: f64,
    /// Centre temperature (°C)
    pub temperature: f64,
    /// Resolved fission events
    pub generation: u64,
    /// Heat gauge, 0-100
    pub heat_level: f32,
    /// Energy gauge, 0-100
    pub energy_percent: f64,
    /// Simulation time since start (ms)
    pub elapsed_ms: f64,
}

/// A queued notification for the shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Effect(EffectRequest),
    Stats(StatsSnapshot),
    DamageZones(DamageZones),
    Status(Severity),
}

/// Effect requests held before the oldest are dropped
pub const MAX_PENDING_EFFECTS: usize = 64;

/// Bounded queue of pending notifications.
///
/// Stats, damage zones and status are snapshots: a newer one replaces the
/// pending one of the same kind and moves to the back. Effect requests queue
/// in order up to `MAX_PENDING_EFFECTS`.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<SimEvent>,
    pending_effects: usize,
    overflow_warned: bool,
}

impl EventQueue {
    pub fn push(&mut self, event: SimEvent) {
        if matches!(event, SimEvent::Effect(_)) {
            if self.pending_effects >= MAX_PENDING_EFFECTS {
                self.drop_oldest_effect();
            }
            self.pending_effects += 1;
        } else {
            let slot = discriminant(&event);
            self.events.retain(|e| discriminant(e) != slot);
        }
        self.events.push_back(event);
    }

    fn drop_oldest_effect(&mut self) {
        let oldest = self
            .events
            .iter()
            .position(|e| matches!(e, SimEvent::Effect(_)));
        if let Some(index) = oldest {
            self.events.remove(index);
            self.pending_effects -= 1;
        }
        if !self.overflow_warned {
            log::warn!(
                "Effect queue full ({} pending); dropping oldest requests",
                MAX_PENDING_EFFECTS
            );
            self.overflow_warned = true;
        }
    }

    /// Take all pending events in queue order
    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.pending_effects = 0;
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }
}

/// Receives core notifications. All methods default to no-ops.
pub trait Observer {
    fn request_effect(&mut self, _request: &EffectRequest) {}
    fn publish_stats(&mut self, _stats: &StatsSnapshot) {}
    fn publish_damage_zones(&mut self, _zones: &DamageZones) {}
    fn publish_status(&mut self, _severity: Severity) {}
}

/// Deliver events to an observer in queue order
pub fn dispatch<O, I>(events: I, observer: &mut O)
where
    O: Observer + ?Sized,
    I: IntoIterator<Item = SimEvent>,
{
    for event in events {
        match event {
            SimEvent::Effect(request) => observer.request_effect(&request),
            SimEvent::Stats(stats) => observer.publish_stats(&stats),
            SimEvent::DamageZones(zones) => observer.publish_damage_zones(&zones),
            SimEvent::Status(severity) => observer.publish_status(severity),
        }
    }
}
