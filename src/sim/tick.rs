//! Fixed timestep simulation tick
//!
//! One frame of the reaction: deadlines, waves, fallout, motion, collisions,
//! gauges and publication, in that order.

use super::effects::{decay_gauges, update_fallout};
use super::events::SimEvent;
use super::integrate::integrate;
use super::reaction::{resolve_collisions, status};
use super::state::{SimPhase, SimulationState};
use crate::config::Config;
use crate::consts::*;

/// Advance the simulation by one frame. No-op unless running.
pub fn tick(state: &mut SimulationState, config: &Config) {
    if state.phase != SimPhase::Running {
        return;
    }

    state.time_ms += FRAME_MS;
    state.effects.expire(state.time_ms);

    state.waves.retain_mut(|wave| wave.update());
    update_fallout(state);

    integrate(state, config);
    resolve_collisions(state, config);

    decay_gauges(&mut state.stats);

    if state.frame % METRICS_INTERVAL == 0 {
        state.publish_metrics();
    }
    let severity = status(state);
    state.events.push(SimEvent::Status(severity));

    state.frame += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::Severity;
    use crate::sim::particle::ParticleKind;

    fn running(config: &Config) -> SimulationState {
        let mut state = SimulationState::new(config);
        state.seed_neutrons(config);
        state.phase = SimPhase::Running;
        state.drain_events();
        state
    }

    #[test]
    fn test_idle_and_paused_do_not_advance() {
        let config = Config::default();
        let mut state = SimulationState::new(&config);
        tick(&mut state, &config);
        assert_eq!(state.time_ms, 0.0);
        assert_eq!(state.frame, 0);

        state.phase = SimPhase::Paused;
        tick(&mut state, &config);
        assert_eq!(state.frame, 0);
    }

    #[test]
    fn test_clock_advances_per_tick() {
        let config = Config::default();
        let mut state = running(&config);
        for _ in 0..5 {
            tick(&mut state, &config);
        }
        assert_eq!(state.frame, 5);
        assert_eq!(state.time_ms, 5.0 * FRAME_MS);
    }

    fn kinds_published(state: &mut SimulationState) -> (bool, bool, bool) {
        let events = state.drain_events();
        let status = events.iter().any(|e| matches!(e, SimEvent::Status(_)));
        let stats = events.iter().any(|e| matches!(e, SimEvent::Stats(_)));
        let zones = events.iter().any(|e| matches!(e, SimEvent::DamageZones(_)));
        (status, stats, zones)
    }

    #[test]
    fn test_status_every_tick_metrics_every_third() {
        let config = Config::default();
        let mut state = running(&config);
        for frame in 0..6 {
            tick(&mut state, &config);
            let metrics_due = frame % METRICS_INTERVAL == 0;
            assert_eq!(
                kinds_published(&mut state),
                (true, metrics_due, metrics_due)
            );
        }
    }

    #[test]
    fn test_counts_stay_positive() {
        let config = Config {
            criticality: 3.0,
            ..Config::default()
        };
        let mut state = running(&config);
        for _ in 0..200 {
            tick(&mut state, &config);
            assert!(state.particles.iter().all(|p| p.count >= 1));
            assert!(state.particles.iter().all(|p| p.life > LIFE_EPSILON));
        }
    }

    #[test]
    fn test_empty_arena_is_quiescent() {
        let config = Config {
            initial_fissile: 0,
            initial_neutrons: 0,
            ..Config::default()
        };
        let mut state = running(&config);
        tick(&mut state, &config);
        let events = state.drain_events();
        assert!(events.contains(&SimEvent::Status(Severity::Quiescent)));
        assert_eq!(state.particle_count(ParticleKind::Neutron), 0);
    }

    #[test]
    fn test_determinism() {
        let config = Config {
            criticality: 6.0,
            seed: 99_999,
            ..Config::default()
        };
        let mut a = running(&config);
        let mut b = running(&config);
        for _ in 0..120 {
            tick(&mut a, &config);
            tick(&mut b, &config);
        }
        assert_eq!(a.stats.fissions, b.stats.fissions);
        assert_eq!(a.stats.total_neutrons, b.stats.total_neutrons);
        assert_eq!(a.particles.len(), b.particles.len());
        for (pa, pb) in a.particles.iter().zip(&b.particles) {
            assert_eq!(pa.id, pb.id);
            assert_eq!(pa.pos, pb.pos);
            assert_eq!(pa.count, pb.count);
        }
    }
}
