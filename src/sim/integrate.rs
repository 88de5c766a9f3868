//! Per-frame motion and decay
//!
//! Moves every particle, decays energy quanta, reflects off the arena walls
//! and records trails. Particles spawned here (wall sparks) are appended
//! after the pass so they first move on the next frame.

use std::num::NonZeroU64;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::effects::{HEAT_THRESHOLD, trigger_explosion_effect};
use super::particle::{ExplosionWave, Particle, ParticleKind};
use super::state::SimulationState;
use crate::config::Config;
use crate::consts::*;

/// Side effects collected while integrating
#[derive(Debug, Default)]
struct Spawns {
    /// (position, velocity) of wall sparks
    sparks: Vec<(Vec2, Vec2)>,
    /// (position, wave intensity, aggregate count) of energy bursts
    bursts: Vec<(Vec2, f32, u64)>,
}

/// Advance every particle by one frame
pub fn integrate(state: &mut SimulationState, config: &Config) {
    let arena = state.arena;
    let now_ms = state.time_ms;
    let mut heat_busy = state.effects.heat_active();
    let mut spawns = Spawns::default();

    for particle in state.particles.iter_mut() {
        step_particle(
            particle,
            &mut state.rng,
            arena,
            now_ms,
            &mut heat_busy,
            &mut spawns,
        );
    }

    let duration_ms = config.effect_duration_ms();
    let spark_lifetime_ms = duration_ms * 0.5;
    for (pos, vel) in spawns.sparks {
        let id = state.next_entity_id();
        state.particles.push(
            Particle::spawned(
                id,
                ParticleKind::Energy,
                pos,
                vel,
                NonZeroU64::MIN,
                0.5,
                now_ms,
            )
            .with_lifetime(spark_lifetime_ms),
        );
    }

    for (pos, intensity, count) in spawns.bursts {
        state.waves.push(ExplosionWave::new(pos, intensity));
        trigger_explosion_effect(state, count as f32 / 300.0, duration_ms);
    }
}

fn step_particle(
    p: &mut Particle,
    rng: &mut Pcg32,
    arena: Vec2,
    now_ms: f64,
    heat_busy: &mut bool,
    spawns: &mut Spawns,
) {
    let is_energy = p.kind == ParticleKind::Energy;

    // Hard lifetime cap
    if is_energy {
        if let Some(max_ms) = p.max_lifetime_ms {
            let elapsed = now_ms - p.spawned_at_ms;
            if elapsed >= max_ms {
                p.life = 0.0;
                return;
            }
            p.life = p.life.min((1.0 - elapsed / max_ms) as f32);
        }
    }

    p.record_trail();

    p.pos += p.vel * p.intensity;
    p.glow_phase += 0.1;

    if is_energy {
        p.life -= ENERGY_LIFE_DECAY;
        p.size *= ENERGY_SHRINK;

        // A sufficiently energetic quantum can escalate into a screen-level effect
        if p.count > ENERGY_BURST_MIN_COUNT
            && rng.random_bool(ENERGY_BURST_CHANCE)
            && !*heat_busy
        {
            let effect_intensity = p.count as f32 / 300.0;
            spawns.bursts.push((p.pos, p.intensity, p.count));
            *heat_busy |= effect_intensity > HEAT_THRESHOLD;
        }
    }

    // Each axis is checked independently; a corner hit may spark twice
    if p.pos.x < p.size || p.pos.x > arena.x - p.size {
        p.vel.x *= WALL_RESTITUTION;
        p.pos.x = p.pos.x.max(p.size).min(arena.x - p.size);
        if is_energy {
            spark(rng, p.pos, spawns);
        }
    }
    if p.pos.y < p.size || p.pos.y > arena.y - p.size {
        p.vel.y *= WALL_RESTITUTION;
        p.pos.y = p.pos.y.max(p.size).min(arena.y - p.size);
        if is_energy {
            spark(rng, p.pos, spawns);
        }
    }

    p.vel *= VELOCITY_DAMPING;
}

fn spark(rng: &mut Pcg32, pos: Vec2, spawns: &mut Spawns) {
    if !rng.random_bool(SPARK_CHANCE) {
        return;
    }
    for _ in 0..SPARKS_PER_HIT {
        let vel = Vec2::new(
            (rng.random::<f32>() - 0.5) * 4.0,
            (rng.random::<f32>() - 0.5) * 4.0,
        );
        spawns.sparks.push((pos, vel));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::SimEvent;

    fn empty_state(seed: u64) -> (SimulationState, Config) {
        let config = Config {
            initial_fissile: 0,
            seed,
            ..Config::default()
        };
        let mut state = SimulationState::new(&config);
        state.drain_events();
        (state, config)
    }

    fn add(state: &mut SimulationState, kind: ParticleKind, pos: Vec2, vel: Vec2, count: u64) {
        let id = state.next_entity_id();
        let p = Particle::new(id, kind, pos, vel, count, 1.0, state.time_ms).unwrap();
        state.particles.push(p);
    }

    #[test]
    fn test_moves_and_damps() {
        let (mut state, config) = empty_state(1);
        add(&mut state, ParticleKind::Neutron, Vec2::new(100.0, 100.0), Vec2::new(5.0, -2.0), 1);
        integrate(&mut state, &config);
        let p = &state.particles[0];
        assert_eq!(p.pos, Vec2::new(105.0, 98.0));
        assert!((p.vel.x - 5.0 * VELOCITY_DAMPING).abs() < 1e-6);
        assert!((p.vel.y + 2.0 * VELOCITY_DAMPING).abs() < 1e-6);
        assert_eq!(p.trail.len(), 1);
        assert_eq!(p.trail[0].pos, Vec2::new(100.0, 100.0));
        // Non-energy particles never decay
        assert_eq!(p.life, 1.0);
    }

    #[test]
    fn test_wall_reflection_clamps() {
        let (mut state, config) = empty_state(1);
        add(&mut state, ParticleKind::Fragment, Vec2::new(495.0, 100.0), Vec2::new(10.0, 0.0), 1);
        integrate(&mut state, &config);
        let p = &state.particles[0];
        assert_eq!(p.pos.x, state.arena.x - p.size);
        assert!(p.vel.x < 0.0);
        assert!((p.vel.x - 10.0 * WALL_RESTITUTION * VELOCITY_DAMPING).abs() < 1e-5);
        // Fragments never spark
        assert_eq!(state.particles.len(), 1);
    }

    #[test]
    fn test_energy_decays_and_shrinks() {
        let (mut state, config) = empty_state(1);
        add(&mut state, ParticleKind::Energy, Vec2::new(200.0, 150.0), Vec2::ZERO, 1);
        let size0 = state.particles[0].size;
        integrate(&mut state, &config);
        let p = &state.particles[0];
        assert!((p.life - (1.0 - ENERGY_LIFE_DECAY)).abs() < 1e-6);
        assert!((p.size - size0 * ENERGY_SHRINK).abs() < 1e-5);
    }

    #[test]
    fn test_energy_lifetime_forces_zero() {
        let (mut state, config) = empty_state(1);
        add(&mut state, ParticleKind::Energy, Vec2::new(200.0, 150.0), Vec2::ZERO, 1);
        state.particles[0].max_lifetime_ms = Some(100.0);

        let mut last_life = state.particles[0].life;
        for frame in 1..=10 {
            state.time_ms = frame as f64 * FRAME_MS;
            integrate(&mut state, &config);
            let life = state.particles[0].life;
            assert!(life <= last_life);
            last_life = life;
            if state.time_ms >= 100.0 {
                assert_eq!(life, 0.0);
            }
        }
    }

    #[test]
    fn test_corner_hit_can_spark_on_both_axes() {
        let mut max_sparks = 0;
        for seed in 0..200 {
            let (mut state, config) = empty_state(seed);
            add(&mut state, ParticleKind::Energy, Vec2::new(1.0, 1.0), Vec2::new(-3.0, -3.0), 1);
            integrate(&mut state, &config);
            let sparks = state.particles.len() - 1;
            assert_eq!(sparks % SPARKS_PER_HIT, 0);
            assert!(sparks <= 2 * SPARKS_PER_HIT);
            max_sparks = max_sparks.max(sparks);
        }
        assert_eq!(max_sparks, 2 * SPARKS_PER_HIT);
    }

    #[test]
    fn test_sparks_are_short_lived_energy() {
        for seed in 0..100 {
            let (mut state, config) = empty_state(seed);
            add(&mut state, ParticleKind::Energy, Vec2::new(1.0, 150.0), Vec2::new(-3.0, 0.0), 1);
            integrate(&mut state, &config);
            if state.particles.len() > 1 {
                let spark = &state.particles[1];
                assert_eq!(spark.kind, ParticleKind::Energy);
                assert_eq!(spark.count, 1);
                assert_eq!(spark.intensity, 0.5);
                assert_eq!(spark.max_lifetime_ms, Some(config.effect_duration_ms() * 0.5));
                // Not moved on the frame it was spawned
                assert!(spark.trail.is_empty());
                return;
            }
        }
        panic!("no seed produced a spark");
    }

    #[test]
    fn test_energetic_particle_bursts_at_most_once_per_frame() {
        let mut saw_burst = false;
        for seed in 0..200 {
            let (mut state, config) = empty_state(seed);
            for i in 0..20 {
                add(
                    &mut state,
                    ParticleKind::Energy,
                    Vec2::new(100.0 + i as f32 * 10.0, 150.0),
                    Vec2::ZERO,
                    600,
                );
            }
            integrate(&mut state, &config);
            let effects = state
                .drain_events()
                .into_iter()
                .filter(|e| matches!(e, SimEvent::Effect(_)))
                .count();
            // Heat gates every burst after the first
            assert!(state.waves.len() <= 1);
            if state.waves.len() == 1 {
                saw_burst = true;
                assert!(effects > 0);
                assert!(state.effects.heat_active());
            }
        }
        assert!(saw_burst);
    }
}
