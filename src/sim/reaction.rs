//! Reaction engine
//!
//! Neutron/nucleus collision resolution, fission product spawning and the
//! end-of-frame cleanup that keeps the particle list bounded.

use std::f32::consts::{PI, TAU};
use std::num::NonZeroU64;

use glam::Vec2;
use rand::Rng;

use super::effects::trigger_explosion_effect;
use super::events::Severity;
use super::merge::merge_nearby;
use super::particle::{ExplosionWave, Particle, ParticleKind};
use super::state::SimulationState;
use crate::config::Config;
use crate::consts::*;
use crate::polar_to_cartesian;

/// Per-contact fission chance for a criticality multiplier.
///
/// Zero for non-positive (or NaN) multipliers, linear up to the 0.98 ceiling.
pub fn fission_probability(multiplier: f32) -> f64 {
    if multiplier.is_nan() || multiplier <= 0.0 {
        return 0.0;
    }
    (BASE_FISSION_PROBABILITY * multiplier as f64).min(MAX_FISSION_PROBABILITY)
}

/// Resolve every neutron/nucleus contact for this frame, then prune and merge.
pub fn resolve_collisions(state: &mut SimulationState, config: &Config) {
    let multiplier = config.criticality;
    let probability = fission_probability(multiplier);
    let duration_ms = config.effect_duration_ms();

    let neutrons: Vec<usize> = indices_of(&state.particles, |p| p.kind == ParticleKind::Neutron);
    let nuclei: Vec<usize> = indices_of(&state.particles, |p| {
        p.kind == ParticleKind::Fissile && !p.has_collided
    });
    let mut consumed = vec![false; state.particles.len()];
    let mut spawned = Vec::new();
    let mut over_budget = false;

    for &ni in neutrons.iter().rev() {
        for &fi in nuclei.iter().rev() {
            let nucleus = &state.particles[fi];
            if consumed[fi] || nucleus.has_collided {
                continue;
            }
            if !state.particles[ni].overlaps(nucleus) {
                continue;
            }
            if !state.rng.random_bool(probability) {
                continue;
            }

            let reaction = state.particles[ni].count.min(nucleus.count);

            let neutron = &mut state.particles[ni];
            if neutron.count > reaction {
                neutron.count -= reaction;
            } else {
                consumed[ni] = true;
            }

            let nucleus = &mut state.particles[fi];
            if nucleus.count > reaction {
                nucleus.count -= reaction;
            } else {
                nucleus.has_collided = true;
                consumed[fi] = true;
            }
            let site = nucleus.pos;

            over_budget |= state.particles.len() + spawned.len() > config.max_visual_particles;
            if let Some(reaction) = NonZeroU64::new(reaction) {
                fission(state, multiplier, duration_ms, site, reaction, &mut spawned);
            }
            // One fission per neutron per frame
            break;
        }
    }

    let mut index = 0;
    state.particles.retain(|_| {
        let keep = !consumed[index];
        index += 1;
        keep
    });
    state.particles.append(&mut spawned);

    // A fission on an over-budget list thins it before dead particles go
    if over_budget {
        merge_nearby(&mut state.particles, config.merge_threshold);
    }

    state.stats.active_neutrons = state.aggregate_count(ParticleKind::Neutron);

    state.particles.retain(|p| p.life > LIFE_EPSILON);

    if state.particles.len() > config.merge_threshold {
        merge_nearby(&mut state.particles, config.merge_threshold);
    }
}

fn indices_of(particles: &[Particle], pred: impl Fn(&Particle) -> bool) -> Vec<usize> {
    particles
        .iter()
        .enumerate()
        .filter(|(_, p)| pred(p))
        .map(|(i, _)| i)
        .collect()
}

/// Split `reaction` nuclei at `site`: fragments, neutrons, energy, stats and
/// effects. New particles go to `spawned` and join the list after the pass.
fn fission(
    state: &mut SimulationState,
    multiplier: f32,
    duration_ms: f64,
    site: Vec2,
    reaction: NonZeroU64,
    spawned: &mut Vec<Particle>,
) {
    let now_ms = state.time_ms;
    let count = reaction.get();
    let m = multiplier.max(0.0);
    let sqrt_m = m.sqrt();
    let explosion = (m * count as f32 / 500.0).min(MAX_EXPLOSION_INTENSITY);

    // Two fragments, roughly back to back
    let angle = state.rng.random::<f32>() * TAU;
    let opposite = angle + PI + (state.rng.random::<f32>() - 0.5) * 0.5;
    let speed = (2.0 + state.rng.random::<f32>() * 4.0) * sqrt_m;
    for direction in [angle, opposite] {
        let id = state.next_entity_id();
        spawned.push(Particle::spawned(
            id,
            ParticleKind::Fragment,
            site,
            polar_to_cartesian(speed, direction),
            reaction,
            explosion,
            now_ms,
        ));
    }

    let base: u64 = state.rng.random_range(2..=3);
    let neutron_yield = (base as f64 * m as f64 * count as f64).floor() as u64;
    if neutron_yield > 0 {
        let visual = neutron_yield
            .div_ceil(NEUTRONS_PER_VISUAL)
            .clamp(1, MAX_VISUAL_NEUTRONS);
        let per_particle = neutron_yield
            .div_ceil(visual)
            .min(MAX_NEUTRON_PARTICLE_COUNT);
        if let Some(per_particle) = NonZeroU64::new(per_particle) {
            for _ in 0..visual {
                let angle = state.rng.random::<f32>() * TAU;
                let speed = (3.0 + state.rng.random::<f32>() * 5.0) * sqrt_m;
                let jitter = Vec2::new(
                    (state.rng.random::<f32>() - 0.5) * 30.0,
                    (state.rng.random::<f32>() - 0.5) * 30.0,
                );
                let id = state.next_entity_id();
                spawned.push(Particle::spawned(
                    id,
                    ParticleKind::Neutron,
                    site + jitter,
                    polar_to_cartesian(speed, angle),
                    per_particle,
                    explosion.min(1.2),
                    now_ms,
                ));
            }
        }
    }

    let visual_energy = count
        .div_ceil(FISSIONS_PER_VISUAL_ENERGY)
        .clamp(1, MAX_VISUAL_ENERGY);
    for _ in 0..visual_energy {
        let angle = state.rng.random::<f32>() * TAU;
        let speed = (4.0 + state.rng.random::<f32>() * 6.0) * m;
        let id = state.next_entity_id();
        spawned.push(
            Particle::spawned(
                id,
                ParticleKind::Energy,
                site,
                polar_to_cartesian(speed, angle),
                reaction,
                explosion,
                now_ms,
            )
            .with_lifetime(duration_ms),
        );
    }

    let stats = &mut state.stats;
    stats.fissions = stats.fissions.saturating_add(count);
    stats.total_neutrons = stats.total_neutrons.saturating_add(neutron_yield);
    stats.energy += ENERGY_PER_FISSION * m as f64 * count as f64;
    let interval_s = (now_ms - stats.last_reaction_ms) / 1000.0;
    if interval_s > 0.0 {
        stats.reaction_rate = count as f64 / interval_s;
    }
    stats.last_reaction_ms = now_ms;
    stats.generation += 1;

    log::debug!(
        "Fission x{} at ({:.0}, {:.0}): {} neutrons, intensity {:.2}",
        count,
        site.x,
        site.y,
        neutron_yield,
        explosion
    );

    state.waves.push(ExplosionWave::new(site, explosion));
    trigger_explosion_effect(state, explosion, duration_ms);
}

/// Reaction status from the free-neutron population and reaction rate
pub fn classify(active_neutrons: u64, reaction_rate: f64, energy_present: bool) -> Severity {
    if active_neutrons > 500 || reaction_rate > 200.0 {
        Severity::Critical
    } else if active_neutrons > 100 || reaction_rate > 50.0 {
        Severity::Active
    } else if active_neutrons > 0 || energy_present {
        Severity::Stabilizing
    } else {
        Severity::Quiescent
    }
}

/// Current status of a state
pub fn status(state: &SimulationState) -> Severity {
    classify(
        state.stats.active_neutrons,
        state.stats.reaction_rate,
        state.particle_count(ParticleKind::Energy) > 0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(criticality: f32, seed: u64) -> (SimulationState, Config) {
        let config = Config {
            initial_fissile: 0,
            criticality,
            seed,
            ..Config::default()
        };
        let mut state = SimulationState::new(&config);
        state.drain_events();
        (state, config)
    }

    fn add(state: &mut SimulationState, kind: ParticleKind, pos: Vec2, count: u64) {
        let id = state.next_entity_id();
        let p = Particle::new(id, kind, pos, Vec2::ZERO, count, 1.0, state.time_ms).unwrap();
        state.particles.push(p);
    }

    /// Run collision passes until the first fission, advancing the clock
    fn resolve_until_fission(state: &mut SimulationState, config: &Config, attempts: usize) {
        for _ in 0..attempts {
            state.time_ms += FRAME_MS;
            resolve_collisions(state, config);
            if state.stats.fissions > 0 {
                return;
            }
        }
    }

    #[test]
    fn test_probability_curve() {
        assert_eq!(fission_probability(0.0), 0.0);
        assert_eq!(fission_probability(-2.0), 0.0);
        assert_eq!(fission_probability(f32::NAN), 0.0);
        assert!((fission_probability(1.0) - 0.3).abs() < 1e-9);
        assert!((fission_probability(3.0) - 0.9).abs() < 1e-6);
        assert_eq!(fission_probability(3.27), MAX_FISSION_PROBABILITY);
        assert_eq!(fission_probability(10.0), MAX_FISSION_PROBABILITY);
    }

    #[test]
    fn test_single_fission_products() {
        let (mut state, config) = setup(3.0, 7);
        let site = Vec2::new(250.0, 175.0);
        add(&mut state, ParticleKind::Fissile, site, 1);
        add(&mut state, ParticleKind::Neutron, site, 1);

        resolve_until_fission(&mut state, &config, 50);

        assert_eq!(state.stats.fissions, 1);
        assert_eq!(state.stats.generation, 1);
        assert_eq!(state.particle_count(ParticleKind::Fissile), 0);
        assert_eq!(state.particle_count(ParticleKind::Fragment), 2);
        assert_eq!(state.aggregate_count(ParticleKind::Fragment), 2);
        assert_eq!(state.particle_count(ParticleKind::Energy), 1);

        // floor({2,3} * 3 * 1) neutrons, one visual particle carrying them all
        let released = state.stats.total_neutrons;
        assert!(released == 6 || released == 9);
        assert_eq!(state.particle_count(ParticleKind::Neutron), 1);
        assert_eq!(state.aggregate_count(ParticleKind::Neutron), released);
        assert_eq!(state.stats.active_neutrons, released);

        assert!((state.stats.energy - 0.0075).abs() < 1e-9);
        assert_eq!(state.waves.len(), 1);

        let energy = state
            .particles
            .iter()
            .find(|p| p.kind == ParticleKind::Energy)
            .unwrap();
        assert_eq!(energy.max_lifetime_ms, Some(config.effect_duration_ms()));
        assert_eq!(energy.pos, site);
    }

    #[test]
    fn test_counts_are_conserved_at_fission() {
        let (mut state, config) = setup(3.0, 11);
        let site = Vec2::new(100.0, 100.0);
        add(&mut state, ParticleKind::Fissile, site, 3);
        add(&mut state, ParticleKind::Neutron, site, 5);
        let neutron_id = state.particles[1].id;

        resolve_until_fission(&mut state, &config, 50);

        assert_eq!(state.stats.fissions, 3);
        assert_eq!(state.particle_count(ParticleKind::Fissile), 0);
        let survivor = state.particles.iter().find(|p| p.id == neutron_id).unwrap();
        assert_eq!(survivor.count, 2);
        // Fragments carry the reaction count each
        assert!(
            state
                .particles
                .iter()
                .filter(|p| p.kind == ParticleKind::Fragment)
                .all(|p| p.count == 3)
        );
    }

    #[test]
    fn test_partial_nucleus_survives() {
        let (mut state, config) = setup(3.0, 5);
        let site = Vec2::new(100.0, 100.0);
        add(&mut state, ParticleKind::Fissile, site, 10);
        add(&mut state, ParticleKind::Neutron, site, 4);

        resolve_until_fission(&mut state, &config, 50);

        assert_eq!(state.stats.fissions, 4);
        let nucleus = state
            .particles
            .iter()
            .find(|p| p.kind == ParticleKind::Fissile)
            .unwrap();
        assert_eq!(nucleus.count, 6);
        assert!(!nucleus.has_collided);
    }

    #[test]
    fn test_one_fission_per_neutron_per_pass() {
        let (mut state, config) = setup(10.0, 3);
        let site = Vec2::new(200.0, 200.0);
        add(&mut state, ParticleKind::Fissile, site, 1);
        add(&mut state, ParticleKind::Fissile, site, 1);
        add(&mut state, ParticleKind::Neutron, site, 10);

        resolve_until_fission(&mut state, &config, 50);

        assert_eq!(state.stats.generation, 1);
        assert_eq!(state.particle_count(ParticleKind::Fissile), 1);
    }

    #[test]
    fn test_zero_multiplier_never_fissions() {
        let (mut state, config) = setup(0.0, 1);
        let site = Vec2::new(200.0, 200.0);
        add(&mut state, ParticleKind::Fissile, site, 1);
        add(&mut state, ParticleKind::Neutron, site, 1);

        for _ in 0..200 {
            resolve_collisions(&mut state, &config);
        }
        assert_eq!(state.stats.fissions, 0);
        assert_eq!(state.particles.len(), 2);
    }

    #[test]
    fn test_zero_yield_spawns_no_neutrons() {
        // floor(3 * 0.1 * 1) = 0
        let (mut state, config) = setup(0.1, 9);
        let site = Vec2::new(200.0, 200.0);
        add(&mut state, ParticleKind::Fissile, site, 1);
        add(&mut state, ParticleKind::Neutron, site, 1);

        resolve_until_fission(&mut state, &config, 2000);

        assert_eq!(state.stats.fissions, 1);
        assert_eq!(state.stats.total_neutrons, 0);
        assert_eq!(state.particle_count(ParticleKind::Neutron), 0);
        assert_eq!(state.stats.active_neutrons, 0);
    }

    #[test]
    fn test_reaction_rate_uses_simulation_clock() {
        let (mut state, config) = setup(3.0, 21);
        let site = Vec2::new(200.0, 200.0);
        add(&mut state, ParticleKind::Fissile, site, 4);
        add(&mut state, ParticleKind::Neutron, site, 4);
        state.time_ms = 1_000.0 - FRAME_MS;

        resolve_until_fission(&mut state, &config, 1);
        if state.stats.fissions > 0 {
            // 4 fissions, one second after reset
            assert!((state.stats.reaction_rate - 4.0).abs() < 1e-9);
            assert_eq!(state.stats.last_reaction_ms, 1_000.0);
        } else {
            assert_eq!(state.stats.reaction_rate, 0.0);
        }
    }

    #[test]
    fn test_faded_particles_pruned() {
        let (mut state, config) = setup(1.0, 1);
        add(&mut state, ParticleKind::Energy, Vec2::new(50.0, 50.0), 1);
        add(&mut state, ParticleKind::Energy, Vec2::new(150.0, 50.0), 1);
        state.particles[0].life = LIFE_EPSILON;
        resolve_collisions(&mut state, &config);
        assert_eq!(state.particles.len(), 1);
    }

    #[test]
    fn test_fission_over_visual_budget_merges() {
        for seed in 0..20 {
            let (mut state, mut config) = setup(10.0, seed);
            config.max_visual_particles = 20;
            config.merge_threshold = 20;

            add(&mut state, ParticleKind::Neutron, Vec2::new(100.0, 100.0), 1);
            add(&mut state, ParticleKind::Fissile, Vec2::new(100.0, 100.0), 1);
            for i in 0..12 {
                add(&mut state, ParticleKind::Fragment, Vec2::new(400.0 + i as f32 * 0.5, 50.0), 1);
            }
            // Fading quanta keep the list over budget until pruning
            for i in 0..10 {
                add(&mut state, ParticleKind::Energy, Vec2::new(20.0 + i as f32 * 40.0, 300.0), 1);
                state.particles.last_mut().unwrap().life = 0.01;
            }

            resolve_collisions(&mut state, &config);
            if state.stats.fissions == 0 {
                continue;
            }

            // Pruning left the list under the threshold, yet the cluster merged
            assert!(state.particles.len() <= config.merge_threshold);
            let clustered = state
                .particles
                .iter()
                .filter(|p| p.kind == ParticleKind::Fragment && p.pos.y < 60.0)
                .count();
            assert_eq!(clustered, 2);
            assert_eq!(state.aggregate_count(ParticleKind::Fragment), 14);
            return;
        }
        panic!("no seed produced a fission");
    }

    #[test]
    fn test_fission_within_budget_does_not_merge() {
        let (mut state, config) = setup(10.0, 3);
        add(&mut state, ParticleKind::Neutron, Vec2::new(100.0, 100.0), 1);
        add(&mut state, ParticleKind::Fissile, Vec2::new(100.0, 100.0), 1);
        for i in 0..12 {
            add(&mut state, ParticleKind::Fragment, Vec2::new(400.0 + i as f32 * 0.5, 50.0), 1);
        }
        resolve_collisions(&mut state, &config);
        let clustered = state
            .particles
            .iter()
            .filter(|p| p.kind == ParticleKind::Fragment && p.pos.y < 60.0)
            .count();
        assert_eq!(clustered, 12);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(0, 0.0, false), Severity::Quiescent);
        assert_eq!(classify(0, 0.0, true), Severity::Stabilizing);
        assert_eq!(classify(1, 0.0, false), Severity::Stabilizing);
        assert_eq!(classify(101, 0.0, false), Severity::Active);
        assert_eq!(classify(0, 51.0, false), Severity::Active);
        assert_eq!(classify(501, 0.0, false), Severity::Critical);
        assert_eq!(classify(0, 200.5, false), Severity::Critical);
        assert_eq!(classify(500, 200.0, false), Severity::Active);
    }
}
