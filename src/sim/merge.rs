//! Population controller
//!
//! Coalesces nearby same-kind particles into aggregates so the live list
//! stays near the visual budget while unit counts are preserved exactly.

use super::particle::Particle;
use crate::consts::{MAX_MERGE_GROUP, MERGE_DISTANCE_FACTOR};

/// Whether `other` may join a group anchored at `anchor`
#[inline]
fn can_merge(anchor: &Particle, other: &Particle) -> bool {
    anchor.kind == other.kind
        && !anchor.has_collided
        && !other.has_collided
        && anchor.distance_to(other) < (anchor.size + other.size) * MERGE_DISTANCE_FACTOR
}

/// Partition indices into groups in list order. The first index of each
/// group is its anchor.
fn plan_groups(particles: &[Particle]) -> Vec<Vec<usize>> {
    let mut grouped = vec![false; particles.len()];
    let mut groups = Vec::new();

    for i in 0..particles.len() {
        if grouped[i] {
            continue;
        }
        grouped[i] = true;
        let anchor = &particles[i];
        let mut members = Vec::with_capacity(MAX_MERGE_GROUP);
        members.push(i);

        for j in (i + 1)..particles.len() {
            if grouped[j] || !can_merge(anchor, &particles[j]) {
                continue;
            }
            grouped[j] = true;
            members.push(j);
            if members.len() >= MAX_MERGE_GROUP {
                break;
            }
        }
        groups.push(members);
    }

    groups
}

/// Fold a group into its anchor: centroid position, mean velocity and the
/// summed count. Kind, intensity, life and lifetime cap come from the anchor.
fn combine(mut anchor: Particle, others: Vec<Particle>) -> Particle {
    let n = (others.len() + 1) as f32;
    let mut pos_sum = anchor.pos;
    let mut vel_sum = anchor.vel;
    for other in &others {
        pos_sum += other.pos;
        vel_sum += other.vel;
        anchor.count = anchor.count.saturating_add(other.count);
    }
    anchor.pos = pos_sum / n;
    anchor.vel = vel_sum / n;
    anchor.trail.clear();
    anchor.refresh_size();
    anchor
}

/// Merge nearby particles when the list holds at least `threshold` entries.
///
/// Returns the number of particles eliminated.
pub fn merge_nearby(particles: &mut Vec<Particle>, threshold: usize) -> usize {
    if particles.len() < threshold {
        return 0;
    }

    let before = particles.len();
    let groups = plan_groups(particles);
    let mut slots: Vec<Option<Particle>> =
        std::mem::take(particles).into_iter().map(Some).collect();

    for members in groups {
        let mut taken = members.iter().filter_map(|&i| slots[i].take());
        let Some(anchor) = taken.next() else {
            continue;
        };
        let others: Vec<Particle> = taken.collect();
        if others.is_empty() {
            particles.push(anchor);
        } else {
            particles.push(combine(anchor, others));
        }
    }

    let removed = before - particles.len();
    if removed > 0 {
        log::debug!("Merged {} particles into {}", before, particles.len());
    }
    removed
}
