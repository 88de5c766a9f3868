//! Entity model: particles, explosion waves and fallout debris

use std::num::NonZeroU64;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{TRAIL_FADE, TRAIL_LENGTH};
use crate::error::{SimError, SimResult};

/// The four particle kinds. Fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Aggregate of one or more fissionable nuclei
    Fissile,
    Neutron,
    /// Fission fragment
    Fragment,
    /// Energy quantum; the only kind that decays
    Energy,
}

/// Per-kind constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindTraits {
    /// Minimum drawn radius
    pub base_size: f32,
    /// 0xRRGGBB
    pub color: u32,
    pub symbol: char,
}

/// Indexed by `ParticleKind as usize`
const KIND_TABLE: [KindTraits; 4] = [
    KindTraits {
        base_size: 15.0,
        color: 0xff4500,
        symbol: 'U',
    },
    KindTraits {
        base_size: 10.0,
        color: 0x00bfff,
        symbol: 'n',
    },
    KindTraits {
        base_size: 12.0,
        color: 0xffd700,
        symbol: 'F',
    },
    KindTraits {
        base_size: 10.0,
        color: 0xff1493,
        symbol: 'E',
    },
];

impl ParticleKind {
    pub const ALL: [ParticleKind; 4] = [
        ParticleKind::Fissile,
        ParticleKind::Neutron,
        ParticleKind::Fragment,
        ParticleKind::Energy,
    ];

    #[inline]
    pub fn traits(self) -> &'static KindTraits {
        &KIND_TABLE[self as usize]
    }

    #[inline]
    pub fn base_size(self) -> f32 {
        self.traits().base_size
    }

    #[inline]
    pub fn color(self) -> u32 {
        self.traits().color
    }

    #[inline]
    pub fn symbol(self) -> char {
        self.traits().symbol
    }
}

/// Drawn radius for an aggregate of `count` units.
///
/// Grows with log10(count) up to 3x the base, scaled by intensity, and never
/// drops below the kind's base size.
pub fn derived_size(kind: ParticleKind, count: u64, intensity: f32) -> f32 {
    let base = kind.base_size();
    let multiplier = (1.0 + (count.max(1) as f32).log10() * 0.3).clamp(1.0, 3.0);
    (base * multiplier * intensity).max(base)
}

/// Trail point with its own fade state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub life: f32,
}

/// A simulated particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: ParticleKind,
    /// Number of units this particle aggregates (always >= 1 while alive)
    pub count: u64,
    /// Scales displacement, size and spawned-effect strength
    pub intensity: f32,
    pub size: f32,
    /// 0-1; only energy particles decay
    pub life: f32,
    /// Simulation clock at creation (ms)
    pub spawned_at_ms: f64,
    /// Hard lifetime cap for energy particles (ms)
    pub max_lifetime_ms: Option<f64>,
    /// Consumed or grouped during the current pass
    pub has_collided: bool,
    pub glow_phase: f32,
    /// Recent positions, oldest first
    #[serde(skip)]
    pub trail: Vec<TrailPoint>,
}

impl Particle {
    /// Create a particle after validating invariants.
    ///
    /// Errors:
    /// - `SimError::InvalidParticle` if `count` is 0, `intensity` is negative,
    ///   or any input is NaN/inf.
    pub fn new(
        id: u32,
        kind: ParticleKind,
        pos: Vec2,
        vel: Vec2,
        count: u64,
        intensity: f32,
        spawned_at_ms: f64,
    ) -> SimResult<Self> {
        let count = NonZeroU64::new(count)
            .ok_or_else(|| SimError::InvalidParticle("count must be >= 1".into()))?;
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(SimError::InvalidParticle(
                "intensity must be finite and >= 0".into(),
            ));
        }
        if !pos.is_finite() {
            return Err(SimError::InvalidParticle("position must be finite".into()));
        }
        if !vel.is_finite() {
            return Err(SimError::InvalidParticle("velocity must be finite".into()));
        }
        if !spawned_at_ms.is_finite() {
            return Err(SimError::InvalidParticle("spawn time must be finite".into()));
        }
        Ok(Self::spawned(id, kind, pos, vel, count, intensity, spawned_at_ms))
    }

    /// Infallible constructor for spawn sites whose inputs are already valid
    pub(crate) fn spawned(
        id: u32,
        kind: ParticleKind,
        pos: Vec2,
        vel: Vec2,
        count: NonZeroU64,
        intensity: f32,
        spawned_at_ms: f64,
    ) -> Self {
        let count = count.get();
        Self {
            id,
            pos,
            vel,
            kind,
            count,
            intensity,
            size: derived_size(kind, count, intensity),
            life: 1.0,
            spawned_at_ms,
            max_lifetime_ms: None,
            has_collided: false,
            glow_phase: 0.0,
            trail: Vec::with_capacity(TRAIL_LENGTH),
        }
    }

    /// Set the hard lifetime cap. Non-positive caps mean "no cap".
    pub fn with_lifetime(mut self, max_lifetime_ms: f64) -> Self {
        self.max_lifetime_ms = Some(max_lifetime_ms).filter(|ms| *ms > 0.0);
        self
    }

    pub fn with_glow_phase(mut self, phase: f32) -> Self {
        self.glow_phase = phase;
        self
    }

    #[inline]
    pub fn color(&self) -> u32 {
        self.kind.color()
    }

    #[inline]
    pub fn symbol(&self) -> char {
        self.kind.symbol()
    }

    #[inline]
    pub fn distance_to(&self, other: &Particle) -> f32 {
        self.pos.distance(other.pos)
    }

    /// Centres closer than the sum of both radii
    #[inline]
    pub fn overlaps(&self, other: &Particle) -> bool {
        self.distance_to(other) < self.size + other.size
    }

    /// Record current position to the trail and fade older points
    pub fn record_trail(&mut self) {
        self.trail.push(TrailPoint {
            pos: self.pos,
            life: 1.0,
        });
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.remove(0);
        }
        for point in &mut self.trail {
            point.life -= TRAIL_FADE;
        }
    }

    /// Recompute size from count and intensity
    pub fn refresh_size(&mut self) {
        self.size = derived_size(self.kind, self.count, self.intensity);
    }
}

/// An expanding shock ring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplosionWave {
    pub center: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    pub speed: f32,
    pub intensity: f32,
    pub life: f32,
}

impl ExplosionWave {
    pub fn new(center: Vec2, intensity: f32) -> Self {
        Self {
            center,
            radius: 0.0,
            max_radius: 200.0 * intensity,
            speed: 8.0 * intensity,
            intensity,
            life: 1.0,
        }
    }

    /// Advance one frame. Returns false once the wave is spent.
    pub fn update(&mut self) -> bool {
        self.radius += self.speed;
        self.life -= 0.02;
        self.speed *= 0.98;
        self.life > 0.0 && self.radius < self.max_radius
    }
}

/// A falling debris speck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FalloutParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub life: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
}

impl FalloutParticle {
    /// Spawn just above the arena at a random x
    pub fn spawn<R: Rng>(rng: &mut R, arena_width: f32) -> Self {
        Self {
            pos: Vec2::new(rng.random::<f32>() * arena_width, -10.0),
            vel: Vec2::new(
                (rng.random::<f32>() - 0.5) * 0.5,
                rng.random::<f32>() * 2.0 + 1.0,
            ),
            size: rng.random::<f32>() * 3.0 + 1.0,
            life: 1.0,
            rotation: rng.random::<f32>() * std::f32::consts::TAU,
            rotation_speed: (rng.random::<f32>() - 0.5) * 0.1,
        }
    }

    /// Advance one frame. Returns false once faded or below the arena.
    pub fn update(&mut self, arena_width: f32, arena_height: f32) -> bool {
        self.pos += self.vel;
        self.rotation += self.rotation_speed;
        self.life -= 0.002;
        // Gravity
        self.vel.y += 0.01;

        if self.pos.x < 0.0 || self.pos.x > arena_width {
            self.vel.x *= -0.8;
        }

        self.life > 0.0 && self.pos.y < arena_height + 50.0
    }
}
