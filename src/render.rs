//! Render snapshot
//!
//! Flattens the visual state into plain-old-data instances a shell can
//! upload to a GPU buffer as-is. Nothing here feeds back into the simulation.

use bytemuck::{Pod, Zeroable};

use crate::sim::state::SimulationState;

/// Background clear color
pub const BACKGROUND: [f32; 4] = [0.0, 6.0 / 255.0, 24.0 / 255.0, 1.0];

// ============================================================================
// GPU DATA STRUCTURES (layout is part of the contract with the shell)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FrameGlobals {
    pub resolution: [f32; 2], // offset 0
    pub time: f32,            // offset 8, seconds of simulation clock
    pub heat_level: f32,      // offset 12, 0-100
    pub explosion_intensity: f32,
    pub particle_count: u32,
    pub wave_count: u32,
    pub fallout_count: u32, // 32 bytes
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub pos: [f32; 2],
    pub size: f32,
    pub life: f32,
    /// 0xRRGGBB
    pub color: u32,
    /// `ParticleKind as u32`
    pub kind: u32,
    /// Pulse factor 0-1
    pub glow: f32,
    /// Aggregate count, saturated to u32
    pub count: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TrailInstance {
    pub pos: [f32; 2],
    pub alpha: f32,
    pub size: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct WaveInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub alpha: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FalloutInstance {
    pub pos: [f32; 2],
    pub size: f32,
    pub rotation: f32,
    pub life: f32,
    pub _pad: [u32; 3], // Pad to 32 bytes for alignment
}

/// Everything a shell needs to draw one frame
#[derive(Debug, Clone, Default)]
pub struct RenderSnapshot {
    pub globals: FrameGlobals,
    pub particles: Vec<ParticleInstance>,
    pub trails: Vec<TrailInstance>,
    pub waves: Vec<WaveInstance>,
    pub fallout: Vec<FalloutInstance>,
}

impl RenderSnapshot {
    pub fn particle_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }

    pub fn trail_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.trails)
    }

    pub fn wave_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.waves)
    }

    pub fn fallout_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.fallout)
    }
}

/// Build a snapshot of the current visual state
pub fn snapshot(state: &SimulationState) -> RenderSnapshot {
    let particles: Vec<ParticleInstance> = state
        .particles
        .iter()
        .map(|p| ParticleInstance {
            pos: p.pos.to_array(),
            size: p.size,
            life: p.life,
            color: p.color(),
            kind: p.kind as u32,
            glow: 0.5 + 0.5 * p.glow_phase.sin(),
            count: u32::try_from(p.count).unwrap_or(u32::MAX),
        })
        .collect();

    // Trails thin out towards the oldest point
    let trails = state
        .particles
        .iter()
        .flat_map(|p| {
            let len = p.trail.len().max(1) as f32;
            p.trail.iter().enumerate().filter(|(_, t)| t.life > 0.0).map(move |(i, t)| {
                TrailInstance {
                    pos: t.pos.to_array(),
                    alpha: t.life * 0.5,
                    size: p.size * 0.3 * (i + 1) as f32 / len,
                }
            })
        })
        .collect();

    let waves = state
        .waves
        .iter()
        .map(|w| WaveInstance {
            center: w.center.to_array(),
            radius: w.radius,
            alpha: (w.life * w.intensity).clamp(0.0, 1.0),
        })
        .collect();

    let fallout = state
        .fallout
        .iter()
        .map(|f| FalloutInstance {
            pos: f.pos.to_array(),
            size: f.size,
            rotation: f.rotation,
            life: f.life,
            _pad: [0; 3],
        })
        .collect();

    RenderSnapshot {
        globals: FrameGlobals {
            resolution: state.arena.to_array(),
            time: (state.time_ms / 1000.0) as f32,
            heat_level: state.stats.heat_level,
            explosion_intensity: state.stats.explosion_intensity,
            particle_count: state.particles.len() as u32,
            wave_count: state.waves.len() as u32,
            fallout_count: state.fallout.len() as u32,
        },
        particles,
        trails,
        waves,
        fallout,
    }
}
