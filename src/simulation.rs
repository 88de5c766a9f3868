//! Simulation controller and frame pacing
//!
//! `Simulation` is the only entry point a shell needs: it owns the
//! configuration and state, exposes the lifecycle commands and hands out
//! queued events. `FramePacer` turns wall-clock timestamps into tick counts.

use crate::config::{Config, Preset};
use crate::consts::{FRAME_MS, MAX_SUBSTEPS};
use crate::error::SimResult;
use crate::render::{self, RenderSnapshot};
use crate::sim::events::{self, Observer, Severity, SimEvent, StatsSnapshot};
use crate::sim::metrics::DamageZones;
use crate::sim::reaction;
use crate::sim::state::{SimPhase, SimulationState};
use crate::sim::tick::tick;

/// Largest wall-clock gap credited to the accumulator (ms)
const MAX_FRAME_DELTA_MS: f64 = 100.0;

/// Chain-reaction simulation driven by an external shell
#[derive(Debug, Clone)]
pub struct Simulation {
    config: Config,
    state: SimulationState,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Simulation {
    /// Create a simulation. Out-of-range config values are clamped.
    pub fn new(config: Config) -> Self {
        let config = config.sanitized();
        let state = SimulationState::new(&config);
        log::info!(
            "Simulation created: preset {}, seed {}",
            config.preset.as_str(),
            config.seed
        );
        Self { config, state }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> SimPhase {
        self.state.phase
    }

    /// Replace the configuration and reset
    pub fn configure(&mut self, config: Config) {
        self.config = config.sanitized();
        self.reset();
    }

    /// Load a JSON configuration, rejecting invalid values, and reset
    pub fn configure_json(&mut self, json: &str) -> SimResult<()> {
        let config = Config::from_json(json)?;
        self.configure(config);
        Ok(())
    }

    /// Apply a named preset and reset
    pub fn apply_preset(&mut self, preset: Preset) {
        self.config.apply_preset(preset);
        log::info!("Preset applied: {} ({})", preset.label(), preset.info());
        self.reset();
    }

    /// Discard all particles and statistics and reseed the nuclei.
    ///
    /// The RNG is reseeded from the configuration, so two resets in a row
    /// produce identical states. Undrained events of the old run are
    /// discarded; the queue starts with the fresh metrics.
    pub fn reset(&mut self) {
        self.state = SimulationState::new(&self.config);
        log::info!(
            "Simulation reset: {} nuclei in {} particles",
            self.config.initial_fissile,
            self.state.particles.len()
        );
    }

    /// Release the initial neutrons and start running. No-op unless idle.
    pub fn start(&mut self) {
        if self.state.phase != SimPhase::Idle {
            return;
        }
        self.state.seed_neutrons(&self.config);
        self.state.phase = SimPhase::Running;
        self.state.stats.start_time_ms = self.state.time_ms;
        self.state.stats.last_reaction_ms = self.state.time_ms;
        log::info!("Simulation started at {:.0}ms", self.state.time_ms);
    }

    pub fn pause(&mut self) {
        if self.state.phase == SimPhase::Running {
            self.state.phase = SimPhase::Paused;
            log::info!("Simulation paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state.phase == SimPhase::Paused {
            self.state.phase = SimPhase::Running;
            log::info!("Simulation resumed");
        }
    }

    /// Toggle between running and paused
    pub fn toggle_pause(&mut self) {
        match self.state.phase {
            SimPhase::Running => self.pause(),
            SimPhase::Paused => self.resume(),
            SimPhase::Idle => {}
        }
    }

    /// Advance one frame. No-op unless running.
    pub fn tick(&mut self) {
        tick(&mut self.state, &self.config);
    }

    /// Run as many ticks as the pacer grants for `now_ms`
    pub fn advance(&mut self, pacer: &mut FramePacer, now_ms: f64) -> u32 {
        let ticks = pacer.frame(now_ms);
        for _ in 0..ticks {
            self.tick();
        }
        ticks
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.state.drain_events()
    }

    /// Deliver pending events to an observer in queue order
    pub fn dispatch<O: Observer + ?Sized>(&mut self, observer: &mut O) {
        events::dispatch(self.state.drain_events(), observer);
    }

    pub fn status(&self) -> Severity {
        reaction::status(&self.state)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.state.stats.snapshot(self.state.time_ms)
    }

    pub fn damage_zones(&self) -> DamageZones {
        DamageZones::from_energy(self.state.stats.energy)
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        render::snapshot(&self.state)
    }
}

/// Fixed-step accumulator: wall-clock time in, tick count out
#[derive(Debug, Clone)]
pub struct FramePacer {
    accumulator_ms: f64,
    last_time_ms: Option<f64>,
    // FPS tracking
    frame_times: [f64; 60],
    frame_index: usize,
    fps: u32,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePacer {
    pub fn new() -> Self {
        Self {
            accumulator_ms: 0.0,
            last_time_ms: None,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }
    }

    /// Feed a wall-clock timestamp (ms); returns how many ticks to run
    pub fn frame(&mut self, now_ms: f64) -> u32 {
        let dt = match self.last_time_ms {
            Some(last) => (now_ms - last).clamp(0.0, MAX_FRAME_DELTA_MS),
            None => FRAME_MS,
        };
        self.last_time_ms = Some(now_ms);
        self.accumulator_ms += dt;

        let mut substeps = 0;
        while self.accumulator_ms >= FRAME_MS && substeps < MAX_SUBSTEPS {
            self.accumulator_ms -= FRAME_MS;
            substeps += 1;
        }

        self.frame_times[self.frame_index] = now_ms;
        self.frame_index = (self.frame_index + 1) % self.frame_times.len();

        // Oldest sample is the slot about to be overwritten
        let oldest_time = self.frame_times[self.frame_index];
        if oldest_time > 0.0 {
            let elapsed = now_ms - oldest_time;
            if elapsed > 0.0 {
                self.fps = (60_000.0 / elapsed).round() as u32;
            }
        }

        substeps
    }

    /// Drop accumulated time, e.g. after a pause
    pub fn reset(&mut self) {
        self.accumulator_ms = 0.0;
        self.last_time_ms = None;
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}
