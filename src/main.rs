//! Chain Reaction - headless native runner
//!
//! Usage: `chain-reaction [preset] [seconds]`
//!
//! Runs a preset for the given number of simulated seconds, driving the
//! frame pacer with a synthetic 60 Hz display clock, and logs status changes
//! and periodic statistics. Set `RUST_LOG=debug` to see individual fissions.

use chain_reaction::sim::{
    DamageZones, EffectRequest, Observer, Severity, StatsSnapshot, format_count,
};
use chain_reaction::{Config, FramePacer, Preset, SimResult, Simulation};

/// Display refresh interval of the synthetic clock (ms)
const DISPLAY_FRAME_MS: f64 = 1000.0 / 60.0;
const DEFAULT_SECONDS: f64 = 10.0;

/// Logs what a UI shell would display
#[derive(Default)]
struct LogObserver {
    status: Option<Severity>,
    last_stats: StatsSnapshot,
    last_zones: DamageZones,
    effects: usize,
}

impl Observer for LogObserver {
    fn request_effect(&mut self, request: &EffectRequest) {
        self.effects += 1;
        log::debug!(
            "Effect {:?} intensity {:.2} until {:.0}ms",
            request.kind,
            request.intensity,
            request.until_ms
        );
    }

    fn publish_stats(&mut self, stats: &StatsSnapshot) {
        self.last_stats = *stats;
    }

    fn publish_damage_zones(&mut self, zones: &DamageZones) {
        self.last_zones = *zones;
    }

    fn publish_status(&mut self, severity: Severity) {
        if self.status != Some(severity) {
            log::info!(
                "[{:>6.0}ms] status: {}",
                self.last_stats.elapsed_ms,
                severity.as_str()
            );
            self.status = Some(severity);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Chain Reaction (native) starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Embedders drive `Simulation` directly on wasm
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> SimResult<()> {
    let mut args = std::env::args().skip(1);
    let preset = match args.next() {
        Some(name) => Preset::parse(&name)?,
        None => Preset::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_SECONDS);

    let mut sim = Simulation::new(Config::from_preset(preset));
    let mut pacer = FramePacer::new();
    let mut observer = LogObserver::default();

    sim.start();

    let mut now_ms = 0.0;
    let mut next_report_ms = 1000.0;
    while now_ms < seconds * 1000.0 {
        sim.advance(&mut pacer, now_ms);
        sim.dispatch(&mut observer);

        if sim.state().time_ms >= next_report_ms {
            let stats = &observer.last_stats;
            log::info!(
                "fissions {} | neutrons {} | energy {:.2} kt | rate {}/s | particles {}",
                format_count(stats.fissions as f64),
                format_count(stats.active_neutrons as f64),
                stats.energy,
                format_count(stats.reaction_rate.floor()),
                sim.state().particles.len()
            );
            next_report_ms += 1000.0;
        }
        now_ms += DISPLAY_FRAME_MS;
    }

    let stats = sim.stats();
    let zones = sim.damage_zones();
    println!("Preset:            {} ({})", preset.label(), preset.info());
    println!("Fissions:          {}", format_count(stats.fissions as f64));
    println!("Neutrons released: {}", format_count(stats.total_neutrons as f64));
    println!("Yield:             {:.2} kt TNT", stats.energy);
    println!("Generations:       {}", stats.generation);
    println!("Effects requested: {}", observer.effects);
    println!(
        "Damage radii:      {:.1} / {:.1} / {:.1} / {:.1} km",
        zones.total_km, zones.severe_km, zones.moderate_km, zones.radiation_km
    );
    println!("Centre temp:       {}°C", format_count(zones.center_temp_c));
    println!("Cloud height:      {}m", format_count(zones.cloud_height_m));
    println!("Final status:      {}", sim.status().as_str());

    Ok(())
}
