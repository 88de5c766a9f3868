//! Damage model derived from accumulated yield
//!
//! Pure functions of energy. Nothing here feeds back into the physics.

use serde::{Deserialize, Serialize};

/// Yield divisor inside the square root
const YIELD_SCALE: f64 = 15.0;
/// Radius multipliers: total destruction, severe, moderate, radiation
const ZONE_MULTIPLIERS: [f64; 4] = [0.8, 1.8, 3.2, 8.0];
const TEMP_PER_KT: f64 = 666_667.0;
const MAX_CENTER_TEMP: f64 = 1.0e8;
const CLOUD_PER_KT: f64 = 200.0;
const CLOUD_BASE: f64 = 3000.0;
const MAX_CLOUD_HEIGHT: f64 = 50_000.0;

/// Concentric damage radii and fireball figures
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DamageZones {
    pub total_km: f64,
    pub severe_km: f64,
    pub moderate_km: f64,
    pub radiation_km: f64,
    pub center_temp_c: f64,
    pub cloud_height_m: f64,
}

impl DamageZones {
    /// Compute all zones for an accumulated yield (kt TNT)
    pub fn from_energy(energy: f64) -> Self {
        let energy = energy.max(0.0);
        let k = (energy / YIELD_SCALE).sqrt();
        Self {
            total_km: k * ZONE_MULTIPLIERS[0],
            severe_km: k * ZONE_MULTIPLIERS[1],
            moderate_km: k * ZONE_MULTIPLIERS[2],
            radiation_km: k * ZONE_MULTIPLIERS[3],
            center_temp_c: center_temperature(energy),
            cloud_height_m: cloud_height(energy),
        }
    }
}

pub fn center_temperature(energy: f64) -> f64 {
    (energy * TEMP_PER_KT).min(MAX_CENTER_TEMP)
}

pub fn cloud_height(energy: f64) -> f64 {
    (energy * CLOUD_PER_KT + CLOUD_BASE).min(MAX_CLOUD_HEIGHT)
}

/// Energy gauge fill (0-100); full at 100 kt
pub fn energy_percent(energy: f64) -> f64 {
    energy.clamp(0.0, 100.0)
}

/// Compact count for HUD display: 950, 1.5K, 2.3M, 4.0G
pub fn format_count(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.1}G", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{}", value.floor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_energy() {
        let zones = DamageZones::from_energy(0.0);
        assert_eq!(zones.total_km, 0.0);
        assert_eq!(zones.radiation_km, 0.0);
        assert_eq!(zones.center_temp_c, 0.0);
        assert_eq!(zones.cloud_height_m, 3000.0);
    }

    #[test]
    fn test_known_values() {
        // sqrt(15 / 15) = 1
        let zones = DamageZones::from_energy(15.0);
        assert!((zones.total_km - 0.8).abs() < 1e-12);
        assert!((zones.severe_km - 1.8).abs() < 1e-12);
        assert!((zones.moderate_km - 3.2).abs() < 1e-12);
        assert!((zones.radiation_km - 8.0).abs() < 1e-12);
        assert!((zones.center_temp_c - 15.0 * 666_667.0).abs() < 1e-6);
        assert!((zones.cloud_height_m - 6000.0).abs() < 1e-9);
    }

    #[test]
    fn test_saturation() {
        let zones = DamageZones::from_energy(1_000.0);
        assert_eq!(zones.center_temp_c, 1.0e8);
        assert_eq!(zones.cloud_height_m, 50_000.0);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1_500.0), "1.5K");
        assert_eq!(format_count(2_300_000.0), "2.3M");
        assert_eq!(format_count(4.0e9), "4.0G");
    }

    #[test]
    fn test_energy_percent_clamps() {
        assert_eq!(energy_percent(-1.0), 0.0);
        assert_eq!(energy_percent(42.0), 42.0);
        assert_eq!(energy_percent(250.0), 100.0);
    }
}
