use thiserror::Error;

/// Crate-wide result type alias.
pub type SimResult<T> = std::result::Result<T, SimError>;

/// Errors raised at the simulation's construction boundaries.
///
/// Nothing inside a tick can fail; invalid particles and configurations are
/// rejected before they reach the particle list.
#[derive(Debug, Error)]
pub enum SimError {
    /// A particle was built with values that break an entity invariant.
    #[error("invalid particle: {0}")]
    InvalidParticle(String),

    /// A configuration value is outside its documented range.
    #[error("invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Preset name did not match any known preset.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
