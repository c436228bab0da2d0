//! Engine policy knobs.
//!
//! Defaults implement the fixed thresholds of the admission rule set:
//! near-envelope at 90% of the capped envelope, large exceedance at
//! 120%, pattern detection at three `0100`/`0101` incidents, and the
//! standard constraint set for marginal-wind approvals. Deployments may
//! tighten these through configuration; the engine treats the knobs as
//! read-only for the duration of a run.

use serde::{Deserialize, Serialize};

/// Thresholds and constraint values the rule engine evaluates against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineKnobs {
    /// Fraction of the capped envelope at which wind counts as "near".
    pub near_envelope_fraction: f64,

    /// Fraction of the capped envelope above which exceedance is "large"
    /// and terminally denied.
    pub large_exceedance_fraction: f64,

    /// Number of `0100`/`0101` incidents that constitutes a pattern.
    pub pattern_threshold: u64,

    /// Speed limit (m/s) attached to constrained approvals.
    pub constraint_speed_limit_mps: u32,

    /// Altitude ceiling (m) attached to constrained approvals.
    pub constraint_max_altitude_m: u32,
}

impl Default for EngineKnobs {
    fn default() -> Self {
        Self {
            near_envelope_fraction: 0.9,
            large_exceedance_fraction: 1.2,
            pattern_threshold: 3,
            constraint_speed_limit_mps: 7,
            constraint_max_altitude_m: 30,
        }
    }
}
