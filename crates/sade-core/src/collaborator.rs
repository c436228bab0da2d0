//! Collaborator interfaces and wire types.
//!
//! The engine depends on three external collaborators, modelled only at
//! their interface boundary:
//!
//! - [`EnvironmentProvider`]: current conditions + manufacturer flight
//!   constraints,
//! - [`ReputationProvider`]: historical reliability and incident record,
//! - [`ClaimsVerifier`]: verification of required remedial actions.
//!
//! Responses are echoed verbatim into the audit trail. Numeric fields use
//! lenient deserialization (number, numeric string, or null) because
//! upstream systems deliver limits as strings in some deployments; a
//! value that cannot be read as a finite float normalizes to `None` and
//! resolves through the engine's fail-closed paths rather than through a
//! deserialization error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lenient float deserialization: accepts a JSON number, a numeric
/// string, or null. Non-finite and unparseable values become `None`.
pub(crate) mod lenient_f64 {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(read_f64))
    }

    pub(crate) fn read_f64(value: &serde_json::Value) -> Option<f64> {
        let parsed = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|v| v.is_finite())
    }
}

/// Failure reported by a collaborator call.
///
/// The engine never retries a failed call within a run; each stage maps
/// the failure to its fail-closed outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CollaboratorError {
    /// The collaborator could not be reached or returned a transport
    /// failure.
    #[error("collaborator unavailable: {reason}")]
    Unavailable {
        /// Transport-level failure description.
        reason: String,
    },

    /// The collaborator response could not be parsed.
    #[error("collaborator response malformed: {reason}")]
    Malformed {
        /// Parse failure description.
        reason: String,
    },

    /// The call exceeded the caller-owned deadline.
    #[error("collaborator call timed out after {elapsed_ms} ms")]
    Timeout {
        /// Elapsed time at expiry.
        elapsed_ms: u64,
    },
}

// =============================================================================
// Environment collaborator
// =============================================================================

/// Query sent to the environment collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentQuery {
    /// Pilot registration identifier.
    pub pilot_id: String,
    /// Organization identifier.
    pub org_id: String,
    /// Drone identifier.
    pub drone_id: String,
    /// Requested entry time (RFC 3339, verbatim).
    pub entry_time: String,
    /// Request type name (ZONE, REGION, ROUTE).
    pub request_type: String,
    /// Geometry payload for REGION/ROUTE requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_payload: Option<serde_json::Value>,
}

/// Manufacturer flight constraints, sourced verbatim from the
/// environment collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerFlightConstraints {
    /// Airframe manufacturer name.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Airframe model.
    #[serde(default)]
    pub model: Option<String>,
    /// Airframe category.
    #[serde(default)]
    pub category: Option<String>,
    /// Maximum rated payload in kilograms.
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub mfc_payload_max_kg: Option<f64>,
    /// Maximum rated wind in knots.
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub mfc_max_wind_kt: Option<f64>,
}

/// Spatial constraints reported with current conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialConstraints {
    /// Airspace class, e.g. "Class E".
    #[serde(default)]
    pub airspace_class: Option<String>,
    /// Active no-fly zones.
    #[serde(default)]
    pub no_fly_zones: Vec<String>,
    /// Active restricted areas.
    #[serde(default)]
    pub restricted_areas: Vec<String>,
}

/// Current measured conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConditions {
    /// Steady wind in knots.
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub wind: Option<f64>,
    /// Gust wind in knots.
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub wind_gust: Option<f64>,
    /// Precipitation level: none, light, moderate, heavy.
    #[serde(default)]
    pub precipitation: Option<String>,
    /// Visibility in nautical miles.
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub visibility: Option<f64>,
    /// Light conditions: daylight, dusk, dawn, night.
    #[serde(default)]
    pub light_conditions: Option<String>,
    /// Spatial constraints in effect.
    #[serde(default)]
    pub spatial_constraints: SpatialConstraints,
}

/// Advisory risk assessment attached to a collaborator response. Echoed
/// into the audit trail; the engine does not branch on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// LOW, MEDIUM, or HIGH.
    #[serde(default)]
    pub risk_level: String,
    /// Factors the collaborator considers blocking.
    #[serde(default)]
    pub blocking_factors: Vec<String>,
    /// Factors the collaborator considers marginal.
    #[serde(default)]
    pub marginal_factors: Vec<String>,
    /// Factors the collaborator considers confidence-building.
    #[serde(default)]
    pub confidence_factors: Vec<String>,
}

/// Full environment collaborator response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentResponse {
    /// Manufacturer flight constraints for the drone.
    #[serde(default)]
    pub manufacturer_fc: ManufacturerFlightConstraints,
    /// Current measured conditions.
    #[serde(default)]
    pub raw_conditions: RawConditions,
    /// Advisory risk assessment.
    #[serde(default)]
    pub risk_assessment: RiskAssessment,
    /// Suggested operational constraints.
    #[serde(default)]
    pub constraint_suggestions: Vec<String>,
    /// Advisory recommendation: LOW, MEDIUM, HIGH, UNKNOWN.
    #[serde(default)]
    pub recommendation: String,
    /// Prose form of the recommendation.
    #[serde(default)]
    pub recommendation_prose: String,
    /// Prose rationale.
    #[serde(default)]
    pub why_prose: String,
    /// Structured rationale entries.
    #[serde(default)]
    pub why: Vec<String>,
}

/// Retrieves current conditions and manufacturer limits for a request.
#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
    /// Fetches environment data for the given query.
    async fn fetch(&self, query: &EnvironmentQuery) -> Result<EnvironmentResponse, CollaboratorError>;
}

// =============================================================================
// Reputation collaborator
// =============================================================================

/// Query sent to the reputation collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ReputationQuery {
    /// Pilot registration identifier.
    pub pilot_id: String,
    /// Organization identifier.
    pub org_id: String,
    /// Drone identifier.
    pub drone_id: String,
    /// Requested entry time, used as the reference for recency windows.
    pub entry_time: String,
}

/// A single incident record from the historical record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentReport {
    /// `hhhh-sss` incident code.
    #[serde(default)]
    pub incident_code: String,
    /// Category name.
    #[serde(default)]
    pub incident_category: String,
    /// Subcategory name.
    #[serde(default)]
    pub incident_subcategory: String,
    /// Severity name: LOW, MEDIUM, HIGH.
    #[serde(default)]
    pub severity: String,
    /// Whether a verified follow-up resolves the incident.
    #[serde(default)]
    pub resolved: bool,
    /// Session in which the incident occurred.
    #[serde(default)]
    pub session_id: String,
    /// ISO 8601 incident date.
    #[serde(default)]
    pub date: String,
}

/// Aggregated incident analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentAnalysis {
    /// Per-incident records.
    #[serde(default)]
    pub incidents: Vec<IncidentReport>,
    /// Whether any incident lacks a verified follow-up.
    #[serde(default)]
    pub unresolved_incidents_present: bool,
    /// Total incident count.
    #[serde(default)]
    pub total_incidents: u64,
    /// Incidents within the 30-day recency window.
    #[serde(default)]
    pub recent_incidents_count: u64,
}

/// Full reputation collaborator response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReputationResponse {
    /// Incident analysis.
    #[serde(default)]
    pub incident_analysis: IncidentAnalysis,
    /// Advisory risk assessment.
    #[serde(default)]
    pub risk_assessment: RiskAssessment,
    /// Number of recorded flight sessions for the DPO.
    #[serde(default)]
    pub drp_sessions_count: u64,
    /// Best demonstrated steady wind, knots.
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub demo_steady_max_kt: Option<f64>,
    /// Best demonstrated gust wind, knots.
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub demo_gust_max_kt: Option<f64>,
    /// All incident codes across sessions (with repeats).
    #[serde(default)]
    pub incident_codes: Vec<String>,
    /// Count of `0100`/`0101` family incidents; carried verbatim into
    /// pattern detection.
    #[serde(default)]
    pub n_0100_0101: u64,
    /// Advisory recommendation: LOW, MEDIUM, HIGH, UNKNOWN.
    #[serde(default)]
    pub recommendation: String,
    /// Prose form of the recommendation.
    #[serde(default)]
    pub recommendation_prose: String,
    /// Prose rationale.
    #[serde(default)]
    pub why_prose: String,
    /// Structured rationale entries.
    #[serde(default)]
    pub why: Vec<String>,
}

/// Retrieves the historical reliability and incident record for a DPO.
#[async_trait]
pub trait ReputationProvider: Send + Sync {
    /// Fetches reputation data for the given query.
    async fn fetch(&self, query: &ReputationQuery) -> Result<ReputationResponse, CollaboratorError>;
}

// =============================================================================
// Claims collaborator
// =============================================================================

/// Wind context forwarded to the claims collaborator for capability
/// verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindContext {
    /// Current steady wind, knots.
    pub wind_now_kt: f64,
    /// Current gust wind, knots.
    pub gust_now_kt: f64,
    /// Demonstrated steady maximum, knots.
    pub demo_steady_max_kt: f64,
    /// Demonstrated gust maximum, knots.
    pub demo_gust_max_kt: f64,
}

/// Request issued to the claims collaborator; constructed exactly once
/// per run by the escalation controller.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimsRequest {
    /// Deterministic action identifier for this escalation.
    pub action_id: String,
    /// Pilot registration identifier.
    pub pilot_id: String,
    /// Organization identifier.
    pub org_id: String,
    /// Drone identifier.
    pub drone_id: String,
    /// Requested entry time (RFC 3339, verbatim).
    pub entry_time: String,
    /// Actions the candidate verdict requires.
    pub required_actions: Vec<String>,
    /// Incident codes in the session record.
    pub incident_codes: Vec<String>,
    /// Wind context for capability verification.
    pub wind_context: WindContext,
}

/// Claims collaborator verdict. Ground truth: the engine never
/// re-derives or overrides these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsResponse {
    /// Whether every required action is satisfied.
    #[serde(default)]
    pub satisfied: bool,
    /// Incident prefixes with verified resolution.
    #[serde(default)]
    pub resolved_incident_prefixes: Vec<String>,
    /// Incident prefixes still lacking verified resolution.
    #[serde(default)]
    pub unresolved_incident_prefixes: Vec<String>,
    /// Required actions verified satisfied.
    #[serde(default)]
    pub satisfied_actions: Vec<String>,
    /// Required actions not verified satisfied.
    #[serde(default)]
    pub unsatisfied_actions: Vec<String>,
    /// Prose recommendation.
    #[serde(default)]
    pub recommendation_prose: String,
    /// Prose rationale.
    #[serde(default)]
    pub why_prose: String,
    /// Structured rationale entries.
    #[serde(default)]
    pub why: Vec<String>,
}

/// Verifies whether required remedial actions are satisfied with real
/// evidence.
#[async_trait]
pub trait ClaimsVerifier: Send + Sync {
    /// Verifies the required actions in the request.
    async fn verify(&self, request: &ClaimsRequest) -> Result<ClaimsResponse, CollaboratorError>;
}
