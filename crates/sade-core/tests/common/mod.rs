//! Scripted collaborators for driving the full engine in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sade_core::collaborator::{
    ClaimsRequest, ClaimsResponse, ClaimsVerifier, CollaboratorError, EnvironmentProvider,
    EnvironmentQuery, EnvironmentResponse, ManufacturerFlightConstraints, RawConditions,
    ReputationProvider, ReputationQuery, ReputationResponse,
};
use sade_core::request::RawEntryRequest;

/// Environment provider that returns a fixed response and counts calls.
pub struct ScriptedEnvironment {
    pub response: Result<EnvironmentResponse, CollaboratorError>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl EnvironmentProvider for ScriptedEnvironment {
    async fn fetch(
        &self,
        _query: &EnvironmentQuery,
    ) -> Result<EnvironmentResponse, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// Reputation provider that returns a fixed response and counts calls.
pub struct ScriptedReputation {
    pub response: Result<ReputationResponse, CollaboratorError>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ReputationProvider for ScriptedReputation {
    async fn fetch(
        &self,
        _query: &ReputationQuery,
    ) -> Result<ReputationResponse, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// Claims verifier that returns a fixed response and counts calls.
pub struct ScriptedClaims {
    pub response: Result<ClaimsResponse, CollaboratorError>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ClaimsVerifier for ScriptedClaims {
    async fn verify(&self, _request: &ClaimsRequest) -> Result<ClaimsResponse, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// A complete, well-formed entry request.
pub fn entry_request() -> RawEntryRequest {
    RawEntryRequest {
        sade_zone_id: "ZONE-123".into(),
        pilot_id: "FA-01234567".into(),
        organization_id: "ORG-789".into(),
        drone_id: "DRONE-001".into(),
        payload: "2".into(),
        requested_entry_time: "2026-01-26T14:00:00Z".into(),
        request_type: "ZONE".into(),
        request_payload: None,
    }
}

/// Environment response with the given wind and manufacturer limits.
pub fn environment(
    wind: f64,
    gust: f64,
    mfc_wind: Option<f64>,
    mfc_payload: Option<f64>,
) -> EnvironmentResponse {
    EnvironmentResponse {
        manufacturer_fc: ManufacturerFlightConstraints {
            manufacturer: Some("AeroWorks".into()),
            model: Some("AW-210".into()),
            category: Some("small-uas".into()),
            mfc_payload_max_kg: mfc_payload,
            mfc_max_wind_kt: mfc_wind,
        },
        raw_conditions: RawConditions {
            wind: Some(wind),
            wind_gust: Some(gust),
            precipitation: Some("none".into()),
            visibility: Some(10.0),
            light_conditions: Some("daylight".into()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Reputation response with the given demonstrated envelope and
/// incident codes.
pub fn reputation(
    demo_steady: Option<f64>,
    demo_gust: Option<f64>,
    incident_codes: &[&str],
    n_0100_0101: u64,
) -> ReputationResponse {
    ReputationResponse {
        drp_sessions_count: 12,
        demo_steady_max_kt: demo_steady,
        demo_gust_max_kt: demo_gust,
        incident_codes: incident_codes.iter().map(|s| (*s).to_string()).collect(),
        n_0100_0101,
        ..Default::default()
    }
}

/// Claims response builder.
pub fn claims(
    satisfied: bool,
    resolved: &[&str],
    unresolved: &[&str],
    satisfied_actions: &[&str],
    unsatisfied_actions: &[&str],
) -> ClaimsResponse {
    ClaimsResponse {
        satisfied,
        resolved_incident_prefixes: resolved.iter().map(|s| (*s).to_string()).collect(),
        unresolved_incident_prefixes: unresolved.iter().map(|s| (*s).to_string()).collect(),
        satisfied_actions: satisfied_actions.iter().map(|s| (*s).to_string()).collect(),
        unsatisfied_actions: unsatisfied_actions.iter().map(|s| (*s).to_string()).collect(),
        ..Default::default()
    }
}

/// Builds an engine plus call counters for each collaborator.
pub fn engine(
    env: Result<EnvironmentResponse, CollaboratorError>,
    rep: Result<ReputationResponse, CollaboratorError>,
    claims_response: Result<ClaimsResponse, CollaboratorError>,
) -> (
    sade_core::AdmissionEngine<ScriptedEnvironment, ScriptedReputation, ScriptedClaims>,
    Arc<AtomicUsize>,
    Arc<AtomicUsize>,
    Arc<AtomicUsize>,
) {
    let env_calls = Arc::new(AtomicUsize::new(0));
    let rep_calls = Arc::new(AtomicUsize::new(0));
    let claims_calls = Arc::new(AtomicUsize::new(0));
    let engine = sade_core::AdmissionEngine::new(
        ScriptedEnvironment {
            response: env,
            calls: Arc::clone(&env_calls),
        },
        ScriptedReputation {
            response: rep,
            calls: Arc::clone(&rep_calls),
        },
        ScriptedClaims {
            response: claims_response,
            calls: Arc::clone(&claims_calls),
        },
    );
    (engine, env_calls, rep_calls, claims_calls)
}
