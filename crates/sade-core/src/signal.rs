//! Signal Gateway: concurrent collaborator retrieval and normalization.
//!
//! Issues the environment and reputation calls concurrently (neither
//! depends on the other's result), waits for both, and normalizes their
//! responses into a flat [`SignalSet`]. The stage fails closed: a failed
//! call, or a response missing any of the four wind scalars required
//! downstream, aborts the run with a `RETRY_SIGNAL_RETRIEVAL` outcome
//! and no further stage executes. Manufacturer limits are NOT gateway
//! prerequisites; a missing limit flows through to the rule engine so
//! the correct denial code is chosen.

use thiserror::Error;
use tracing::{debug, warn};

use crate::collaborator::{
    CollaboratorError, EnvironmentProvider, EnvironmentQuery, EnvironmentResponse,
    ReputationProvider, ReputationQuery, ReputationResponse,
};
use crate::request::EntryRequest;

/// The flat, normalized signal set consumed by the risk computer and the
/// rule engine. Recomputed every run, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    /// Current steady wind, knots.
    pub steady_wind_kt: f64,
    /// Current gust wind, knots.
    pub gust_wind_kt: f64,
    /// Best demonstrated steady wind, knots.
    pub demo_steady_max_kt: f64,
    /// Best demonstrated gust wind, knots.
    pub demo_gust_max_kt: f64,
    /// Manufacturer maximum wind, knots. `None` when missing or
    /// non-numeric; resolved by rule 1.
    pub mfc_max_wind_kt: Option<f64>,
    /// Manufacturer maximum payload, kilograms. `None` when missing or
    /// non-numeric; resolved by rule 1.
    pub mfc_payload_max_kg: Option<f64>,
    /// Incident codes across the session record, verbatim.
    pub incident_codes: Vec<String>,
    /// Count of `0100`/`0101` family incidents, verbatim from the
    /// reputation collaborator.
    pub n_0100_0101: u64,
}

/// The gateway's full output: normalized signals plus the verbatim
/// responses for the audit trail.
#[derive(Debug, Clone)]
pub struct GatheredSignals {
    /// Normalized signal set.
    pub signals: SignalSet,
    /// Verbatim environment response.
    pub environment: EnvironmentResponse,
    /// Verbatim reputation response.
    pub reputation: ReputationResponse,
}

/// Why signal retrieval failed. Always resolves to the fail-closed
/// `RETRY_SIGNAL_RETRIEVAL` outcome.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SignalFailure {
    /// The environment collaborator call failed.
    #[error("environment retrieval failed: {source}")]
    Environment {
        /// The collaborator failure.
        #[source]
        source: CollaboratorError,
    },

    /// The reputation collaborator call failed.
    #[error("reputation retrieval failed: {source}")]
    Reputation {
        /// The collaborator failure.
        #[source]
        source: CollaboratorError,
    },

    /// A response parsed but lacks wind scalars required downstream.
    #[error("signal field(s) missing or non-numeric: {}", fields.join(", "))]
    MissingScalars {
        /// External names of the absent fields.
        fields: Vec<&'static str>,
    },
}

/// Issues both collaborator calls concurrently and normalizes the
/// responses.
///
/// # Errors
///
/// Returns [`SignalFailure`] when either call fails or any of the four
/// required wind scalars is missing; the caller resolves this into the
/// `RETRY_SIGNAL_RETRIEVAL` outcome without running further stages.
pub async fn gather<E, R>(
    environment: &E,
    reputation: &R,
    request: &EntryRequest,
) -> Result<GatheredSignals, SignalFailure>
where
    E: EnvironmentProvider + ?Sized,
    R: ReputationProvider + ?Sized,
{
    let env_query = EnvironmentQuery {
        pilot_id: request.pilot_id.clone(),
        org_id: request.organization_id.clone(),
        drone_id: request.drone_id.clone(),
        entry_time: request.requested_entry_time_raw.clone(),
        request_type: request.request_type.as_str().to_string(),
        request_payload: request.request_payload.clone(),
    };
    let rep_query = ReputationQuery {
        pilot_id: request.pilot_id.clone(),
        org_id: request.organization_id.clone(),
        drone_id: request.drone_id.clone(),
        entry_time: request.requested_entry_time_raw.clone(),
    };

    let (env_result, rep_result) =
        tokio::join!(environment.fetch(&env_query), reputation.fetch(&rep_query));

    let environment = env_result.map_err(|source| {
        warn!(error = %source, "environment retrieval failed; failing closed");
        SignalFailure::Environment { source }
    })?;
    let reputation = rep_result.map_err(|source| {
        warn!(error = %source, "reputation retrieval failed; failing closed");
        SignalFailure::Reputation { source }
    })?;

    let signals = normalize(&environment, &reputation)?;
    debug!(
        steady_wind_kt = signals.steady_wind_kt,
        gust_wind_kt = signals.gust_wind_kt,
        demo_steady_max_kt = signals.demo_steady_max_kt,
        demo_gust_max_kt = signals.demo_gust_max_kt,
        "signals normalized"
    );

    Ok(GatheredSignals {
        signals,
        environment,
        reputation,
    })
}

/// Normalizes the two responses into a [`SignalSet`], enforcing the four
/// required wind scalars.
fn normalize(
    environment: &EnvironmentResponse,
    reputation: &ReputationResponse,
) -> Result<SignalSet, SignalFailure> {
    let present = |value: Option<f64>| value.is_some_and(f64::is_finite);
    let mut missing: Vec<&'static str> = Vec::new();
    if !present(environment.raw_conditions.wind) {
        missing.push("wind");
    }
    if !present(environment.raw_conditions.wind_gust) {
        missing.push("wind_gust");
    }
    if !present(reputation.demo_steady_max_kt) {
        missing.push("demo_steady_max_kt");
    }
    if !present(reputation.demo_gust_max_kt) {
        missing.push("demo_gust_max_kt");
    }
    if !missing.is_empty() {
        warn!(fields = ?missing, "required wind scalars absent; failing closed");
        return Err(SignalFailure::MissingScalars { fields: missing });
    }

    // Presence established above; the unwraps cannot fire.
    Ok(SignalSet {
        steady_wind_kt: environment.raw_conditions.wind.unwrap_or_default(),
        gust_wind_kt: environment.raw_conditions.wind_gust.unwrap_or_default(),
        demo_steady_max_kt: reputation.demo_steady_max_kt.unwrap_or_default(),
        demo_gust_max_kt: reputation.demo_gust_max_kt.unwrap_or_default(),
        mfc_max_wind_kt: environment.manufacturer_fc.mfc_max_wind_kt,
        mfc_payload_max_kg: environment.manufacturer_fc.mfc_payload_max_kg,
        incident_codes: reputation.incident_codes.clone(),
        n_0100_0101: reputation.n_0100_0101,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::collaborator::{ManufacturerFlightConstraints, RawConditions};
    use crate::request::{RawEntryRequest, validate};

    struct FixedEnvironment(Result<EnvironmentResponse, CollaboratorError>);
    struct FixedReputation(Result<ReputationResponse, CollaboratorError>);

    #[async_trait]
    impl EnvironmentProvider for FixedEnvironment {
        async fn fetch(
            &self,
            _query: &EnvironmentQuery,
        ) -> Result<EnvironmentResponse, CollaboratorError> {
            self.0.clone()
        }
    }

    #[async_trait]
    impl ReputationProvider for FixedReputation {
        async fn fetch(
            &self,
            _query: &ReputationQuery,
        ) -> Result<ReputationResponse, CollaboratorError> {
            self.0.clone()
        }
    }

    fn request() -> EntryRequest {
        validate(&RawEntryRequest {
            sade_zone_id: "ZONE-1".into(),
            pilot_id: "PILOT-1".into(),
            organization_id: "ORG-1".into(),
            drone_id: "DRONE-1".into(),
            payload: "2".into(),
            requested_entry_time: "2026-01-26T14:00:00Z".into(),
            request_type: "ZONE".into(),
            request_payload: None,
        })
        .unwrap()
    }

    fn complete_environment() -> EnvironmentResponse {
        EnvironmentResponse {
            manufacturer_fc: ManufacturerFlightConstraints {
                mfc_payload_max_kg: Some(5.0),
                mfc_max_wind_kt: Some(30.0),
                ..Default::default()
            },
            raw_conditions: RawConditions {
                wind: Some(5.0),
                wind_gust: Some(7.0),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn complete_reputation() -> ReputationResponse {
        ReputationResponse {
            demo_steady_max_kt: Some(20.0),
            demo_gust_max_kt: Some(25.0),
            n_0100_0101: 1,
            incident_codes: vec!["0100-001".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn normalizes_complete_responses() {
        let gathered = gather(
            &FixedEnvironment(Ok(complete_environment())),
            &FixedReputation(Ok(complete_reputation())),
            &request(),
        )
        .await
        .unwrap();
        assert_eq!(gathered.signals.steady_wind_kt, 5.0);
        assert_eq!(gathered.signals.demo_gust_max_kt, 25.0);
        assert_eq!(gathered.signals.mfc_max_wind_kt, Some(30.0));
        assert_eq!(gathered.signals.n_0100_0101, 1);
    }

    #[tokio::test]
    async fn environment_failure_fails_closed() {
        let result = gather(
            &FixedEnvironment(Err(CollaboratorError::Unavailable {
                reason: "connection refused".into(),
            })),
            &FixedReputation(Ok(complete_reputation())),
            &request(),
        )
        .await;
        assert!(matches!(result, Err(SignalFailure::Environment { .. })));
    }

    #[tokio::test]
    async fn missing_wind_scalars_fail_closed_with_field_names() {
        let mut env = complete_environment();
        env.raw_conditions.wind_gust = None;
        let mut rep = complete_reputation();
        rep.demo_steady_max_kt = None;

        let result = gather(
            &FixedEnvironment(Ok(env)),
            &FixedReputation(Ok(rep)),
            &request(),
        )
        .await;
        match result {
            Err(SignalFailure::MissingScalars { fields }) => {
                assert_eq!(fields, vec!["wind_gust", "demo_steady_max_kt"]);
            }
            other => panic!("expected MissingScalars, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_manufacturer_limits_are_not_a_gateway_failure() {
        let mut env = complete_environment();
        env.manufacturer_fc.mfc_max_wind_kt = None;
        env.manufacturer_fc.mfc_payload_max_kg = None;

        let gathered = gather(
            &FixedEnvironment(Ok(env)),
            &FixedReputation(Ok(complete_reputation())),
            &request(),
        )
        .await
        .unwrap();
        assert_eq!(gathered.signals.mfc_max_wind_kt, None);
        assert_eq!(gathered.signals.mfc_payload_max_kg, None);
    }
}
