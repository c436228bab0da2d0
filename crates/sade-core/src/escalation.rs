//! Escalation controller: the single claims-verification call.
//!
//! Fires only when the rule engine's candidate is `ACTION_REQUIRED`.
//! The at-most-once invariant is enforced structurally: invoking the
//! claims collaborator requires consuming an [`EscalationTicket`] by
//! value, and tickets are neither cloneable nor re-issuable for the same
//! run. There is no code path that loops, retries, or issues a second
//! call; a collaborator failure degrades to "no actions satisfied".
//!
//! # Invariants
//!
//! - At most one claims call per request, regardless of how many actions
//!   are required or how the collaborator responds.
//! - The ticket is only constructible inside this module from an
//!   `ACTION_REQUIRED` candidate's action list.
//! - A degraded outcome reports every required action unsatisfied and
//!   `satisfied == false`; it never fabricates resolution evidence.

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::collaborator::{ClaimsRequest, ClaimsResponse, ClaimsVerifier, WindContext};
use crate::decision::RequiredAction;
use crate::request::EntryRequest;
use crate::signal::SignalSet;

/// Derives the deterministic action identifier for a request.
///
/// `ACT-` followed by the first 16 hex characters of a SHA-256 over the
/// request identity tuple. Identical requests produce identical action
/// ids, which keeps the whole decision reproducible.
#[must_use]
pub fn derive_action_id(request: &EntryRequest) -> String {
    derive_action_id_parts([
        request.sade_zone_id.as_str(),
        request.pilot_id.as_str(),
        request.organization_id.as_str(),
        request.drone_id.as_str(),
        request.requested_entry_time_raw.as_str(),
    ])
}

/// Derives an action identifier from raw identity parts. Used for
/// requests that never passed validation but still need a stable id.
#[must_use]
pub fn derive_action_id_parts(parts: [&str; 5]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(20);
    hex.push_str("ACT-");
    for byte in &digest[..8] {
        use std::fmt::Write as _;
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Single-use authorization to invoke the claims collaborator.
///
/// Not `Clone`: consuming it is the only way to issue the call.
#[derive(Debug)]
pub struct EscalationTicket {
    request: ClaimsRequest,
    required: Vec<RequiredAction>,
}

impl EscalationTicket {
    /// The claims request this ticket will issue.
    #[must_use]
    pub fn request(&self) -> &ClaimsRequest {
        &self.request
    }

    /// The action id carried by the ticket.
    #[must_use]
    pub fn action_id(&self) -> &str {
        &self.request.action_id
    }
}

/// Result of the escalation call.
#[derive(Debug, Clone)]
pub struct EscalationOutcome {
    /// The claims verdict (degraded synthesis on collaborator failure).
    pub response: ClaimsResponse,
    /// Whether the collaborator failed and the outcome was degraded to
    /// "no actions satisfied".
    pub degraded: bool,
}

/// Prepares the single escalation ticket for an `ACTION_REQUIRED`
/// candidate.
#[must_use]
pub fn prepare(
    request: &EntryRequest,
    signals: &SignalSet,
    actions: &[RequiredAction],
) -> EscalationTicket {
    let claims_request = ClaimsRequest {
        action_id: derive_action_id(request),
        pilot_id: request.pilot_id.clone(),
        org_id: request.organization_id.clone(),
        drone_id: request.drone_id.clone(),
        entry_time: request.requested_entry_time_raw.clone(),
        required_actions: actions.iter().map(|a| a.as_str().to_string()).collect(),
        incident_codes: signals.incident_codes.clone(),
        wind_context: WindContext {
            wind_now_kt: signals.steady_wind_kt,
            gust_now_kt: signals.gust_wind_kt,
            demo_steady_max_kt: signals.demo_steady_max_kt,
            demo_gust_max_kt: signals.demo_gust_max_kt,
        },
    };
    EscalationTicket {
        request: claims_request,
        required: actions.to_vec(),
    }
}

/// Consumes the ticket and issues the claims call exactly once.
///
/// A collaborator failure is not retried: the outcome degrades to every
/// required action unsatisfied.
pub async fn escalate<C>(ticket: EscalationTicket, verifier: &C) -> EscalationOutcome
where
    C: ClaimsVerifier + ?Sized,
{
    let EscalationTicket { request, required } = ticket;
    debug!(
        action_id = %request.action_id,
        required = ?request.required_actions,
        "issuing claims verification"
    );
    match verifier.verify(&request).await {
        Ok(response) => EscalationOutcome {
            response,
            degraded: false,
        },
        Err(error) => {
            warn!(
                action_id = %request.action_id,
                error = %error,
                "claims verification failed; degrading to no actions satisfied"
            );
            EscalationOutcome {
                response: ClaimsResponse {
                    satisfied: false,
                    unsatisfied_actions: required
                        .iter()
                        .map(|a| a.as_str().to_string())
                        .collect(),
                    why: vec![format!("claims verification unavailable: {error}")],
                    why_prose: format!("claims verification unavailable: {error}"),
                    ..Default::default()
                },
                degraded: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::collaborator::CollaboratorError;
    use crate::request::{RawEntryRequest, validate};

    struct CountingVerifier {
        calls: AtomicUsize,
        result: Result<ClaimsResponse, CollaboratorError>,
    }

    #[async_trait]
    impl ClaimsVerifier for CountingVerifier {
        async fn verify(
            &self,
            _request: &ClaimsRequest,
        ) -> Result<ClaimsResponse, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
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

    fn signals() -> SignalSet {
        SignalSet {
            steady_wind_kt: 5.0,
            gust_wind_kt: 7.0,
            demo_steady_max_kt: 20.0,
            demo_gust_max_kt: 25.0,
            mfc_max_wind_kt: Some(30.0),
            mfc_payload_max_kg: Some(5.0),
            incident_codes: vec!["0001-001".into()],
            n_0100_0101: 0,
        }
    }

    #[test]
    fn action_id_is_deterministic_and_prefixed() {
        let a = derive_action_id(&request());
        let b = derive_action_id(&request());
        assert_eq!(a, b);
        assert!(a.starts_with("ACT-"));
        assert_eq!(a.len(), 4 + 16);
    }

    #[test]
    fn action_id_varies_with_identity() {
        let base = derive_action_id(&request());
        let mut other = request();
        other.drone_id = "DRONE-2".into();
        assert_ne!(base, derive_action_id(&other));
    }

    #[test]
    fn ticket_carries_wind_context_and_actions() {
        let ticket = prepare(
            &request(),
            &signals(),
            &[RequiredAction::ResolveHighSeverityIncidents],
        );
        assert_eq!(
            ticket.request().required_actions,
            vec!["RESOLVE_HIGH_SEVERITY_INCIDENTS"]
        );
        assert_eq!(ticket.request().wind_context.demo_gust_max_kt, 25.0);
        assert_eq!(ticket.request().incident_codes, vec!["0001-001"]);
    }

    #[tokio::test]
    async fn escalate_calls_the_verifier_exactly_once() {
        let verifier = CountingVerifier {
            calls: AtomicUsize::new(0),
            result: Ok(ClaimsResponse {
                satisfied: true,
                ..Default::default()
            }),
        };
        let ticket = prepare(
            &request(),
            &signals(),
            &[RequiredAction::ResolveHighSeverityIncidents],
        );
        let outcome = escalate(ticket, &verifier).await;
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
        assert!(!outcome.degraded);
        assert!(outcome.response.satisfied);
    }

    #[tokio::test]
    async fn collaborator_failure_degrades_to_all_unsatisfied() {
        let verifier = CountingVerifier {
            calls: AtomicUsize::new(0),
            result: Err(CollaboratorError::Timeout { elapsed_ms: 5000 }),
        };
        let ticket = prepare(
            &request(),
            &signals(),
            &[RequiredAction::SubmitRequiredFollowupReports],
        );
        let outcome = escalate(ticket, &verifier).await;
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
        assert!(outcome.degraded);
        assert!(!outcome.response.satisfied);
        assert_eq!(
            outcome.response.unsatisfied_actions,
            vec!["SUBMIT_REQUIRED_FOLLOWUP_REPORTS"]
        );
        assert!(outcome.response.resolved_incident_prefixes.is_empty());
    }
}
