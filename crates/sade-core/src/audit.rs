//! Audit trail assembly.
//!
//! Every decision carries a full audit object: a copy of the entry
//! request, the verbatim response of every collaborator consulted, the
//! claims echo with its `called` flag, and the ordered list of rule
//! identifiers fired. Re-running the engine with identical collaborator
//! responses reproduces the trace exactly.

use serde::{Deserialize, Serialize};

use crate::collaborator::{ClaimsResponse, EnvironmentResponse, ReputationResponse};
use crate::request::EntryRequest;

/// Copy of the entry request with the external field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRequestEcho {
    /// Target SADE zone identifier.
    pub sade_zone_id: String,
    /// Pilot registration identifier.
    pub pilot_id: String,
    /// Operating organization identifier.
    pub organization_id: String,
    /// Drone identifier.
    pub drone_id: String,
    /// Payload string as received.
    pub payload: String,
    /// Requested entry time as received.
    pub requested_entry_time: String,
    /// Request type as received.
    pub request_type: String,
}

impl EntryRequestEcho {
    /// Builds the echo from a validated request.
    #[must_use]
    pub fn from_request(request: &EntryRequest) -> Self {
        Self {
            sade_zone_id: request.sade_zone_id.clone(),
            pilot_id: request.pilot_id.clone(),
            organization_id: request.organization_id.clone(),
            drone_id: request.drone_id.clone(),
            payload: request.payload.clone(),
            requested_entry_time: request.requested_entry_time_raw.clone(),
            request_type: request.request_type.as_str().to_string(),
        }
    }
}

/// Claims collaborator echo: `called` flag plus the full response when
/// the escalation path ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsEcho {
    /// Whether the claims collaborator was invoked this run.
    pub called: bool,
    /// The verbatim response fields (defaults when not called).
    #[serde(flatten)]
    pub response: ClaimsResponse,
}

impl ClaimsEcho {
    /// Echo for a run that escalated.
    #[must_use]
    pub fn called(response: ClaimsResponse) -> Self {
        Self {
            called: true,
            response,
        }
    }

    /// Echo for a run that never escalated.
    #[must_use]
    pub fn not_called() -> Self {
        Self::default()
    }
}

/// The full audit object attached to every decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// Entry request copy.
    pub entry_request: EntryRequestEcho,
    /// Verbatim environment response; absent when the run terminated
    /// before the gateway completed.
    pub environment_agent: Option<EnvironmentResponse>,
    /// Verbatim reputation response; absent when the run terminated
    /// before the gateway completed.
    pub reputation_agent: Option<ReputationResponse>,
    /// Claims echo with `called` flag.
    pub claims_agent: ClaimsEcho,
    /// Ordered rule identifiers fired.
    pub rule_trace: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_echo_defaults_to_not_called() {
        let echo = ClaimsEcho::not_called();
        assert!(!echo.called);
        assert!(!echo.response.satisfied);
        assert!(echo.response.unsatisfied_actions.is_empty());
    }

    #[test]
    fn claims_echo_flattens_response_fields() {
        let echo = ClaimsEcho::called(ClaimsResponse {
            satisfied: true,
            resolved_incident_prefixes: vec!["0011".into()],
            ..Default::default()
        });
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["called"], true);
        assert_eq!(json["satisfied"], true);
        assert_eq!(json["resolved_incident_prefixes"][0], "0011");
    }

    #[test]
    fn audit_trace_serializes_rule_order() {
        let trace = AuditTrace {
            rule_trace: vec!["RULE-006".into(), "REEVAL-001".into()],
            ..Default::default()
        };
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["rule_trace"][0], "RULE-006");
        assert_eq!(json["rule_trace"][1], "REEVAL-001");
    }
}
