//! Admission engine: the per-request decision pipeline.
//!
//! Drives the stage sequence for one entry request:
//!
//! ```text
//! validate -> gather signals (concurrent pair) -> compute flags ->
//! rule table -> [escalate once] -> re-evaluate -> emit
//! ```
//!
//! Everything after the signal gateway is strictly sequential. The
//! engine holds no cross-request mutable state; every entity is created
//! fresh per request and discarded once the outcome is emitted, so a
//! cancelled run leaves no partial effects behind.
//!
//! # Invariants
//!
//! - Rules 1–5 terminal denials never reach the escalation controller.
//! - The claims collaborator is invoked at most once per request
//!   (single-use ticket, see [`crate::escalation`]).
//! - The final verdict after escalation derives strictly from the
//!   claims result; no stage re-reasons over it.
//! - Identical collaborator responses reproduce the identical decision
//!   and rule trace.

use tracing::debug;

use crate::audit::{AuditTrace, ClaimsEcho, EntryRequestEcho};
use crate::collaborator::{ClaimsVerifier, EnvironmentProvider, ReputationProvider};
use crate::decision::Decision;
use crate::emit::{AdmissionOutcome, assemble};
use crate::envelope;
use crate::escalation;
use crate::policy::EngineKnobs;
use crate::request::{RawEntryRequest, validate};
use crate::reevaluate::reevaluate;
use crate::rules::{
    Candidate, RULE_SIGNAL_RETRIEVAL_FAILED, RULE_VALIDATION_FAILED, RuleContext, evaluate,
};
use crate::signal;

/// The admission decision engine. Stateless between calls; collaborators
/// and knobs are fixed at construction.
pub struct AdmissionEngine<E, R, C> {
    environment: E,
    reputation: R,
    claims: C,
    knobs: EngineKnobs,
}

impl<E, R, C> AdmissionEngine<E, R, C>
where
    E: EnvironmentProvider,
    R: ReputationProvider,
    C: ClaimsVerifier,
{
    /// Creates an engine with the default knobs.
    pub fn new(environment: E, reputation: R, claims: C) -> Self {
        Self::with_knobs(environment, reputation, claims, EngineKnobs::default())
    }

    /// Creates an engine with explicit knobs.
    pub fn with_knobs(environment: E, reputation: R, claims: C, knobs: EngineKnobs) -> Self {
        Self {
            environment,
            reputation,
            claims,
            knobs,
        }
    }

    /// The knobs in effect.
    #[must_use]
    pub fn knobs(&self) -> &EngineKnobs {
        &self.knobs
    }

    /// Decides one entry request. Total: every input, including a
    /// malformed one, yields a complete outcome with audit trace.
    pub async fn decide(&self, raw: &RawEntryRequest) -> AdmissionOutcome {
        let mut rule_trace: Vec<String> = Vec::new();

        // Stage 1: validation, before any collaborator call.
        let request = match validate(raw) {
            Ok(request) => request,
            Err(error) => {
                debug!(error = %error, "entry request failed validation");
                rule_trace.push(RULE_VALIDATION_FAILED.to_string());
                let audit = AuditTrace {
                    entry_request: EntryRequestEcho {
                        sade_zone_id: raw.sade_zone_id.clone(),
                        pilot_id: raw.pilot_id.clone(),
                        organization_id: raw.organization_id.clone(),
                        drone_id: raw.drone_id.clone(),
                        payload: raw.payload.clone(),
                        requested_entry_time: raw.requested_entry_time.clone(),
                        request_type: raw.request_type.clone(),
                    },
                    claims_agent: ClaimsEcho::not_called(),
                    rule_trace,
                    ..Default::default()
                };
                return assemble(
                    Decision::ActionRequired {
                        action_id: escalation::derive_action_id_parts([
                            raw.sade_zone_id.as_str(),
                            raw.pilot_id.as_str(),
                            raw.organization_id.as_str(),
                            raw.drone_id.as_str(),
                            raw.requested_entry_time.as_str(),
                        ]),
                        actions: vec!["FIX_INVALID_ENTRY_REQUEST".to_string()],
                        explanation: format!("entry request failed validation: {error}"),
                    },
                    audit,
                );
            }
        };

        let entry_echo = EntryRequestEcho::from_request(&request);

        // Stage 2: signal gateway; both collaborator calls run
        // concurrently and the stage fails closed.
        let gathered =
            match signal::gather(&self.environment, &self.reputation, &request).await {
                Ok(gathered) => gathered,
                Err(failure) => {
                    rule_trace.push(RULE_SIGNAL_RETRIEVAL_FAILED.to_string());
                    let audit = AuditTrace {
                        entry_request: entry_echo,
                        claims_agent: ClaimsEcho::not_called(),
                        rule_trace,
                        ..Default::default()
                    };
                    return assemble(
                        Decision::ActionRequired {
                            action_id: escalation::derive_action_id(&request),
                            actions: vec!["RETRY_SIGNAL_RETRIEVAL".to_string()],
                            explanation: format!(
                                "signal retrieval failed before risk evaluation: {failure}"
                            ),
                        },
                        audit,
                    );
                }
            };

        // Stage 3: derived risk flags, pure.
        let flags = envelope::compute(&gathered.signals, &request.payload, &self.knobs);

        // Stage 4: ordered rule table, first match wins.
        let initial = evaluate(&RuleContext {
            signals: &gathered.signals,
            flags: &flags,
            knobs: &self.knobs,
            payload_raw: &request.payload,
        });
        rule_trace.push(initial.rule_id.to_string());

        let (decision, claims_echo) = match initial.candidate {
            // Rules 1–5: terminal denial, escalation forbidden.
            Candidate::Denied { code, explanation } => {
                (Decision::Denied { code, explanation }, ClaimsEcho::not_called())
            }
            // Final without escalation.
            Candidate::Approved { explanation } => {
                (Decision::Approved { explanation }, ClaimsEcho::not_called())
            }
            Candidate::ApprovedWithConstraints {
                constraints,
                explanation,
            } => (
                Decision::ApprovedWithConstraints {
                    constraints,
                    explanation,
                },
                ClaimsEcho::not_called(),
            ),
            // Stage 5 + 6: escalate exactly once, then re-evaluate
            // strictly from the claims result.
            Candidate::ActionRequired { actions, .. } => {
                let ticket = escalation::prepare(&request, &gathered.signals, &actions);
                let action_id = ticket.action_id().to_string();
                let outcome = escalation::escalate(ticket, &self.claims).await;
                let verdict = reevaluate(&outcome.response, &flags, &self.knobs, &action_id);
                rule_trace.push(verdict.rule_id.to_string());
                (verdict.decision, ClaimsEcho::called(outcome.response))
            }
        };

        // Stage 7: emit with the full audit object.
        let audit = AuditTrace {
            entry_request: entry_echo,
            environment_agent: Some(gathered.environment),
            reputation_agent: Some(gathered.reputation),
            claims_agent: claims_echo,
            rule_trace,
        };
        assemble(decision, audit)
    }
}
