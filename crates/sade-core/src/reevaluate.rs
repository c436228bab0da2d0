//! Re-evaluation engine: the final verdict after claims verification.
//!
//! Consumes only the claims collaborator's normalized fields plus the
//! envelope flags computed earlier in the run. Applied in order, first
//! match wins. There is no code path that recomputes `satisfied` or the
//! prefix/action lists: the claims result is ground truth, and residual
//! unsatisfied actions are surfaced verbatim, never invented.

use tracing::debug;

use crate::collaborator::ClaimsResponse;
use crate::decision::{Decision, DenialCode};
use crate::envelope::RiskFlags;
use crate::incident::is_high_severity_prefix;
use crate::policy::EngineKnobs;
use crate::rules::standard_constraints;

/// A High-severity prefix remains unresolved.
pub const REEVAL_UNRESOLVED_HIGH: &str = "REEVAL-001";
/// Follow-up reports remain unsatisfied.
pub const REEVAL_MISSING_FOLLOWUPS: &str = "REEVAL-002";
/// Wind capability unproven while the envelope is exceeded.
pub const REEVAL_WIND_UNPROVEN: &str = "REEVAL-003";
/// Residual unsatisfied actions surface verbatim.
pub const REEVAL_RESIDUAL_ACTIONS: &str = "REEVAL-004";
/// All actions satisfied; envelope constraint rule re-applied.
pub const REEVAL_SATISFIED: &str = "REEVAL-005";

/// The final verdict and the re-evaluation rule that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalVerdict {
    /// Identifier of the re-evaluation rule that fired.
    pub rule_id: &'static str,
    /// The final decision.
    pub decision: Decision,
}

/// Derives the final verdict strictly from the claims result.
#[must_use]
pub fn reevaluate(
    claims: &ClaimsResponse,
    flags: &RiskFlags,
    knobs: &EngineKnobs,
    action_id: &str,
) -> FinalVerdict {
    // 1. Any High-severity prefix still unresolved is a terminal denial.
    if let Some(prefix) = claims
        .unresolved_incident_prefixes
        .iter()
        .find(|p| is_high_severity_prefix(p.as_str()))
    {
        debug!(rule_id = REEVAL_UNRESOLVED_HIGH, prefix = %prefix, "re-evaluation fired");
        return FinalVerdict {
            rule_id: REEVAL_UNRESOLVED_HIGH,
            decision: Decision::Denied {
                code: DenialCode::UnresolvedHighSeverityIncident,
                explanation: format!(
                    "the claims verifier reports High-severity incident prefix {prefix} \
                     still unresolved"
                ),
            },
        };
    }

    // 2. Missing follow-up reports.
    if claims
        .unsatisfied_actions
        .iter()
        .any(|a| a == "SUBMIT_REQUIRED_FOLLOWUP_REPORTS")
    {
        debug!(rule_id = REEVAL_MISSING_FOLLOWUPS, "re-evaluation fired");
        return FinalVerdict {
            rule_id: REEVAL_MISSING_FOLLOWUPS,
            decision: Decision::Denied {
                code: DenialCode::MissingFollowupReports,
                explanation: "the claims verifier reports the required follow-up reports \
                              were not submitted"
                    .to_string(),
            },
        };
    }

    // 3. Wind capability unproven while the envelope is exceeded.
    if flags.exceeds_envelope
        && claims
            .unsatisfied_actions
            .iter()
            .any(|a| a == "PROVE_WIND_CAPABILITY")
    {
        debug!(rule_id = REEVAL_WIND_UNPROVEN, "re-evaluation fired");
        return FinalVerdict {
            rule_id: REEVAL_WIND_UNPROVEN,
            decision: Decision::Denied {
                code: DenialCode::WindCapabilityNotProven,
                explanation: "current wind exceeds the demonstrated envelope and the \
                              claims verifier found no proof of wind capability"
                    .to_string(),
            },
        };
    }

    // 4. Any remaining unsatisfied actions surface verbatim.
    if !claims.unsatisfied_actions.is_empty() {
        debug!(
            rule_id = REEVAL_RESIDUAL_ACTIONS,
            actions = ?claims.unsatisfied_actions,
            "re-evaluation fired"
        );
        return FinalVerdict {
            rule_id: REEVAL_RESIDUAL_ACTIONS,
            decision: Decision::ActionRequired {
                action_id: action_id.to_string(),
                actions: claims.unsatisfied_actions.clone(),
                explanation: format!(
                    "the claims verifier reports {} action(s) still unsatisfied",
                    claims.unsatisfied_actions.len()
                ),
            },
        };
    }

    // 5. Fully satisfied: re-apply only the envelope constraint rule.
    if claims.satisfied {
        debug!(rule_id = REEVAL_SATISFIED, near_envelope = flags.near_envelope, "re-evaluation fired");
        let decision = if flags.near_envelope {
            Decision::ApprovedWithConstraints {
                constraints: standard_constraints(knobs),
                explanation: "the claims verifier confirmed all required actions; current \
                              wind remains near the demonstrated envelope, so entry is \
                              constrained"
                    .to_string(),
            }
        } else {
            Decision::Approved {
                explanation: "the claims verifier confirmed all required actions satisfied"
                    .to_string(),
            }
        };
        return FinalVerdict {
            rule_id: REEVAL_SATISFIED,
            decision,
        };
    }

    // Inconsistent claims result: not satisfied, yet nothing listed as
    // unsatisfied. Fail closed to a pending-action outcome, surfacing the
    // (empty) unsatisfied list verbatim rather than inventing actions.
    debug!(rule_id = REEVAL_RESIDUAL_ACTIONS, "re-evaluation fired on inconsistent claims result");
    FinalVerdict {
        rule_id: REEVAL_RESIDUAL_ACTIONS,
        decision: Decision::ActionRequired {
            action_id: action_id.to_string(),
            actions: Vec::new(),
            explanation: "the claims verifier reported the requirements unsatisfied \
                          without naming outstanding actions; entry remains blocked \
                          pending verification"
                .to_string(),
        },
    }
}
