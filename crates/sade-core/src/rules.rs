//! Rule engine: the ordered admission rule table.
//!
//! A finite, strictly ordered table evaluated first match wins; later
//! rules are never evaluated once a rule fires. The table is a fixed
//! array of predicate/outcome entries so evaluation order is structural,
//! not conventional.
//!
//! Rules 1–5 are terminal DENIED exits: the escalation controller must
//! never be invoked when one of them fires. Rules 6–10 produce a
//! candidate that is not yet final; an `ACTION_REQUIRED` candidate feeds
//! the escalation path.
//!
//! # Rule identifiers
//!
//! Stage identifiers (`VALIDATE-001`, `SIGNAL-001`) mark pre-rule
//! terminations; `RULE-001` through `RULE-011` are the table entries
//! below. All identifiers are recorded in the audit rule trace.

use tracing::debug;

use crate::decision::{Constraint, DenialCode, RequiredAction};
use crate::envelope::RiskFlags;
use crate::policy::EngineKnobs;
use crate::signal::SignalSet;

/// Request validation failed before any collaborator call.
pub const RULE_VALIDATION_FAILED: &str = "VALIDATE-001";
/// Signal retrieval failed before flags were computed.
pub const RULE_SIGNAL_RETRIEVAL_FAILED: &str = "SIGNAL-001";
/// Manufacturer wind or payload limit missing or non-numeric.
pub const RULE_MFC_DATA_UNAVAILABLE: &str = "RULE-001";
/// Payload unparseable.
pub const RULE_INVALID_PAYLOAD: &str = "RULE-002";
/// Payload exceeds the manufacturer maximum.
pub const RULE_PAYLOAD_OVER_MFC: &str = "RULE-003";
/// Wind exceeds the manufacturer maximum.
pub const RULE_WIND_OVER_MFC: &str = "RULE-004";
/// Wind exceeds 120% of the demonstrated envelope cap.
pub const RULE_WIND_LARGE_EXCEEDANCE: &str = "RULE-005";
/// High-severity incidents present.
pub const RULE_HIGH_SEVERITY_INCIDENTS: &str = "RULE-006";
/// Only Low-severity incidents present.
pub const RULE_LOW_SEVERITY_FOLLOWUPS: &str = "RULE-007";
/// Medium-family incidents present.
pub const RULE_MEDIUM_FAMILY: &str = "RULE-008";
/// Wind exceeds the demonstrated envelope.
pub const RULE_ENVELOPE_EXCEEDED: &str = "RULE-009";
/// Wind near the demonstrated envelope.
pub const RULE_NEAR_ENVELOPE: &str = "RULE-010";
/// Default approval.
pub const RULE_DEFAULT_APPROVED: &str = "RULE-011";

/// Everything a rule predicate may consult.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Normalized signals.
    pub signals: &'a SignalSet,
    /// Derived risk flags.
    pub flags: &'a RiskFlags,
    /// Engine thresholds.
    pub knobs: &'a EngineKnobs,
    /// The raw payload string, for denial explanations.
    pub payload_raw: &'a str,
}

/// The rule engine's candidate verdict. DENIED candidates are terminal;
/// `ACTION_REQUIRED` candidates feed the escalation path.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// Terminal denial; escalation is forbidden.
    Denied {
        /// Denial code.
        code: DenialCode,
        /// Evidence-citing explanation.
        explanation: String,
    },
    /// Pending remedial actions; escalates to claims verification.
    ActionRequired {
        /// Actions the DPO must satisfy.
        actions: Vec<RequiredAction>,
        /// Evidence-citing explanation.
        explanation: String,
    },
    /// Approval under operational constraints; final without escalation.
    ApprovedWithConstraints {
        /// Constraints in effect.
        constraints: Vec<Constraint>,
        /// Evidence-citing explanation.
        explanation: String,
    },
    /// Unconditional approval; final without escalation.
    Approved {
        /// Evidence-citing explanation.
        explanation: String,
    },
}

impl Candidate {
    /// Whether this candidate is a terminal denial (rules 1–5).
    #[must_use]
    pub const fn is_terminal_denial(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// The initial verdict: the first rule that fired and its candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialVerdict {
    /// Identifier of the rule that fired.
    pub rule_id: &'static str,
    /// The candidate outcome.
    pub candidate: Candidate,
}

/// One entry of the ordered rule table. `eval` returns `Some` when the
/// rule fires.
struct Rule {
    id: &'static str,
    eval: fn(&RuleContext<'_>) -> Option<Candidate>,
}

/// The ordered rule table. Array position IS evaluation order.
const RULES: &[Rule] = &[
    Rule {
        id: RULE_MFC_DATA_UNAVAILABLE,
        eval: |ctx| {
            (ctx.signals.mfc_max_wind_kt.is_none() || ctx.signals.mfc_payload_max_kg.is_none())
                .then(|| Candidate::Denied {
                    code: DenialCode::MfcDataUnavailable,
                    explanation: "manufacturer flight constraints from the environment \
                                  provider are missing or non-numeric (wind or payload limit)"
                        .to_string(),
                })
        },
    },
    Rule {
        id: RULE_INVALID_PAYLOAD,
        eval: |ctx| {
            ctx.flags.payload_kg.is_none().then(|| Candidate::Denied {
                code: DenialCode::InvalidPayloadWeight,
                explanation: format!(
                    "payload {:?} does not parse as a finite non-negative weight in kg",
                    ctx.payload_raw
                ),
            })
        },
    },
    Rule {
        id: RULE_PAYLOAD_OVER_MFC,
        eval: |ctx| {
            let payload_kg = ctx.flags.payload_kg?;
            let max_kg = ctx.signals.mfc_payload_max_kg?;
            (payload_kg > max_kg).then(|| Candidate::Denied {
                code: DenialCode::PayloadExceedsMfcMax,
                explanation: format!(
                    "payload {payload_kg} kg exceeds the manufacturer maximum {max_kg} kg \
                     reported by the environment provider"
                ),
            })
        },
    },
    Rule {
        id: RULE_WIND_OVER_MFC,
        eval: |ctx| {
            let limit = ctx.signals.mfc_max_wind_kt?;
            (ctx.signals.steady_wind_kt > limit || ctx.signals.gust_wind_kt > limit).then(|| {
                Candidate::Denied {
                    code: DenialCode::WindExceedsMfcMax,
                    explanation: format!(
                        "current wind (steady {} kt, gust {} kt) exceeds the manufacturer \
                         wind limit {limit} kt reported by the environment provider",
                        ctx.signals.steady_wind_kt, ctx.signals.gust_wind_kt
                    ),
                }
            })
        },
    },
    Rule {
        id: RULE_WIND_LARGE_EXCEEDANCE,
        eval: |ctx| {
            ctx.flags.exceeds_large.then(|| Candidate::Denied {
                code: DenialCode::WindExceedsDemonstratedCapability,
                explanation: format!(
                    "current wind (steady {} kt, gust {} kt) exceeds {:.0}% of the \
                     demonstrated envelope cap (steady cap {} kt, gust cap {} kt) from the \
                     reputation record and manufacturer limits",
                    ctx.signals.steady_wind_kt,
                    ctx.signals.gust_wind_kt,
                    ctx.knobs.large_exceedance_fraction * 100.0,
                    ctx.flags.steady_cap_kt,
                    ctx.flags.gust_cap_kt
                ),
            })
        },
    },
    Rule {
        id: RULE_HIGH_SEVERITY_INCIDENTS,
        eval: |ctx| {
            ctx.flags.has_high_severity.then(|| Candidate::ActionRequired {
                actions: vec![RequiredAction::ResolveHighSeverityIncidents],
                explanation: "the reputation record contains High-severity incident(s); \
                              resolution with verified evidence is required"
                    .to_string(),
            })
        },
    },
    Rule {
        id: RULE_LOW_SEVERITY_FOLLOWUPS,
        eval: |ctx| {
            ctx.flags
                .has_only_low_severity
                .then(|| Candidate::ActionRequired {
                    actions: vec![RequiredAction::SubmitRequiredFollowupReports],
                    explanation: "the reputation record contains only Low-severity \
                                  incident(s); the required follow-up reports are outstanding"
                        .to_string(),
                })
        },
    },
    Rule {
        id: RULE_MEDIUM_FAMILY,
        eval: |ctx| {
            if !ctx.flags.has_medium_family {
                return None;
            }
            if ctx.flags.exceeds_envelope || ctx.flags.near_envelope {
                Some(Candidate::ActionRequired {
                    actions: vec![RequiredAction::Resolve01000101IncidentsAndMitigateWindRisk],
                    explanation: format!(
                        "0100/0101 incident(s) in the reputation record combined with \
                         current wind (steady {} kt, gust {} kt) at or beyond the \
                         demonstrated envelope cap",
                        ctx.signals.steady_wind_kt, ctx.signals.gust_wind_kt
                    ),
                })
            } else if ctx.flags.pattern_present {
                Some(Candidate::ActionRequired {
                    actions: vec![RequiredAction::ResolvePatternOf01000101],
                    explanation: format!(
                        "the reputation record shows {} incidents in the 0100/0101 family, \
                         at or above the pattern threshold of {}",
                        ctx.signals.n_0100_0101, ctx.knobs.pattern_threshold
                    ),
                })
            } else {
                Some(Candidate::ApprovedWithConstraints {
                    constraints: standard_constraints(ctx.knobs),
                    explanation: "0100/0101 incident(s) in the reputation record with \
                                  current wind inside the demonstrated envelope; entry \
                                  constrained"
                        .to_string(),
                })
            }
        },
    },
    Rule {
        id: RULE_ENVELOPE_EXCEEDED,
        eval: |ctx| {
            ctx.flags.exceeds_envelope.then(|| Candidate::ActionRequired {
                actions: vec![RequiredAction::ProveWindCapability],
                explanation: format!(
                    "current wind (steady {} kt, gust {} kt) exceeds the demonstrated \
                     envelope cap (steady cap {} kt, gust cap {} kt); capability proof \
                     required",
                    ctx.signals.steady_wind_kt,
                    ctx.signals.gust_wind_kt,
                    ctx.flags.steady_cap_kt,
                    ctx.flags.gust_cap_kt
                ),
            })
        },
    },
    Rule {
        id: RULE_NEAR_ENVELOPE,
        eval: |ctx| {
            ctx.flags.near_envelope.then(|| Candidate::ApprovedWithConstraints {
                constraints: standard_constraints(ctx.knobs),
                explanation: format!(
                    "current wind (steady {} kt, gust {} kt) is within {:.0}% of the \
                     demonstrated envelope cap (steady cap {} kt, gust cap {} kt); entry \
                     constrained",
                    ctx.signals.steady_wind_kt,
                    ctx.signals.gust_wind_kt,
                    ctx.knobs.near_envelope_fraction * 100.0,
                    ctx.flags.steady_cap_kt,
                    ctx.flags.gust_cap_kt
                ),
            })
        },
    },
    Rule {
        id: RULE_DEFAULT_APPROVED,
        eval: |_ctx| {
            Some(Candidate::Approved {
                explanation: "manufacturer limits, current wind, demonstrated envelope, \
                              and incident record from the environment and reputation \
                              providers are all clear"
                    .to_string(),
            })
        },
    },
];

/// The standard constraint set for marginal-wind approvals.
#[must_use]
pub fn standard_constraints(knobs: &EngineKnobs) -> Vec<Constraint> {
    vec![
        Constraint::SpeedLimit {
            mps: knobs.constraint_speed_limit_mps,
        },
        Constraint::MaxAltitude {
            meters: knobs.constraint_max_altitude_m,
        },
    ]
}

/// Evaluates the ordered rule table; the first rule that fires wins.
#[must_use]
pub fn evaluate(ctx: &RuleContext<'_>) -> InitialVerdict {
    for rule in RULES {
        if let Some(candidate) = (rule.eval)(ctx) {
            debug!(rule_id = rule.id, "admission rule fired");
            if candidate.is_terminal_denial()
                && (ctx.flags.has_high_severity
                    || ctx.flags.has_medium_family
                    || ctx.flags.has_only_low_severity)
            {
                // Precedence shadows the incident-based rules here; log
                // the overlap, never change the outcome.
                debug!(
                    rule_id = rule.id,
                    has_high_severity = ctx.flags.has_high_severity,
                    has_medium_family = ctx.flags.has_medium_family,
                    has_only_low_severity = ctx.flags.has_only_low_severity,
                    "terminal denial shadows incident conditions"
                );
            }
            return InitialVerdict {
                rule_id: rule.id,
                candidate,
            };
        }
    }
    // RULE-011 always fires; the table cannot fall through.
    unreachable!("admission rule table has a default rule")
}
