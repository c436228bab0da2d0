//! Decision types, canonical status rendering, and the flat output
//! record.
//!
//! The four mutually-exclusive decision shapes are a sum type with
//! per-variant payload; only the fields legal for a variant exist on it.
//! [`DecisionRecord`] is the serialized projection with the external
//! field names, and its shape invariants hold by construction:
//! `constraints` only for APPROVED-CONSTRAINTS, `action_id`/`actions`
//! only for ACTION-REQUIRED, `denial_code` only for DENIED.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Denial codes for terminal and claims-derived denials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum DenialCode {
    /// Manufacturer wind or payload limit missing or non-numeric.
    MfcDataUnavailable,
    /// Payload string is not a finite non-negative weight.
    InvalidPayloadWeight,
    /// Payload exceeds the manufacturer maximum.
    PayloadExceedsMfcMax,
    /// Current wind exceeds the manufacturer maximum.
    WindExceedsMfcMax,
    /// Current wind exceeds 120% of the demonstrated envelope cap.
    WindExceedsDemonstratedCapability,
    /// A High-severity incident remains unresolved after claims
    /// verification.
    UnresolvedHighSeverityIncident,
    /// Required follow-up reports were not verified.
    MissingFollowupReports,
    /// Wind capability was not proven while the envelope is exceeded.
    WindCapabilityNotProven,
}

impl DenialCode {
    /// Canonical code string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MfcDataUnavailable => "MFC_DATA_UNAVAILABLE",
            Self::InvalidPayloadWeight => "INVALID_PAYLOAD_WEIGHT",
            Self::PayloadExceedsMfcMax => "PAYLOAD_EXCEEDS_MFC_MAX",
            Self::WindExceedsMfcMax => "WIND_EXCEEDS_MFC_MAX",
            Self::WindExceedsDemonstratedCapability => "WIND_EXCEEDS_DEMONSTRATED_CAPABILITY",
            Self::UnresolvedHighSeverityIncident => "UNRESOLVED_HIGH_SEVERITY_INCIDENT",
            Self::MissingFollowupReports => "MISSING_FOLLOWUP_REPORTS",
            Self::WindCapabilityNotProven => "WIND_CAPABILITY_NOT_PROVEN",
        }
    }
}

impl fmt::Display for DenialCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remedial actions the engine can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredAction {
    /// The entry request itself is malformed.
    #[serde(rename = "FIX_INVALID_ENTRY_REQUEST")]
    FixInvalidEntryRequest,
    /// Signal retrieval failed; a fresh request is the retry mechanism.
    #[serde(rename = "RETRY_SIGNAL_RETRIEVAL")]
    RetrySignalRetrieval,
    /// Resolve High-severity incidents with verified evidence.
    #[serde(rename = "RESOLVE_HIGH_SEVERITY_INCIDENTS")]
    ResolveHighSeverityIncidents,
    /// Submit the follow-up reports the incident record requires.
    #[serde(rename = "SUBMIT_REQUIRED_FOLLOWUP_REPORTS")]
    SubmitRequiredFollowupReports,
    /// Resolve `0100`/`0101` incidents and mitigate current wind risk.
    #[serde(rename = "RESOLVE_0100_0101_INCIDENTS_AND_MITIGATE_WIND_RISK")]
    Resolve01000101IncidentsAndMitigateWindRisk,
    /// Resolve a pattern of `0100`/`0101` incidents.
    #[serde(rename = "RESOLVE_PATTERN_OF_0100_0101")]
    ResolvePatternOf01000101,
    /// Prove wind capability beyond the demonstrated envelope.
    #[serde(rename = "PROVE_WIND_CAPABILITY")]
    ProveWindCapability,
}

impl RequiredAction {
    /// Canonical action string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixInvalidEntryRequest => "FIX_INVALID_ENTRY_REQUEST",
            Self::RetrySignalRetrieval => "RETRY_SIGNAL_RETRIEVAL",
            Self::ResolveHighSeverityIncidents => "RESOLVE_HIGH_SEVERITY_INCIDENTS",
            Self::SubmitRequiredFollowupReports => "SUBMIT_REQUIRED_FOLLOWUP_REPORTS",
            Self::Resolve01000101IncidentsAndMitigateWindRisk => {
                "RESOLVE_0100_0101_INCIDENTS_AND_MITIGATE_WIND_RISK"
            }
            Self::ResolvePatternOf01000101 => "RESOLVE_PATTERN_OF_0100_0101",
            Self::ProveWindCapability => "PROVE_WIND_CAPABILITY",
        }
    }
}

impl fmt::Display for RequiredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operational constraint attached to a constrained approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// Ground-speed limit in metres per second.
    SpeedLimit {
        /// Limit value, m/s.
        mps: u32,
    },
    /// Altitude ceiling in metres.
    MaxAltitude {
        /// Ceiling value, m.
        meters: u32,
    },
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpeedLimit { mps } => write!(f, "SPEED_LIMIT({mps}m/s)"),
            Self::MaxAltitude { meters } => write!(f, "MAX_ALTITUDE({meters}m)"),
        }
    }
}

/// The final admission decision. Exactly one variant per request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Entry allowed without conditions.
    Approved {
        /// Evidence-citing explanation.
        explanation: String,
    },
    /// Entry allowed under operational constraints.
    ApprovedWithConstraints {
        /// The constraints in effect.
        constraints: Vec<Constraint>,
        /// Evidence-citing explanation.
        explanation: String,
    },
    /// Entry blocked pending remedial actions.
    ActionRequired {
        /// Deterministic action identifier.
        action_id: String,
        /// Required action strings, verbatim where claims-derived.
        actions: Vec<String>,
        /// Evidence-citing explanation.
        explanation: String,
    },
    /// Entry denied outright.
    Denied {
        /// The denial code.
        code: DenialCode,
        /// Evidence-citing explanation.
        explanation: String,
    },
}

impl Decision {
    /// External type name for the variant.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Approved { .. } => "APPROVED",
            Self::ApprovedWithConstraints { .. } => "APPROVED-CONSTRAINTS",
            Self::ActionRequired { .. } => "ACTION-REQUIRED",
            Self::Denied { .. } => "DENIED",
        }
    }

    /// The explanation carried by any variant.
    #[must_use]
    pub fn explanation(&self) -> &str {
        match self {
            Self::Approved { explanation }
            | Self::ApprovedWithConstraints { explanation, .. }
            | Self::ActionRequired { explanation, .. }
            | Self::Denied { explanation, .. } => explanation,
        }
    }

    /// Renders the canonical status string:
    ///
    /// - `APPROVED`
    /// - `APPROVED-CONSTRAINTS,(c1,c2,...)`
    /// - `<action-id>,ACTION-REQUIRED,(a1,a2,...)`
    /// - `DENIED,<code>,<explanation>`
    #[must_use]
    pub fn sade_message(&self) -> String {
        match self {
            Self::Approved { .. } => "APPROVED".to_string(),
            Self::ApprovedWithConstraints { constraints, .. } => {
                let rendered: Vec<String> =
                    constraints.iter().map(ToString::to_string).collect();
                format!("APPROVED-CONSTRAINTS,({})", rendered.join(","))
            }
            Self::ActionRequired {
                action_id, actions, ..
            } => format!("{action_id},ACTION-REQUIRED,({})", actions.join(",")),
            Self::Denied { code, explanation } => {
                format!("DENIED,{code},{explanation}")
            }
        }
    }

    /// Projects the decision into the flat output record.
    #[must_use]
    pub fn to_record(&self) -> DecisionRecord {
        let mut record = DecisionRecord {
            decision_type: self.type_name().to_string(),
            sade_message: self.sade_message(),
            constraints: Vec::new(),
            action_id: None,
            actions: Vec::new(),
            denial_code: None,
            explanation: self.explanation().to_string(),
        };
        match self {
            Self::Approved { .. } => {}
            Self::ApprovedWithConstraints { constraints, .. } => {
                record.constraints = constraints.iter().map(ToString::to_string).collect();
            }
            Self::ActionRequired {
                action_id, actions, ..
            } => {
                record.action_id = Some(action_id.clone());
                record.actions = actions.clone();
            }
            Self::Denied { code, .. } => {
                record.denial_code = Some(code.as_str().to_string());
            }
        }
        record
    }
}

/// Flat decision record with the external field names. Shape invariants
/// hold by construction from [`Decision::to_record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// APPROVED, APPROVED-CONSTRAINTS, ACTION-REQUIRED, or DENIED.
    #[serde(rename = "type")]
    pub decision_type: String,
    /// Canonical status string.
    pub sade_message: String,
    /// Constraint strings; non-empty only for APPROVED-CONSTRAINTS.
    pub constraints: Vec<String>,
    /// Action identifier; present only for ACTION-REQUIRED.
    pub action_id: Option<String>,
    /// Required actions; non-empty only for ACTION-REQUIRED.
    pub actions: Vec<String>,
    /// Denial code; present only for DENIED.
    pub denial_code: Option<String>,
    /// Evidence-citing explanation, always non-empty.
    pub explanation: String,
}
