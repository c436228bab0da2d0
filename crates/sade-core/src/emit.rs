//! Decision emitter: final assembly and output-shape enforcement.
//!
//! Takes the final [`Decision`] and the accumulated audit pieces,
//! renders the flat record and canonical status message, and enforces
//! the output-shape invariants: exactly one variant, per-variant fields
//! only, non-empty explanation, and a rule trace that reflects every
//! stage that ran.

use tracing::info;

use crate::audit::AuditTrace;
use crate::decision::{Decision, DecisionRecord};

/// The engine's complete output for one request.
#[derive(Debug, Clone)]
pub struct AdmissionOutcome {
    /// The final decision.
    pub decision: Decision,
    /// Flat output record with the external field names.
    pub record: DecisionRecord,
    /// Full audit object.
    pub audit: AuditTrace,
}

/// Shape violations detectable on a rendered record. Exists for
/// verification; [`Decision::to_record`] cannot produce a violating
/// record.
#[must_use]
pub fn record_shape_violations(record: &DecisionRecord) -> Vec<&'static str> {
    let mut violations = Vec::new();
    if record.explanation.trim().is_empty() {
        violations.push("explanation must be non-empty");
    }
    if record.decision_type != "APPROVED-CONSTRAINTS" && !record.constraints.is_empty() {
        violations.push("constraints only legal for APPROVED-CONSTRAINTS");
    }
    if record.decision_type != "ACTION-REQUIRED"
        && (record.action_id.is_some() || !record.actions.is_empty())
    {
        violations.push("action_id/actions only legal for ACTION-REQUIRED");
    }
    if record.decision_type == "ACTION-REQUIRED" && record.action_id.is_none() {
        violations.push("ACTION-REQUIRED requires action_id");
    }
    if record.decision_type != "DENIED" && record.denial_code.is_some() {
        violations.push("denial_code only legal for DENIED");
    }
    if record.decision_type == "DENIED" && record.denial_code.is_none() {
        violations.push("DENIED requires denial_code");
    }
    violations
}

/// Assembles the final outcome and enforces the shape invariants.
#[must_use]
pub fn assemble(decision: Decision, audit: AuditTrace) -> AdmissionOutcome {
    let record = decision.to_record();
    debug_assert!(
        record_shape_violations(&record).is_empty(),
        "decision record violates shape invariants: {:?}",
        record_shape_violations(&record)
    );
    info!(
        decision = record.decision_type.as_str(),
        sade_message = record.sade_message.as_str(),
        rule_trace = ?audit.rule_trace,
        "admission decision emitted"
    );
    AdmissionOutcome {
        decision,
        record,
        audit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DenialCode;

    #[test]
    fn assembled_records_have_no_shape_violations() {
        let decisions = vec![
            Decision::Approved {
                explanation: "clear".into(),
            },
            Decision::ActionRequired {
                action_id: "ACT-1".into(),
                actions: vec!["PROVE_WIND_CAPABILITY".into()],
                explanation: "pending proof".into(),
            },
            Decision::Denied {
                code: DenialCode::WindExceedsMfcMax,
                explanation: "over limit".into(),
            },
        ];
        for decision in decisions {
            let outcome = assemble(decision, AuditTrace::default());
            assert!(record_shape_violations(&outcome.record).is_empty());
        }
    }

    #[test]
    fn violation_detector_catches_hand_built_bad_records() {
        let mut record = Decision::Approved {
            explanation: "ok".into(),
        }
        .to_record();
        record.denial_code = Some("MFC_DATA_UNAVAILABLE".into());
        record.explanation = String::new();
        let violations = record_shape_violations(&record);
        assert!(violations.contains(&"denial_code only legal for DENIED"));
        assert!(violations.contains(&"explanation must be non-empty"));
    }
}
