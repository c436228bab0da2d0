//! End-to-end admission scenarios through the full engine pipeline.

mod common;

use std::sync::atomic::Ordering;

use common::{claims, engine, entry_request, environment, reputation};

#[tokio::test]
async fn calm_conditions_clean_record_approves() {
    // steady 5 kt, gust 7 kt, demo 20/25, mfc wind 30, payload 2 of 5 kg.
    let (engine, _, _, claims_calls) = engine(
        Ok(environment(5.0, 7.0, Some(30.0), Some(5.0))),
        Ok(reputation(Some(20.0), Some(25.0), &[], 0)),
        Ok(claims(true, &[], &[], &[], &[])),
    );
    let outcome = engine.decide(&entry_request()).await;

    assert_eq!(outcome.record.decision_type, "APPROVED");
    assert_eq!(outcome.record.sade_message, "APPROVED");
    assert!(outcome.record.constraints.is_empty());
    assert!(outcome.record.action_id.is_none());
    assert!(outcome.record.denial_code.is_none());
    assert!(!outcome.record.explanation.is_empty());
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-011"]);
    assert!(!outcome.audit.claims_agent.called);
    assert_eq!(claims_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wind_near_envelope_approves_with_constraints() {
    // steady 18 of cap 20, gust 19 of cap 20 (mfc 25): near 0.9x.
    let (engine, _, _, claims_calls) = engine(
        Ok(environment(18.0, 19.0, Some(25.0), Some(5.0))),
        Ok(reputation(Some(20.0), Some(20.0), &[], 0)),
        Ok(claims(true, &[], &[], &[], &[])),
    );
    let outcome = engine.decide(&entry_request()).await;

    assert_eq!(outcome.record.decision_type, "APPROVED-CONSTRAINTS");
    assert_eq!(
        outcome.record.sade_message,
        "APPROVED-CONSTRAINTS,(SPEED_LIMIT(7m/s),MAX_ALTITUDE(30m))"
    );
    assert_eq!(
        outcome.record.constraints,
        vec!["SPEED_LIMIT(7m/s)", "MAX_ALTITUDE(30m)"]
    );
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-010"]);
    assert_eq!(claims_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn payload_over_manufacturer_max_denies_without_escalation() {
    // payload 12 kg against a 10 kg manufacturer limit.
    let mut request = entry_request();
    request.payload = "12".into();
    let (engine, _, _, claims_calls) = engine(
        Ok(environment(5.0, 7.0, Some(30.0), Some(10.0))),
        Ok(reputation(Some(20.0), Some(25.0), &[], 0)),
        Ok(claims(true, &[], &[], &[], &[])),
    );
    let outcome = engine.decide(&request).await;

    assert_eq!(outcome.record.decision_type, "DENIED");
    assert_eq!(
        outcome.record.denial_code.as_deref(),
        Some("PAYLOAD_EXCEEDS_MFC_MAX")
    );
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-003"]);
    assert_eq!(claims_calls.load(Ordering::SeqCst), 0);
    assert!(!outcome.audit.claims_agent.called);
}

#[tokio::test]
async fn unresolved_high_severity_incident_denies_after_escalation() {
    // One High-severity incident; the claims verifier reports the
    // prefix still unresolved.
    let (engine, _, _, claims_calls) = engine(
        Ok(environment(5.0, 7.0, Some(30.0), Some(5.0))),
        Ok(reputation(Some(20.0), Some(25.0), &["0011-010"], 0)),
        Ok(claims(
            false,
            &[],
            &["0011"],
            &[],
            &["RESOLVE_HIGH_SEVERITY_INCIDENTS"],
        )),
    );
    let outcome = engine.decide(&entry_request()).await;

    assert_eq!(outcome.record.decision_type, "DENIED");
    assert_eq!(
        outcome.record.denial_code.as_deref(),
        Some("UNRESOLVED_HIGH_SEVERITY_INCIDENT")
    );
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-006", "REEVAL-001"]);
    assert_eq!(claims_calls.load(Ordering::SeqCst), 1);
    assert!(outcome.audit.claims_agent.called);
    assert_eq!(
        outcome.audit.claims_agent.response.unresolved_incident_prefixes,
        vec!["0011"]
    );
}

#[tokio::test]
async fn large_envelope_exceedance_denies_without_escalation() {
    // steady 24 kt against demo 15 (cap 15): 24 > 1.2 * 15 = 18.
    let (engine, _, _, claims_calls) = engine(
        Ok(environment(24.0, 7.0, Some(30.0), Some(5.0))),
        Ok(reputation(Some(15.0), Some(25.0), &[], 0)),
        Ok(claims(true, &[], &[], &[], &[])),
    );
    let outcome = engine.decide(&entry_request()).await;

    assert_eq!(outcome.record.decision_type, "DENIED");
    assert_eq!(
        outcome.record.denial_code.as_deref(),
        Some("WIND_EXCEEDS_DEMONSTRATED_CAPABILITY")
    );
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-005"]);
    assert_eq!(claims_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolved_incidents_approve_after_escalation() {
    // High-severity incident resolved with verified evidence: the
    // satisfied claims result re-applies only the envelope rule.
    let (engine, _, _, claims_calls) = engine(
        Ok(environment(5.0, 7.0, Some(30.0), Some(5.0))),
        Ok(reputation(Some(20.0), Some(25.0), &["0011-010"], 0)),
        Ok(claims(
            true,
            &["0011"],
            &[],
            &["RESOLVE_HIGH_SEVERITY_INCIDENTS"],
            &[],
        )),
    );
    let outcome = engine.decide(&entry_request()).await;

    assert_eq!(outcome.record.decision_type, "APPROVED");
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-006", "REEVAL-005"]);
    assert_eq!(claims_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn satisfied_claims_near_envelope_still_constrains() {
    // Medium-family incident with wind near the cap escalates; claims
    // satisfied; the near-envelope constraint re-applies.
    let (engine, _, _, _) = engine(
        Ok(environment(18.0, 7.0, Some(30.0), Some(5.0))),
        Ok(reputation(Some(20.0), Some(25.0), &["0100-001"], 1)),
        Ok(claims(
            true,
            &["0100"],
            &[],
            &["RESOLVE_0100_0101_INCIDENTS_AND_MITIGATE_WIND_RISK"],
            &[],
        )),
    );
    let outcome = engine.decide(&entry_request()).await;

    assert_eq!(outcome.record.decision_type, "APPROVED-CONSTRAINTS");
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-008", "REEVAL-005"]);
}

#[tokio::test]
async fn residual_unsatisfied_actions_surface_verbatim() {
    // Pattern of 0100/0101 incidents; claims leaves the action (plus an
    // upstream-defined one) unsatisfied without a denial condition.
    let (engine, _, _, claims_calls) = engine(
        Ok(environment(5.0, 7.0, Some(30.0), Some(5.0))),
        Ok(reputation(
            Some(20.0),
            Some(25.0),
            &["0100-001", "0101-010", "0100-100"],
            3,
        )),
        Ok(claims(
            false,
            &[],
            &[],
            &[],
            &["RESOLVE_PATTERN_OF_0100_0101", "UPSTREAM_SAFETY_BRIEFING"],
        )),
    );
    let outcome = engine.decide(&entry_request()).await;

    assert_eq!(outcome.record.decision_type, "ACTION-REQUIRED");
    assert_eq!(
        outcome.record.actions,
        vec!["RESOLVE_PATTERN_OF_0100_0101", "UPSTREAM_SAFETY_BRIEFING"]
    );
    let action_id = outcome.record.action_id.clone().unwrap();
    assert!(action_id.starts_with("ACT-"));
    assert_eq!(
        outcome.record.sade_message,
        format!(
            "{action_id},ACTION-REQUIRED,(RESOLVE_PATTERN_OF_0100_0101,UPSTREAM_SAFETY_BRIEFING)"
        )
    );
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-008", "REEVAL-004"]);
    assert_eq!(claims_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn wind_capability_unproven_denies_when_envelope_exceeded() {
    // steady 21 kt over cap 20 (not large); capability proof missing.
    let (engine, _, _, _) = engine(
        Ok(environment(21.0, 7.0, Some(30.0), Some(5.0))),
        Ok(reputation(Some(20.0), Some(25.0), &[], 0)),
        Ok(claims(false, &[], &[], &[], &["PROVE_WIND_CAPABILITY"])),
    );
    let outcome = engine.decide(&entry_request()).await;

    assert_eq!(outcome.record.decision_type, "DENIED");
    assert_eq!(
        outcome.record.denial_code.as_deref(),
        Some("WIND_CAPABILITY_NOT_PROVEN")
    );
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-009", "REEVAL-003"]);
}

#[tokio::test]
async fn identical_inputs_reproduce_identical_outcomes() {
    let build = || {
        engine(
            Ok(environment(18.0, 7.0, Some(30.0), Some(5.0))),
            Ok(reputation(Some(20.0), Some(25.0), &["0100-001"], 1)),
            Ok(claims(
                false,
                &[],
                &[],
                &[],
                &["RESOLVE_0100_0101_INCIDENTS_AND_MITIGATE_WIND_RISK"],
            )),
        )
    };

    let (first_engine, _, _, _) = build();
    let (second_engine, _, _, _) = build();
    let first = first_engine.decide(&entry_request()).await;
    let second = second_engine.decide(&entry_request()).await;

    assert_eq!(first.record, second.record);
    assert_eq!(first.audit.rule_trace, second.audit.rule_trace);
    assert_eq!(first.record.action_id, second.record.action_id);
}

#[tokio::test]
async fn audit_echoes_collaborator_responses_verbatim() {
    let env = environment(5.0, 7.0, Some(30.0), Some(5.0));
    let rep = reputation(Some(20.0), Some(25.0), &["1111-001"], 0);
    let (engine, _, _, _) = engine(
        Ok(env.clone()),
        Ok(rep.clone()),
        Ok(claims(
            true,
            &["1111"],
            &[],
            &["SUBMIT_REQUIRED_FOLLOWUP_REPORTS"],
            &[],
        )),
    );
    let outcome = engine.decide(&entry_request()).await;

    assert_eq!(outcome.audit.environment_agent.as_ref(), Some(&env));
    assert_eq!(outcome.audit.reputation_agent.as_ref(), Some(&rep));
    assert_eq!(outcome.audit.entry_request.sade_zone_id, "ZONE-123");
    assert_eq!(outcome.audit.entry_request.request_type, "ZONE");
    assert_eq!(outcome.audit.rule_trace, vec!["RULE-007", "REEVAL-005"]);
}
