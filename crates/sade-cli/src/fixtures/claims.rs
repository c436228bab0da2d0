//! Fixture claims verifier.
//!
//! Verifies required actions against locally recorded DPO follow-up
//! claims. Records are filtered by drone, sorted chronologically, and
//! aligned positionally with the incident codes from the session
//! record; an incident prefix counts as resolved when its aligned
//! record is marked `Resolved`. Wind capability is checked against the
//! wind context forwarded by the escalation controller.

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use sade_core::collaborator::{
    ClaimsRequest, ClaimsResponse, ClaimsVerifier, CollaboratorError,
};
use sade_core::incident::{HIGH_SEVERITY_PREFIXES, IncidentCode, MEDIUM_FAMILY_PREFIXES};
use serde::Deserialize;
use tracing::debug;

use super::FixtureError;

/// One DPO follow-up/claim record.
#[derive(Debug, Clone, Deserialize)]
pub struct UserClaimRecord {
    /// Drone the record applies to.
    #[serde(default)]
    pub drones: String,
    /// Record date, `MM/DD/YYYY`.
    #[serde(default)]
    pub date: String,
    /// Resolution status; `Resolved` satisfies the aligned incident.
    #[serde(default)]
    pub status: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Claims verifier backed by a local follow-up record file.
pub struct FixtureClaims {
    records: Vec<UserClaimRecord>,
}

impl FixtureClaims {
    /// Loads the follow-up record file. A missing file means no claims
    /// on record.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when a present file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let records: Vec<UserClaimRecord> = super::load_optional_json(path)?;
        debug!(records = records.len(), "fixture claims loaded");
        Ok(Self { records })
    }

    /// Builds a verifier from in-memory records (tests).
    #[must_use]
    pub fn from_records(records: Vec<UserClaimRecord>) -> Self {
        Self { records }
    }

    fn records_for(&self, drone_id: &str) -> Vec<&UserClaimRecord> {
        let mut records: Vec<&UserClaimRecord> = self
            .records
            .iter()
            .filter(|r| r.drones == drone_id)
            .collect();
        records.sort_by_key(|r| {
            NaiveDate::parse_from_str(&r.date, "%m/%d/%Y").unwrap_or(NaiveDate::MIN)
        });
        records
    }
}

/// Aligns incident codes with claim records by chronological position.
/// Returns `(resolved_prefixes, unresolved_prefixes)`.
fn align_incident_resolution(
    incident_codes: &[String],
    records: &[&UserClaimRecord],
) -> (Vec<String>, Vec<String>) {
    let mut resolved: Vec<String> = Vec::new();
    let mut unresolved: Vec<String> = Vec::new();

    for (index, code) in incident_codes.iter().enumerate() {
        let Some(parsed) = IncidentCode::parse(code) else {
            continue;
        };
        let is_resolved = records
            .get(index)
            .is_some_and(|record| record.status == "Resolved");
        if is_resolved {
            if !resolved.contains(&parsed.prefix) {
                resolved.push(parsed.prefix);
            }
        } else if !unresolved.contains(&parsed.prefix) {
            unresolved.push(parsed.prefix);
        }
    }
    unresolved.retain(|prefix| !resolved.contains(prefix));
    (resolved, unresolved)
}

/// Distinct prefixes across the incident codes, in first-seen order.
fn distinct_prefixes(incident_codes: &[String]) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::new();
    for code in incident_codes {
        if let Some(parsed) = IncidentCode::parse(code) {
            if !prefixes.contains(&parsed.prefix) {
                prefixes.push(parsed.prefix);
            }
        }
    }
    prefixes
}

#[async_trait]
impl ClaimsVerifier for FixtureClaims {
    async fn verify(&self, request: &ClaimsRequest) -> Result<ClaimsResponse, CollaboratorError> {
        let records = self.records_for(&request.drone_id);
        let (resolved_prefixes, unresolved_prefixes) =
            align_incident_resolution(&request.incident_codes, &records);
        let all_prefixes = distinct_prefixes(&request.incident_codes);

        let mut satisfied_actions: Vec<String> = Vec::new();
        let mut unsatisfied_actions: Vec<String> = Vec::new();
        let mut why: Vec<String> = Vec::new();

        for action in &request.required_actions {
            match action.as_str() {
                "RESOLVE_HIGH_SEVERITY_INCIDENTS" => {
                    let high_any: Vec<&String> = all_prefixes
                        .iter()
                        .filter(|p| HIGH_SEVERITY_PREFIXES.contains(&p.as_str()))
                        .collect();
                    let high_resolved: Vec<&String> = resolved_prefixes
                        .iter()
                        .filter(|p| HIGH_SEVERITY_PREFIXES.contains(&p.as_str()))
                        .collect();
                    if !high_any.is_empty() && high_resolved.is_empty() {
                        unsatisfied_actions.push(action.clone());
                        why.push(
                            "high-severity incident(s) lack a verified follow-up record"
                                .to_string(),
                        );
                    } else if !high_any.is_empty() {
                        satisfied_actions.push(action.clone());
                        why.push(format!(
                            "verified follow-up for high-severity prefix(es) {high_resolved:?}"
                        ));
                    } else {
                        satisfied_actions.push(action.clone());
                        why.push("no high-severity incidents in the session record".to_string());
                    }
                }
                "SUBMIT_REQUIRED_FOLLOWUP_REPORTS" => {
                    if records.len() >= request.incident_codes.len() {
                        let missing: Vec<&String> = all_prefixes
                            .iter()
                            .filter(|p| unresolved_prefixes.contains(p))
                            .collect();
                        if missing.is_empty() {
                            satisfied_actions.push(action.clone());
                            why.push(format!(
                                "follow-up reports found for {} incident(s)",
                                request.incident_codes.len()
                            ));
                        } else {
                            unsatisfied_actions.push(action.clone());
                            why.push(format!(
                                "follow-up not resolved for prefix(es) {missing:?}"
                            ));
                        }
                    } else {
                        unsatisfied_actions.push(action.clone());
                        why.push(format!(
                            "{} claim record(s) on file for {} incident(s); follow-ups missing",
                            records.len(),
                            request.incident_codes.len()
                        ));
                    }
                }
                "RESOLVE_0100_0101_INCIDENTS_AND_MITIGATE_WIND_RISK"
                | "RESOLVE_PATTERN_OF_0100_0101" => {
                    let family: Vec<&String> = all_prefixes
                        .iter()
                        .filter(|p| MEDIUM_FAMILY_PREFIXES.contains(&p.as_str()))
                        .collect();
                    let family_resolved: Vec<&String> = resolved_prefixes
                        .iter()
                        .filter(|p| MEDIUM_FAMILY_PREFIXES.contains(&p.as_str()))
                        .collect();
                    if !family.is_empty() && family_resolved.len() != family.len() {
                        unsatisfied_actions.push(action.clone());
                        why.push(format!(
                            "0100/0101 incidents not all resolved; resolved {family_resolved:?}"
                        ));
                    } else if !family.is_empty() {
                        satisfied_actions.push(action.clone());
                        why.push(format!(
                            "0100/0101 incidents resolved or mitigated: {family_resolved:?}"
                        ));
                    } else {
                        satisfied_actions.push(action.clone());
                        why.push("no 0100/0101 incidents in the session record".to_string());
                    }
                }
                "PROVE_WIND_CAPABILITY" => {
                    let wind = &request.wind_context;
                    if wind.wind_now_kt <= wind.demo_steady_max_kt
                        && wind.gust_now_kt <= wind.demo_gust_max_kt
                    {
                        satisfied_actions.push(action.clone());
                        why.push("wind within the demonstrated envelope".to_string());
                    } else {
                        unsatisfied_actions.push(action.clone());
                        why.push(
                            "wind exceeds the demonstrated envelope; no proof record"
                                .to_string(),
                        );
                    }
                }
                other => {
                    satisfied_actions.push(action.clone());
                    why.push(format!("action '{other}' has no local verification rule"));
                }
            }
        }

        let satisfied = unsatisfied_actions.is_empty();
        why.truncate(10);
        Ok(ClaimsResponse {
            satisfied,
            recommendation_prose: if satisfied {
                "All required actions satisfied.".to_string()
            } else {
                format!(
                    "Unsatisfied: {unsatisfied_actions:?}; resolved prefixes: \
                     {resolved_prefixes:?}."
                )
            },
            why_prose: why.join("; "),
            resolved_incident_prefixes: resolved_prefixes,
            unresolved_incident_prefixes: unresolved_prefixes,
            satisfied_actions,
            unsatisfied_actions,
            why,
        })
    }
}
