//! Fixture reputation provider.
//!
//! Scans historical session records for the DPO, derives the
//! demonstrated wind envelope, classifies incidents against the
//! taxonomy, and marks an incident resolved when a follow-up session
//! (record type `010`) carries its code. Recency uses a 30-day window
//! ending at the requested entry time.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use sade_core::collaborator::{
    CollaboratorError, IncidentAnalysis, IncidentReport, ReputationProvider, ReputationQuery,
    ReputationResponse, RiskAssessment,
};
use sade_core::incident::{self, IncidentCode, Severity};
use serde::Deserialize;
use tracing::debug;

use super::FixtureError;

/// Record type marking a follow-up session.
const FOLLOW_UP_RECORD_TYPE: &str = "010";

/// One historical flight session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    /// Session identifier.
    pub session_id: String,
    /// Pilot flown under.
    pub pilot_id: String,
    /// Drone flown.
    pub drone_id: String,
    /// Session start, ISO 8601.
    #[serde(default)]
    pub time_in: String,
    /// Session end, ISO 8601.
    #[serde(default)]
    pub time_out: String,
    /// Record type; `010` marks a follow-up session.
    #[serde(default)]
    pub record_type: String,
    /// Steady wind flown in, kt (number or numeric string).
    #[serde(default)]
    pub wind_steady_kt: Option<serde_json::Value>,
    /// Gust wind flown in, kt (number or numeric string).
    #[serde(default)]
    pub wind_gusts_kt: Option<serde_json::Value>,
    /// Incident codes logged in the session.
    #[serde(default)]
    pub incidents: Vec<String>,
}

/// Reputation provider backed by a local session-record file.
pub struct FixtureReputation {
    sessions: Vec<SessionRecord>,
}

impl FixtureReputation {
    /// Loads the session-record file. A missing file means an empty
    /// history.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when a present file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let sessions: Vec<SessionRecord> = super::load_optional_json(path)?;
        debug!(sessions = sessions.len(), "fixture reputation loaded");
        Ok(Self { sessions })
    }

    /// Builds a provider from in-memory records (tests).
    #[must_use]
    pub fn from_sessions(sessions: Vec<SessionRecord>) -> Self {
        Self { sessions }
    }
}

/// Lenient wind reading: number or numeric string, default 0.0.
fn read_wind(value: Option<&serde_json::Value>) -> f64 {
    value
        .and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parses an ISO 8601 timestamp, assuming UTC when the offset is absent.
fn parse_when(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[async_trait]
impl ReputationProvider for FixtureReputation {
    async fn fetch(&self, query: &ReputationQuery) -> Result<ReputationResponse, CollaboratorError> {
        let sessions: Vec<&SessionRecord> = self
            .sessions
            .iter()
            .filter(|s| s.pilot_id == query.pilot_id && s.drone_id == query.drone_id)
            .collect();

        // One incident report per distinct code, first occurrence wins;
        // resolved when any follow-up session carries the code.
        let mut reports: Vec<IncidentReport> = Vec::new();
        for session in &sessions {
            for code in &session.incidents {
                if reports.iter().any(|r| &r.incident_code == code) {
                    continue;
                }
                let resolved = sessions.iter().any(|s| {
                    s.record_type == FOLLOW_UP_RECORD_TYPE && s.incidents.contains(code)
                });
                let (category, subcategory, severity) = match IncidentCode::parse(code) {
                    Some(parsed) => {
                        let class = incident::classify(&parsed);
                        (class.category, class.subcategory, class.severity)
                    }
                    None => ("Unknown", "Unknown", Severity::Low),
                };
                reports.push(IncidentReport {
                    incident_code: code.clone(),
                    incident_category: category.to_string(),
                    incident_subcategory: subcategory.to_string(),
                    severity: severity.as_str().to_string(),
                    resolved,
                    session_id: session.session_id.clone(),
                    date: session.time_in.clone(),
                });
            }
        }

        let reference = parse_when(&query.entry_time)
            .unwrap_or_else(|| Utc.with_ymd_and_hms(2026, 1, 26, 0, 0, 0).unwrap());
        let window_start = reference - Duration::days(30);
        let recent_count = reports
            .iter()
            .filter(|r| parse_when(&r.date).is_some_and(|d| d >= window_start))
            .count() as u64;

        let unresolved_present = reports.iter().any(|r| !r.resolved);
        let mut risk_level = "LOW";
        let mut blocking = Vec::new();
        let mut confidence = Vec::new();
        if unresolved_present {
            let high_unresolved = reports
                .iter()
                .any(|r| !r.resolved && r.severity == "HIGH");
            if high_unresolved {
                risk_level = "HIGH";
                blocking.push("unresolved_high_severity_incident".to_string());
            } else {
                risk_level = "MEDIUM";
                blocking.push("unresolved_incidents_present".to_string());
            }
        }
        if recent_count == 0 {
            confidence.push("no_recent_incidents".to_string());
        }
        if reports.iter().all(|r| r.resolved) {
            confidence.push("all_incidents_resolved".to_string());
        }

        let demo_steady_max_kt = sessions
            .iter()
            .map(|s| read_wind(s.wind_steady_kt.as_ref()))
            .fold(0.0_f64, f64::max);
        let demo_gust_max_kt = sessions
            .iter()
            .map(|s| read_wind(s.wind_gusts_kt.as_ref()))
            .fold(0.0_f64, f64::max);

        let incident_codes: Vec<String> = sessions
            .iter()
            .flat_map(|s| s.incidents.iter().cloned())
            .collect();
        let n_0100_0101 = incident_codes
            .iter()
            .filter_map(|code| IncidentCode::parse(code))
            .filter(IncidentCode::is_medium_family)
            .count() as u64;

        let mut why = vec![
            format!("drp_sessions_count={}", sessions.len()),
            format!("demo_steady_max_kt={demo_steady_max_kt}"),
            format!("demo_gust_max_kt={demo_gust_max_kt}"),
            format!("n_0100_0101={n_0100_0101}"),
            format!("unresolved_incidents_present={unresolved_present}"),
        ];
        if !incident_codes.is_empty() {
            let mut prefixes: Vec<String> = Vec::new();
            for code in &incident_codes {
                if let Some(parsed) = IncidentCode::parse(code) {
                    if !prefixes.contains(&parsed.prefix) {
                        prefixes.push(parsed.prefix);
                    }
                }
            }
            prefixes.truncate(10);
            why.push(format!("incident_prefixes_present={prefixes:?}"));
        }
        why.truncate(8);

        Ok(ReputationResponse {
            incident_analysis: IncidentAnalysis {
                unresolved_incidents_present: unresolved_present,
                total_incidents: reports.len() as u64,
                recent_incidents_count: recent_count,
                incidents: reports,
            },
            risk_assessment: RiskAssessment {
                risk_level: risk_level.to_string(),
                blocking_factors: blocking,
                marginal_factors: Vec::new(),
                confidence_factors: confidence,
            },
            drp_sessions_count: sessions.len() as u64,
            demo_steady_max_kt: Some(demo_steady_max_kt),
            demo_gust_max_kt: Some(demo_gust_max_kt),
            incident_codes,
            n_0100_0101,
            recommendation: risk_level.to_string(),
            recommendation_prose: format!(
                "Historical risk signal: {risk_level}. Sessions={}, demo wind envelope \
                 steady={demo_steady_max_kt} kt gust={demo_gust_max_kt} kt; \
                 n_0100_0101={n_0100_0101}, \
                 unresolved_incidents_present={unresolved_present}.",
                sessions.len()
            ),
            why_prose: why.join("; "),
            why,
        })
    }
}
