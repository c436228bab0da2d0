//! Fixture environment provider.
//!
//! Serves manufacturer flight constraints from a local drone-model
//! table and current conditions from an optional wind-conditions file,
//! deriving light conditions from the requested entry hour. Risk
//! laddering and constraint suggestions follow the upstream service's
//! advisory scheme; the engine echoes them without branching on them.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Timelike};
use sade_core::collaborator::{
    CollaboratorError, EnvironmentProvider, EnvironmentQuery, EnvironmentResponse,
    ManufacturerFlightConstraints, RawConditions, RiskAssessment, SpatialConstraints,
};
use serde::Deserialize;
use tracing::debug;

use super::FixtureError;

/// One row of the drone-model table.
#[derive(Debug, Clone, Deserialize)]
pub struct DroneModelEntry {
    /// Drone identifier the entry applies to.
    pub drone_id: String,
    /// Airframe manufacturer.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Airframe model.
    #[serde(default)]
    pub model: Option<String>,
    /// Airframe category.
    #[serde(default)]
    pub category: Option<String>,
    /// Maximum rated payload, kg.
    #[serde(default)]
    pub mfc_payload_max_kg: Option<f64>,
    /// Maximum rated wind, kt.
    #[serde(default)]
    pub mfc_max_wind_kt: Option<f64>,
}

/// Current wind conditions override file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindConditions {
    /// Steady wind, kt.
    pub wind: f64,
    /// Gust wind, kt.
    pub wind_gust: f64,
    /// Visibility, nm.
    pub visibility: f64,
    /// Precipitation level.
    pub precipitation: String,
}

impl Default for WindConditions {
    fn default() -> Self {
        Self {
            wind: 12.5,
            wind_gust: 18.0,
            visibility: 10.0,
            precipitation: "none".to_string(),
        }
    }
}

/// Environment provider backed by local fixture files.
pub struct FixtureEnvironment {
    models: Vec<DroneModelEntry>,
    conditions: WindConditions,
}

impl FixtureEnvironment {
    /// Loads the drone-model table and optional wind conditions.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when a present data file cannot be read
    /// or parsed.
    pub fn load(models_path: &Path, conditions_path: &Path) -> Result<Self, FixtureError> {
        let models: Vec<DroneModelEntry> = super::load_optional_json(models_path)?;
        let conditions: Option<WindConditions> = if conditions_path.exists() {
            Some(
                serde_json::from_str(&std::fs::read_to_string(conditions_path).map_err(
                    |source| FixtureError::Io {
                        path: conditions_path.to_path_buf(),
                        source,
                    },
                )?)
                .map_err(|source| FixtureError::Parse {
                    path: conditions_path.to_path_buf(),
                    source,
                })?,
            )
        } else {
            None
        };
        debug!(
            models = models.len(),
            conditions_overridden = conditions.is_some(),
            "fixture environment loaded"
        );
        Ok(Self {
            models,
            conditions: conditions.unwrap_or_default(),
        })
    }

    /// Builds a provider from in-memory data (tests).
    #[must_use]
    pub fn from_parts(models: Vec<DroneModelEntry>, conditions: WindConditions) -> Self {
        Self { models, conditions }
    }

    fn constraints_for(&self, drone_id: &str) -> ManufacturerFlightConstraints {
        self.models
            .iter()
            .find(|entry| entry.drone_id == drone_id)
            .map_or_else(ManufacturerFlightConstraints::default, |entry| {
                ManufacturerFlightConstraints {
                    manufacturer: entry.manufacturer.clone(),
                    model: entry.model.clone(),
                    category: entry.category.clone(),
                    mfc_payload_max_kg: entry.mfc_payload_max_kg,
                    mfc_max_wind_kt: entry.mfc_max_wind_kt,
                }
            })
    }
}

/// Derives light conditions from the requested entry hour.
fn light_conditions(entry_time: &str) -> &'static str {
    match DateTime::parse_from_rfc3339(entry_time) {
        Ok(dt) => match dt.hour() {
            6 => "dawn",
            7..=17 => "daylight",
            18 => "dusk",
            _ => "night",
        },
        Err(_) => "daylight",
    }
}

#[async_trait]
impl EnvironmentProvider for FixtureEnvironment {
    async fn fetch(
        &self,
        query: &EnvironmentQuery,
    ) -> Result<EnvironmentResponse, CollaboratorError> {
        let light = light_conditions(&query.entry_time);
        let conditions = RawConditions {
            wind: Some(self.conditions.wind),
            wind_gust: Some(self.conditions.wind_gust),
            precipitation: Some(self.conditions.precipitation.clone()),
            visibility: Some(self.conditions.visibility),
            light_conditions: Some(light.to_string()),
            spatial_constraints: SpatialConstraints {
                airspace_class: Some("Class E".to_string()),
                ..Default::default()
            },
        };

        // Advisory risk ladder over gusts, visibility, and light.
        let mut risk_level = "LOW";
        let mut blocking = Vec::new();
        let mut marginal = Vec::new();
        if self.conditions.wind_gust > 25.0 {
            risk_level = "HIGH";
            blocking.push("high_wind_gusts".to_string());
        } else if self.conditions.wind_gust > 20.0 {
            risk_level = "MEDIUM";
            marginal.push("elevated_wind_gusts".to_string());
        }
        if self.conditions.visibility < 3.0 {
            risk_level = "HIGH";
            blocking.push("low_visibility".to_string());
        } else if self.conditions.visibility < 5.0 {
            if risk_level == "LOW" {
                risk_level = "MEDIUM";
            }
            marginal.push("reduced_visibility".to_string());
        }
        if light == "night" {
            marginal.push("night_operations".to_string());
        }

        let mut suggestions = Vec::new();
        if self.conditions.wind_gust > 20.0 {
            suggestions.push("SPEED_LIMIT(7 m/s)".to_string());
        }
        if self.conditions.wind_gust > 15.0 {
            suggestions.push("MAX_ALTITUDE(300 m)".to_string());
        }

        let why = vec![
            format!("wind={} kt", self.conditions.wind),
            format!("wind_gust={} kt", self.conditions.wind_gust),
            format!("visibility={} nm", self.conditions.visibility),
            format!("light_conditions={light}"),
        ];

        Ok(EnvironmentResponse {
            manufacturer_fc: self.constraints_for(&query.drone_id),
            raw_conditions: conditions,
            risk_assessment: RiskAssessment {
                risk_level: risk_level.to_string(),
                blocking_factors: blocking,
                marginal_factors: marginal,
                confidence_factors: Vec::new(),
            },
            constraint_suggestions: suggestions,
            recommendation: risk_level.to_string(),
            recommendation_prose: format!(
                "Environmental risk signal: {risk_level}. Wind {} kt gusting {} kt, \
                 visibility {} nm, {light}.",
                self.conditions.wind, self.conditions.wind_gust, self.conditions.visibility
            ),
            why_prose: why.join("; "),
            why,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> FixtureEnvironment {
        FixtureEnvironment::from_parts(
            vec![DroneModelEntry {
                drone_id: "DRONE-001".into(),
                manufacturer: Some("AeroWorks".into()),
                model: Some("AW-210".into()),
                category: Some("small-uas".into()),
                mfc_payload_max_kg: Some(5.0),
                mfc_max_wind_kt: Some(30.0),
            }],
            WindConditions::default(),
        )
    }

    fn query(drone_id: &str, entry_time: &str) -> EnvironmentQuery {
        EnvironmentQuery {
            pilot_id: "PILOT-1".into(),
            org_id: "ORG-1".into(),
            drone_id: drone_id.into(),
            entry_time: entry_time.into(),
            request_type: "ZONE".into(),
            request_payload: None,
        }
    }

    #[tokio::test]
    async fn serves_limits_for_known_drones() {
        let response = provider()
            .fetch(&query("DRONE-001", "2026-01-26T14:00:00Z"))
            .await
            .unwrap();
        assert_eq!(response.manufacturer_fc.mfc_max_wind_kt, Some(30.0));
        assert_eq!(response.manufacturer_fc.manufacturer.as_deref(), Some("AeroWorks"));
        assert_eq!(response.raw_conditions.wind, Some(12.5));
    }

    #[tokio::test]
    async fn unknown_drone_yields_absent_limits() {
        let response = provider()
            .fetch(&query("DRONE-999", "2026-01-26T14:00:00Z"))
            .await
            .unwrap();
        assert_eq!(response.manufacturer_fc.mfc_max_wind_kt, None);
        assert_eq!(response.manufacturer_fc.mfc_payload_max_kg, None);
    }

    #[tokio::test]
    async fn light_conditions_follow_the_entry_hour() {
        let provider = provider();
        for (time, expected) in [
            ("2026-01-26T06:30:00Z", "dawn"),
            ("2026-01-26T14:00:00Z", "daylight"),
            ("2026-01-26T18:10:00Z", "dusk"),
            ("2026-01-26T23:00:00Z", "night"),
        ] {
            let response = provider.fetch(&query("DRONE-001", time)).await.unwrap();
            assert_eq!(
                response.raw_conditions.light_conditions.as_deref(),
                Some(expected),
                "time {time}"
            );
        }
    }

    #[tokio::test]
    async fn gusty_conditions_raise_the_advisory_ladder() {
        let provider = FixtureEnvironment::from_parts(
            Vec::new(),
            WindConditions {
                wind: 18.0,
                wind_gust: 22.0,
                ..Default::default()
            },
        );
        let response = provider
            .fetch(&query("DRONE-001", "2026-01-26T14:00:00Z"))
            .await
            .unwrap();
        assert_eq!(response.risk_assessment.risk_level, "MEDIUM");
        assert!(
            response
                .constraint_suggestions
                .contains(&"SPEED_LIMIT(7 m/s)".to_string())
        );
        assert!(
            response
                .constraint_suggestions
                .contains(&"MAX_ALTITUDE(300 m)".to_string())
        );
    }
}
