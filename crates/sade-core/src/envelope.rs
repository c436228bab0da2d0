//! Envelope and risk computation.
//!
//! A pure function of the normalized signal set; no I/O, no side
//! effects. Derives the capped wind envelope, the graduated wind
//! proximity flags (90% / 100% / 120%), the incident severity-family
//! flags, and the parsed payload weight.
//!
//! Payload parse failure is recorded as a flag, not raised as an error:
//! the run must still reach the rule engine so the correct denial code
//! is chosen by rule order.

use crate::incident::IncidentCode;
use crate::policy::EngineKnobs;
use crate::signal::SignalSet;

/// Derived risk flags. Recomputed every run, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskFlags {
    /// Steady envelope cap: `min(demo_steady_max_kt, mfc_max_wind_kt)`.
    pub steady_cap_kt: f64,
    /// Gust envelope cap: `min(demo_gust_max_kt, mfc_max_wind_kt)`.
    pub gust_cap_kt: f64,
    /// Current wind at or above 90% of either cap.
    pub near_envelope: bool,
    /// Current wind above either cap.
    pub exceeds_envelope: bool,
    /// Current wind above 120% of either cap.
    pub exceeds_large: bool,
    /// At least `pattern_threshold` incidents in the `0100`/`0101`
    /// family.
    pub pattern_present: bool,
    /// At least one High-family incident.
    pub has_high_severity: bool,
    /// Low-family incidents present and no High- or Medium-family ones.
    pub has_only_low_severity: bool,
    /// At least one Medium-family (`0100`/`0101`) incident.
    pub has_medium_family: bool,
    /// Parsed payload weight in kilograms; `None` when the payload
    /// string is not a finite non-negative number.
    pub payload_kg: Option<f64>,
}

/// Parses a payload string as kilograms. Accepts only finite,
/// non-negative values.
#[must_use]
pub fn parse_payload_kg(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|kg| kg.is_finite() && *kg >= 0.0)
}

/// Computes the derived risk flags from normalized signals.
///
/// When a manufacturer wind limit is absent the caps fall back to the
/// demonstrated envelope alone; rule 1 fires before any cap-derived rule
/// can act on them.
#[must_use]
pub fn compute(signals: &SignalSet, payload_raw: &str, knobs: &EngineKnobs) -> RiskFlags {
    let steady_cap_kt = match signals.mfc_max_wind_kt {
        Some(limit) => signals.demo_steady_max_kt.min(limit),
        None => signals.demo_steady_max_kt,
    };
    let gust_cap_kt = match signals.mfc_max_wind_kt {
        Some(limit) => signals.demo_gust_max_kt.min(limit),
        None => signals.demo_gust_max_kt,
    };

    let near = knobs.near_envelope_fraction;
    let large = knobs.large_exceedance_fraction;
    let near_envelope = signals.steady_wind_kt >= near * steady_cap_kt
        || signals.gust_wind_kt >= near * gust_cap_kt;
    let exceeds_envelope =
        signals.steady_wind_kt > steady_cap_kt || signals.gust_wind_kt > gust_cap_kt;
    let exceeds_large = signals.steady_wind_kt > large * steady_cap_kt
        || signals.gust_wind_kt > large * gust_cap_kt;

    let codes: Vec<IncidentCode> = signals
        .incident_codes
        .iter()
        .filter_map(|code| IncidentCode::parse(code))
        .collect();
    let has_high_severity = codes.iter().any(IncidentCode::is_high_family);
    let has_medium_family = codes.iter().any(IncidentCode::is_medium_family);
    let has_low = codes.iter().any(IncidentCode::is_low_family);
    let has_only_low_severity = has_low && !has_high_severity && !has_medium_family;

    RiskFlags {
        steady_cap_kt,
        gust_cap_kt,
        near_envelope,
        exceeds_envelope,
        exceeds_large,
        pattern_present: signals.n_0100_0101 >= knobs.pattern_threshold,
        has_high_severity,
        has_only_low_severity,
        has_medium_family,
        payload_kg: parse_payload_kg(payload_raw),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn signals(steady: f64, gust: f64, demo_steady: f64, demo_gust: f64) -> SignalSet {
        SignalSet {
            steady_wind_kt: steady,
            gust_wind_kt: gust,
            demo_steady_max_kt: demo_steady,
            demo_gust_max_kt: demo_gust,
            mfc_max_wind_kt: Some(30.0),
            mfc_payload_max_kg: Some(5.0),
            incident_codes: Vec::new(),
            n_0100_0101: 0,
        }
    }

    #[test]
    fn caps_are_min_of_demonstrated_and_manufacturer() {
        let flags = compute(&signals(5.0, 7.0, 20.0, 45.0), "2", &EngineKnobs::default());
        assert_eq!(flags.steady_cap_kt, 20.0);
        assert_eq!(flags.gust_cap_kt, 30.0);
    }

    #[test]
    fn calm_wind_sets_no_proximity_flags() {
        let flags = compute(&signals(5.0, 7.0, 20.0, 25.0), "2", &EngineKnobs::default());
        assert!(!flags.near_envelope);
        assert!(!flags.exceeds_envelope);
        assert!(!flags.exceeds_large);
    }

    #[test]
    fn near_at_ninety_percent_of_either_cap() {
        // steady 18 >= 0.9 * 20
        let flags = compute(&signals(18.0, 7.0, 20.0, 25.0), "2", &EngineKnobs::default());
        assert!(flags.near_envelope);
        assert!(!flags.exceeds_envelope);

        // gust-side trigger only
        let flags = compute(&signals(5.0, 23.0, 20.0, 25.0), "2", &EngineKnobs::default());
        assert!(flags.near_envelope);
    }

    #[test]
    fn exceeds_large_above_one_twenty_percent() {
        // 24 > 1.2 * min(15, 30) = 18
        let flags = compute(&signals(24.0, 7.0, 15.0, 25.0), "2", &EngineKnobs::default());
        assert!(flags.exceeds_large);
        assert!(flags.exceeds_envelope);
        assert!(flags.near_envelope);
    }

    #[test]
    fn pattern_requires_threshold_count() {
        let mut s = signals(5.0, 7.0, 20.0, 25.0);
        s.n_0100_0101 = 2;
        assert!(!compute(&s, "2", &EngineKnobs::default()).pattern_present);
        s.n_0100_0101 = 3;
        assert!(compute(&s, "2", &EngineKnobs::default()).pattern_present);
    }

    #[test]
    fn severity_family_flags() {
        let mut s = signals(5.0, 7.0, 20.0, 25.0);
        s.incident_codes = vec!["0011-010".into(), "1111-001".into()];
        let flags = compute(&s, "2", &EngineKnobs::default());
        assert!(flags.has_high_severity);
        assert!(!flags.has_medium_family);
        assert!(!flags.has_only_low_severity);

        s.incident_codes = vec!["1111-001".into()];
        let flags = compute(&s, "2", &EngineKnobs::default());
        assert!(flags.has_only_low_severity);

        s.incident_codes = vec!["1111-001".into(), "0100-011".into()];
        let flags = compute(&s, "2", &EngineKnobs::default());
        assert!(flags.has_medium_family);
        assert!(!flags.has_only_low_severity);
    }

    #[test]
    fn malformed_incident_codes_are_ignored() {
        let mut s = signals(5.0, 7.0, 20.0, 25.0);
        s.incident_codes = vec!["garbage".into(), "0100".into()];
        let flags = compute(&s, "2", &EngineKnobs::default());
        assert!(!flags.has_high_severity);
        assert!(!flags.has_medium_family);
        assert!(!flags.has_only_low_severity);
    }

    #[test]
    fn payload_parse_accepts_only_finite_non_negative() {
        assert_eq!(parse_payload_kg("2.5"), Some(2.5));
        assert_eq!(parse_payload_kg(" 0 "), Some(0.0));
        assert_eq!(parse_payload_kg("-1"), None);
        assert_eq!(parse_payload_kg("NaN"), None);
        assert_eq!(parse_payload_kg("inf"), None);
        assert_eq!(parse_payload_kg("heavy"), None);
        assert_eq!(parse_payload_kg(""), None);
    }

    proptest! {
        #[test]
        fn caps_never_exceed_either_input(
            demo_steady in 0.0f64..60.0,
            demo_gust in 0.0f64..60.0,
            limit in 0.0f64..60.0,
        ) {
            let mut s = signals(5.0, 7.0, demo_steady, demo_gust);
            s.mfc_max_wind_kt = Some(limit);
            let flags = compute(&s, "2", &EngineKnobs::default());
            prop_assert!(flags.steady_cap_kt <= demo_steady);
            prop_assert!(flags.steady_cap_kt <= limit);
            prop_assert!(flags.gust_cap_kt <= demo_gust);
            prop_assert!(flags.gust_cap_kt <= limit);
        }

        #[test]
        fn proximity_flags_are_monotone(
            steady in 0.0f64..80.0,
            gust in 0.0f64..80.0,
            demo_steady in 1.0f64..60.0,
            demo_gust in 1.0f64..60.0,
        ) {
            let flags = compute(
                &signals(steady, gust, demo_steady, demo_gust),
                "2",
                &EngineKnobs::default(),
            );
            // exceeds-large implies exceeds, exceeds implies near, for
            // positive caps.
            if flags.exceeds_large {
                prop_assert!(flags.exceeds_envelope);
            }
            if flags.exceeds_envelope {
                prop_assert!(flags.near_envelope);
            }
        }
    }
}
