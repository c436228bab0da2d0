//! Incident codes, severity families, and the incident taxonomy.
//!
//! Incident codes use the `hhhh-sss` format: a four-digit category prefix
//! and a subtype. The engine's risk flags are computed over three fixed
//! severity families keyed by prefix:
//!
//! - **High**: `0001`, `0011`, `0110`
//! - **Medium**: `0100`, `0101`
//! - **Low**: `1111`
//!
//! The taxonomy below additionally carries human-readable category and
//! subcategory names for audit rendering. Note that prefix `0010`
//! (Property Damage) classifies as MEDIUM severity in the taxonomy but is
//! NOT a member of the engine's Medium family; the family sets are fixed
//! and membership drives control flow, taxonomy severity does not.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefixes whose incidents block admission until resolved with verified
/// evidence.
pub const HIGH_SEVERITY_PREFIXES: [&str; 3] = ["0001", "0011", "0110"];

/// The medium family tracked for wind-risk coupling and pattern detection.
pub const MEDIUM_FAMILY_PREFIXES: [&str; 2] = ["0100", "0101"];

/// Prefixes requiring only follow-up reports.
pub const LOW_SEVERITY_PREFIXES: [&str; 1] = ["1111"];

/// Taxonomy severity of an incident category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Follow-up report expected; does not block on its own.
    Low,
    /// Operational risk; may block in combination with wind exposure.
    Medium,
    /// Blocks admission until resolved.
    High,
}

impl Severity {
    /// Canonical uppercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `hhhh-sss` incident code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentCode {
    /// Four-digit category prefix (`hhhh`).
    pub prefix: String,
    /// Subtype digits (`sss`).
    pub subtype: String,
}

impl IncidentCode {
    /// Parses a `hhhh-sss` code. Returns `None` when the code does not
    /// split into a four-digit prefix and a non-empty digit subtype.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        let (prefix, subtype) = code.split_once('-')?;
        if prefix.len() != 4 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if subtype.is_empty() || !subtype.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            prefix: prefix.to_string(),
            subtype: subtype.to_string(),
        })
    }

    /// Whether this code belongs to the High severity family.
    #[must_use]
    pub fn is_high_family(&self) -> bool {
        HIGH_SEVERITY_PREFIXES.contains(&self.prefix.as_str())
    }

    /// Whether this code belongs to the Medium (`0100`/`0101`) family.
    #[must_use]
    pub fn is_medium_family(&self) -> bool {
        MEDIUM_FAMILY_PREFIXES.contains(&self.prefix.as_str())
    }

    /// Whether this code belongs to the Low severity family.
    #[must_use]
    pub fn is_low_family(&self) -> bool {
        LOW_SEVERITY_PREFIXES.contains(&self.prefix.as_str())
    }
}

impl fmt::Display for IncidentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.subtype)
    }
}

/// Whether a bare prefix string is in the High severity family.
#[must_use]
pub fn is_high_severity_prefix(prefix: &str) -> bool {
    HIGH_SEVERITY_PREFIXES.contains(&prefix)
}

/// One taxonomy entry: prefix, category name, taxonomy severity, and the
/// known subtype table.
pub struct TaxonomyEntry {
    /// Four-digit category prefix.
    pub prefix: &'static str,
    /// Category name.
    pub category: &'static str,
    /// Taxonomy severity (display only; families drive control flow).
    pub severity: Severity,
    /// `(subtype, name)` pairs.
    pub subcategories: &'static [(&'static str, &'static str)],
}

/// The fixed incident taxonomy.
pub const TAXONOMY: &[TaxonomyEntry] = &[
    TaxonomyEntry {
        prefix: "0001",
        category: "Injury-Related Incidents",
        severity: Severity::High,
        subcategories: &[("001", "Serious Injury"), ("010", "Loss of Consciousness")],
    },
    TaxonomyEntry {
        prefix: "0010",
        category: "Property Damage",
        severity: Severity::Medium,
        subcategories: &[("001", "Damage > $500")],
    },
    TaxonomyEntry {
        prefix: "0011",
        category: "Mid-Air Collisions / Near-Misses",
        severity: Severity::High,
        subcategories: &[
            ("001", "Collision with Manned Aircraft"),
            ("010", "Near Mid-Air Collision (NMAC)"),
        ],
    },
    TaxonomyEntry {
        prefix: "0100",
        category: "Loss of Control / Malfunctions",
        severity: Severity::Medium,
        subcategories: &[
            ("001", "GPS or Navigation Failure"),
            ("010", "Flight Control Failure"),
            ("011", "Battery Failure / Fire"),
            ("100", "Communication Loss (C2 Link)"),
            ("101", "Flyaway (Uncontrolled Drone)"),
        ],
    },
    TaxonomyEntry {
        prefix: "0101",
        category: "Airspace Violations",
        severity: Severity::Medium,
        subcategories: &[
            ("001", "Unauthorized Entry into Controlled Airspace"),
            ("010", "Violation of Temporary Flight Restriction (TFR)"),
            ("011", "Overflight of People Without Waiver"),
            ("100", "Night Operations Without Proper Lighting"),
        ],
    },
    TaxonomyEntry {
        prefix: "0110",
        category: "Security & Law Enforcement Events",
        severity: Severity::High,
        subcategories: &[
            ("001", "Intercepted by Law Enforcement or Military"),
            ("010", "Suspected Cyberattack or GPS Jamming"),
            ("011", "Drone Used in Criminal Activity"),
        ],
    },
    TaxonomyEntry {
        prefix: "1111",
        category: "Incomplete Flight Log",
        severity: Severity::Low,
        subcategories: &[("001", "Drone did not exit zone")],
    },
];

/// Looks up the taxonomy entry for a prefix.
#[must_use]
pub fn taxonomy_entry(prefix: &str) -> Option<&'static TaxonomyEntry> {
    TAXONOMY.iter().find(|e| e.prefix == prefix)
}

/// Classification of a parsed incident code against the taxonomy.
///
/// Unknown prefixes classify as LOW with "Unknown" names so that a novel
/// code never silently escalates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Category name, or "Unknown".
    pub category: &'static str,
    /// Subcategory name, or "Unknown".
    pub subcategory: &'static str,
    /// Taxonomy severity.
    pub severity: Severity,
}

/// Classifies an incident code against the taxonomy.
#[must_use]
pub fn classify(code: &IncidentCode) -> Classification {
    match taxonomy_entry(&code.prefix) {
        Some(entry) => Classification {
            category: entry.category,
            subcategory: entry
                .subcategories
                .iter()
                .find(|(sub, _)| *sub == code.subtype)
                .map_or("Unknown", |(_, name)| name),
            severity: entry.severity,
        },
        None => Classification {
            category: "Unknown",
            subcategory: "Unknown",
            severity: Severity::Low,
        },
    }
}
