//! Entry request parsing and validation.
//!
//! The raw record arrives with the exact external field names
//! (`sade_zone_id`, `pilot_id`, ...). Every field is serde-defaulted so a
//! structurally incomplete record still deserializes; the validator then
//! resolves missing or malformed fields into a terminal
//! `FIX_INVALID_ENTRY_REQUEST` outcome instead of a deserialization error.
//! Validation never touches a collaborator.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted length for identifier fields.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// A raw, unvalidated entry request as received from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEntryRequest {
    /// Target SADE zone identifier.
    #[serde(default)]
    pub sade_zone_id: String,

    /// Pilot registration identifier.
    #[serde(default)]
    pub pilot_id: String,

    /// Operating organization identifier.
    #[serde(default)]
    pub organization_id: String,

    /// Drone identifier.
    #[serde(default)]
    pub drone_id: String,

    /// Payload weight as a string, parsed as kilograms downstream.
    #[serde(default)]
    pub payload: String,

    /// Requested entry time, RFC 3339.
    #[serde(default)]
    pub requested_entry_time: String,

    /// Request type: ZONE, REGION, or ROUTE.
    #[serde(default)]
    pub request_type: String,

    /// Geometry payload for REGION/ROUTE requests. Echoed into the audit
    /// trail, never branched on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_payload: Option<serde_json::Value>,
}

/// The kind of airspace access requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestType {
    /// Full zone access.
    Zone,
    /// Polygon region with ceiling and floor.
    Region,
    /// Waypoint route.
    Route,
}

impl RequestType {
    /// Canonical uppercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zone => "ZONE",
            Self::Region => "REGION",
            Self::Route => "ROUTE",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "ZONE" => Some(Self::Zone),
            "REGION" => Some(Self::Region),
            "ROUTE" => Some(Self::Route),
            _ => None,
        }
    }
}

/// A validated entry request. Immutable once constructed; the decision is
/// computed about this record.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRequest {
    /// Target SADE zone identifier.
    pub sade_zone_id: String,
    /// Pilot registration identifier.
    pub pilot_id: String,
    /// Operating organization identifier.
    pub organization_id: String,
    /// Drone identifier.
    pub drone_id: String,
    /// Payload weight string; parsed to kilograms by the risk computer.
    pub payload: String,
    /// Parsed entry time.
    pub requested_entry_time: DateTime<FixedOffset>,
    /// The verbatim entry-time string, preserved for echoes and
    /// deterministic action-id derivation.
    pub requested_entry_time_raw: String,
    /// Requested access kind.
    pub request_type: RequestType,
    /// Geometry payload, echoed only.
    pub request_payload: Option<serde_json::Value>,
}

/// Why a raw entry request failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RequestValidationError {
    /// One or more required identifier fields are missing or blank.
    #[error("missing required field(s): {}", fields.join(", "))]
    MissingFields {
        /// The external names of the missing fields.
        fields: Vec<&'static str>,
    },

    /// An identifier field exceeds the accepted length.
    #[error("field {field} exceeds max length: {actual} > {max}")]
    IdentifierTooLong {
        /// External field name.
        field: &'static str,
        /// Actual length in bytes.
        actual: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// `requested_entry_time` is not a valid RFC 3339 timestamp.
    #[error("requested_entry_time is not a valid RFC 3339 timestamp: {value:?}")]
    InvalidEntryTime {
        /// The rejected value.
        value: String,
    },

    /// `request_type` is not one of ZONE, REGION, ROUTE.
    #[error("request_type must be one of ZONE, REGION, ROUTE; got {value:?}")]
    UnknownRequestType {
        /// The rejected value.
        value: String,
    },
}

/// Validates a raw entry request into an [`EntryRequest`].
///
/// # Errors
///
/// Returns [`RequestValidationError`] when identifiers are missing or
/// oversized, the entry time does not parse, or the request type is
/// unrecognized. The caller resolves the error into a terminal
/// `FIX_INVALID_ENTRY_REQUEST` decision.
pub fn validate(raw: &RawEntryRequest) -> Result<EntryRequest, RequestValidationError> {
    let identifiers: [(&'static str, &str); 5] = [
        ("sade_zone_id", &raw.sade_zone_id),
        ("pilot_id", &raw.pilot_id),
        ("organization_id", &raw.organization_id),
        ("drone_id", &raw.drone_id),
        ("requested_entry_time", &raw.requested_entry_time),
    ];

    let missing: Vec<&'static str> = identifiers
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(RequestValidationError::MissingFields { fields: missing });
    }

    for (field, value) in &identifiers {
        if value.len() > MAX_IDENTIFIER_LENGTH {
            return Err(RequestValidationError::IdentifierTooLong {
                field,
                actual: value.len(),
                max: MAX_IDENTIFIER_LENGTH,
            });
        }
    }

    let requested_entry_time = DateTime::parse_from_rfc3339(raw.requested_entry_time.trim())
        .map_err(|_| RequestValidationError::InvalidEntryTime {
            value: raw.requested_entry_time.clone(),
        })?;

    let request_type = RequestType::parse(raw.request_type.trim()).ok_or_else(|| {
        RequestValidationError::UnknownRequestType {
            value: raw.request_type.clone(),
        }
    })?;

    Ok(EntryRequest {
        sade_zone_id: raw.sade_zone_id.trim().to_string(),
        pilot_id: raw.pilot_id.trim().to_string(),
        organization_id: raw.organization_id.trim().to_string(),
        drone_id: raw.drone_id.trim().to_string(),
        payload: raw.payload.clone(),
        requested_entry_time,
        requested_entry_time_raw: raw.requested_entry_time.trim().to_string(),
        request_type,
        request_payload: raw.request_payload.clone(),
    })
}
