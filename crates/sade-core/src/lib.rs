//! sade-core - SADE zone admission decision engine
//!
//! Decides, for a Drone|Pilot|Organization (DPO) triple requesting entry
//! into a controlled airspace zone, whether entry is APPROVED, approved
//! with operational constraints, blocked pending remedial actions, or
//! DENIED. Decisions are deterministic, reproducible from identical
//! inputs, and fully auditable: every consulted fact and every rule that
//! fired is recorded in the outcome's audit trace.
//!
//! The engine is stateless between requests. Within a request the two
//! signal retrievals run concurrently; every later stage is strictly
//! sequential, and the claims collaborator is invoked at most once,
//! enforced by a single-use escalation ticket.
//!
//! # Modules
//!
//! - [`request`]: entry request parsing and validation
//! - [`collaborator`]: wire types and async traits for the environment,
//!   reputation, and claims collaborators
//! - [`signal`]: concurrent signal retrieval and normalization
//! - [`incident`]: incident codes, severity families, taxonomy
//! - [`envelope`]: derived risk flags (pure)
//! - [`policy`]: engine threshold knobs
//! - [`rules`]: the ordered admission rule table
//! - [`escalation`]: the single claims-verification call
//! - [`reevaluate`]: final verdict from the claims result
//! - [`decision`]: decision sum type and canonical rendering
//! - [`audit`]: audit trace assembly
//! - [`emit`]: final assembly and shape enforcement
//! - [`engine`]: the per-request pipeline
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = AdmissionEngine::new(environment, reputation, claims);
//! let outcome = engine.decide(&raw_request).await;
//! println!("{}", outcome.record.sade_message);
//! ```

pub mod audit;
pub mod collaborator;
pub mod decision;
pub mod emit;
pub mod engine;
pub mod envelope;
pub mod escalation;
pub mod incident;
pub mod policy;
pub mod request;
pub mod reevaluate;
pub mod rules;
pub mod signal;

pub use audit::AuditTrace;
pub use collaborator::{
    ClaimsRequest, ClaimsResponse, ClaimsVerifier, CollaboratorError, EnvironmentProvider,
    EnvironmentQuery, EnvironmentResponse, ReputationProvider, ReputationQuery,
    ReputationResponse,
};
pub use decision::{Constraint, Decision, DecisionRecord, DenialCode, RequiredAction};
pub use emit::AdmissionOutcome;
pub use engine::AdmissionEngine;
pub use policy::EngineKnobs;
pub use request::{EntryRequest, RawEntryRequest, RequestType};
