//! Form state and validation engine with asynchronous dependent-field
//! resolution
//!
//! This crate provides the engine behind a personal-information data-entry
//! form:
//! - Masked-input transforms for patterned text fields (tax ID, postal
//!   code, phone) with value-dependent pattern selection
//! - Declarative per-field validation rules with first-failure-wins
//!   reporting over the full snapshot
//! - Form state with dirty tracking, atomic multi-field merges, and
//!   identity-field locking after an entity is persisted
//! - Race-free resolution of dependent fields from one trigger field (the
//!   postal code → address pattern), discarding superseded lookup responses
//!   by request id
//! - A controller composing the above into the change/submit handlers a
//!   rendering layer consumes
//!
//! The concrete enrollment form built on the engine lives in
//! [`enrollment`]; remote persistence, address lookup, and notification
//! delivery stay behind the collaborator traits in [`services`].

pub mod controller;
pub mod enrollment;
pub mod form;
pub mod mask;
pub mod resolver;
pub mod rules;
pub mod services;

pub use controller::{FormController, FormView, SubmitOutcome};
pub use form::{ErrorSnapshot, FormError, FormResult, FormSnapshot, FormState};
pub use mask::{InputMask, apply_mask, unmask};
pub use resolver::DependentFieldResolver;
pub use rules::{RuleSet, ValidationRule};
pub use services::{
	Address, AddressLookup, AddressRecord, Enrollment, EnrollmentService, LookupError,
	LookupResult, Notifier, SaveError, SaveResult,
};
