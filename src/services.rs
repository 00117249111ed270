//! Collaborator contracts: persistence, postal-code lookup, notifications
//!
//! The engine performs no I/O of its own. Everything remote is reached
//! through the traits here, so tests and alternative transports plug in
//! without touching the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Nested address block of a persisted enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
	pub cep: String,
	pub street: String,
	pub city: String,
	pub number: String,
	pub state: String,
	pub neighborhood: String,
	pub address_detail: String,
}

/// The entity shape the persistence collaborator expects.
///
/// `phone` is always delivered canonicalized as `(DD) DDDD-DDDD` or
/// `(DD) DDDDD-DDDD`; `birthday` carries the display format `DD-MM-YYYY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
	pub name: String,
	pub cpf: String,
	pub birthday: String,
	pub address: Address,
	pub phone: String,
}

/// Failure taxonomy of [`EnrollmentService::save`].
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
	/// The identity key (CPF) already belongs to another enrollment. The
	/// backend's own message is shown to the user verbatim.
	#[error("{message}")]
	Conflict { message: String },
	/// The backend rejected the payload with field-independent messages,
	/// each surfaced individually.
	#[error("enrollment rejected: {}", details.join("; "))]
	Rejected { details: Vec<String> },
	/// Anything else: transport failures, unexpected statuses.
	#[error("enrollment save failed")]
	Other(#[source] anyhow::Error),
}

pub type SaveResult<T> = Result<T, SaveError>;

/// Remote persistence for enrollments.
#[async_trait]
pub trait EnrollmentService: Send + Sync {
	/// Persists the enrollment, creating it or replacing the caller's
	/// previous one.
	async fn save(&self, enrollment: &Enrollment) -> SaveResult<()>;
}

/// Payload returned by the postal-code lookup provider, with the provider's
/// own field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
	pub logradouro: String,
	pub localidade: String,
	pub bairro: String,
	pub uf: String,
}

/// Failure of a postal-code lookup.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
	#[error("postal code {0} not found")]
	NotFound(String),
	#[error("address lookup failed")]
	Transport(#[source] anyhow::Error),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Resolves a complete postal code into an address record.
///
/// Invoked only once the postal code reaches its required digit length.
///
/// # Examples
///
/// ```rust,no_run
/// use enrollform::services::{AddressLookup, AddressRecord, LookupResult};
/// use async_trait::async_trait;
///
/// struct ViaCep;
///
/// #[async_trait]
/// impl AddressLookup for ViaCep {
///     async fn get_address(&self, cep: &str) -> LookupResult<AddressRecord> {
///         // issue the HTTP request here
///         # let _ = cep;
///         # unimplemented!()
///     }
/// }
/// ```
#[async_trait]
pub trait AddressLookup: Send + Sync {
	async fn get_address(&self, cep: &str) -> LookupResult<AddressRecord>;
}

/// User-visible notification delivery (toasts in the reference frontend).
pub trait Notifier: Send + Sync {
	fn success(&self, message: &str);
	fn error(&self, message: &str);
}
