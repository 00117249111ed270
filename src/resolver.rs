//! Asynchronous dependent-field resolution
//!
//! One trigger field (the postal code), once complete, issues a lookup whose
//! result populates several other fields while the user keeps typing. Each
//! lookup carries a monotonically increasing request id; only the response
//! matching the latest issued id may write into the form state. Responses
//! from superseded requests are discarded at arrival time — there is no
//! cancellation of in-flight lookups, by comparison of request ids alone.

use crate::form::{FormSnapshot, FormState};
use crate::services::{AddressLookup, AddressRecord};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

type ResponseMapper = Arc<dyn Fn(AddressRecord) -> FormSnapshot + Send + Sync>;

/// Progress of the outstanding lookup, guarded as one unit so issuing a new
/// request and committing a response can never interleave.
#[derive(Default)]
struct Tracker {
	latest: u64,
	busy: bool,
	last_failure: Option<String>,
}

/// Watches a trigger field and resolves its dependent fields.
///
/// State machine per trigger edit: idle → pending on a complete value;
/// pending → resolved when the matching response merges, → superseded when a
/// newer request is issued first, → failed on lookup error (dependent fields
/// keep their prior values, nothing is fabricated).
pub struct DependentFieldResolver {
	trigger: String,
	required_digits: usize,
	lookup: Arc<dyn AddressLookup>,
	map_response: ResponseMapper,
	state: Arc<Mutex<FormState>>,
	tracker: Arc<Mutex<Tracker>>,
}

impl DependentFieldResolver {
	/// Creates a resolver for `trigger`, merging each successful response
	/// through `map_response` into the shared form state.
	pub fn new<F>(
		trigger: impl Into<String>,
		required_digits: usize,
		lookup: Arc<dyn AddressLookup>,
		state: Arc<Mutex<FormState>>,
		map_response: F,
	) -> Self
	where
		F: Fn(AddressRecord) -> FormSnapshot + Send + Sync + 'static,
	{
		Self {
			trigger: trigger.into(),
			required_digits,
			lookup,
			map_response: Arc::new(map_response),
			state,
			tracker: Arc::new(Mutex::new(Tracker::default())),
		}
	}

	/// Name of the field whose completion fires a lookup.
	pub fn trigger(&self) -> &str {
		&self.trigger
	}

	/// Whether a lookup is outstanding. While `true` the submit action and
	/// the dependent inputs are expected to be disabled.
	pub fn busy(&self) -> bool {
		self.tracker.lock().busy
	}

	/// Message of the most recent lookup failure, cleared by the next
	/// successful resolution.
	pub fn last_failure(&self) -> Option<String> {
		self.tracker.lock().last_failure.clone()
	}

	/// Completeness predicate over the trigger value.
	///
	/// Mirrors the wire check: strip the single mask separator, then compare
	/// the remaining character count against the required digit count. The
	/// characters themselves are not tested — the input mask upstream only
	/// ever produces digits here.
	///
	/// # Examples
	///
	/// ```
	/// use enrollform::resolver::DependentFieldResolver;
	///
	/// assert!(DependentFieldResolver::value_complete("01310-100", 8));
	/// assert!(!DependentFieldResolver::value_complete("01310-10", 8));
	/// assert!(!DependentFieldResolver::value_complete("", 8));
	/// ```
	pub fn value_complete(value: &str, required_digits: usize) -> bool {
		value.replacen('-', "", 1).chars().count() == required_digits
	}

	/// Whether the given trigger value satisfies this resolver's
	/// completeness predicate.
	pub fn is_complete(&self, value: &str) -> bool {
		Self::value_complete(value, self.required_digits)
	}

	/// Reacts to a change of the trigger field.
	///
	/// Incomplete values do nothing. A complete value issues a lookup under
	/// a fresh request id and returns the handle of the spawned resolution
	/// task; the caller may drop it — the commit/discard decision happens at
	/// response time, never through the handle.
	pub fn notify(&self, value: &str) -> Option<JoinHandle<()>> {
		if !self.is_complete(value) {
			return None;
		}

		let request_id = {
			let mut tracker = self.tracker.lock();
			tracker.latest += 1;
			tracker.busy = true;
			tracker.latest
		};
		let code = value.replacen('-', "", 1);
		tracing::debug!(request_id, code = %code, "issuing address lookup");

		let lookup = Arc::clone(&self.lookup);
		let map_response = Arc::clone(&self.map_response);
		let state = Arc::clone(&self.state);
		let tracker = Arc::clone(&self.tracker);

		Some(tokio::spawn(async move {
			let outcome = lookup.get_address(&code).await;

			let mut tracker = tracker.lock();
			if request_id != tracker.latest {
				tracing::debug!(
					request_id,
					latest = tracker.latest,
					"discarding superseded lookup response"
				);
				return;
			}

			match outcome {
				Ok(record) => {
					let updates = map_response(record);
					if let Err(error) = state.lock().merge(updates) {
						tracing::warn!(%error, "dependent-field merge rejected");
					}
					tracker.busy = false;
					tracker.last_failure = None;
				}
				Err(error) => {
					tracing::warn!(request_id, %error, "address lookup failed");
					tracker.busy = false;
					tracker.last_failure = Some(error.to_string());
				}
			}
		}))
	}
}
