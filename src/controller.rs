//! Submit/change orchestration
//!
//! [`FormController`] wires the form state, the rule set, and the
//! dependent-field resolver into the two handlers the rendering layer
//! consumes. It owns the session-scoped collaborators explicitly — nothing
//! here reaches for process-wide context.

use crate::form::{ErrorSnapshot, FormResult, FormSnapshot, FormState};
use crate::mask::InputMask;
use crate::resolver::DependentFieldResolver;
use crate::rules::RuleSet;
use crate::services::{AddressLookup, AddressRecord, Enrollment, EnrollmentService, Notifier, SaveError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const SAVED_MESSAGE: &str = "Salvo com sucesso!";
const GENERIC_FAILURE_MESSAGE: &str = "Não foi possível";

type PayloadBuilder = Box<dyn Fn(&FormSnapshot) -> FormResult<Enrollment> + Send + Sync>;
type EntitySeeder = Box<dyn Fn(&Enrollment) -> FormSnapshot + Send + Sync>;

/// What the rendering layer reads on every render.
#[derive(Debug, Clone)]
pub struct FormView {
	pub data: FormSnapshot,
	pub errors: ErrorSnapshot,
	/// A dependent lookup is outstanding: dependent inputs and the submit
	/// action are expected to be disabled.
	pub busy: bool,
	/// The identity field belongs to a persisted entity and is no longer
	/// editable.
	pub disabled_identity_field: bool,
}

/// Result of one submit attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
	/// Persisted; the form was re-seeded from the saved entity.
	Saved,
	/// Validation failed — nothing was sent, the errors are also visible
	/// through [`FormController::view`].
	Invalid(ErrorSnapshot),
	/// A lookup or a prior submit is still outstanding; this attempt was a
	/// no-op, not queued.
	Blocked,
	/// The persistence collaborator failed; already surfaced through the
	/// notifier.
	Failed(SaveError),
}

/// Composition root for one editing session.
pub struct FormController {
	state: Arc<Mutex<FormState>>,
	rules: RuleSet,
	masks: HashMap<String, InputMask>,
	resolver: Option<DependentFieldResolver>,
	identity_field: Option<String>,
	errors: Mutex<ErrorSnapshot>,
	submitting: AtomicBool,
	last_loaded: Mutex<Option<Enrollment>>,
	service: Arc<dyn EnrollmentService>,
	notifier: Arc<dyn Notifier>,
	build_payload: PayloadBuilder,
	seed_values: EntitySeeder,
}

impl FormController {
	/// Creates a controller over the given state and rules.
	///
	/// `build_payload` reshapes a validated flat snapshot into the entity
	/// the persistence collaborator expects; `seed_values` flattens a
	/// persisted entity back into field values for editing.
	pub fn new<P, S>(
		state: FormState,
		rules: RuleSet,
		service: Arc<dyn EnrollmentService>,
		notifier: Arc<dyn Notifier>,
		build_payload: P,
		seed_values: S,
	) -> Self
	where
		P: Fn(&FormSnapshot) -> FormResult<Enrollment> + Send + Sync + 'static,
		S: Fn(&Enrollment) -> FormSnapshot + Send + Sync + 'static,
	{
		Self {
			state: Arc::new(Mutex::new(state)),
			rules,
			masks: HashMap::new(),
			resolver: None,
			identity_field: None,
			errors: Mutex::new(ErrorSnapshot::new()),
			submitting: AtomicBool::new(false),
			last_loaded: Mutex::new(None),
			service,
			notifier,
			build_payload: Box::new(build_payload),
			seed_values: Box::new(seed_values),
		}
	}

	/// Attaches an input mask to a field.
	pub fn with_mask(mut self, field: &str, mask: InputMask) -> Self {
		self.masks.insert(field.to_string(), mask);
		self
	}

	/// Declares the immutable identity field (locked once an entity exists).
	pub fn with_identity_field(mut self, field: &str) -> Self {
		self.identity_field = Some(field.to_string());
		self
	}

	/// Attaches the dependent-field lookup to a trigger field.
	pub fn with_lookup<F>(
		mut self,
		lookup: Arc<dyn AddressLookup>,
		trigger: &str,
		required_digits: usize,
		map_response: F,
	) -> Self
	where
		F: Fn(AddressRecord) -> FormSnapshot + Send + Sync + 'static,
	{
		self.resolver = Some(DependentFieldResolver::new(
			trigger,
			required_digits,
			lookup,
			Arc::clone(&self.state),
			map_response,
		));
		self
	}

	/// Applies one user edit: mask, store, and — for the trigger field —
	/// hand the new value to the resolver.
	///
	/// Edits are applied immediately and are never blocked by an
	/// outstanding lookup. Edits to the locked identity field are dropped.
	pub fn handle_change(&self, field: &str, value: &str) -> FormSnapshot {
		let masked = match self.masks.get(field) {
			Some(mask) => {
				let current = self.state.lock().text(field).to_string();
				mask.apply(value, &current)
			}
			None => value.to_string(),
		};

		let new_value = serde_json::Value::String(masked.clone());
		let (snapshot, changed) = {
			let mut state = self.state.lock();
			let changed = state.value(field) != Some(&new_value);
			match state.set(field, new_value) {
				Ok(snapshot) => (snapshot, changed),
				Err(error) => {
					tracing::debug!(field, %error, "edit dropped");
					return state.snapshot();
				}
			}
		};

		if changed
			&& let Some(resolver) = &self.resolver
			&& resolver.trigger() == field
		{
			// fire-and-forget: stale responses are discarded at arrival time
			resolver.notify(&masked);
		}

		snapshot
	}

	/// Validates the whole snapshot and, when clean, persists the entity.
	///
	/// No-op while a lookup or a prior submit is outstanding. On success the
	/// saved entity re-seeds the form, which also locks the identity field.
	pub async fn handle_submit(&self) -> SubmitOutcome {
		if self.busy() {
			tracing::debug!("submit ignored: dependent lookup outstanding");
			return SubmitOutcome::Blocked;
		}
		if self
			.submitting
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			tracing::debug!("submit ignored: already in flight");
			return SubmitOutcome::Blocked;
		}

		let snapshot = self.state.lock().snapshot();
		let errors = self.rules.validate(&snapshot);
		if !errors.is_empty() {
			*self.errors.lock() = errors.clone();
			self.submitting.store(false, Ordering::SeqCst);
			return SubmitOutcome::Invalid(errors);
		}
		self.errors.lock().clear();

		let enrollment = match (self.build_payload)(&snapshot) {
			Ok(enrollment) => enrollment,
			Err(error) => {
				tracing::error!(%error, "payload shaping failed on a validated snapshot");
				self.notifier.error(GENERIC_FAILURE_MESSAGE);
				self.submitting.store(false, Ordering::SeqCst);
				return SubmitOutcome::Failed(SaveError::Other(error.into()));
			}
		};

		match self.service.save(&enrollment).await {
			Ok(()) => {
				self.notifier.success(SAVED_MESSAGE);
				self.on_entity_loaded(enrollment);
				self.submitting.store(false, Ordering::SeqCst);
				SubmitOutcome::Saved
			}
			Err(error) => {
				match &error {
					SaveError::Conflict { message } => self.notifier.error(message),
					SaveError::Rejected { details } => {
						for detail in details {
							self.notifier.error(detail);
						}
					}
					SaveError::Other(_) => self.notifier.error(GENERIC_FAILURE_MESSAGE),
				}
				self.submitting.store(false, Ordering::SeqCst);
				SubmitOutcome::Failed(error)
			}
		}
	}

	/// Seeds the form from a persisted entity and locks the identity field.
	///
	/// Delivered once when an existing enrollment becomes available, and
	/// again after each successful save. Idempotent for an unchanged
	/// entity value.
	pub fn on_entity_loaded(&self, entity: Enrollment) {
		let mut last = self.last_loaded.lock();
		if last.as_ref() == Some(&entity) {
			return;
		}

		let values = (self.seed_values)(&entity);
		{
			let mut state = self.state.lock();
			if let Err(error) = state.reset(values) {
				tracing::warn!(%error, "entity seed rejected");
				return;
			}
			if let Some(field) = &self.identity_field
				&& let Err(error) = state.lock_field(field)
			{
				tracing::warn!(%error, "identity lock rejected");
			}
		}
		*last = Some(entity);
	}

	/// Whether a dependent lookup is outstanding.
	pub fn busy(&self) -> bool {
		self.resolver.as_ref().is_some_and(DependentFieldResolver::busy)
	}

	/// Message of the most recent lookup failure, if any.
	pub fn last_lookup_failure(&self) -> Option<String> {
		self.resolver
			.as_ref()
			.and_then(DependentFieldResolver::last_failure)
	}

	/// Everything the rendering layer needs for one render pass.
	pub fn view(&self) -> FormView {
		// busy reads the resolver tracker; take it before the state lock so
		// this never inverts the resolver's tracker → state lock order
		let busy = self.busy();
		let errors = self.errors.lock().clone();
		let state = self.state.lock();
		FormView {
			data: state.snapshot(),
			errors,
			busy,
			disabled_identity_field: self
				.identity_field
				.as_deref()
				.is_some_and(|field| state.is_locked(field)),
		}
	}

	/// Clone of the current error snapshot.
	pub fn errors(&self) -> ErrorSnapshot {
		self.errors.lock().clone()
	}

	/// Clone of the current value snapshot.
	pub fn snapshot(&self) -> FormSnapshot {
		self.state.lock().snapshot()
	}
}
