//! Form state: field values, dirty tracking, and edit locking
//!
//! [`FormState`] owns the snapshot of every field value for one editing
//! session. All mutation goes through its operations; the snapshot is never
//! handed out by reference, so callers can diff the clones they receive
//! without observing partial updates.

use std::collections::{HashMap, HashSet};

/// Complete field-name → value mapping at one instant.
pub type FormSnapshot = HashMap<String, serde_json::Value>;

/// Field-name → error-message mapping produced by a validation pass.
///
/// Absence of a key means the field is valid; there is no empty-string
/// sentinel.
pub type ErrorSnapshot = HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
	#[error("unknown field: {0}")]
	UnknownField(String),
	#[error("field {0} is locked and cannot be edited")]
	LockedField(String),
	#[error("missing value for field {0}")]
	MissingValue(String),
	#[error("field {field} holds an unexpected value: {reason}")]
	InvalidValue { field: String, reason: String },
}

pub type FormResult<T> = Result<T, FormError>;

/// Field values for a single editing session.
///
/// Fields are registered once, in display order; writes to unregistered
/// names are rejected. Loading a persisted entity locks the identity field
/// against further edits.
pub struct FormState {
	fields: Vec<String>,
	data: FormSnapshot,
	initial: FormSnapshot,
	locked: HashSet<String>,
}

impl FormState {
	/// Creates a state holding the given fields, all set to JSON `null`.
	///
	/// Registration order is display order.
	///
	/// # Examples
	///
	/// ```
	/// use enrollform::form::FormState;
	///
	/// let state = FormState::new(["name", "cpf"]);
	/// assert_eq!(state.fields(), ["name", "cpf"]);
	/// assert!(state.value("name").unwrap().is_null());
	/// ```
	pub fn new<I, S>(fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
		let data: FormSnapshot = fields
			.iter()
			.map(|f| (f.clone(), serde_json::Value::Null))
			.collect();
		Self {
			initial: data.clone(),
			fields,
			data,
			locked: HashSet::new(),
		}
	}

	/// Seeds the snapshot with initial values. Marks nothing dirty.
	///
	/// # Examples
	///
	/// ```
	/// use enrollform::form::FormState;
	/// use serde_json::json;
	///
	/// let mut state = FormState::new(["name"]);
	/// state.initialize([("name".to_string(), json!("Ana"))].into()).unwrap();
	/// assert_eq!(state.value("name"), Some(&json!("Ana")));
	/// assert!(!state.has_changed());
	/// ```
	pub fn initialize(&mut self, values: FormSnapshot) -> FormResult<()> {
		self.check_known(values.keys())?;
		for (field, value) in values {
			self.data.insert(field, value);
		}
		self.initial = self.data.clone();
		Ok(())
	}

	/// Replaces one field's value and returns the resulting snapshot.
	///
	/// The returned snapshot is a clone; it stays stable while the caller
	/// diffs it against a later one. Writing to a locked field is rejected
	/// and leaves the value untouched.
	///
	/// # Examples
	///
	/// ```
	/// use enrollform::form::FormState;
	/// use serde_json::json;
	///
	/// let mut state = FormState::new(["name"]);
	/// let snapshot = state.set("name", json!("Ana")).unwrap();
	/// assert_eq!(snapshot.get("name"), Some(&json!("Ana")));
	/// assert!(state.set("missing", json!("x")).is_err());
	/// ```
	pub fn set(&mut self, field: &str, value: serde_json::Value) -> FormResult<FormSnapshot> {
		if !self.data.contains_key(field) {
			return Err(FormError::UnknownField(field.to_string()));
		}
		if self.locked.contains(field) {
			return Err(FormError::LockedField(field.to_string()));
		}
		self.data.insert(field.to_string(), value);
		Ok(self.data.clone())
	}

	/// Applies several field updates atomically.
	///
	/// Either every update lands or none does: unknown or locked fields fail
	/// the whole merge before anything is written, so no interleaved partial
	/// state is ever observable.
	///
	/// # Examples
	///
	/// ```
	/// use enrollform::form::FormState;
	/// use serde_json::json;
	///
	/// let mut state = FormState::new(["street", "city"]);
	/// let partial = [
	///     ("street".to_string(), json!("Avenida Paulista")),
	///     ("city".to_string(), json!("São Paulo")),
	/// ];
	/// state.merge(partial.into()).unwrap();
	/// assert_eq!(state.value("city"), Some(&json!("São Paulo")));
	/// ```
	pub fn merge(&mut self, partial: FormSnapshot) -> FormResult<FormSnapshot> {
		self.check_known(partial.keys())?;
		if let Some(field) = partial.keys().find(|f| self.locked.contains(*f)) {
			return Err(FormError::LockedField(field.clone()));
		}
		for (field, value) in partial {
			self.data.insert(field, value);
		}
		Ok(self.data.clone())
	}

	/// Replaces the entire snapshot, typically from a persisted entity.
	///
	/// Both the values and the dirty baseline are reset; locking the
	/// identity field is a separate step (see [`FormState::lock_field`]).
	pub fn reset(&mut self, values: FormSnapshot) -> FormResult<()> {
		self.check_known(values.keys())?;
		for field in &self.fields {
			let value = values
				.get(field)
				.cloned()
				.unwrap_or(serde_json::Value::Null);
			self.data.insert(field.clone(), value);
		}
		self.initial = self.data.clone();
		Ok(())
	}

	/// Marks a field as non-editable for the rest of the session.
	///
	/// Used for the identity field once a persisted entity exists: edits to
	/// the identity key after creation are never permitted.
	pub fn lock_field(&mut self, field: &str) -> FormResult<()> {
		if !self.data.contains_key(field) {
			return Err(FormError::UnknownField(field.to_string()));
		}
		self.locked.insert(field.to_string());
		Ok(())
	}

	/// Whether the field has been locked against edits.
	pub fn is_locked(&self, field: &str) -> bool {
		self.locked.contains(field)
	}

	/// Clones the complete current snapshot.
	pub fn snapshot(&self) -> FormSnapshot {
		self.data.clone()
	}

	/// Current value of one field, if registered.
	pub fn value(&self, field: &str) -> Option<&serde_json::Value> {
		self.data.get(field)
	}

	/// Current value of one field as a string slice, empty when null/absent.
	pub fn text(&self, field: &str) -> &str {
		self.data
			.get(field)
			.and_then(serde_json::Value::as_str)
			.unwrap_or("")
	}

	/// Registered field names in display order.
	pub fn fields(&self) -> &[String] {
		&self.fields
	}

	/// Whether any field differs from its seeded value.
	///
	/// # Examples
	///
	/// ```
	/// use enrollform::form::FormState;
	/// use serde_json::json;
	///
	/// let mut state = FormState::new(["name"]);
	/// assert!(!state.has_changed());
	/// state.set("name", json!("Ana")).unwrap();
	/// assert!(state.has_changed());
	/// ```
	pub fn has_changed(&self) -> bool {
		self.fields.iter().any(|f| self.field_changed(f))
	}

	/// Whether one field differs from its seeded value.
	pub fn field_changed(&self, field: &str) -> bool {
		self.data.get(field) != self.initial.get(field)
	}

	fn check_known<'a, I>(&self, fields: I) -> FormResult<()>
	where
		I: IntoIterator<Item = &'a String>,
	{
		for field in fields {
			if !self.data.contains_key(field) {
				return Err(FormError::UnknownField(field.clone()));
			}
		}
		Ok(())
	}
}
