//! Declarative per-field validation rules
//!
//! A [`RuleSet`] holds rules in registration order and evaluates every rule
//! against the full snapshot, so cross-field rules are expressible. The
//! first failing rule for a field supplies that field's error message;
//! later rules for the same field are skipped. Rules are pure and
//! synchronous — anything asynchronous belongs to the dependent-field
//! resolver, not here.

use crate::form::{ErrorSnapshot, FormSnapshot};
use crate::mask::unmask;
use chrono::NaiveDate;

type Predicate = Box<dyn Fn(Option<&serde_json::Value>, &FormSnapshot) -> bool + Send + Sync>;

/// One rule: a predicate over a field's value (and the full snapshot) plus
/// the message reported when the predicate fails.
pub struct ValidationRule {
	field: String,
	message: String,
	predicate: Predicate,
}

impl ValidationRule {
	/// Creates a rule for `field` that fails with `message` when
	/// `predicate` returns `false`.
	pub fn new<F>(field: impl Into<String>, message: impl Into<String>, predicate: F) -> Self
	where
		F: Fn(Option<&serde_json::Value>, &FormSnapshot) -> bool + Send + Sync + 'static,
	{
		Self {
			field: field.into(),
			message: message.into(),
			predicate: Box::new(predicate),
		}
	}

	/// Name of the field this rule validates.
	pub fn field(&self) -> &str {
		&self.field
	}

	/// Message reported when this rule fails.
	pub fn message(&self) -> &str {
		&self.message
	}
}

/// Ordered collection of validation rules for one form.
///
/// # Examples
///
/// ```
/// use enrollform::rules::RuleSet;
/// use serde_json::json;
///
/// let rules = RuleSet::new()
///     .required("name", "Digite um nome válido")
///     .digit_count("cpf", 11, "Digite um CPF válido");
///
/// let snapshot = [
///     ("name".to_string(), json!("Ana")),
///     ("cpf".to_string(), json!("123.456.789")),
/// ]
/// .into();
/// let errors = rules.validate(&snapshot);
/// assert_eq!(errors.get("cpf").map(String::as_str), Some("Digite um CPF válido"));
/// assert!(!errors.contains_key("name"));
/// ```
#[derive(Default)]
pub struct RuleSet {
	rules: Vec<ValidationRule>,
}

impl RuleSet {
	pub fn new() -> Self {
		Self { rules: Vec::new() }
	}

	/// Appends a custom rule. Registration order is evaluation order.
	pub fn rule<F>(mut self, field: &str, message: &str, predicate: F) -> Self
	where
		F: Fn(Option<&serde_json::Value>, &FormSnapshot) -> bool + Send + Sync + 'static,
	{
		self.rules.push(ValidationRule::new(field, message, predicate));
		self
	}

	/// Presence rule: the value must be a non-null, non-blank string.
	///
	/// Register this before any shape rule for the same field so an empty
	/// value fails fast with the presence message.
	pub fn required(self, field: &str, message: &str) -> Self {
		self.rule(field, message, |value, _| {
			value
				.and_then(serde_json::Value::as_str)
				.is_some_and(|s| !s.trim().is_empty())
		})
	}

	/// Shape rule: the value must contain exactly `count` digits once
	/// mask literals are stripped.
	pub fn digit_count(self, field: &str, count: usize, message: &str) -> Self {
		self.rule(field, message, move |value, _| {
			value
				.and_then(serde_json::Value::as_str)
				.is_some_and(|s| unmask(s).chars().count() == count)
		})
	}

	/// Shape rule: at least `count` digits once mask literals are stripped.
	pub fn min_digits(self, field: &str, count: usize, message: &str) -> Self {
		self.rule(field, message, move |value, _| {
			value
				.and_then(serde_json::Value::as_str)
				.is_some_and(|s| unmask(s).chars().count() >= count)
		})
	}

	/// Semantic rule: the value must parse as a calendar date in the given
	/// `chrono` format.
	pub fn date(self, field: &str, format: &'static str, message: &str) -> Self {
		self.rule(field, message, move |value, _| {
			value
				.and_then(serde_json::Value::as_str)
				.is_some_and(|s| NaiveDate::parse_from_str(s, format).is_ok())
		})
	}

	/// Runs every rule against the snapshot and collects the first failing
	/// message per field.
	///
	/// The result is recomputed wholesale: a field with no failing rule has
	/// no entry, and stale errors from earlier passes never carry over.
	pub fn validate(&self, snapshot: &FormSnapshot) -> ErrorSnapshot {
		let mut errors = ErrorSnapshot::new();
		for rule in &self.rules {
			if errors.contains_key(&rule.field) {
				continue;
			}
			let value = snapshot.get(&rule.field);
			if !(rule.predicate)(value, snapshot) {
				errors.insert(rule.field.clone(), rule.message.clone());
			}
		}
		errors
	}

	/// Number of registered rules.
	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}
