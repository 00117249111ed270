//! The personal-information enrollment form
//!
//! Concrete wiring of the engine: field roster, masks, validation rules,
//! payload shaping, and the postal-code lookup that fills the address
//! block. Everything the generic modules leave open is pinned down here.

use crate::controller::FormController;
use crate::form::{FormError, FormResult, FormSnapshot, FormState};
use crate::mask::{InputMask, unmask};
use crate::rules::RuleSet;
use crate::services::{
	Address, AddressLookup, AddressRecord, Enrollment, EnrollmentService, Notifier,
};
use regex::Regex;
use std::sync::{Arc, LazyLock};

pub const NAME: &str = "name";
pub const CPF: &str = "cpf";
pub const BIRTHDAY: &str = "birthday";
pub const PHONE: &str = "phone";
pub const CEP: &str = "cep";
pub const STATE: &str = "state";
pub const CITY: &str = "city";
pub const STREET: &str = "street";
pub const NUMBER: &str = "number";
pub const NEIGHBORHOOD: &str = "neighborhood";
pub const ADDRESS_DETAIL: &str = "addressDetail";

/// Field roster in display order.
pub const FIELDS: [&str; 11] = [
	NAME,
	CPF,
	BIRTHDAY,
	PHONE,
	CEP,
	STATE,
	CITY,
	STREET,
	NUMBER,
	NEIGHBORHOOD,
	ADDRESS_DETAIL,
];

/// Digit count at which the postal code fires the address lookup.
pub const CEP_DIGITS: usize = 8;

/// Display format the birthday field carries.
pub const BIRTHDAY_FORMAT: &str = "%d-%m-%Y";

// Canonical national phone shape: area code, then the 8- or 9-digit number
// split before its last four digits.
static PHONE_CANONICAL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(\d{2})(9?\d{4})(\d{4})$").expect("PHONE_CANONICAL: invalid regex pattern")
});

/// Re-formats a phone value into `(DD) DDDD-DDDD` / `(DD) DDDDD-DDDD`.
///
/// The value is stripped to digits first, so masked input and raw digits
/// canonicalize identically. A value that does not match the national shape
/// is returned digits-only, unchanged.
///
/// # Examples
///
/// ```
/// use enrollform::enrollment::canonical_phone;
///
/// assert_eq!(canonical_phone("(21) 3333-4444"), "(21) 3333-4444");
/// assert_eq!(canonical_phone("21999998888"), "(21) 99999-8888");
/// assert_eq!(canonical_phone("(21) 9999-98888"), "(21) 99999-8888");
/// ```
pub fn canonical_phone(value: &str) -> String {
	let digits = unmask(value);
	PHONE_CANONICAL.replace(&digits, "($1) $2-$3").into_owned()
}

/// Mask for the tax-ID field.
pub fn cpf_mask() -> InputMask {
	InputMask::fixed("999.999.999-99")
}

/// Mask for the postal-code field.
pub fn cep_mask() -> InputMask {
	InputMask::fixed("99999-999")
}

/// Mask for the phone field.
///
/// The short pattern carries one overflow placeholder so a ninth digit can
/// be typed before the stored value grows long enough for the selector to
/// switch to the 9-digit pattern.
pub fn phone_mask() -> InputMask {
	InputMask::selected_by(|current| {
		if current.len() < 15 {
			"(99) 9999-99999"
		} else {
			"(99) 99999-9999"
		}
	})
}

/// Validation rules for the whole form, presence before shape before
/// semantics.
pub fn rules() -> RuleSet {
	RuleSet::new()
		.required(NAME, "Digite um nome válido")
		.required(CPF, "Digite um CPF válido")
		.digit_count(CPF, 11, "Digite um CPF válido")
		.required(BIRTHDAY, "Digite uma data de nascimento válida")
		.date(BIRTHDAY, BIRTHDAY_FORMAT, "Digite uma data de nascimento válida")
		.required(PHONE, "Digite um telefone válido")
		.min_digits(PHONE, 10, "Digite um telefone válido")
		.required(CEP, "Digite um CEP válido")
		.digit_count(CEP, CEP_DIGITS, "Digite um CEP válido")
		.required(STATE, "Selecione um estado")
		.required(CITY, "Digite uma cidade válida")
		.required(STREET, "Digite uma rua válida")
		.required(NUMBER, "Digite um número válido")
		.required(NEIGHBORHOOD, "Digite um bairro válido")
}

/// Initial values for a fresh session: empty strings, no birthday.
pub fn initial_values() -> FormSnapshot {
	let mut values: FormSnapshot = FIELDS
		.iter()
		.map(|f| (f.to_string(), serde_json::Value::String(String::new())))
		.collect();
	values.insert(BIRTHDAY.to_string(), serde_json::Value::Null);
	values
}

/// Maps a lookup payload onto the dependent address fields.
pub fn map_address(record: AddressRecord) -> FormSnapshot {
	[
		(STREET.to_string(), serde_json::Value::String(record.logradouro)),
		(CITY.to_string(), serde_json::Value::String(record.localidade)),
		(NEIGHBORHOOD.to_string(), serde_json::Value::String(record.bairro)),
		(STATE.to_string(), serde_json::Value::String(record.uf)),
	]
	.into()
}

/// Reshapes a validated flat snapshot into the persistence entity, with the
/// phone in canonical form.
pub fn build_payload(snapshot: &FormSnapshot) -> FormResult<Enrollment> {
	Ok(Enrollment {
		name: text(snapshot, NAME)?,
		cpf: text(snapshot, CPF)?,
		birthday: text(snapshot, BIRTHDAY)?,
		address: Address {
			cep: text(snapshot, CEP)?,
			street: text(snapshot, STREET)?,
			city: text(snapshot, CITY)?,
			number: text(snapshot, NUMBER)?,
			state: text(snapshot, STATE)?,
			neighborhood: text(snapshot, NEIGHBORHOOD)?,
			address_detail: text_or_empty(snapshot, ADDRESS_DETAIL),
		},
		phone: canonical_phone(&text(snapshot, PHONE)?),
	})
}

/// Flattens a persisted entity back into field values for editing.
pub fn seed_values(entity: &Enrollment) -> FormSnapshot {
	[
		(NAME, entity.name.clone()),
		(CPF, entity.cpf.clone()),
		(BIRTHDAY, entity.birthday.clone()),
		(PHONE, entity.phone.clone()),
		(CEP, entity.address.cep.clone()),
		(STREET, entity.address.street.clone()),
		(CITY, entity.address.city.clone()),
		(STATE, entity.address.state.clone()),
		(NUMBER, entity.address.number.clone()),
		(NEIGHBORHOOD, entity.address.neighborhood.clone()),
		(ADDRESS_DETAIL, entity.address.address_detail.clone()),
	]
	.into_iter()
	.map(|(field, value)| (field.to_string(), serde_json::Value::String(value)))
	.collect()
}

/// Builds the fully-wired controller for one editing session.
pub fn personal_information_form(
	service: Arc<dyn EnrollmentService>,
	lookup: Arc<dyn AddressLookup>,
	notifier: Arc<dyn Notifier>,
) -> FormResult<FormController> {
	let mut state = FormState::new(FIELDS);
	state.initialize(initial_values())?;

	Ok(
		FormController::new(state, rules(), service, notifier, build_payload, seed_values)
			.with_mask(CPF, cpf_mask())
			.with_mask(CEP, cep_mask())
			.with_mask(PHONE, phone_mask())
			.with_identity_field(CPF)
			.with_lookup(lookup, CEP, CEP_DIGITS, map_address),
	)
}

fn text(snapshot: &FormSnapshot, field: &str) -> FormResult<String> {
	match snapshot.get(field) {
		Some(serde_json::Value::String(s)) => Ok(s.clone()),
		Some(serde_json::Value::Null) | None => Err(FormError::MissingValue(field.to_string())),
		Some(other) => Err(FormError::InvalidValue {
			field: field.to_string(),
			reason: format!("expected a string, got {other}"),
		}),
	}
}

fn text_or_empty(snapshot: &FormSnapshot, field: &str) -> String {
	snapshot
		.get(field)
		.and_then(serde_json::Value::as_str)
		.unwrap_or_default()
		.to_string()
}
