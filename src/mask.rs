//! Masked-input transforms for patterned text fields
//!
//! A mask pattern is a sequence of literal characters and `9` digit
//! placeholders. Applying a mask strips everything that is not a digit from
//! the input, then walks the pattern re-inserting literals at their fixed
//! positions, truncating digits past the last placeholder.

/// Digit placeholder character used in mask patterns.
const PLACEHOLDER: char = '9';

/// Applies a mask pattern to a raw value.
///
/// All non-digit characters are stripped from `raw` first, so feeding an
/// already-masked value back in is a no-op. Literals are emitted only while
/// digits remain, which keeps partially-typed values free of trailing
/// separators.
///
/// # Examples
///
/// ```
/// use enrollform::mask::apply_mask;
///
/// assert_eq!(apply_mask("12345678901", "999.999.999-99"), "123.456.789-01");
/// assert_eq!(apply_mask("1234", "999.999.999-99"), "123.4");
/// assert_eq!(apply_mask("123.456.789-01", "999.999.999-99"), "123.456.789-01");
/// // Digits past the placeholder count are dropped
/// assert_eq!(apply_mask("123456789", "99999-999"), "12345-678");
/// ```
pub fn apply_mask(raw: &str, pattern: &str) -> String {
	let digits = unmask(raw);
	let mut digits = digits.chars().peekable();
	let mut masked = String::with_capacity(pattern.len());

	for ch in pattern.chars() {
		if ch == PLACEHOLDER {
			match digits.next() {
				Some(d) => masked.push(d),
				None => break,
			}
		} else {
			if digits.peek().is_none() {
				break;
			}
			masked.push(ch);
		}
	}

	masked
}

/// Strips every non-digit character from a value.
///
/// Used before dispatching a value to a backend and before any
/// equality/length check over the digits a user actually typed.
///
/// # Examples
///
/// ```
/// use enrollform::mask::unmask;
///
/// assert_eq!(unmask("123.456.789-01"), "12345678901");
/// assert_eq!(unmask("(21) 99999-9999"), "21999999999");
/// assert_eq!(unmask(""), "");
/// ```
pub fn unmask(value: &str) -> String {
	value.chars().filter(char::is_ascii_digit).collect()
}

/// Pattern selector: picks a mask pattern based on the value currently held
/// by the field.
type PatternSelector = Box<dyn Fn(&str) -> &'static str + Send + Sync>;

/// An input mask whose pattern may depend on the current field value.
///
/// Most fields use a single fixed pattern. A field whose valid lengths are
/// ambiguous as raw digit strings (the 8/9-digit national phone number)
/// selects between patterns by inspecting how much has been typed so far.
pub struct InputMask {
	selector: PatternSelector,
}

impl InputMask {
	/// Creates a mask with a single fixed pattern.
	///
	/// # Examples
	///
	/// ```
	/// use enrollform::mask::InputMask;
	///
	/// let mask = InputMask::fixed("99999-999");
	/// assert_eq!(mask.apply("01310100", ""), "01310-100");
	/// ```
	pub fn fixed(pattern: &'static str) -> Self {
		Self {
			selector: Box::new(move |_| pattern),
		}
	}

	/// Creates a mask that selects its pattern from the current field value.
	///
	/// # Examples
	///
	/// ```
	/// use enrollform::mask::InputMask;
	///
	/// let mask = InputMask::selected_by(|current| {
	///     if current.len() < 15 { "(99) 9999-99999" } else { "(99) 99999-9999" }
	/// });
	/// assert_eq!(mask.apply("2133334444", ""), "(21) 3333-4444");
	/// ```
	pub fn selected_by<F>(selector: F) -> Self
	where
		F: Fn(&str) -> &'static str + Send + Sync + 'static,
	{
		Self {
			selector: Box::new(selector),
		}
	}

	/// Returns the pattern the selector picks for the given current value.
	pub fn pattern_for(&self, current: &str) -> &'static str {
		(self.selector)(current)
	}

	/// Masks a raw input value, selecting the pattern from `current`.
	pub fn apply(&self, raw: &str, current: &str) -> String {
		apply_mask(raw, self.pattern_for(current))
	}
}

impl std::fmt::Debug for InputMask {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InputMask").finish_non_exhaustive()
	}
}
