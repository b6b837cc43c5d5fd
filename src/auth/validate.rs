//! Pure validation of protocol parameter values against their fixed value sets.
//!
//! [`validate`] never performs I/O and never fails: it reports whether a raw value is
//! acceptable together with a description of what would be. The typed parsers
//! ([`FromStr`] on the parameter enums, [`ScopeSet`], [`parse_login_hint`],
//! [`parse_max_age`]) share the same rules and are what the connector uses internally.

// crates.io
use validator::ValidateEmail;
// self
use crate::{
	_prelude::*,
	auth::{Locale, Prompt, Qoa, Qor, Scope, ScopeSet, TokenKind},
	error::ParameterError,
	provider::Environment,
};

/// Parameter kinds understood by [`validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterKind {
	/// Deployment environment.
	Environment,
	/// Space-separated scope request.
	Scope,
	/// Quality of Authentication.
	Qoa,
	/// Quality of Registration.
	Qor,
	/// UI locale.
	Locale,
	/// Login hint (an e-mail address).
	LoginHint,
	/// Prompt behavior.
	Prompt,
	/// Maximum authentication age in seconds.
	MaxAge,
	/// Token kind readable through the connector.
	TokenType,
}
impl ParameterKind {
	/// Parameter name as it appears in requests and errors.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Environment => Environment::PARAMETER,
			Self::Scope => Scope::PARAMETER,
			Self::Qoa => Qoa::PARAMETER,
			Self::Qor => Qor::PARAMETER,
			Self::Locale => Locale::PARAMETER,
			Self::LoginHint => "login_hint",
			Self::Prompt => Prompt::PARAMETER,
			Self::MaxAge => "max_age",
			Self::TokenType => TokenKind::PARAMETER,
		}
	}

	/// Human-readable description of the accepted values.
	pub fn allowed_values(self) -> String {
		match self {
			Self::Environment => Environment::allowed_values(),
			Self::Scope => Scope::allowed_values(),
			Self::Qoa => Qoa::allowed_values(),
			Self::Qor => Qor::allowed_values(),
			Self::Locale => Locale::allowed_values(),
			Self::LoginHint => "a valid e-mail address".into(),
			Self::Prompt => Prompt::allowed_values(),
			Self::MaxAge => "a number >= 0".into(),
			Self::TokenType => TokenKind::allowed_values(),
		}
	}
}

/// Outcome of [`validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validation {
	/// Whether the value is acceptable.
	pub valid: bool,
	/// Description of the accepted values.
	pub allowed_values: String,
}

/// Checks a raw value against the value set of `kind`.
pub fn validate(kind: ParameterKind, value: &str) -> Validation {
	Validation { valid: check(kind, value).is_ok(), allowed_values: kind.allowed_values() }
}

/// Like [`validate`], but returns the descriptive error for invalid values.
pub fn check(kind: ParameterKind, value: &str) -> Result<(), ParameterError> {
	match kind {
		ParameterKind::Environment => Environment::from_str(value).map(drop),
		ParameterKind::Scope => ScopeSet::from_str(value).map(drop),
		ParameterKind::Qoa => Qoa::from_str(value).map(drop),
		ParameterKind::Qor => Qor::from_str(value).map(drop),
		ParameterKind::Locale => Locale::from_str(value).map(drop),
		ParameterKind::LoginHint => parse_login_hint(value).map(drop),
		ParameterKind::Prompt => Prompt::from_str(value).map(drop),
		ParameterKind::MaxAge => parse_max_age(value).map(drop),
		ParameterKind::TokenType => TokenKind::from_str(value).map(drop),
	}
}

/// Accepts any syntactically valid e-mail address.
pub fn parse_login_hint(value: &str) -> Result<String, ParameterError> {
	if value.validate_email() {
		Ok(value.to_owned())
	} else {
		Err(invalid(ParameterKind::LoginHint, value))
	}
}

/// Accepts any non-negative number of seconds; a fractional part is truncated, as the
/// request carries whole seconds.
pub fn parse_max_age(value: &str) -> Result<u64, ParameterError> {
	let raw = value.trim();

	if let Ok(seconds) = raw.parse::<u64>() {
		return Ok(seconds);
	}

	match raw.parse::<f64>() {
		Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds.trunc() as u64),
		_ => Err(invalid(ParameterKind::MaxAge, value)),
	}
}

fn invalid(kind: ParameterKind, value: &str) -> ParameterError {
	ParameterError {
		parameter: kind.name(),
		value: value.to_owned(),
		allowed: kind.allowed_values(),
	}
}
