//! Verified end-user claims and the SwissID-specific claim helpers.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, auth::Qor};

/// Claim carrying the age-over assertion.
pub const AGE_OVER_CLAIM: &str = "urn:swissid:age_over";
/// Claim carrying the attained Quality of Registration.
pub const QOR_CLAIM: &str = "urn:swissid:qor";
/// The only age-over value that counts as "over 18".
pub const AGE_OVER_18: &str = "18";

/// Verified claim set decoded from a signed userinfo response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);
impl ClaimSet {
	/// Returns the raw value of a claim, if present.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Looks a claim up by name; an absent claim yields a `None` value, not an error.
	pub fn claim(&self, name: &str) -> Claim {
		Claim { name: name.to_owned(), value: self.0.get(name).cloned() }
	}

	/// Returns true if the claim is present.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// Number of claims.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no claims are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over claim names and values.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}

	/// Subject identifier.
	pub fn subject(&self) -> Option<&str> {
		self.get("sub").and_then(Value::as_str)
	}

	/// End-user e-mail address.
	pub fn email(&self) -> Option<&str> {
		self.get("email").and_then(Value::as_str)
	}

	/// Attained Quality of Registration, when the provider reports one.
	pub fn qor(&self) -> Option<Qor> {
		self.get(QOR_CLAIM).and_then(Value::as_str).and_then(|raw| raw.parse().ok())
	}

	/// Whether the age-over assertion states "over 18".
	///
	/// Only the exact `"18"` string qualifies; `"16"`, numbers, and absent claims do not.
	pub fn is_age_over_18(&self) -> bool {
		matches!(self.get(AGE_OVER_CLAIM), Some(Value::String(flag)) if flag == AGE_OVER_18)
	}
}
impl From<Map<String, Value>> for ClaimSet {
	fn from(value: Map<String, Value>) -> Self {
		Self(value)
	}
}

/// Result of a claim lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claim {
	/// Requested claim name.
	pub name: String,
	/// Claim value, or `None` when the claim is absent.
	pub value: Option<Value>,
}
