//! OpenID Connect scope sets restricted to the scopes the provider publishes.

// std
use std::slice::Iter;
// self
use crate::{_prelude::*, auth::params::def_param, error::ParameterError};

def_param! {
	/// Individual scope tokens the provider accepts.
	Scope, "scope" {
		/// Mandatory OpenID Connect scope.
		OpenId => "openid",
		/// Profile claims (names, gender, birthdate, language).
		Profile => "profile",
		/// E-mail claims.
		Email => "email",
		/// Phone claims.
		Phone => "phone",
		/// Postal address claims.
		Address => "address",
	}
}

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// The request contains no scope tokens.
	#[error("Scope request cannot be empty.")]
	Empty,
	/// A token is not one of the published scopes.
	#[error("Scope `{scope}` is not supported.")]
	Unknown {
		/// The offending scope token.
		scope: String,
	},
	/// A token appears more than once.
	#[error("Scope `{scope}` is requested more than once.")]
	Duplicate {
		/// The repeated scope token.
		scope: String,
	},
}

/// Ordered set of requested scopes; every token is known and appears exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeSet(Vec<Scope>);
impl ScopeSet {
	/// Creates a scope set from individual tokens, rejecting unknown or repeated ones.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut set = Vec::new();

		for raw in scopes {
			let raw = raw.as_ref();
			let scope = Scope::from_str(raw)
				.map_err(|_| ScopeValidationError::Unknown { scope: raw.to_owned() })?;

			if set.contains(&scope) {
				return Err(ScopeValidationError::Duplicate { scope: raw.to_owned() });
			}

			set.push(scope);
		}

		if set.is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Ok(Self(set))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: Scope) -> bool {
		self.0.contains(&scope)
	}

	/// Iterator over the requested scopes in request order.
	pub fn iter(&self) -> Iter<'_, Scope> {
		self.0.iter()
	}

	/// Returns the space-delimited representation sent to the provider.
	pub fn normalized(&self) -> String {
		self.0.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" ")
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ParameterError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s.split_whitespace()).map_err(|e| ParameterError {
			parameter: Scope::PARAMETER,
			value: s.to_owned(),
			allowed: format!("{} ({e})", Scope::allowed_values()),
		})
	}
}
impl From<Scope> for ScopeSet {
	fn from(value: Scope) -> Self {
		Self(vec![value])
	}
}
impl TryFrom<String> for ScopeSet {
	type Error = ParameterError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<ScopeSet> for String {
	fn from(value: ScopeSet) -> Self {
		value.normalized()
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = Iter<'a, Scope>;
	type Item = &'a Scope;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
