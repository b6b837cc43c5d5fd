//! Parameters the provider appends to the redirect URI when sending the end-user back.

// crates.io
use url::form_urlencoded;
// self
use crate::_prelude::*;

/// Callback parameters read from the redirect URI's query string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
	/// Authorization code.
	pub code: Option<String>,
	/// State echoed by the provider.
	pub state: Option<String>,
	/// Provider error code.
	pub error: Option<String>,
	/// Provider error description.
	pub error_description: Option<String>,
}
impl Callback {
	/// A callback carrying nothing; used when an operation is re-entered without a redirect.
	pub fn empty() -> Self {
		Self::default()
	}

	/// A callback carrying an authorization code.
	pub fn with_code(code: impl Into<String>) -> Self {
		Self { code: Some(code.into()), ..Self::default() }
	}

	/// Parses a raw query string (without the leading `?`).
	pub fn from_query(query: &str) -> Self {
		let mut callback = Self::default();

		for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
			let slot = match key.as_ref() {
				"code" => &mut callback.code,
				"state" => &mut callback.state,
				"error" => &mut callback.error,
				"error_description" => &mut callback.error_description,
				_ => continue,
			};

			if !value.is_empty() {
				*slot = Some(value.into_owned());
			}
		}

		callback
	}

	/// Parses the query string of a full redirect URL.
	pub fn from_url(url: &Url) -> Self {
		url.query().map(Self::from_query).unwrap_or_default()
	}

	/// Sets the echoed state.
	pub fn state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Returns the provider error, if the callback carries one.
	pub fn provider_error(&self) -> Option<Error> {
		self.error.as_ref().map(|error| Error::Provider {
			error: error.clone(),
			description: self.error_description.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_codes_and_errors() {
		let url = Url::parse("https://shop.example.com/callback?code=abc&state=xyz&foo=bar")
			.expect("Callback fixture should parse.");
		let callback = Callback::from_url(&url);

		assert_eq!(callback.code.as_deref(), Some("abc"));
		assert_eq!(callback.state.as_deref(), Some("xyz"));
		assert!(callback.provider_error().is_none());

		let callback = Callback::from_query(
			"error=access_denied&error_description=User+declined+the+consent",
		);
		let err = callback.provider_error().expect("Provider error should be exposed.");

		assert!(matches!(
			err,
			Error::Provider { ref error, description: Some(ref description) }
				if error == "access_denied" && description == "User declined the consent"
		));
	}

	#[test]
	fn empty_values_are_ignored() {
		let callback = Callback::from_query("?code=&state=s1");

		assert_eq!(callback.code, None);
		assert_eq!(callback.state.as_deref(), Some("s1"));
		assert_eq!(Callback::from_url(&Url::parse("https://a.example").expect("URL")), Callback::empty());
	}
}
