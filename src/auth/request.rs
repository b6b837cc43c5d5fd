//! Authentication request parameters: raw caller input and the validated, typed form.

// self
use crate::{
	_prelude::*,
	auth::{Locale, Prompt, Qoa, Qor, ScopeSet, parse_login_hint, parse_max_age},
	error::ParameterError,
};

/// Raw parameters for an authentication or step-up request.
///
/// Every field is optional; omitted values fall back to the ones remembered from the
/// previous request. Values are validated by [`AuthenticationRequest::validate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthenticationRequest {
	/// Space-separated scope tokens.
	pub scope: Option<String>,
	/// Quality of Authentication.
	pub qoa: Option<String>,
	/// Quality of Registration whose claim is requested in userinfo.
	pub qor: Option<String>,
	/// UI locale.
	pub locale: Option<String>,
	/// Opaque state echoed by the provider.
	pub state: Option<String>,
	/// Nonce bound to the issued tokens.
	pub nonce: Option<String>,
	/// E-mail address pre-filled on the login form.
	pub login_hint: Option<String>,
	/// Prompt behavior.
	pub prompt: Option<String>,
	/// Maximum authentication age in seconds.
	pub max_age: Option<String>,
}
impl AuthenticationRequest {
	/// Creates an empty request that reuses every remembered parameter.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the requested scopes.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the Quality of Authentication.
	pub fn qoa(mut self, qoa: impl Into<String>) -> Self {
		self.qoa = Some(qoa.into());

		self
	}

	/// Sets the Quality of Registration.
	pub fn qor(mut self, qor: impl Into<String>) -> Self {
		self.qor = Some(qor.into());

		self
	}

	/// Sets the UI locale.
	pub fn locale(mut self, locale: impl Into<String>) -> Self {
		self.locale = Some(locale.into());

		self
	}

	/// Sets the state value.
	pub fn state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Sets the nonce.
	pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
		self.nonce = Some(nonce.into());

		self
	}

	/// Sets the login hint.
	pub fn login_hint(mut self, login_hint: impl Into<String>) -> Self {
		self.login_hint = Some(login_hint.into());

		self
	}

	/// Sets the prompt behavior.
	pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
		self.prompt = Some(prompt.into());

		self
	}

	/// Sets the maximum authentication age.
	pub fn max_age(mut self, max_age: impl Into<String>) -> Self {
		self.max_age = Some(max_age.into());

		self
	}

	/// Validates the supplied values in a fixed order (scope, qoa, qor, locale, login hint,
	/// prompt, max age); the first invalid one is reported.
	pub fn validate(&self) -> Result<AuthParams, ParameterError> {
		Ok(AuthParams {
			scope: self.scope.as_deref().map(ScopeSet::from_str).transpose()?,
			qoa: self.qoa.as_deref().map(Qoa::from_str).transpose()?,
			qor: self.qor.as_deref().map(Qor::from_str).transpose()?,
			locale: self.locale.as_deref().map(Locale::from_str).transpose()?,
			login_hint: self.login_hint.as_deref().map(parse_login_hint).transpose()?,
			prompt: self.prompt.as_deref().map(Prompt::from_str).transpose()?,
			max_age: self.max_age.as_deref().map(parse_max_age).transpose()?,
			state: self.state.clone(),
			nonce: self.nonce.clone(),
		})
	}
}

/// Validated request parameters; `None` means "not set".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
	/// Requested scopes.
	pub scope: Option<ScopeSet>,
	/// Quality of Authentication, sent as `acr_values`.
	pub qoa: Option<Qoa>,
	/// Quality of Registration whose claim is requested in userinfo.
	pub qor: Option<Qor>,
	/// UI locale, sent as `ui_locales`.
	pub locale: Option<Locale>,
	/// Login hint.
	pub login_hint: Option<String>,
	/// Prompt behavior.
	pub prompt: Option<Prompt>,
	/// Maximum authentication age in seconds.
	pub max_age: Option<u64>,
	/// Opaque state echoed by the provider.
	pub state: Option<String>,
	/// Nonce bound to the issued tokens.
	pub nonce: Option<String>,
}
impl AuthParams {
	/// Merges `overrides` over `self`: an explicit value wins, otherwise the remembered one
	/// is kept.
	pub fn resolve(&self, overrides: &AuthParams) -> AuthParams {
		AuthParams {
			scope: overrides.scope.clone().or_else(|| self.scope.clone()),
			qoa: overrides.qoa.or(self.qoa),
			qor: overrides.qor.or(self.qor),
			locale: overrides.locale.or(self.locale),
			login_hint: overrides.login_hint.clone().or_else(|| self.login_hint.clone()),
			prompt: overrides.prompt.or(self.prompt),
			max_age: overrides.max_age.or(self.max_age),
			state: overrides.state.clone().or_else(|| self.state.clone()),
			nonce: overrides.nonce.clone().or_else(|| self.nonce.clone()),
		}
	}
}
