//! Authorization request construction shared by authentication and step-up.

// crates.io
use rand::{Rng, distr::Alphanumeric};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	auth::{AuthParams, QOR_CLAIM, Scope, ScopeSet},
};

const STATE_LEN: usize = 32;
const NONCE_LEN: usize = 32;

/// Merges `overrides` over the remembered parameters and fills in whatever a request cannot
/// go out without: the `openid` scope, a state, and a nonce.
pub(super) fn effective_params(remembered: &AuthParams, overrides: &AuthParams) -> AuthParams {
	let mut params = remembered.resolve(overrides);

	if params.scope.is_none() {
		params.scope = Some(ScopeSet::from(Scope::OpenId));
	}
	if params.state.is_none() {
		params.state = Some(random_string(STATE_LEN));
	}
	if params.nonce.is_none() {
		params.nonce = Some(random_string(NONCE_LEN));
	}

	params
}

/// Appends the authorization request query to `base`; unset parameters are omitted.
pub(super) fn build_request_url(
	base: &Url,
	client_id: &str,
	redirect_uri: &Url,
	params: &AuthParams,
) -> Url {
	let mut url = base.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if let Some(scope) = &params.scope {
		pairs.append_pair("scope", &scope.normalized());
	}
	if let Some(state) = &params.state {
		pairs.append_pair("state", state);
	}
	if let Some(nonce) = &params.nonce {
		pairs.append_pair("nonce", nonce);
	}
	if let Some(qoa) = params.qoa {
		pairs.append_pair("acr_values", qoa.as_str());
	}
	if let Some(locale) = params.locale {
		pairs.append_pair("ui_locales", locale.as_str());
	}
	if let Some(login_hint) = &params.login_hint {
		pairs.append_pair("login_hint", login_hint);
	}
	if let Some(prompt) = params.prompt {
		pairs.append_pair("prompt", prompt.as_str());
	}
	if let Some(max_age) = params.max_age {
		pairs.append_pair("max_age", &max_age.to_string());
	}
	if let Some(qor) = params.qor {
		let claims = json!({ "userinfo": { QOR_CLAIM: { "value": qor.as_str() } } });

		pairs.append_pair("claims", &claims.to_string());
	}

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
