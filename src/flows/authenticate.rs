//! Authorization-code login: building the authorization redirect and handling the callback.

// self
use crate::{
	_prelude::*,
	auth::AuthenticationRequest,
	error::{ProtocolError, StateError},
	flows::{Callback, Connector, Transition, authorize},
	http::ProviderHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	state::AuthState,
};

impl<C, M> Connector<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts a login and returns the redirect to the provider's authorization endpoint.
	///
	/// Supplied parameters are validated in a fixed order and merged over the ones
	/// remembered from the previous request. Any previous session (tokens, claims, step-ups)
	/// is dropped.
	pub async fn authenticate(&mut self, request: &AuthenticationRequest) -> Result<Transition> {
		const KIND: FlowKind = FlowKind::Authenticate;

		let span = FlowSpan::new(KIND, "authenticate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		self.state.last_error = None;

		let result = span.instrument(async { self.start_authentication(request) }).await;

		self.finish(KIND, result).await
	}

	/// Handles the provider's redirect back to the relying party.
	///
	/// While a login is in progress the callback's authorization code is exchanged and the
	/// userinfo claims are verified. Once authenticated, the call only refreshes the claims
	/// (refreshing the access token first if it expired) and never exchanges a code again.
	pub async fn complete_authentication(&mut self, callback: &Callback) -> Result<Transition> {
		const KIND: FlowKind = FlowKind::CompleteAuthentication;

		let span = FlowSpan::new(KIND, "complete_authentication");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		self.state.last_error = None;

		let result = span.instrument(self.resume_authentication(callback)).await;

		self.finish(KIND, result).await
	}

	fn start_authentication(&mut self, request: &AuthenticationRequest) -> Result<Transition> {
		let authorization_endpoint = self.provider()?.metadata.authorization_endpoint.clone();
		let overrides = request.validate()?;
		let params = authorize::effective_params(&self.state.params, &overrides);
		let url = authorize::build_request_url(
			&authorization_endpoint,
			&self.config.client_id,
			&self.config.redirect_uri,
			&params,
		);

		self.state.reset_session();
		self.state.params = params;
		self.state.authentication = AuthState::InProgress;

		Ok(Transition::Redirect(url))
	}

	async fn resume_authentication(&mut self, callback: &Callback) -> Result<Transition> {
		self.provider()?;

		match self.state.authentication {
			AuthState::NotStarted => Err(StateError::AuthenticationNotInitiated.into()),
			AuthState::InProgress => {
				let code = self.accept_callback(callback)?;

				self.exchange_code(&code).await?;

				self.obtain_claims().await
			},
			AuthState::Authenticated => self.obtain_claims().await,
		}
	}

	/// Checks a callback and returns its authorization code.
	pub(super) fn accept_callback(&mut self, callback: &Callback) -> Result<String> {
		if let Some(err) = callback.provider_error() {
			return Err(err);
		}
		// A stored state must come back unchanged; a missing one counts as a mismatch.
		if let Some(expected) = self.state.params.state.as_deref() {
			if callback.state.as_deref() != Some(expected) {
				return Err(StateError::StateMismatch.into());
			}
		}

		let code = callback.code.clone().ok_or(ProtocolError::MissingAuthorizationCode)?;

		self.state.authorization_code = Some(code.clone());

		Ok(code)
	}

	/// Exchanges `code` at the token endpoint; the connector is authenticated afterwards.
	pub(super) async fn exchange_code(&mut self, code: &str) -> Result<()> {
		let facade = self.facade()?;
		let tokens = facade.exchange_code(code, &self.config.redirect_uri).await?;

		self.set_tokens(tokens);
		self.state.authentication = AuthState::Authenticated;

		Ok(())
	}
}
