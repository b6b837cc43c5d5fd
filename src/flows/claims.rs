//! Userinfo retrieval: token refresh on expiry, signed-claim verification, and the single
//! automatic re-authentication after a rejected access token.

// self
use crate::{
	_prelude::*,
	auth::{Prompt, TokenKind, TokenSet},
	error::{ProtocolError, StateError},
	flows::{Connector, Transition, authorize},
	http::{self, ProviderHttpClient},
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome},
	state::AuthState,
	verify::Verifier,
};

const USERINFO_ENDPOINT: &str = "userinfo";

impl<C, M> Connector<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches and verifies the userinfo claims, refreshing an expired access token first.
	///
	/// A `401` from the userinfo endpoint restarts the login with `prompt=login` once; a
	/// second consecutive `401` fails with [`ProtocolError::Unauthorized`].
	pub(super) async fn obtain_claims(&mut self) -> Result<Transition> {
		if self.state.tokens.as_ref().is_some_and(TokenSet::is_expired) {
			self.refresh_tokens().await?;
		}

		obs::record_flow_outcome(FlowKind::UserInfo, FlowOutcome::Attempt);

		let result = self.fetch_claims().await;

		obs::record_flow_outcome(
			FlowKind::UserInfo,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	async fn refresh_tokens(&mut self) -> Result<()> {
		const KIND: FlowKind = FlowKind::Refresh;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let facade = self.facade()?;
		let refreshed = match self.state.tokens.as_ref() {
			Some(current) => facade.refresh_token(current, self.state.params.scope.as_ref()).await,
			None => Err(StateError::NotAuthenticated.into()),
		};

		match refreshed {
			Ok(tokens) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				self.set_tokens(tokens);

				Ok(())
			},
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Err(err)
			},
		}
	}

	async fn fetch_claims(&mut self) -> Result<Transition> {
		let userinfo_endpoint = self.provider()?.metadata.userinfo_endpoint.clone();
		let access_token = self
			.token(TokenKind::Access)
			.map(str::to_owned)
			.ok_or(StateError::NotAuthenticated)?;
		let request = http::get_request(&userinfo_endpoint, Some(&access_token))?;
		let response = http::execute(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			USERINFO_ENDPOINT,
			request,
		)
		.await?;

		match response.status().as_u16() {
			200 => {
				let body = String::from_utf8(response.into_body()).map_err(|e| {
					ProtocolError::Decode { context: "userinfo response", reason: e.to_string() }
				})?;
				let provider = self.provider()?;
				let claims =
					Verifier::new(&self.config.client_id, &self.config.client_secret, &provider.keys)
						.verify(&body)?;

				self.state.claims = Some(claims.clone());
				self.state.automated_reauthentication_attempted = false;

				Ok(Transition::Continue(claims))
			},
			401 => self.reauthenticate(),
			status => Err(ProtocolError::UnexpectedStatus {
				endpoint: USERINFO_ENDPOINT,
				status,
				message: None,
				retry_after: None,
			}
			.into()),
		}
	}

	fn reauthenticate(&mut self) -> Result<Transition> {
		if self.state.automated_reauthentication_attempted {
			self.state.reset_session();
			// Stays set until an explicit `authenticate`.
			self.state.automated_reauthentication_attempted = true;

			return Err(ProtocolError::Unauthorized.into());
		}

		let authorization_endpoint = self.provider()?.metadata.authorization_endpoint.clone();
		let mut params = self.state.params.clone();

		params.prompt = Some(Prompt::Login);

		let url = authorize::build_request_url(
			&authorization_endpoint,
			&self.config.client_id,
			&self.config.redirect_uri,
			&params,
		);

		self.state.reset_session();
		self.state.params = params;
		self.state.authentication = AuthState::InProgress;
		self.state.automated_reauthentication_attempted = true;

		Ok(Transition::Redirect(url))
	}
}
