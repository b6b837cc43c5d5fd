//! The connector state machine and its protocol operations.
//!
//! A [`Connector`] is created fresh (loading discovery metadata and signing keys) or restored
//! from the session store, then driven through `authenticate` → `complete_authentication` →
//! optional `step_up_qor` → `end_session`. Every state-changing operation returns a
//! [`Transition`] telling the web layer whether to redirect the user agent or continue with
//! verified claims; failures are returned as `Err` and recorded as the connector's last error.

pub mod authenticate;
pub mod callback;
pub mod claims;
pub mod end_session;
pub mod initialize;
pub mod step_up;

mod authorize;

pub use callback::*;

// self
use crate::{
	_prelude::*,
	auth::{Claim, ClaimSet, Qor, TokenKind, TokenSet},
	config::ConnectorConfig,
	error::{RecordedError, StateError},
	http::ProviderHttpClient,
	oauth::{BasicFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome},
	provider::ProviderSnapshot,
	state::{AuthState, ConnectorState, StepUpState},
	store::SessionStore,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Connector specialized for the crate's default reqwest transport stack.
pub type ReqwestConnector = Connector<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// What the web layer should do after a state-changing operation succeeded.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
	/// Redirect the user agent to this URL; the flow resumes on the callback.
	Redirect(Url),
	/// The flow is complete; these are the verified end-user claims.
	Continue(ClaimSet),
}
impl Transition {
	/// Returns the redirect target, if this is a redirect.
	pub fn redirect_url(&self) -> Option<&Url> {
		match self {
			Self::Redirect(url) => Some(url),
			Self::Continue(_) => None,
		}
	}

	/// Returns the claims, if the flow completed.
	pub fn claims(&self) -> Option<&ClaimSet> {
		match self {
			Self::Redirect(_) => None,
			Self::Continue(claims) => Some(claims),
		}
	}
}

/// Stateful OpenID Connect relying-party connector for one end-user session.
///
/// The connector owns the HTTP client, the transport error mapper, and the session store.
/// Its entire protocol state lives in [`ConnectorState`] and is written to the store under
/// [`ConnectorConfig::session_key`] after every operation.
pub struct Connector<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: ConnectorConfig,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	store: Arc<dyn SessionStore>,
	state: ConnectorState,
}
impl<C, M> Connector<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn from_parts(
		config: ConnectorConfig,
		store: Arc<dyn SessionStore>,
		http_client: Arc<C>,
		transport_mapper: Arc<M>,
		state: ConnectorState,
	) -> Self {
		Self { config, http_client, transport_mapper, store, state }
	}

	/// Connector configuration.
	pub fn config(&self) -> &ConnectorConfig {
		&self.config
	}

	/// Current protocol state.
	pub fn state(&self) -> &ConnectorState {
		&self.state
	}

	/// Whether discovery metadata and signing keys were loaded.
	pub fn is_initialized(&self) -> bool {
		self.state.is_initialized()
	}

	/// Whether an authentication request has been issued (or completed).
	pub fn is_authentication_initialized(&self) -> bool {
		self.state.authentication != AuthState::NotStarted
	}

	/// Whether the end-user is authenticated.
	pub fn is_authenticated(&self) -> bool {
		self.state.authentication == AuthState::Authenticated
	}

	/// Whether a step-up to `level` has been issued (or completed).
	pub fn is_step_up_initialized(&self, level: Qor) -> bool {
		self.state.step_up_state(level) != StepUpState::NotStarted
	}

	/// Whether the step-up to `level` completed.
	pub fn is_stepped_up(&self, level: Qor) -> bool {
		self.state.step_up_state(level) == StepUpState::SteppedUp
	}

	/// Verified claims from the last userinfo fetch.
	pub fn claims(&self) -> Option<&ClaimSet> {
		self.state.claims.as_ref()
	}

	/// Looks a claim up by name.
	///
	/// An absent claim yields a `None` value and is not an error. Calling this before any
	/// claims were verified fails with [`StateError::NotAuthenticated`], which is also
	/// recorded as the last error.
	pub fn get_claim(&mut self, name: &str) -> Result<Claim> {
		if let Some(claims) = self.state.claims.as_ref() {
			return Ok(claims.claim(name));
		}

		Err(self.record(StateError::NotAuthenticated.into()))
	}

	/// Returns the stored token of the requested kind.
	pub fn token(&self, kind: TokenKind) -> Option<&str> {
		let tokens = self.state.tokens.as_ref()?;

		match kind {
			TokenKind::Access => Some(tokens.access_token.expose()),
			TokenKind::Refresh => Some(tokens.refresh_token.expose()),
		}
	}

	/// Like [`Connector::token`], but takes the raw kind name (`ACCESS` or `REFRESH`); an
	/// unknown name is recorded as the last error.
	pub fn token_by_name(&mut self, kind: &str) -> Result<Option<&str>> {
		match TokenKind::from_str(kind) {
			Ok(kind) => Ok(self.token(kind)),
			Err(e) => Err(self.record(e.into())),
		}
	}

	/// Absolute expiry of the access token.
	pub fn access_token_expiry(&self) -> Option<OffsetDateTime> {
		self.state.tokens.as_ref().map(|tokens| tokens.expires_at)
	}

	/// Whether a failure has been recorded.
	pub fn has_error(&self) -> bool {
		self.state.last_error.is_some()
	}

	/// Most recently recorded failure.
	pub fn last_error(&self) -> Option<&RecordedError> {
		self.state.last_error.as_ref()
	}

	fn record(&mut self, err: Error) -> Error {
		self.state.last_error = Some(RecordedError::from(&err));

		err
	}

	async fn persist(&self) -> Result<()> {
		let record = self.state.encode()?;

		self.store.put(&self.config.session_key, record).await?;

		Ok(())
	}

	fn provider(&self) -> Result<&ProviderSnapshot> {
		self.state.provider.as_ref().ok_or_else(|| StateError::NotInitialized.into())
	}

	fn facade(&self) -> Result<BasicFacade<C, M>> {
		let provider = self.provider()?;

		Ok(BasicFacade::new(
			&provider.metadata.token_endpoint,
			&self.config.client_id,
			self.config.client_secret.expose(),
			self.http_client.clone(),
			self.transport_mapper.clone(),
		))
	}

	/// Records the outcome of an operation, persists the state, and hands the result back.
	async fn finish<T>(&mut self, kind: FlowKind, result: Result<T>) -> Result<T> {
		let result = match result {
			Ok(value) => Ok(value),
			Err(err) => Err(self.record(err)),
		};
		let result = match (result, self.persist().await) {
			(Ok(value), Ok(())) => Ok(value),
			(Ok(_), Err(err)) => Err(self.record(err)),
			(Err(err), _) => Err(err),
		};

		obs::record_flow_outcome(
			kind,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	fn set_tokens(&mut self, tokens: TokenSet) {
		self.state.tokens = Some(tokens);
	}
}
impl<C, M> Debug for Connector<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Connector")
			.field("client_id", &self.config.client_id)
			.field("environment", &self.config.environment())
			.field("initialized", &self.state.is_initialized())
			.field("authentication", &self.state.authentication)
			.field("step_up", &self.state.step_up)
			.finish()
	}
}
