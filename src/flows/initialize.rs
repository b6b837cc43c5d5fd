//! Connector construction: fresh creation with discovery, restoration from the session store,
//! and seeding with previously issued tokens.

// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	config::ConnectorConfig,
	error::ProtocolError,
	flows::Connector,
	http::{self, ProviderHttpClient},
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{ProviderMetadata, ProviderSnapshot, parse_key_set},
	state::{AuthState, ConnectorState},
	store::SessionStore,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const DISCOVERY_ENDPOINT: &str = "discovery";
const JWKS_ENDPOINT: &str = "jwks";

#[cfg(feature = "reqwest")]
impl Connector<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a fresh connector on the default reqwest transport, bounded by
	/// [`ConnectorConfig::http_timeout`].
	pub async fn create(config: ConnectorConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.http_timeout)?;

		Self::create_with_http_client(config, store, http_client, ReqwestTransportErrorMapper).await
	}

	/// Restores the connector persisted under [`ConnectorConfig::session_key`], or creates a
	/// fresh one, on the default reqwest transport.
	pub async fn restore(config: ConnectorConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.http_timeout)?;

		Self::restore_with_http_client(config, store, http_client, ReqwestTransportErrorMapper)
			.await
	}

	/// Creates a connector that starts out authenticated with `tokens`, on the default
	/// reqwest transport.
	pub async fn with_tokens(
		config: ConnectorConfig,
		store: Arc<dyn SessionStore>,
		tokens: TokenSet,
	) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.http_timeout)?;

		Self::with_tokens_and_http_client(
			config,
			store,
			tokens,
			http_client,
			ReqwestTransportErrorMapper,
		)
		.await
	}
}

impl<C, M> Connector<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a fresh connector and loads the discovery document and signing keys.
	///
	/// A failed discovery or key fetch does not fail construction: the connector comes back
	/// uninitialized with the failure recorded as its last error, and every protocol
	/// operation then fails with [`StateError::NotInitialized`](crate::error::StateError).
	/// Only session-store failures are returned as `Err`.
	pub async fn create_with_http_client(
		config: ConnectorConfig,
		store: Arc<dyn SessionStore>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let state = ConnectorState::new(
			config.client_id.clone(),
			config.redirect_uri.clone(),
			config.environment(),
		);
		let mut connector =
			Self::from_parts(config, store, http_client.into(), mapper.into(), state);

		connector.initialize().await?;

		Ok(connector)
	}

	/// Resumes the connector persisted under [`ConnectorConfig::session_key`] without
	/// refetching discovery or keys.
	///
	/// Missing, undecodable, foreign, or uninitialized records are discarded and a fresh
	/// connector is created in their place.
	pub async fn restore_with_http_client(
		config: ConnectorConfig,
		store: Arc<dyn SessionStore>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let http_client = http_client.into();
		let mapper = mapper.into();

		match load_state(&config, store.as_ref()).await? {
			Some(state) => Ok(Self::from_parts(config, store, http_client, mapper, state)),
			None => Self::create_with_http_client(config, store, http_client, mapper).await,
		}
	}

	/// Creates a fresh connector and seeds it with tokens issued earlier.
	///
	/// The connector is authenticated but holds no claims until the next
	/// [`complete_authentication`](Connector::complete_authentication). Tokens are only
	/// seeded when initialization succeeded.
	pub async fn with_tokens_and_http_client(
		config: ConnectorConfig,
		store: Arc<dyn SessionStore>,
		tokens: TokenSet,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let mut connector =
			Self::create_with_http_client(config, store, http_client, mapper).await?;

		if connector.is_initialized() {
			connector.set_tokens(tokens);
			connector.state.authentication = AuthState::Authenticated;
			connector.persist().await?;
		}

		Ok(connector)
	}

	async fn initialize(&mut self) -> Result<()> {
		const KIND: FlowKind = FlowKind::Initialize;

		let span = FlowSpan::new(KIND, "initialize");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let loaded = span.instrument(self.load_provider()).await.map(|snapshot| {
			self.state.provider = Some(snapshot);
		});

		match self.finish(KIND, loaded).await {
			Err(err @ Error::Store(_)) => Err(err),
			Err(err) => {
				obs::warn(KIND, "provider initialization failed", &err);

				Ok(())
			},
			Ok(()) => Ok(()),
		}
	}

	async fn load_provider(&self) -> Result<ProviderSnapshot> {
		let discovery =
			self.fetch_document(DISCOVERY_ENDPOINT, &self.config.provider.discovery).await?;
		let metadata = ProviderMetadata::from_slice(&discovery)?;
		let jwks = self.fetch_document(JWKS_ENDPOINT, &metadata.jwks_uri).await?;
		let keys = parse_key_set(&jwks)?;

		Ok(ProviderSnapshot { metadata, keys })
	}

	async fn fetch_document(&self, endpoint: &'static str, url: &Url) -> Result<Vec<u8>> {
		let request = http::get_request(url, None)?;
		let response = http::execute(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			endpoint,
			request,
		)
		.await?;
		let status = response.status().as_u16();

		if status != 200 {
			return Err(ProtocolError::UnexpectedStatus {
				endpoint,
				status,
				message: None,
				retry_after: None,
			}
			.into());
		}

		Ok(response.into_body())
	}
}

async fn load_state(
	config: &ConnectorConfig,
	store: &dyn SessionStore,
) -> Result<Option<ConnectorState>> {
	let Some(record) = store.get(&config.session_key).await? else {
		return Ok(None);
	};
	let state = match ConnectorState::decode(&record) {
		Ok(state) => state,
		Err(err) => {
			obs::warn(FlowKind::Initialize, "discarding unreadable session record", &err);

			return Ok(None);
		},
	};

	if !state.belongs_to(&config.client_id, config.environment()) {
		obs::warn(
			FlowKind::Initialize,
			"discarding session record of another client",
			&state.client_id,
		);

		return Ok(None);
	}
	if !state.is_initialized() {
		return Ok(None);
	}

	Ok(Some(state))
}
