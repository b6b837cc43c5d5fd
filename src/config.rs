//! Connector configuration: client credentials, redirect URI, environment, and transport knobs.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{Qor, TokenSecret},
	error::ConfigError,
	provider::{Environment, ProviderDescriptor},
};

/// Default per-request timeout applied to every outbound call.
pub const DEFAULT_HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(10);
/// Default session-store key under which the connector state is persisted.
pub const DEFAULT_SESSION_KEY: &str = "swissid_connector";

/// Immutable connector configuration.
#[derive(Clone, Debug)]
pub struct ConnectorConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret; also the HS256 verification key.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Endpoints of the selected environment.
	pub provider: ProviderDescriptor,
	/// Timeout for each outbound HTTP request.
	pub http_timeout: StdDuration,
	/// Session-store key for the persisted state.
	pub session_key: String,
}
impl ConnectorConfig {
	/// Creates a new builder for the provided client identifier.
	pub fn builder(client_id: impl Into<String>) -> ConnectorConfigBuilder {
		ConnectorConfigBuilder::new(client_id)
	}

	/// Builds a configuration from raw strings, validating the environment name and the
	/// redirect URI.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_uri: &str,
		environment: &str,
	) -> Result<Self> {
		let environment = Environment::from_str(environment)?;
		let redirect_uri =
			Url::parse(redirect_uri).map_err(|source| ConfigError::InvalidRedirect { source })?;

		Ok(Self::builder(client_id)
			.client_secret(client_secret)
			.redirect_uri(redirect_uri)
			.environment(environment)
			.build()?)
	}

	/// Environment the connector talks to.
	pub fn environment(&self) -> Environment {
		self.provider.environment
	}
}

/// Builder for [`ConnectorConfig`] values.
#[derive(Debug)]
pub struct ConnectorConfigBuilder {
	client_id: String,
	client_secret: Option<String>,
	redirect_uri: Option<Url>,
	environment: Option<Environment>,
	discovery_endpoint: Option<Url>,
	step_up_endpoints: BTreeMap<Qor, Url>,
	http_timeout: StdDuration,
	session_key: String,
}
impl ConnectorConfigBuilder {
	fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri: None,
			environment: None,
			discovery_endpoint: None,
			step_up_endpoints: BTreeMap::new(),
			http_timeout: DEFAULT_HTTP_TIMEOUT,
			session_key: DEFAULT_SESSION_KEY.into(),
		}
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Selects the environment.
	pub fn environment(mut self, environment: Environment) -> Self {
		self.environment = Some(environment);

		self
	}

	/// Overrides the environment's discovery document location.
	pub fn discovery_endpoint(mut self, url: Url) -> Self {
		self.discovery_endpoint = Some(url);

		self
	}

	/// Overrides the environment's step-up endpoint for `level`.
	pub fn step_up_endpoint(mut self, level: Qor, url: Url) -> Self {
		self.step_up_endpoints.insert(level, url);

		self
	}

	/// Overrides the per-request HTTP timeout.
	pub fn http_timeout(mut self, timeout: StdDuration) -> Self {
		self.http_timeout = timeout;

		self
	}

	/// Overrides the session-store key.
	pub fn session_key(mut self, key: impl Into<String>) -> Self {
		self.session_key = key.into();

		self
	}

	/// Consumes the builder and validates the configuration.
	pub fn build(self) -> Result<ConnectorConfig, ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingField { field: "client_id" });
		}

		let client_secret = self
			.client_secret
			.map(TokenSecret::from)
			.filter(|secret| !secret.is_blank())
			.ok_or(ConfigError::MissingField { field: "client_secret" })?;
		let redirect_uri =
			self.redirect_uri.ok_or(ConfigError::MissingField { field: "redirect_uri" })?;
		let environment =
			self.environment.ok_or(ConfigError::MissingField { field: "environment" })?;

		if self.session_key.is_empty() {
			return Err(ConfigError::MissingField { field: "session_key" });
		}

		let mut descriptor = ProviderDescriptor::builder(environment);

		if let Some(url) = self.discovery_endpoint {
			descriptor = descriptor.discovery_endpoint(url);
		}
		for (level, url) in self.step_up_endpoints {
			descriptor = descriptor.step_up_endpoint(level, url);
		}

		Ok(ConnectorConfig {
			client_id: self.client_id,
			client_secret,
			redirect_uri,
			provider: descriptor.build()?,
			http_timeout: self.http_timeout,
			session_key: self.session_key,
		})
	}
}
