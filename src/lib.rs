//! OpenID Connect relying-party connector for SwissID: drive the authorization-code flow, step up
//! the Quality of Registration, verify signed userinfo, and carry the whole handshake across
//! requests through a pluggable session store.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod state;
pub mod store;
pub mod verify;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::TokenSet,
		config::ConnectorConfig,
		flows::Connector,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::Environment,
		store::{MemoryStore, SessionStore},
	};

	/// Connector type alias used by reqwest-backed integration tests.
	pub type ReqwestTestConnector = Connector<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Client identifier used by the test helpers.
	pub const TEST_CLIENT_ID: &str = "client-it";
	/// Client secret used by the test helpers; userinfo fixtures are HS256-signed with it.
	pub const TEST_CLIENT_SECRET: &str = "secret-it-0123456789abcdef0123456789";
	/// Redirect URI registered for the test client.
	pub const TEST_REDIRECT_URI: &str = "https://shop.example.com/swissid/callback";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a connector configuration whose discovery and step-up endpoints live on the
	/// provided mock base URL.
	pub fn test_config(base_url: &str) -> ConnectorConfig {
		ConnectorConfig::builder(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.redirect_uri(
				Url::parse(TEST_REDIRECT_URI).expect("Test redirect URI should parse successfully."),
			)
			.environment(Environment::Preproduction)
			.discovery_endpoint(
				Url::parse(&format!("{base_url}/idp/oauth2/.well-known/openid-configuration"))
					.expect("Mock discovery endpoint should parse successfully."),
			)
			.step_up_endpoint(
				crate::auth::Qor::Qor1,
				Url::parse(&format!("{base_url}/idcheck/rp/stepup/lot1"))
					.expect("Mock step-up endpoint should parse successfully."),
			)
			.build()
			.expect("Test connector configuration should build successfully.")
	}

	/// Creates a fresh connector backed by an in-memory session store and the reqwest
	/// transport used across integration tests.
	pub async fn build_reqwest_test_connector(
		base_url: &str,
	) -> (ReqwestTestConnector, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let connector = restore_reqwest_test_connector(base_url, store_backend.clone()).await;

		(connector, store_backend)
	}

	/// Restores (or freshly creates) a connector from the provided in-memory store.
	pub async fn restore_reqwest_test_connector(
		base_url: &str,
		store: Arc<MemoryStore>,
	) -> ReqwestTestConnector {
		let store: Arc<dyn SessionStore> = store;

		Connector::restore_with_http_client(
			test_config(base_url),
			store,
			test_reqwest_http_client(),
			ReqwestTransportErrorMapper,
		)
		.await
		.expect("Test connector should restore successfully.")
	}

	/// Creates a connector that starts out authenticated with the supplied tokens.
	pub async fn build_reqwest_test_connector_with_tokens(
		base_url: &str,
		tokens: TokenSet,
	) -> (ReqwestTestConnector, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let connector = Connector::with_tokens_and_http_client(
			test_config(base_url),
			store,
			tokens,
			test_reqwest_http_client(),
			ReqwestTransportErrorMapper,
		)
		.await
		.expect("Test connector should accept seeded tokens.");

		(connector, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
