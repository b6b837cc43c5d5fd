mod mock_idp;

// crates.io
use httpmock::prelude::*;
// self
use mock_idp::{
	END_SESSION_PATH, callback_for, mount_code_exchange, mount_provider, mount_userinfo, user_claims,
};
use swissid_connector::{
	_preludet::*,
	auth::{AuthenticationRequest, TokenKind, TokenSet},
	config::ConnectorConfig,
	flows::{Callback, Connector},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::Environment,
	state::AuthState,
	store::{MemoryStore, SessionStore},
};

#[tokio::test]
async fn restored_connector_resumes_without_refetching_metadata() {
	let server = MockServer::start_async().await;
	let idp = mount_provider(&server).await;
	let token = mount_code_exchange(&server, "code-1", "access-1", "refresh-1").await;
	let userinfo = mount_userinfo(&server, "access-1", &user_claims()).await;
	let base_url = server.base_url();
	let (mut connector, store) = build_reqwest_test_connector(&base_url).await;

	connector
		.authenticate(&AuthenticationRequest::new().scope("openid").qoa("qoa2").state("state-1"))
		.await
		.expect("Login should start.");

	// The callback arrives on a new request with a new connector instance.
	let mut resumed = restore_reqwest_test_connector(&base_url, store.clone()).await;

	assert_eq!(resumed.state(), connector.state());
	assert_eq!(resumed.state().authentication, AuthState::InProgress);

	resumed
		.complete_authentication(&Callback::with_code("code-1").state("state-1"))
		.await
		.expect("Restored connector should complete the login.");

	let restored = restore_reqwest_test_connector(&base_url, store).await;

	assert_eq!(restored.state(), resumed.state());
	assert!(restored.is_authenticated());
	assert_eq!(restored.token(TokenKind::Access), Some("access-1"));
	assert_eq!(
		restored.claims().and_then(|claims| claims.email()),
		Some("jane.doe@example.ch")
	);

	idp.discovery.assert_calls_async(1).await;
	idp.jwks.assert_calls_async(1).await;
	token.assert_calls_async(1).await;
	userinfo.assert_calls_async(1).await;
}

#[tokio::test]
async fn foreign_and_corrupt_records_are_discarded() {
	let server = MockServer::start_async().await;
	let idp = mount_provider(&server).await;
	let base_url = server.base_url();
	let store = Arc::new(MemoryStore::default());
	let session: Arc<dyn SessionStore> = store.clone();
	let mut foreign_config = test_config(&base_url);

	foreign_config.client_id = "another-client".into();

	let foreign: Connector<ReqwestHttpClient, ReqwestTransportErrorMapper> =
		Connector::create_with_http_client(
			foreign_config,
			session.clone(),
			test_reqwest_http_client(),
			ReqwestTransportErrorMapper,
		)
		.await
		.expect("Foreign connector should be created.");

	assert!(foreign.is_initialized());

	let restored = restore_reqwest_test_connector(&base_url, store.clone()).await;

	assert_eq!(restored.state().client_id, TEST_CLIENT_ID);

	session
		.put(&restored.config().session_key, b"{\"version\":1,\"state\":".to_vec())
		.await
		.expect("Corrupt record should be written.");

	let restored = restore_reqwest_test_connector(&base_url, store).await;

	assert!(restored.is_initialized());
	assert_eq!(restored.state().client_id, TEST_CLIENT_ID);

	idp.discovery.assert_calls_async(3).await;
}

#[tokio::test]
async fn end_session_notifies_the_provider_and_clears_the_record() {
	let server = MockServer::start_async().await;

	mount_provider(&server).await;
	mount_code_exchange(&server, "code-1", "access-1", "refresh-1").await;
	mount_userinfo(&server, "access-1", &user_claims()).await;

	let end_session = server
		.mock_async(|when, then| {
			when.method(GET).path(END_SESSION_PATH).query_param("id_token_hint", "id-access-1");
			then.status(204);
		})
		.await;
	let base_url = server.base_url();
	let (mut connector, store) = build_reqwest_test_connector(&base_url).await;

	let transition =
		connector.authenticate(&AuthenticationRequest::new()).await.expect("Login should start.");
	let redirect = transition.redirect_url().expect("Login should redirect.");

	connector
		.complete_authentication(&callback_for(redirect, "code-1"))
		.await
		.expect("Login should complete.");
	connector.end_session().await.expect("Ending the session should succeed.");

	end_session.assert_calls_async(1).await;

	assert!(!connector.is_authenticated());
	assert!(connector.token(TokenKind::Access).is_none());
	assert!(connector.claims().is_none());
	assert!(store.is_empty());
}

#[tokio::test]
async fn end_session_ignores_notification_failures() {
	let server = MockServer::start_async().await;

	mount_provider(&server).await;

	let base_url = server.base_url();
	let tokens = TokenSet::new(
		"access-1",
		"id-1",
		"refresh-1",
		OffsetDateTime::now_utc() + Duration::hours(1),
	);
	let (mut connector, store) = build_reqwest_test_connector_with_tokens(&base_url, tokens).await;

	// No end-session mock is mounted, so the provider answers 404.
	connector.end_session().await.expect("Notification failures must not fail the logout.");

	assert!(!connector.has_error());
	assert!(!connector.is_authenticated());
	assert!(!store.contains(&connector.config().session_key));
}

#[tokio::test]
async fn configuration_rejects_unknown_environments() {
	let err = ConnectorConfig::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_REDIRECT_URI, "INT")
		.expect_err("Only PRE and PROD are known environments.");

	assert!(matches!(
		err,
		Error::InvalidParameter(ref parameter) if parameter.parameter == "environment"
	));

	let config =
		ConnectorConfig::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_REDIRECT_URI, "PROD")
			.expect("PROD should be accepted.");

	assert_eq!(config.environment(), Environment::Production);
}
