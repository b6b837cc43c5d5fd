mod mock_idp;

// crates.io
use httpmock::prelude::*;
// self
use mock_idp::{
	OTHER_RSA_KEY, RSA_JWKS, RSA_KEY, TOKEN_PATH, callback_for, mount_code_exchange,
	mount_provider, mount_provider_with_keys, mount_refresh, mount_userinfo,
	mount_userinfo_token, mount_userinfo_unauthorized, query, sign_claims_rs256, user_claims,
};
use swissid_connector::{
	_preludet::*,
	auth::{AuthenticationRequest, TokenKind, TokenSet},
	error::{ProtocolError, StateError},
	state::AuthState,
	flows::{Callback, Transition},
};

fn expired_tokens(refresh: &str) -> TokenSet {
	TokenSet::new("access-old", "id-old", refresh, OffsetDateTime::now_utc() - Duration::minutes(1))
}

fn fresh_tokens() -> TokenSet {
	TokenSet::new("access-1", "id-1", "refresh-1", OffsetDateTime::now_utc() + Duration::hours(1))
}

#[tokio::test]
async fn fresh_tokens_are_served_without_refresh() {
	let server = MockServer::start_async().await;

	mount_provider(&server).await;

	let refresh = mount_refresh(&server, "refresh-1", "access-2").await;
	let (mut connector, _store) =
		build_reqwest_test_connector_with_tokens(&server.base_url(), fresh_tokens()).await;
	let userinfo = mount_userinfo(&server, "access-1", &user_claims()).await;

	assert!(connector.is_authenticated());
	assert_eq!(connector.token(TokenKind::Access), Some("access-1"));

	connector
		.complete_authentication(&Callback::empty())
		.await
		.expect("Seeded session should fetch claims.");

	refresh.assert_calls_async(0).await;
	userinfo.assert_calls_async(1).await;
}

#[tokio::test]
async fn expired_access_token_is_refreshed_exactly_once() {
	let server = MockServer::start_async().await;

	mount_provider(&server).await;

	let refresh = mount_refresh(&server, "refresh-1", "access-2").await;
	let userinfo = mount_userinfo(&server, "access-2", &user_claims()).await;
	let (mut connector, store) = build_reqwest_test_connector_with_tokens(
		&server.base_url(),
		expired_tokens("refresh-1"),
	)
	.await;
	let transition = connector
		.complete_authentication(&Callback::empty())
		.await
		.expect("Expired session should refresh and fetch claims.");

	refresh.assert_calls_async(1).await;
	userinfo.assert_calls_async(1).await;

	assert!(matches!(transition, Transition::Continue(_)));
	assert_eq!(connector.token(TokenKind::Access), Some("access-2"));
	assert_eq!(connector.token(TokenKind::Refresh), Some("refresh-1"));
	assert!(
		connector
			.access_token_expiry()
			.is_some_and(|expiry| expiry > OffsetDateTime::now_utc() + Duration::minutes(59))
	);

	let restored = restore_reqwest_test_connector(&server.base_url(), store).await;

	assert_eq!(restored.token(TokenKind::Access), Some("access-2"));
}

#[tokio::test]
async fn token_response_without_refresh_token_is_rejected() {
	let server = MockServer::start_async().await;

	mount_provider(&server).await;

	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"A","id_token":"I","expires_in":3600}"#);
		})
		.await;
	let (mut connector, _store) = build_reqwest_test_connector(&server.base_url()).await;
	let transition =
		connector.authenticate(&AuthenticationRequest::new()).await.expect("Login should start.");
	let redirect = transition.redirect_url().expect("Login should redirect.");
	let err = connector
		.complete_authentication(&callback_for(redirect, "code-1"))
		.await
		.expect_err("A login without a refresh token must not authenticate.");

	token.assert_calls_async(1).await;

	assert!(matches!(err, Error::Protocol(ProtocolError::MissingRefreshToken)));
	assert!(!connector.is_authenticated());
	assert!(connector.token(TokenKind::Refresh).is_none());
	assert_eq!(
		connector.last_error().map(|recorded| recorded.code.as_str()),
		Some("missing_refresh_token")
	);
}

#[tokio::test]
async fn rs256_userinfo_verifies_against_the_published_keys() {
	let server = MockServer::start_async().await;

	mount_provider_with_keys(&server, RSA_JWKS).await;

	let userinfo =
		mount_userinfo_token(&server, "access-1", sign_claims_rs256(&user_claims(), RSA_KEY))
			.await;
	let (mut connector, _store) =
		build_reqwest_test_connector_with_tokens(&server.base_url(), fresh_tokens()).await;
	let transition = connector
		.complete_authentication(&Callback::empty())
		.await
		.expect("RS256 userinfo signed with the published key should verify.");

	userinfo.assert_calls_async(1).await;

	assert_eq!(transition.claims().and_then(|claims| claims.subject()), Some("user-1"));
}

#[tokio::test]
async fn rs256_userinfo_signed_with_an_unpublished_key_is_rejected() {
	let server = MockServer::start_async().await;

	mount_provider_with_keys(&server, RSA_JWKS).await;
	mount_userinfo_token(&server, "access-1", sign_claims_rs256(&user_claims(), OTHER_RSA_KEY))
		.await;

	let (mut connector, _store) =
		build_reqwest_test_connector_with_tokens(&server.base_url(), fresh_tokens()).await;
	let err = connector
		.complete_authentication(&Callback::empty())
		.await
		.expect_err("A signature from an unpublished key must fail verification.");

	assert!(matches!(err, Error::Protocol(ProtocolError::Verification { .. })));
	assert!(connector.claims().is_none());
	assert_eq!(
		connector.last_error().map(|recorded| recorded.code.as_str()),
		Some("verification_error")
	);
	assert_eq!(connector.state().authentication, AuthState::Authenticated);
}

#[tokio::test]
async fn rejected_access_token_triggers_one_reauthentication() {
	let server = MockServer::start_async().await;

	mount_provider(&server).await;

	let first = mount_code_exchange(&server, "code-1", "access-1", "refresh-1").await;
	let second = mount_code_exchange(&server, "code-2", "access-2", "refresh-2").await;
	let userinfo = mount_userinfo_unauthorized(&server).await;
	let (mut connector, _store) = build_reqwest_test_connector(&server.base_url()).await;

	let transition = connector
		.authenticate(&AuthenticationRequest::new().scope("openid email"))
		.await
		.expect("Login should start.");
	let redirect = transition.redirect_url().expect("Login should redirect.");
	let transition = connector
		.complete_authentication(&callback_for(redirect, "code-1"))
		.await
		.expect("The first 401 should restart the login instead of failing.");
	let url = transition.redirect_url().expect("The first 401 should redirect.");
	let params = query(url);

	assert_eq!(params.get("prompt").map(String::as_str), Some("login"));
	assert_eq!(params.get("scope").map(String::as_str), Some("openid email"));
	assert!(connector.is_authentication_initialized());
	assert!(!connector.is_authenticated());
	assert!(connector.token(TokenKind::Access).is_none());
	assert!(connector.state().automated_reauthentication_attempted);

	let err = connector
		.complete_authentication(&callback_for(url, "code-2"))
		.await
		.expect_err("The second consecutive 401 must fail.");

	assert!(matches!(err, Error::Protocol(ProtocolError::Unauthorized)));
	assert!(!connector.is_authentication_initialized());
	assert_eq!(
		connector.last_error().map(|recorded| recorded.code.as_str()),
		Some("unauthorized")
	);

	first.assert_calls_async(1).await;
	second.assert_calls_async(1).await;
	userinfo.assert_calls_async(2).await;

	let err = connector
		.complete_authentication(&Callback::with_code("code-3"))
		.await
		.expect_err("No further automatic retries may happen.");

	assert!(matches!(err, Error::State(StateError::AuthenticationNotInitiated)));

	userinfo.assert_calls_async(2).await;
}
