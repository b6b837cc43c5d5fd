//! Mock SwissID provider shared by the integration tests.

#![allow(dead_code)]

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use httpmock::{Mock, prelude::*};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
// self
use swissid_connector::{_preludet::*, flows::Callback};

pub const DISCOVERY_PATH: &str = "/idp/oauth2/.well-known/openid-configuration";
pub const JWKS_PATH: &str = "/idp/oauth2/connect/jwk_uri";
pub const AUTHORIZE_PATH: &str = "/idp/oauth2/authorize";
pub const TOKEN_PATH: &str = "/idp/oauth2/access_token";
pub const USERINFO_PATH: &str = "/idp/oauth2/userinfo";
pub const END_SESSION_PATH: &str = "/idp/oauth2/connect/endSession";
pub const STEP_UP_PATH: &str = "/idcheck/rp/stepup/lot1";

/// Key id of the RSA key published by [`RSA_JWKS`].
pub const RSA_KID: &str = "userinfo-key-1";
/// Key set publishing the public half of [`RSA_KEY`].
pub const RSA_JWKS: &str = include_str!("../fixtures/userinfo_jwks.json");
/// Provider RSA signing key.
pub const RSA_KEY: &str = include_str!("../fixtures/userinfo_rsa.pem");
/// RSA key the provider never published.
pub const OTHER_RSA_KEY: &str = include_str!("../fixtures/userinfo_rsa_other.pem");

/// Discovery and key-set mocks mounted on a server.
pub struct MockIdp<'a> {
	pub discovery: Mock<'a>,
	pub jwks: Mock<'a>,
}

pub fn discovery_document(server: &MockServer) -> Value {
	json!({
		"issuer": server.url("/idp/oauth2"),
		"authorization_endpoint": server.url(AUTHORIZE_PATH),
		"token_endpoint": server.url(TOKEN_PATH),
		"userinfo_endpoint": server.url(USERINFO_PATH),
		"jwks_uri": server.url(JWKS_PATH),
		"end_session_endpoint": server.url(END_SESSION_PATH),
		"response_types_supported": ["code"],
	})
}

/// Mounts a healthy discovery document and an empty key set.
pub async fn mount_provider(server: &MockServer) -> MockIdp<'_> {
	mount_provider_with_keys(server, r#"{"keys":[]}"#).await
}

/// Mounts a healthy discovery document publishing `jwks`.
pub async fn mount_provider_with_keys<'a>(server: &'a MockServer, jwks: &str) -> MockIdp<'a> {
	let document = discovery_document(server).to_string();
	let discovery = server
		.mock_async(|when, then| {
			when.method(GET).path(DISCOVERY_PATH);
			then.status(200).header("content-type", "application/json").body(document);
		})
		.await;
	let jwks = server
		.mock_async(|when, then| {
			when.method(GET).path(JWKS_PATH);
			then.status(200).header("content-type", "application/json").body(jwks);
		})
		.await;

	MockIdp { discovery, jwks }
}

/// HTTP Basic credentials of the test client.
pub fn basic_credentials() -> String {
	format!("Basic {}", STANDARD.encode(format!("{TEST_CLIENT_ID}:{TEST_CLIENT_SECRET}")))
}

pub fn token_body(access: &str, refresh: &str, expires_in: i64) -> String {
	json!({
		"access_token": access,
		"id_token": format!("id-{access}"),
		"refresh_token": refresh,
		"expires_in": expires_in,
	})
	.to_string()
}

/// Mounts the token endpoint for the authorization-code grant.
pub async fn mount_code_exchange<'a>(
	server: &'a MockServer,
	code: &str,
	access: &str,
	refresh: &str,
) -> Mock<'a> {
	let body = token_body(access, refresh, 3600);

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("authorization", basic_credentials())
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", code);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

/// Mounts the token endpoint for the refresh-token grant.
pub async fn mount_refresh<'a>(server: &'a MockServer, refresh: &str, access: &str) -> Mock<'a> {
	let body = token_body(access, refresh, 3600);

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("authorization", basic_credentials())
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", refresh);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

/// Default claims the mock userinfo endpoint returns.
pub fn user_claims() -> Value {
	json!({
		"sub": "user-1",
		"aud": TEST_CLIENT_ID,
		"email": "jane.doe@example.ch",
		"given_name": "Jane",
		"urn:swissid:age_over": "18",
		"urn:swissid:qor": "qor1",
	})
}

pub fn sign_claims(claims: &Value) -> String {
	jsonwebtoken::encode(
		&Header::new(Algorithm::HS256),
		claims,
		&EncodingKey::from_secret(TEST_CLIENT_SECRET.as_bytes()),
	)
	.expect("HS256 userinfo fixture should sign.")
}

/// Signs `claims` with RS256 under [`RSA_KID`].
pub fn sign_claims_rs256(claims: &Value, pem: &str) -> String {
	let mut header = Header::new(Algorithm::RS256);

	header.kid = Some(RSA_KID.to_owned());

	jsonwebtoken::encode(
		&header,
		claims,
		&EncodingKey::from_rsa_pem(pem.as_bytes()).expect("RSA fixture key should load."),
	)
	.expect("RS256 userinfo fixture should sign.")
}

/// Mounts the userinfo endpoint answering bearer `access` with HS256-signed `claims`.
pub async fn mount_userinfo<'a>(server: &'a MockServer, access: &str, claims: &Value) -> Mock<'a> {
	mount_userinfo_token(server, access, sign_claims(claims)).await
}

/// Mounts the userinfo endpoint answering bearer `access` with a prepared `token`.
pub async fn mount_userinfo_token<'a>(
	server: &'a MockServer,
	access: &str,
	token: String,
) -> Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path(USERINFO_PATH)
				.header("authorization", format!("Bearer {access}"));
			then.status(200).header("content-type", "application/jwt").body(token);
		})
		.await
}

/// Mounts a userinfo endpoint rejecting every access token.
pub async fn mount_userinfo_unauthorized(server: &MockServer) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path(USERINFO_PATH);
			then.status(401);
		})
		.await
}

pub fn query(url: &Url) -> HashMap<String, String> {
	url.query_pairs().into_owned().collect()
}

/// Builds the callback the provider sends after `redirect`: `code` plus the echoed state.
pub fn callback_for(redirect: &Url, code: &str) -> Callback {
	let callback = Callback::with_code(code);

	match query(redirect).remove("state") {
		Some(state) => callback.state(state),
		None => callback,
	}
}
