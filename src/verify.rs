//! Verification of the compact signed tokens returned by the userinfo endpoint.
//!
//! A token must have exactly three dot-separated segments. The header segment is decoded
//! first to learn the declared algorithm: `HS256` tokens are checked against the client
//! secret, `RS256` tokens against the provider's JSON Web Key Set (selected by `kid`). Any
//! other algorithm is rejected before signature verification starts.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
	Algorithm, DecodingKey, Validation,
	errors::ErrorKind,
	jwk::{AlgorithmParameters, Jwk, JwkSet},
};
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::{ClaimSet, TokenSecret},
	error::ProtocolError,
};

#[derive(Debug, Deserialize)]
struct CompactHeader {
	alg: String,
	#[serde(default)]
	kid: Option<String>,
}

/// Verifies signed userinfo tokens for one client.
#[derive(Clone, Copy, Debug)]
pub struct Verifier<'a> {
	client_id: &'a str,
	client_secret: &'a TokenSecret,
	keys: &'a JwkSet,
}
impl<'a> Verifier<'a> {
	/// Creates a verifier bound to the client credentials and the provider's keys.
	pub fn new(client_id: &'a str, client_secret: &'a TokenSecret, keys: &'a JwkSet) -> Self {
		Self { client_id, client_secret, keys }
	}

	/// Verifies `token` and returns its claims.
	pub fn verify(&self, token: &str) -> Result<ClaimSet, ProtocolError> {
		let token = token.trim();
		let header = decode_header(token)?;
		let (algorithm, key) = match header.alg.as_str() {
			"HS256" => (
				Algorithm::HS256,
				DecodingKey::from_secret(self.client_secret.as_bytes()),
			),
			"RS256" => (Algorithm::RS256, self.rsa_key(header.kid.as_deref())?),
			other => return Err(ProtocolError::UnsupportedAlgorithm { alg: other.to_owned() }),
		};
		let mut validation = Validation::new(algorithm);

		validation.required_spec_claims.clear();
		validation.set_audience(&[self.client_id]);

		let data = jsonwebtoken::decode::<Map<String, Value>>(token, &key, &validation)
			.map_err(classify)?;

		Ok(ClaimSet::from(data.claims))
	}

	fn rsa_key(&self, kid: Option<&str>) -> Result<DecodingKey, ProtocolError> {
		let jwk = match kid {
			Some(kid) => self.keys.find(kid).ok_or_else(|| ProtocolError::Verification {
				reason: format!("no signing key with kid `{kid}`"),
			})?,
			None => self.keys.keys.iter().find(|jwk| is_rsa(jwk)).ok_or_else(|| {
				ProtocolError::Verification { reason: "no RSA signing key published".into() }
			})?,
		};

		if !is_rsa(jwk) {
			return Err(ProtocolError::Verification {
				reason: "selected signing key is not an RSA key".into(),
			});
		}

		DecodingKey::from_jwk(jwk)
			.map_err(|e| ProtocolError::Verification { reason: format!("unusable signing key: {e}") })
	}
}

fn is_rsa(jwk: &Jwk) -> bool {
	matches!(jwk.algorithm, AlgorithmParameters::RSA(_))
}

fn decode_header(token: &str) -> Result<CompactHeader, ProtocolError> {
	let segments = token.split('.').collect::<Vec<_>>();

	if segments.len() != 3 {
		return Err(ProtocolError::Decode {
			context: "userinfo token",
			reason: format!("expected 3 segments, found {}", segments.len()),
		});
	}

	let raw = URL_SAFE_NO_PAD.decode(segments[0].trim_end_matches('=')).map_err(|e| {
		ProtocolError::Decode { context: "userinfo token header", reason: e.to_string() }
	})?;

	serde_json::from_slice(&raw).map_err(|e| ProtocolError::Decode {
		context: "userinfo token header",
		reason: e.to_string(),
	})
}

fn classify(err: jsonwebtoken::errors::Error) -> ProtocolError {
	match err.kind() {
		ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) =>
			ProtocolError::Decode { context: "userinfo token", reason: err.to_string() },
		_ => ProtocolError::Verification { reason: err.to_string() },
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use jsonwebtoken::{EncodingKey, Header};
	use serde_json::json;
	// self
	use super::*;

	const SECRET: &str = "verifier-secret-0123456789abcdef0123";
	const RSA_KID: &str = "userinfo-key-1";
	const RSA_KEY: &str = include_str!("../tests/fixtures/userinfo_rsa.pem");
	const OTHER_RSA_KEY: &str = include_str!("../tests/fixtures/userinfo_rsa_other.pem");
	const RSA_JWKS: &str = include_str!("../tests/fixtures/userinfo_jwks.json");

	fn sign(claims: Value, secret: &str) -> String {
		jsonwebtoken::encode(
			&Header::new(Algorithm::HS256),
			&claims,
			&EncodingKey::from_secret(secret.as_bytes()),
		)
		.expect("HS256 fixture should sign.")
	}

	fn sign_rs256(claims: Value, pem: &str, kid: Option<&str>) -> String {
		let mut header = Header::new(Algorithm::RS256);

		header.kid = kid.map(str::to_owned);

		jsonwebtoken::encode(
			&header,
			&claims,
			&EncodingKey::from_rsa_pem(pem.as_bytes()).expect("RSA fixture key should load."),
		)
		.expect("RS256 fixture should sign.")
	}

	fn empty_keys() -> JwkSet {
		JwkSet { keys: Vec::new() }
	}

	fn published_keys() -> JwkSet {
		serde_json::from_str(RSA_JWKS).expect("JWKS fixture should parse.")
	}

	#[test]
	fn hs256_tokens_verify_with_the_client_secret() {
		let secret = TokenSecret::new(SECRET);
		let keys = empty_keys();
		let verifier = Verifier::new("client-1", &secret, &keys);
		let token = sign(json!({ "sub": "user-1", "aud": "client-1", "email": "a@b.ch" }), SECRET);
		let claims = verifier.verify(&token).expect("Correctly signed token should verify.");

		assert_eq!(claims.subject(), Some("user-1"));
		assert_eq!(claims.email(), Some("a@b.ch"));
	}

	#[test]
	fn wrong_secret_fails_verification() {
		let secret = TokenSecret::new(SECRET);
		let keys = empty_keys();
		let verifier = Verifier::new("client-1", &secret, &keys);
		let token = sign(json!({ "sub": "user-1" }), "some-other-secret-0123456789abcdef");

		assert!(matches!(verifier.verify(&token), Err(ProtocolError::Verification { .. })));
	}

	#[test]
	fn foreign_audience_fails_verification() {
		let secret = TokenSecret::new(SECRET);
		let keys = empty_keys();
		let verifier = Verifier::new("client-1", &secret, &keys);
		let token = sign(json!({ "sub": "user-1", "aud": "client-2" }), SECRET);

		assert!(matches!(verifier.verify(&token), Err(ProtocolError::Verification { .. })));
	}

	#[test]
	fn malformed_and_unsupported_tokens_are_rejected() {
		let secret = TokenSecret::new(SECRET);
		let keys = empty_keys();
		let verifier = Verifier::new("client-1", &secret, &keys);

		assert!(matches!(verifier.verify("a.b"), Err(ProtocolError::Decode { .. })));
		assert!(matches!(verifier.verify("a.b.c.d"), Err(ProtocolError::Decode { .. })));

		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
		let body = URL_SAFE_NO_PAD.encode(br#"{"sub":"user-1"}"#);
		let err = verifier
			.verify(&format!("{header}.{body}."))
			.expect_err("Unsigned tokens must be rejected.");

		assert!(matches!(err, ProtocolError::UnsupportedAlgorithm { ref alg } if alg == "none"));
	}

	#[test]
	fn rs256_requires_a_matching_key() {
		let secret = TokenSecret::new(SECRET);
		let keys = empty_keys();
		let verifier = Verifier::new("client-1", &secret, &keys);
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","kid":"missing"}"#);
		let body = URL_SAFE_NO_PAD.encode(br#"{"sub":"user-1"}"#);
		let err = verifier
			.verify(&format!("{header}.{body}.c2ln"))
			.expect_err("Unknown key ids must be rejected.");

		assert!(matches!(err, ProtocolError::Verification { .. }));
	}

	#[test]
	fn rs256_tokens_verify_with_the_published_key() {
		let secret = TokenSecret::new(SECRET);
		let keys = published_keys();
		let verifier = Verifier::new("client-1", &secret, &keys);
		let claims = json!({ "sub": "user-1", "aud": "client-1" });
		let by_kid = verifier
			.verify(&sign_rs256(claims.clone(), RSA_KEY, Some(RSA_KID)))
			.expect("Token signed with the published key should verify.");

		assert_eq!(by_kid.subject(), Some("user-1"));

		let without_kid = verifier
			.verify(&sign_rs256(claims, RSA_KEY, None))
			.expect("Without a kid the published RSA key should be used.");

		assert_eq!(without_kid.subject(), Some("user-1"));
	}

	#[test]
	fn rs256_tokens_from_another_key_fail_verification() {
		let secret = TokenSecret::new(SECRET);
		let keys = published_keys();
		let verifier = Verifier::new("client-1", &secret, &keys);
		let token = sign_rs256(json!({ "sub": "user-1" }), OTHER_RSA_KEY, Some(RSA_KID));

		assert!(matches!(verifier.verify(&token), Err(ProtocolError::Verification { .. })));
	}
}
