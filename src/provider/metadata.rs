//! Discovery document and signing-key parsing.

// crates.io
use jsonwebtoken::jwk::JwkSet;
// self
use crate::{_prelude::*, error::ProtocolError, provider::validate_endpoint};

/// Subset of the OpenID discovery document the connector relies on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
	/// Issuer identifier.
	pub issuer: String,
	/// Authorization endpoint the end-user is redirected to.
	pub authorization_endpoint: Url,
	/// Token endpoint for code exchanges and refreshes.
	pub token_endpoint: Url,
	/// Userinfo endpoint returning signed claims.
	pub userinfo_endpoint: Url,
	/// JSON Web Key Set location.
	pub jwks_uri: Url,
	/// RP-initiated logout endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_session_endpoint: Option<Url>,
}
impl ProviderMetadata {
	/// Parses and validates a discovery document.
	pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
		let metadata: Self = parse_document("discovery", bytes)?;

		metadata.validate()?;

		Ok(metadata)
	}

	fn validate(&self) -> Result<(), ProtocolError> {
		let endpoints = [
			("authorization", Some(&self.authorization_endpoint)),
			("token", Some(&self.token_endpoint)),
			("userinfo", Some(&self.userinfo_endpoint)),
			("jwks", Some(&self.jwks_uri)),
			("end_session", self.end_session_endpoint.as_ref()),
		];

		for (name, url) in endpoints {
			if let Some(url) = url {
				validate_endpoint(name, url).map_err(ProtocolError::InsecureMetadata)?;
			}
		}

		Ok(())
	}
}

/// Discovery metadata together with the signing keys it references.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderSnapshot {
	/// Parsed discovery document.
	pub metadata: ProviderMetadata,
	/// Signing keys published at `jwks_uri`.
	pub keys: JwkSet,
}

/// Parses a JSON Web Key Set.
pub fn parse_key_set(bytes: &[u8]) -> Result<JwkSet, ProtocolError> {
	parse_document("jwks", bytes)
}

fn parse_document<T>(document: &'static str, bytes: &[u8]) -> Result<T, ProtocolError>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ProtocolError::MetadataParse { document, source })
}
