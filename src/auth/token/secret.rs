//! Credential strings (tokens and the client secret) that must never reach logs.

// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Opaque credential: an issued token or the client secret.
///
/// Formatting never reveals the value. Serialization writes the plain string, since the
/// session record must carry tokens verbatim.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a credential.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Plain credential; keep it out of log fields.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Credential bytes, as used for HMAC keys.
	pub fn as_bytes(&self) -> &[u8] {
		self.0.as_bytes()
	}

	/// Whether the credential is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({REDACTED})")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
