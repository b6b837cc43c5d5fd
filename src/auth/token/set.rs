//! Token triple held by an authenticated connector.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Tokens issued for the current end-user session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
	/// Bearer token presented to the userinfo endpoint.
	pub access_token: TokenSecret,
	/// Signed ID token; used as `id_token_hint` when ending the session.
	pub id_token: TokenSecret,
	/// Refresh token; every authenticated session holds one.
	pub refresh_token: TokenSecret,
	/// Instant the access token stops being valid.
	pub expires_at: OffsetDateTime,
}
impl TokenSet {
	/// Creates a token set whose access token expires at `expires_at`.
	pub fn new(
		access_token: impl Into<String>,
		id_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_at: OffsetDateTime,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			id_token: TokenSecret::new(id_token),
			refresh_token: TokenSecret::new(refresh_token),
			expires_at,
		}
	}

	/// Returns true once `instant` has reached the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns true if the access token is expired right now.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Remaining lifetime at `instant`, saturating at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
