//! Serializable connector state and its versioned session codec.
//!
//! The connector keeps no hidden fields: everything it needs to resume a flow on the next
//! request lives in [`ConnectorState`], which is written to the session store as one record
//! after every state-changing operation. The client secret is not part of the record; it is
//! supplied again from configuration when the connector is restored.

// self
use crate::{
	_prelude::*,
	auth::{AuthParams, ClaimSet, Qor, TokenSet},
	error::RecordedError,
	provider::{Environment, ProviderSnapshot},
	store::StoreError,
};

/// Schema version written by [`ConnectorState::encode`].
pub const STATE_VERSION: u32 = 1;

/// Authentication sub-state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
	/// No authentication request has been issued.
	#[default]
	NotStarted,
	/// The end-user was redirected to the provider; a callback is expected.
	InProgress,
	/// Tokens and verified claims are available.
	Authenticated,
}

/// Step-up sub-state for one QoR level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepUpState {
	/// No step-up request has been issued for the level.
	#[default]
	NotStarted,
	/// The end-user was redirected to the step-up endpoint.
	InProgress,
	/// The step-up completed and claims were refreshed.
	SteppedUp,
}

/// Complete connector state, persisted between requests of one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectorState {
	/// OAuth client identifier the state belongs to.
	pub client_id: String,
	/// Redirect URI used for every request.
	pub redirect_uri: Url,
	/// Environment the state belongs to.
	pub environment: Environment,
	/// Discovery metadata and keys; `None` until initialization succeeded.
	pub provider: Option<ProviderSnapshot>,
	/// Parameters of the most recent authentication or step-up request.
	pub params: AuthParams,
	/// Authentication sub-state.
	pub authentication: AuthState,
	/// Step-up sub-state per QoR level; absent levels are [`StepUpState::NotStarted`].
	pub step_up: BTreeMap<Qor, StepUpState>,
	/// Most recent authorization code received.
	pub authorization_code: Option<String>,
	/// Issued tokens.
	pub tokens: Option<TokenSet>,
	/// Set once the automatic re-authentication after a userinfo 401 has been issued.
	pub automated_reauthentication_attempted: bool,
	/// Claims from the last successful userinfo verification.
	pub claims: Option<ClaimSet>,
	/// Most recent failure.
	pub last_error: Option<RecordedError>,
}
impl ConnectorState {
	/// Creates an uninitialized state.
	pub fn new(client_id: impl Into<String>, redirect_uri: Url, environment: Environment) -> Self {
		Self {
			client_id: client_id.into(),
			redirect_uri,
			environment,
			provider: None,
			params: AuthParams::default(),
			authentication: AuthState::NotStarted,
			step_up: BTreeMap::new(),
			authorization_code: None,
			tokens: None,
			automated_reauthentication_attempted: false,
			claims: None,
			last_error: None,
		}
	}

	/// Whether discovery metadata and keys were loaded.
	pub fn is_initialized(&self) -> bool {
		self.provider.is_some()
	}

	/// Step-up sub-state for `level`.
	pub fn step_up_state(&self, level: Qor) -> StepUpState {
		self.step_up.get(&level).copied().unwrap_or_default()
	}

	/// Records a step-up sub-state; `NotStarted` removes the entry.
	pub fn set_step_up_state(&mut self, level: Qor, state: StepUpState) {
		match state {
			StepUpState::NotStarted => {
				self.step_up.remove(&level);
			},
			other => {
				self.step_up.insert(level, other);
			},
		}
	}

	/// Drops everything tied to the end-user session, keeping the provider snapshot.
	pub fn reset_session(&mut self) {
		self.params = AuthParams::default();
		self.authentication = AuthState::NotStarted;
		self.step_up.clear();
		self.authorization_code = None;
		self.tokens = None;
		self.automated_reauthentication_attempted = false;
		self.claims = None;
	}

	/// Returns true if the state was written for the same client and environment.
	pub fn belongs_to(&self, client_id: &str, environment: Environment) -> bool {
		self.client_id == client_id && self.environment == environment
	}

	/// Encodes the state as a versioned session record.
	pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
		serde_json::to_vec(&VersionedRef { version: STATE_VERSION, state: self }).map_err(|e| {
			StoreError::Serialization { message: format!("Failed to encode connector state: {e}") }
		})
	}

	/// Decodes a session record written by [`ConnectorState::encode`].
	pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
		let envelope: Envelope = serde_json::from_slice(bytes).map_err(|e| {
			StoreError::Serialization { message: format!("Failed to decode connector state: {e}") }
		})?;

		if envelope.version != STATE_VERSION {
			return Err(StoreError::Serialization {
				message: format!("Unsupported connector state version {}", envelope.version),
			});
		}

		serde_json::from_value(envelope.state).map_err(|e| StoreError::Serialization {
			message: format!("Failed to decode connector state: {e}"),
		})
	}
}

#[derive(Serialize)]
struct VersionedRef<'a> {
	version: u32,
	state: &'a ConnectorState,
}

#[derive(Deserialize)]
struct Envelope {
	version: u32,
	state: serde_json::Value,
}
