//! Connector-level error types shared across flows, providers, and stores.
//!
//! Every failure belongs to one of two categories: object errors raised by the connector
//! itself (preconditions, parameters, transport, decoding, unexpected statuses) and
//! provider errors relayed verbatim from the identity provider's redirect.

// self
use crate::_prelude::*;

/// Connector-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical connector error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session store failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout); retry with backoff.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The provider answered, but not in a way the protocol allows.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// The connector is not in a state that permits the requested operation.
	#[error(transparent)]
	State(#[from] StateError),
	/// A request parameter is outside its allowed value set.
	#[error(transparent)]
	InvalidParameter(#[from] ParameterError),

	/// Identity provider redirected back with an `error`/`error_description` pair.
	#[error("Identity provider returned `{error}`: {}.", .description.as_deref().unwrap_or("no description"))]
	Provider {
		/// Provider-supplied `error` code, relayed verbatim.
		error: String,
		/// Provider-supplied `error_description`, relayed verbatim.
		description: Option<String>,
	},
}
impl Error {
	/// Returns the top-level category used to tell local failures from provider ones.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::Provider { .. } => ErrorCategory::Provider,
			_ => ErrorCategory::Object,
		}
	}

	/// Machine-stable error code; provider errors return the provider's own code.
	pub fn code(&self) -> &str {
		match self {
			Self::Store(_) => "session_store_error",
			Self::Config(_) => "configuration_error",
			Self::Transport(_) => "network_error",
			Self::Protocol(e) => e.code(),
			Self::State(e) => e.code(),
			Self::InvalidParameter(_) => "invalid_parameter",
			Self::Provider { error, .. } => error,
		}
	}

	/// Returns `true` for failures that may succeed when retried unchanged.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transport(_))
	}
}

/// Top-level error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
	/// Raised locally by the connector.
	Object,
	/// Relayed from the identity provider.
	Provider,
}

/// Serializable snapshot of the most recent failure, persisted with the connector state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedError {
	/// Object or provider failure.
	pub category: ErrorCategory,
	/// Machine-stable code (see [`Error::code`]).
	pub code: String,
	/// Human-readable description; provider descriptions are kept verbatim.
	pub description: String,
	/// Whether retrying the same call may succeed.
	pub retryable: bool,
}
impl From<&Error> for RecordedError {
	fn from(e: &Error) -> Self {
		let description = match e {
			Error::Provider { description, .. } => description.clone().unwrap_or_default(),
			other => other.to_string(),
		};

		Self {
			category: e.category(),
			code: e.code().to_owned(),
			description,
			retryable: e.is_retryable(),
		}
	}
}

/// Configuration and validation failures raised by the connector.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A required configuration value is missing or empty.
	#[error("Connector configuration is missing `{field}`.")]
	MissingField {
		/// Name of the missing value.
		field: &'static str,
	},
	/// Endpoint descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The environment has no step-up endpoint for the requested level.
	#[error("No step-up endpoint is configured for {level}.")]
	UnsupportedStepUp {
		/// Requested QoR level.
		level: crate::auth::Qor,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeout, IO). All of them are retryable.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the configured timeout.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Endpoint label.
		endpoint: &'static str,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the identity provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Failures caused by what the identity provider returned.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// The endpoint answered with a status other than the one the protocol expects.
	#[error("The {endpoint} endpoint returned HTTP {status}{}.", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
	UnexpectedStatus {
		/// Endpoint label.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// Provider error payload, when one could be read.
		message: Option<String>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The userinfo endpoint rejected the access token.
	#[error("The userinfo endpoint rejected the access token.")]
	Unauthorized,
	/// Discovery advertised an endpoint that fails transport validation.
	#[error("Discovery document advertises an unusable endpoint: {0}")]
	InsecureMetadata(#[source] crate::provider::ProviderDescriptorError),
	/// Discovery or JWKS document could not be parsed.
	#[error("The {document} document is malformed.")]
	MetadataParse {
		/// Which document failed to parse.
		document: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A response could not be decoded.
	#[error("Failed to decode the {context}: {reason}.")]
	Decode {
		/// What was being decoded.
		context: &'static str,
		/// Decoder diagnostic.
		reason: String,
	},
	/// A signed token declared an algorithm the connector does not accept.
	#[error("Signed token uses the unsupported algorithm `{alg}`.")]
	UnsupportedAlgorithm {
		/// Declared `alg` header value.
		alg: String,
	},
	/// Signature or claim verification failed.
	#[error("Signed token failed verification: {reason}.")]
	Verification {
		/// Verifier diagnostic.
		reason: String,
	},
	/// The callback carried neither a code nor an error.
	#[error("The callback does not carry an authorization code.")]
	MissingAuthorizationCode,
	/// The token endpoint omitted `id_token` on an authorization-code exchange.
	#[error("Token endpoint response is missing id_token.")]
	MissingIdToken,
	/// The token endpoint omitted `refresh_token` on an authorization-code exchange.
	#[error("Token endpoint response is missing refresh_token.")]
	MissingRefreshToken,
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned a zero or out-of-range `expires_in`.
	#[error("The expires_in value is outside the supported range.")]
	InvalidExpiresIn,
}
impl ProtocolError {
	fn code(&self) -> &'static str {
		match self {
			Self::UnexpectedStatus { .. } => "unexpected_status",
			Self::Unauthorized => "unauthorized",
			Self::InsecureMetadata(_) => "insecure_endpoint",
			Self::MetadataParse { .. } | Self::TokenResponseParse { .. } | Self::Decode { .. } =>
				"decode_error",
			Self::UnsupportedAlgorithm { .. } | Self::Verification { .. } => "verification_error",
			Self::MissingAuthorizationCode => "missing_authorization_code",
			Self::MissingRefreshToken => "missing_refresh_token",
			Self::MissingIdToken | Self::MissingExpiresIn => "incomplete_token_response",
			Self::InvalidExpiresIn => "invalid_expires_in",
		}
	}
}

/// Precondition failures of the connector state machine.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StateError {
	/// Provider metadata and keys were never loaded.
	#[error("Connector is not initialized.")]
	NotInitialized,
	/// `complete_authentication` was called before `authenticate`.
	#[error("Authentication has not been initiated.")]
	AuthenticationNotInitiated,
	/// The operation needs an authenticated end-user.
	#[error("End-user is not authenticated.")]
	NotAuthenticated,
	/// A step-up callback arrived for a level that was never initiated.
	#[error("Step-up to {level} has not been initiated.")]
	StepUpNotInitiated {
		/// Requested QoR level.
		level: crate::auth::Qor,
	},
	/// The callback `state` does not match the one sent with the request.
	#[error("Callback state does not match the authorization request.")]
	StateMismatch,
}
impl StateError {
	fn code(&self) -> &'static str {
		match self {
			Self::NotInitialized => "not_initialized",
			Self::AuthenticationNotInitiated => "authentication_not_initiated",
			Self::NotAuthenticated => "not_authenticated",
			Self::StepUpNotInitiated { .. } => "step_up_not_initiated",
			Self::StateMismatch => "state_mismatch",
		}
	}
}

/// Parameter validation failure naming the offending parameter and its allowed values.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Parameter `{parameter}` has invalid value `{value}`; allowed values: {allowed}.")]
pub struct ParameterError {
	/// Parameter name as used in the authorization request.
	pub parameter: &'static str,
	/// Rejected value.
	pub value: String,
	/// Human-readable description of the allowed values.
	pub allowed: String,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn provider_errors_keep_their_code_and_description() {
		let err = Error::Provider {
			error: "access_denied".into(),
			description: Some("User declined consent".into()),
		};
		let recorded = RecordedError::from(&err);

		assert_eq!(err.category(), ErrorCategory::Provider);
		assert_eq!(recorded.code, "access_denied");
		assert_eq!(recorded.description, "User declined consent");
		assert!(!recorded.retryable);
	}

	#[test]
	fn transport_errors_are_retryable_object_errors() {
		let err: Error = TransportError::Timeout { endpoint: "token" }.into();

		assert_eq!(err.category(), ErrorCategory::Object);
		assert_eq!(err.code(), "network_error");
		assert!(err.is_retryable());

		let err: Error = StateError::NotInitialized.into();

		assert!(!err.is_retryable());
		assert_eq!(err.code(), "not_initialized");
	}

	#[test]
	fn unexpected_status_renders_provider_message() {
		let err = ProtocolError::UnexpectedStatus {
			endpoint: "token",
			status: 400,
			message: Some("invalid_grant".into()),
			retry_after: None,
		};

		assert_eq!(err.to_string(), "The token endpoint returned HTTP 400: invalid_grant.");
	}
}
