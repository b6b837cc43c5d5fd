//! Token endpoint facade built on the `oauth2` crate, plus transport error mapping.
//!
//! Code exchanges and refreshes are `POST`s to the discovered token endpoint with HTTP Basic
//! client authentication and a form-encoded body. The facade converts the `oauth2` response
//! into a [`TokenSet`] with an absolute expiry and classifies every failure into the
//! connector's error taxonomy.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AccessToken, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, Scope, StandardRevocableToken,
	TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSet},
	error::{ConfigError, ProtocolError, TransportError},
	http::{ProviderHttpClient, ResponseMetadata, ResponseMetadataSlot},
};
#[cfg(all(test, feature = "reqwest"))] use crate::http::ReqwestHttpClient;

const TOKEN_ENDPOINT: &str = "token";

type FacadeRequestError<E> = RequestTokenError<HttpClientError<E>, BasicErrorResponse>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;
type ConfiguredClient = Client<
	BasicErrorResponse,
	TokenEndpointResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Maps HTTP transport failures into connector [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a connector error.
	///
	/// Timeouts must become [`TransportError::Timeout`] so callers can tell them apart from
	/// protocol failures.
	fn map_transport_error(
		&self,
		endpoint: &'static str,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: &'static str,
		_: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) =>
				TransportError::network(endpoint, std::io::Error::other(message)).into(),
			_ => TransportError::network(
				endpoint,
				std::io::Error::other("unrecognized HTTP client failure"),
			)
			.into(),
		}
	}
}

/// Successful token endpoint response of an OpenID Connect provider.
///
/// SwissID may omit `token_type`; an absent value is read as `Bearer`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenEndpointResponse {
	access_token: AccessToken,
	#[serde(default = "bearer")]
	token_type: BasicTokenType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires_in: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<RefreshToken>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id_token: Option<String>,
	#[serde(
		default,
		rename = "scope",
		deserialize_with = "oauth2::helpers::deserialize_space_delimited_vec",
		serialize_with = "oauth2::helpers::serialize_space_delimited_vec",
		skip_serializing_if = "Option::is_none"
	)]
	scopes: Option<Vec<Scope>>,
}
impl TokenEndpointResponse {
	/// Signed ID token, when the provider returned one.
	pub fn id_token(&self) -> Option<&str> {
		self.id_token.as_deref()
	}
}
impl TokenResponse for TokenEndpointResponse {
	type TokenType = BasicTokenType;

	fn access_token(&self) -> &AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &BasicTokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<std::time::Duration> {
		self.expires_in.map(std::time::Duration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		self.scopes.as_ref()
	}
}

fn bearer() -> BasicTokenType {
	BasicTokenType::Bearer
}

pub(crate) trait OAuth2Facade {
	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		redirect_uri: &'a Url,
	) -> FacadeFuture<'a, TokenSet>;

	fn refresh_token<'a>(
		&'a self,
		current: &'a TokenSet,
		scope: Option<&'a ScopeSet>,
	) -> FacadeFuture<'a, TokenSet>;
}

pub(crate) struct BasicFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		token_endpoint: &Url,
		client_id: &str,
		client_secret: &str,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Self {
		let oauth_client = Client::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_token_uri(TokenUrl::from_url(token_endpoint.clone()));

		Self { oauth_client, http_client, error_mapper }
	}

	fn map_error(
		&self,
		meta: Option<ResponseMetadata>,
		err: FacadeRequestError<C::TransportError>,
	) -> Error {
		map_request_error(meta, err, self.error_mapper.as_ref())
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		redirect_uri: &'a Url,
	) -> FacadeFuture<'a, TokenSet> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let redirect_url = RedirectUrl::from_url(redirect_uri.clone());
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_redirect_uri(Cow::Owned(redirect_url))
				.request_async(&instrumented)
				.await
				.map_err(|err| self.map_error(meta.take(), err))?;
			let expires_at = expiry_from(&response)?;
			let id_token =
				response.id_token().map(str::to_owned).ok_or(ProtocolError::MissingIdToken)?;
			let refresh_token = response
				.refresh_token()
				.map(|token| token.secret().to_owned())
				.ok_or(ProtocolError::MissingRefreshToken)?;

			Ok(TokenSet::new(
				response.access_token().secret().to_owned(),
				id_token,
				refresh_token,
				expires_at,
			))
		})
	}

	fn refresh_token<'a>(
		&'a self,
		current: &'a TokenSet,
		scope: Option<&'a ScopeSet>,
	) -> FacadeFuture<'a, TokenSet> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let refresh_secret = RefreshToken::new(current.refresh_token.expose().to_owned());
			let instrumented = self.http_client.with_metadata(meta.clone());
			let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

			if let Some(scope) = scope {
				for scope in scope {
					request = request.add_scope(Scope::new(scope.as_str().to_owned()));
				}
			}

			let response = request
				.request_async(&instrumented)
				.await
				.map_err(|err| self.map_error(meta.take(), err))?;
			let expires_at = expiry_from(&response)?;
			let id_token = response
				.id_token()
				.map_or_else(|| current.id_token.expose().to_owned(), str::to_owned);
			let refresh_token = response
				.refresh_token()
				.map(|token| token.secret().to_owned())
				.unwrap_or_else(|| current.refresh_token.expose().to_owned());

			Ok(TokenSet::new(
				response.access_token().secret().to_owned(),
				id_token,
				refresh_token,
				expires_at,
			))
		})
	}
}

fn expiry_from(response: &TokenEndpointResponse) -> Result<OffsetDateTime> {
	let expires_in = response.expires_in().ok_or(ProtocolError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ProtocolError::InvalidExpiresIn)?;

	if expires_in <= 0 {
		return Err(ProtocolError::InvalidExpiresIn.into());
	}

	OffsetDateTime::now_utc()
		.checked_add(Duration::seconds(expires_in))
		.ok_or_else(|| ProtocolError::InvalidExpiresIn.into())
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: FacadeRequestError<E>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => {
			let message = match response.error_description() {
				Some(description) => format!("{}: {description}", response.error().as_ref()),
				None => response.error().as_ref().to_owned(),
			};

			unexpected_status(meta_ref, Some(message))
		},
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(TOKEN_ENDPOINT, meta_ref, error),
		RequestTokenError::Parse(source, _body) if meta_status(meta_ref) == Some(200) =>
			ProtocolError::TokenResponseParse { source }.into(),
		RequestTokenError::Parse(_, _) => unexpected_status(meta_ref, None),
		RequestTokenError::Other(message) if meta_status(meta_ref) == Some(200) =>
			ProtocolError::Decode { context: "token response", reason: message }.into(),
		RequestTokenError::Other(message) => unexpected_status(meta_ref, Some(message)),
	}
}

fn unexpected_status(meta: Option<&ResponseMetadata>, message: Option<String>) -> Error {
	ProtocolError::UnexpectedStatus {
		endpoint: TOKEN_ENDPOINT,
		status: meta_status(meta).unwrap_or_default(),
		message,
		retry_after: meta.and_then(|value| value.retry_after),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: &'static str, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { endpoint }.into();
	}

	TransportError::network(endpoint, err).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_type_defaults_to_bearer() {
		let response: TokenEndpointResponse = serde_json::from_str(
			r#"{"access_token":"A","id_token":"I","expires_in":3600,"refresh_token":"R"}"#,
		)
		.expect("A response without token_type should deserialize.");

		assert_eq!(response.access_token().secret(), "A");
		assert_eq!(*response.token_type(), BasicTokenType::Bearer);
		assert_eq!(response.id_token(), Some("I"));
		assert_eq!(response.refresh_token().map(|token| token.secret().as_str()), Some("R"));
		assert_eq!(response.expires_in(), Some(std::time::Duration::from_secs(3600)));
		assert!(response.scopes().is_none());

		let response: TokenEndpointResponse = serde_json::from_str(
			r#"{"access_token":"A","token_type":"bearer","scope":"openid email"}"#,
		)
		.expect("A response with token_type and scope should deserialize.");

		assert!(response.id_token().is_none());
		assert_eq!(response.scopes().map(Vec::len), Some(2));
	}

	#[test]
	fn error_responses_become_unexpected_status() {
		let meta = ResponseMetadata { status: Some(400), retry_after: None };
		let err = unexpected_status(Some(&meta), Some("invalid_grant".into()));

		assert!(matches!(
			err,
			Error::Protocol(ProtocolError::UnexpectedStatus { endpoint: "token", status: 400, .. })
		));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn builds_basic_auth_facade() {
		let token = Url::parse("https://login.swissid.ch/idp/oauth2/access_token")
			.expect("Token endpoint fixture should parse.");
		let _facade = <BasicFacade<ReqwestHttpClient, ReqwestTransportErrorMapper>>::new(
			&token,
			"client-id",
			"secret",
			Arc::new(ReqwestHttpClient::default()),
			Arc::new(ReqwestTransportErrorMapper),
		);
	}
}
