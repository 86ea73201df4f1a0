//! Transport seam for the authorization-code exchange.
//!
//! [`TokenTransport`] is the strategy's only dependency on an HTTP stack: it receives the code
//! plus [`ExchangeOptions`] and either returns the provider's [`TokenResponse`] or a
//! [`TransportFailure`] carrying the status and raw body. Classifying that body is the
//! strategy's job, so transports stay dumb. The default implementation lives in
//! [`crate::oauth`]; tests substitute a stub.

// self
use crate::{
	_prelude::*,
	auth::{ClientAssertion, ID_TOKEN_FIELD, TokenSecret},
	error::BoxError,
	provider::StrategyConfig,
};

/// Boxed future returned by [`TokenTransport`] implementations.
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenResponse, TransportFailure>> + 'a + Send>>;

/// Executes the token endpoint call for an authorization code.
///
/// Implementations must not retry; each call maps to one HTTP request. Timeouts belong to the
/// implementation as well.
pub trait TokenTransport
where
	Self: 'static + Send + Sync,
{
	/// Exchanges `code` using `options`.
	fn exchange_authorization_code<'a>(
		&'a self,
		code: &'a str,
		options: &'a ExchangeOptions,
	) -> TransportFuture<'a>;
}

/// OAuth 2.0 grant types issued by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant.
	AuthorizationCode,
}
impl GrantType {
	/// Returns the RFC 6749 identifier.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Options accompanying a code exchange.
#[derive(Clone, Debug)]
pub struct ExchangeOptions {
	/// Client identifier.
	pub client_id: String,
	/// Token endpoint.
	pub token_url: Url,
	/// Always [`GrantType::AuthorizationCode`].
	pub grant_type: GrantType,
	/// Signed client assertion used as the client secret.
	pub client_secret: TokenSecret,
	/// Redirect URI, when one was sent on the authorization request.
	pub redirect_uri: Option<Url>,
}
impl ExchangeOptions {
	/// Builds options for `config` with a freshly signed `assertion`.
	pub fn new(config: &StrategyConfig, assertion: &ClientAssertion) -> Self {
		Self {
			client_id: config.client_id.clone(),
			token_url: config.token_url.clone(),
			grant_type: GrantType::AuthorizationCode,
			client_secret: assertion.token.clone(),
			redirect_uri: config.callback_url.clone(),
		}
	}
}

/// Successful token endpoint response.
#[derive(Clone)]
pub struct TokenResponse {
	/// Access token.
	pub access_token: TokenSecret,
	/// Refresh token, when issued.
	pub refresh_token: Option<TokenSecret>,
	/// Full response payload, including `id_token`.
	pub params: JsonMap<String, JsonValue>,
}
impl TokenResponse {
	/// Builds a response from a decoded JSON payload; `None` when `access_token` is missing.
	pub fn from_params(params: JsonMap<String, JsonValue>) -> Option<Self> {
		let access_token = params.get("access_token")?.as_str()?.to_owned();
		let refresh_token = params
			.get("refresh_token")
			.and_then(JsonValue::as_str)
			.map(TokenSecret::new);

		Some(Self { access_token: TokenSecret::new(access_token), refresh_token, params })
	}

	/// Returns the identity token, when present.
	pub fn id_token(&self) -> Option<&str> {
		self.params.get(ID_TOKEN_FIELD).and_then(JsonValue::as_str)
	}

	/// Returns the payload as a JSON value.
	pub fn raw(&self) -> JsonValue {
		JsonValue::Object(self.params.clone())
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("access_token", &self.access_token)
			.field("refresh_token", &self.refresh_token)
			.field("params", &self.params.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Failure reported by a [`TokenTransport`].
#[derive(Debug)]
pub enum TransportFailure {
	/// Token endpoint answered with a non-success response.
	Response {
		/// HTTP status code, when known.
		status: Option<u16>,
		/// Raw response body.
		body: String,
	},
	/// Request never produced a response (DNS, TCP, TLS, IO).
	Network {
		/// Transport-specific error.
		source: BoxError,
	},
}
impl TransportFailure {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Metadata captured from the most recent HTTP response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
}

/// Thread-safe slot sharing [`ResponseMetadata`] between the HTTP handle and error mapping.
///
/// Every exchange creates its own slot, so concurrent requests never observe each other.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{_test, auth};

	#[test]
	fn options_carry_assertion_and_redirect() {
		let mut config = _test::config();

		config.callback_url =
			Some(Url::parse("https://app.example.com/cb").expect("Fixture URL should parse."));

		let assertion = auth::sign(&config, OffsetDateTime::now_utc())
			.expect("Assertion should sign with the fixture key.");
		let options = ExchangeOptions::new(&config, &assertion);

		assert_eq!(options.grant_type.as_str(), "authorization_code");
		assert_eq!(options.client_id, "CLIENT_ID");
		assert_eq!(options.token_url.as_str(), "https://appleid.apple.com/auth/token");
		assert_eq!(options.client_secret.expose(), assertion.token.expose());
		assert_eq!(
			options.redirect_uri.as_ref().map(Url::as_str),
			Some("https://app.example.com/cb")
		);
	}

	#[test]
	fn token_response_reads_tokens_and_redacts_debug() {
		let params = json!({ "access_token": "AT", "refresh_token": "RT", "id_token": "a.b.c" });
		let JsonValue::Object(params) = params else { unreachable!() };
		let response = TokenResponse::from_params(params).expect("Fixture should parse.");

		assert_eq!(response.access_token.expose(), "AT");
		assert_eq!(response.refresh_token.as_ref().map(TokenSecret::expose), Some("RT"));
		assert_eq!(response.id_token(), Some("a.b.c"));

		let rendered = format!("{response:?}");

		assert!(!rendered.contains("\"AT\""));
		assert!(rendered.contains("id_token"));
		assert!(TokenResponse::from_params(JsonMap::new()).is_none());
	}

	#[test]
	fn metadata_slot_take_clears() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(400) });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(400));
		assert!(slot.take().is_none());
	}
}
