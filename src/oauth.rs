//! Default [`TokenTransport`] built on the `oauth2` crate and `reqwest`.
//!
//! The `oauth2` client performs the form encoding and response parsing. Provider error
//! responses are serialized back into JSON so the strategy classifies every failure from the
//! same `{status, body}` shape regardless of which transport produced it.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, ExtraTokenFields, HttpClientError, HttpRequest, HttpResponse, RedirectUrl,
	RequestTokenError, StandardRevocableToken, StandardTokenResponse, TokenResponse as _, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
use reqwest::redirect::Policy;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	http::{
		ExchangeOptions, ResponseMetadata, ResponseMetadataSlot, TokenResponse, TokenTransport,
		TransportFailure, TransportFuture,
	},
};

/// Extra token-response fields Apple returns alongside the standard ones (`id_token`, ...).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppleTokenFields {
	/// Every non-standard field, keyed by name.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl ExtraTokenFields for AppleTokenFields {}

type AppleTokenResponse = StandardTokenResponse<AppleTokenFields, BasicTokenType>;
type AppleOAuthClient = oauth2::Client<
	BasicErrorResponse,
	AppleTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Production transport: one `reqwest` POST per exchange, no retries, no redirects.
#[derive(Clone, Debug)]
pub struct OAuth2TokenTransport {
	client: ReqwestClient,
}
impl OAuth2TokenTransport {
	/// Builds a transport with a client that refuses to follow redirects.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.build()
			.map_err(|e| ConfigError::HttpClientBuild { reason: e.to_string() })?;

		Ok(Self { client })
	}

	/// Wraps an existing client. Token endpoints answer directly, so configure it without
	/// redirect following.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client }
	}

	fn oauth_client(&self, options: &ExchangeOptions) -> Result<AppleOAuthClient, TransportFailure> {
		let token_url =
			TokenUrl::new(options.token_url.to_string()).map_err(TransportFailure::network)?;
		let client: AppleOAuthClient = oauth2::Client::new(ClientId::new(options.client_id.clone()))
			.set_client_secret(ClientSecret::new(options.client_secret.expose().to_owned()))
			.set_auth_type(AuthType::RequestBody)
			.set_token_uri(token_url);

		Ok(client)
	}
}
impl TokenTransport for OAuth2TokenTransport {
	fn exchange_authorization_code<'a>(
		&'a self,
		code: &'a str,
		options: &'a ExchangeOptions,
	) -> TransportFuture<'a> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let oauth_client = self.oauth_client(options)?;
			let handle = InstrumentedHandle { client: self.client.clone(), slot: meta.clone() };
			let mut request = oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

			if let Some(redirect) = &options.redirect_uri {
				let redirect_url =
					RedirectUrl::new(redirect.to_string()).map_err(TransportFailure::network)?;

				request = request.set_redirect_uri(Cow::Owned(redirect_url));
			}

			let response = request
				.request_async(&handle)
				.await
				.map_err(|err| map_request_error(meta.take(), err))?;

			map_token_response(response)
		})
	}
}

/// [`AsyncHttpClient`] handle that records the response status in a [`ResponseMetadataSlot`].
struct InstrumentedHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let response = self
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			self.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

fn map_token_response(response: AppleTokenResponse) -> Result<TokenResponse, TransportFailure> {
	let params = match serde_json::to_value(&response).map_err(TransportFailure::network)? {
		JsonValue::Object(map) => map,
		_ => JsonMap::new(),
	};

	Ok(TokenResponse {
		access_token: TokenSecret::new(response.access_token().secret().as_str()),
		refresh_token: response.refresh_token().map(|token| TokenSecret::new(token.secret().as_str())),
		params,
	})
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: RequestTokenError<HttpClientError<ReqwestError>, BasicErrorResponse>,
) -> TransportFailure {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let body = serde_json::json!({
				"error": response.error().as_ref(),
				"error_description": response.error_description(),
				"error_uri": response.error_uri(),
			});

			TransportFailure::Response { status, body: body.to_string() }
		},
		RequestTokenError::Request(error) => TransportFailure::network(error),
		RequestTokenError::Parse(_, body) =>
			TransportFailure::Response { status, body: String::from_utf8_lossy(&body).into_owned() },
		RequestTokenError::Other(message) => TransportFailure::Response { status, body: message },
	}
}
