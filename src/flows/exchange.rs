//! Token exchange adapter: signs the client assertion, calls the transport, and classifies
//! failures into the strategy's error taxonomy.

// self
use crate::{
	_prelude::*,
	auth::{self, ClientAssertion},
	error::{TokenExchangeError, TransportError},
	flows::AppleStrategy,
	http::{ExchangeOptions, TokenResponse, TokenTransport, TransportFailure},
	provider::{ProviderErrorKind, StrategyConfig},
};

/// Exchanges `code` through `transport`, authenticating with `assertion`.
///
/// The response is returned untouched. Failures are never retried.
pub async fn exchange(
	transport: &dyn TokenTransport,
	config: &StrategyConfig,
	code: &str,
	assertion: &ClientAssertion,
) -> Result<TokenResponse> {
	let options = ExchangeOptions::new(config, assertion);

	transport.exchange_authorization_code(code, &options).await.map_err(classify_failure)
}

/// Maps a transport failure into an [`Error`].
///
/// A response body shaped like `{"error": "<code>"}` becomes a [`TokenExchangeError`];
/// anything else keeps the raw body in [`TransportError::UnexpectedResponse`].
pub fn classify_failure(failure: TransportFailure) -> Error {
	match failure {
		TransportFailure::Network { source } => TransportError::Network { source }.into(),
		TransportFailure::Response { status, body } => {
			let parsed = serde_json::from_str::<JsonValue>(&body).ok();
			let field = |name: &str| {
				parsed.as_ref().and_then(|value| value.get(name)).and_then(JsonValue::as_str)
			};

			match field("error").filter(|code| !code.is_empty()) {
				Some(code) => TokenExchangeError {
					kind: ProviderErrorKind::from_code(code),
					code: code.to_owned(),
					description: field("error_description").map(str::to_owned),
					uri: field("error_uri").map(str::to_owned),
					status,
				}
				.into(),
				None => TransportError::UnexpectedResponse { status, body }.into(),
			}
		},
	}
}

impl<U> AppleStrategy<U> {
	/// Signs a fresh client assertion and exchanges `code` for tokens.
	pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
		let assertion = auth::sign(&self.config, OffsetDateTime::now_utc())?;

		exchange(self.transport.as_ref(), &self.config, code, &assertion).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str) -> TransportFailure {
		TransportFailure::Response { status: Some(status), body: body.into() }
	}

	#[test]
	fn oauth_error_bodies_become_token_errors() {
		let err = classify_failure(response(
			400,
			r#"{"error":"invalid_grant","error_description":"The code has expired or has been revoked."}"#,
		));

		match err {
			Error::TokenExchange(inner) => {
				assert_eq!(inner.code, "invalid_grant");
				assert_eq!(inner.kind, ProviderErrorKind::InvalidGrant);
				assert_eq!(inner.status, Some(400));
				assert!(inner.description.is_some());
				assert_eq!(inner.uri, None);
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn odd_optional_members_keep_the_error_code() {
		let err = classify_failure(response(
			400,
			r#"{"error":"invalid_grant","error_description":5,"error_uri":null,"extra":[1]}"#,
		));

		assert_eq!(err.oauth_error_code(), Some("invalid_grant"));

		match err {
			Error::TokenExchange(inner) => {
				assert_eq!(inner.description, None);
				assert_eq!(inner.uri, None);
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn unparsable_bodies_keep_raw_text() {
		for body in ["<html>Bad Gateway</html>", r#"{"message":"nope"}"#, r#"{"error":""}"#, "[]"] {
			match classify_failure(response(502, body)) {
				Error::Transport(TransportError::UnexpectedResponse { status, body: raw }) => {
					assert_eq!(status, Some(502));
					assert_eq!(raw, body);
				},
				other => panic!("Unexpected error for {body}: {other:?}."),
			}
		}
	}

	#[test]
	fn network_failures_stay_transport_errors() {
		let failure = TransportFailure::network(std::io::Error::other("connection reset"));

		assert!(matches!(classify_failure(failure), Error::Transport(TransportError::Network { .. })));
	}
}
