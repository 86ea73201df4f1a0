//! Strategy-level error types shared across flows, providers, and transports.

// self
use crate::{_prelude::*, provider::ProviderErrorKind};

/// Strategy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for foreign failures that are only carried for diagnostics.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical strategy error exposed by public APIs and carried by error outcomes.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Client assertion could not be signed.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Provider rejected the token request with an OAuth error code.
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),
	/// Transport failure or an unclassifiable token endpoint response.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Identity token is missing, malformed, or failed verification.
	#[error(transparent)]
	Claims(#[from] ClaimsError),

	/// Application verify callback reported an error.
	#[error("Verify callback failed.")]
	Verify {
		/// Error supplied through `done`.
		#[source]
		source: BoxError,
	},
	/// Application verify callback dropped `done` without reporting a result.
	#[error("Verify callback finished without reporting a result.")]
	VerifyAbandoned,
}
impl Error {
	/// Returns the provider's OAuth error code when the failure came from the token endpoint.
	pub fn oauth_error_code(&self) -> Option<&str> {
		match self {
			Self::TokenExchange(err) => Some(err.code.as_str()),
			_ => None,
		}
	}

	/// Returns a stable, low-cardinality label for metrics.
	///
	/// Token endpoint rejections report their [`ProviderErrorKind`]; every other variant reports
	/// its category.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Config(_) => "config",
			Self::Signing(_) => "signing",
			Self::TokenExchange(err) => err.kind.as_str(),
			Self::Transport(_) => "transport",
			Self::Claims(_) => "claims",
			Self::Verify { .. } => "verify",
			Self::VerifyAbandoned => "verify_abandoned",
		}
	}
}

/// Construction-time configuration failures.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// A required option was absent or empty.
	#[error("Strategy requires the `{option}` option.")]
	MissingOption {
		/// Name of the missing option.
		option: &'static str,
	},
	/// The verify callback was never supplied.
	#[error("Strategy requires a verify callback.")]
	MissingVerifyCallback,
	/// No token transport was supplied and the default transport is disabled.
	#[error("Strategy requires a token transport.")]
	MissingTransport,
	/// A configured URL could not be parsed.
	#[error("The {option} option is not a valid URL: {reason}.")]
	InvalidUrl {
		/// Option holding the URL.
		option: &'static str,
		/// Parser message.
		reason: String,
	},
	/// Provider endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Scope value is not one the provider understands.
	#[error("Unsupported scope `{scope}`.")]
	UnsupportedScope {
		/// Rejected scope value.
		scope: String,
	},
	/// The default HTTP client could not be constructed.
	#[error("HTTP client could not be constructed: {reason}.")]
	HttpClientBuild {
		/// Builder failure message.
		reason: String,
	},
}

/// Client assertion signing failures; fatal for the in-flight request.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// Signing key is not a PKCS#8 PEM encoded P-256 key.
	#[error("Signing key is not a valid EC private key.")]
	InvalidKey {
		/// Underlying key parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// The assertion could not be encoded or signed.
	#[error("Client assertion could not be signed.")]
	Encode {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}

/// Provider rejected the authorization code exchange.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Token endpoint returned the OAuth error `{code}`.")]
pub struct TokenExchangeError {
	/// Provider-supplied OAuth `error` field (e.g. `invalid_grant`).
	pub code: String,
	/// Canonical classification of [`TokenExchangeError::code`].
	pub kind: ProviderErrorKind,
	/// Provider-supplied `error_description`, when present.
	pub description: Option<String>,
	/// Provider-supplied `error_uri`, when present.
	pub uri: Option<String>,
	/// HTTP status code returned by the token endpoint, when available.
	pub status: Option<u16>,
}

/// Transport-level failures and responses that carry no OAuth error code.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Token endpoint failed without a parsable `error` field.
	#[error("Token endpoint returned an unexpected response (status: {status:?}).")]
	UnexpectedResponse {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Raw response body kept for diagnostics.
		body: String,
	},
}

/// Identity token extraction failures.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// Token response carried no `id_token` field.
	#[error("Token response is missing the id_token field.")]
	MissingIdToken,
	/// Identity token is not a three-part compact JWS.
	#[error("Identity token is not a compact JWT.")]
	Malformed,
	/// Identity token payload is not valid base64url.
	#[error("Identity token payload is not valid base64url.")]
	Encoding(#[from] base64::DecodeError),
	/// Identity token payload is not a JSON claims object.
	#[error("Identity token payload could not be parsed.")]
	Payload(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// The `sub` claim is missing or empty.
	#[error("Identity token is missing the subject claim.")]
	MissingSubject,
	/// Another required claim is missing.
	#[error("Identity token is missing the `{claim}` claim.")]
	MissingClaim {
		/// Claim name.
		claim: &'static str,
	},
	/// A timestamp claim is out of range.
	#[error("Identity token claim `{claim}` is not a valid timestamp.")]
	InvalidTimestamp {
		/// Claim name.
		claim: &'static str,
	},
	/// Pluggable verifier rejected the token.
	#[error("Identity token failed verification.")]
	Verification {
		/// Verifier failure.
		#[source]
		source: BoxError,
	},
}
