//! ES256 client assertions that stand in for a static client secret.
//!
//! Apple authenticates confidential clients with a short-lived JWT signed by the team's private
//! key instead of a shared secret. A fresh assertion is signed for every token exchange.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::SigningError,
	provider::{APPLE_AUDIENCE, StrategyConfig},
};

/// Lifetime of a client assertion.
pub const ASSERTION_LIFETIME: Duration = Duration::minutes(5);

/// Claims carried by a client assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Team identifier.
	pub iss: String,
	/// Issued-at, seconds since the Unix epoch.
	pub iat: i64,
	/// Expiry, seconds since the Unix epoch.
	pub exp: i64,
	/// Always [`APPLE_AUDIENCE`].
	pub aud: String,
	/// Client identifier.
	pub sub: String,
}

/// A signed, time-boxed client assertion.
#[derive(Clone, Debug)]
pub struct ClientAssertion {
	/// Compact JWS used as `client_secret`.
	pub token: TokenSecret,
	/// Identifier of the signing key.
	pub key_id: String,
	/// Issue instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant; never later than `issued_at + ASSERTION_LIFETIME`.
	pub expires_at: OffsetDateTime,
}

/// Signs a client assertion for `config` as of `now`.
pub fn sign(config: &StrategyConfig, now: OffsetDateTime) -> Result<ClientAssertion, SigningError> {
	let key = EncodingKey::from_ec_pem(config.signing_key.expose().as_bytes())
		.map_err(|source| SigningError::InvalidKey { source })?;
	let issued_at = now.replace_nanosecond(0).unwrap_or(now);
	let expires_at = issued_at + ASSERTION_LIFETIME;
	let claims = AssertionClaims {
		iss: config.team_id.clone(),
		iat: issued_at.unix_timestamp(),
		exp: expires_at.unix_timestamp(),
		aud: APPLE_AUDIENCE.into(),
		sub: config.client_id.clone(),
	};
	let mut header = Header::new(Algorithm::ES256);

	header.kid = Some(config.key_id.clone());

	let token = jsonwebtoken::encode(&header, &claims, &key)
		.map_err(|source| SigningError::Encode { source })?;

	Ok(ClientAssertion {
		token: TokenSecret::new(token),
		key_id: config.key_id.clone(),
		issued_at,
		expires_at,
	})
}
