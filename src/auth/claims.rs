//! Identity-token claim extraction.
//!
//! The identity token arrives over the TLS-protected token endpoint, so by default its payload is
//! decoded without checking the signature. Deployments that want signature checks plug an
//! [`IdentityTokenVerifier`] into the strategy; it runs before any claim is trusted.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
// self
use crate::{
	_prelude::*,
	error::{BoxError, ClaimsError},
	http::TokenResponse,
	provider::APPLE_AUDIENCE,
};

/// Name of the token-response field carrying the identity token.
pub const ID_TOKEN_FIELD: &str = "id_token";

/// Identity claims extracted from the identity token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
	/// Stable user identifier scoped to the team.
	pub subject: String,
	/// User email (may be a private relay address).
	pub email: Option<String>,
	/// Whether Apple verified the email.
	pub email_verified: Option<bool>,
	/// Whether the email is a private relay address.
	pub is_private_email: Option<bool>,
	/// Token issuer.
	pub issuer: String,
	/// Token audiences (the client identifier).
	pub audience: Vec<String>,
	/// Expiry instant.
	#[serde(with = "time::serde::timestamp")]
	pub expires_at: OffsetDateTime,
	/// Issue instant, when present.
	#[serde(with = "time::serde::timestamp::option")]
	pub issued_at: Option<OffsetDateTime>,
}

/// Hook that checks an identity token's signature (and anything else) before decoding.
pub trait IdentityTokenVerifier: Send + Sync {
	/// Returns an error when `id_token` must not be trusted.
	fn verify(&self, id_token: &str) -> Result<(), BoxError>;
}

/// Verifier backed by a fixed [`DecodingKey`].
///
/// Key discovery and rotation are left to the caller; rebuild the verifier when keys change.
pub struct KeyVerifier {
	key: DecodingKey,
	validation: Validation,
}
impl KeyVerifier {
	/// Creates a verifier that expects Apple as the issuer.
	pub fn new(key: DecodingKey, algorithm: Algorithm) -> Self {
		let mut validation = Validation::new(algorithm);

		validation.set_issuer(&[APPLE_AUDIENCE]);
		validation.validate_aud = false;

		Self { key, validation }
	}

	/// Requires the token audience to contain `client_id`.
	pub fn audience(mut self, client_id: &str) -> Self {
		self.validation.set_audience(&[client_id]);
		self.validation.validate_aud = true;

		self
	}

	/// Overrides the expected issuer.
	pub fn issuer(mut self, issuer: &str) -> Self {
		self.validation.set_issuer(&[issuer]);

		self
	}
}
impl IdentityTokenVerifier for KeyVerifier {
	fn verify(&self, id_token: &str) -> Result<(), BoxError> {
		jsonwebtoken::decode::<JsonValue>(id_token, &self.key, &self.validation)?;

		Ok(())
	}
}
impl Debug for KeyVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeyVerifier").field("algorithms", &self.validation.algorithms).finish()
	}
}

#[derive(Deserialize)]
struct RawClaims {
	sub: Option<String>,
	iss: Option<String>,
	aud: Option<Audience>,
	exp: Option<i64>,
	iat: Option<i64>,
	email: Option<String>,
	email_verified: Option<Flag>,
	is_private_email: Option<Flag>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Audience {
	One(String),
	Many(Vec<String>),
}

// Apple sends booleans either as JSON booleans or as "true"/"false" strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
	Bool(bool),
	Text(String),
}
impl Flag {
	fn into_bool(self) -> Option<bool> {
		match self {
			Flag::Bool(value) => Some(value),
			Flag::Text(text) if text.eq_ignore_ascii_case("true") => Some(true),
			Flag::Text(text) if text.eq_ignore_ascii_case("false") => Some(false),
			Flag::Text(_) => None,
		}
	}
}

/// Extracts identity claims from a token response.
pub fn extract(
	response: &TokenResponse,
	verifier: Option<&dyn IdentityTokenVerifier>,
) -> Result<IdentityClaims, ClaimsError> {
	let id_token = response.id_token().ok_or(ClaimsError::MissingIdToken)?;

	if let Some(verifier) = verifier {
		verifier.verify(id_token).map_err(|source| ClaimsError::Verification { source })?;
	}

	decode_claims(id_token)
}

/// Decodes the payload of a compact JWT without checking its signature.
pub fn decode_claims(id_token: &str) -> Result<IdentityClaims, ClaimsError> {
	let mut segments = id_token.split('.');
	let (Some(_header), Some(payload), Some(_signature), None) =
		(segments.next(), segments.next(), segments.next(), segments.next())
	else {
		return Err(ClaimsError::Malformed);
	};
	let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
	let mut de = serde_json::Deserializer::from_slice(&bytes);
	let raw: RawClaims = serde_path_to_error::deserialize(&mut de)?;
	let subject = raw.sub.filter(|sub| !sub.is_empty()).ok_or(ClaimsError::MissingSubject)?;
	let issuer = raw.iss.ok_or(ClaimsError::MissingClaim { claim: "iss" })?;
	let audience = match raw.aud.ok_or(ClaimsError::MissingClaim { claim: "aud" })? {
		Audience::One(aud) => vec![aud],
		Audience::Many(auds) => auds,
	};
	let expires_at = raw.exp.ok_or(ClaimsError::MissingClaim { claim: "exp" })?;
	let expires_at = OffsetDateTime::from_unix_timestamp(expires_at)
		.map_err(|_| ClaimsError::InvalidTimestamp { claim: "exp" })?;
	let issued_at = raw
		.iat
		.map(OffsetDateTime::from_unix_timestamp)
		.transpose()
		.map_err(|_| ClaimsError::InvalidTimestamp { claim: "iat" })?;

	Ok(IdentityClaims {
		subject,
		email: raw.email,
		email_verified: raw.email_verified.and_then(Flag::into_bool),
		is_private_email: raw.is_private_email.and_then(Flag::into_bool),
		issuer,
		audience,
		expires_at,
		issued_at,
	})
}

#[cfg(test)]
mod tests {
	// crates.io
	use jsonwebtoken::{EncodingKey, Header};
	use serde_json::json;
	// self
	use super::*;

	fn hs256(claims: &JsonValue) -> String {
		jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(b"secret"))
			.expect("Identity token fixture should encode.")
	}

	fn response_with(id_token: Option<String>) -> TokenResponse {
		let mut params = JsonMap::new();

		params.insert("access_token".into(), json!("AT"));

		if let Some(token) = id_token {
			params.insert(ID_TOKEN_FIELD.into(), JsonValue::String(token));
		}

		TokenResponse::from_params(params).expect("Fixture response should carry an access token.")
	}

	#[test]
	fn extracts_required_and_optional_claims() {
		let token = hs256(&json!({
			"sub": "SUBJECT",
			"iss": "https://appleid.apple.com",
			"aud": "CLIENT_ID",
			"exp": 1_900_000_000,
			"iat": 1_899_996_400,
			"email": "user@example.com",
			"email_verified": "true",
			"is_private_email": false
		}));
		let claims =
			extract(&response_with(Some(token)), None).expect("Complete token should decode.");

		assert_eq!(claims.subject, "SUBJECT");
		assert_eq!(claims.email.as_deref(), Some("user@example.com"));
		assert_eq!(claims.email_verified, Some(true));
		assert_eq!(claims.is_private_email, Some(false));
		assert_eq!(claims.issuer, "https://appleid.apple.com");
		assert_eq!(claims.audience, vec!["CLIENT_ID".to_owned()]);
		assert_eq!(claims.expires_at.unix_timestamp(), 1_900_000_000);
		assert_eq!(claims.issued_at.map(|at| at.unix_timestamp()), Some(1_899_996_400));
	}

	#[test]
	fn optional_claims_stay_absent() {
		let token = hs256(&json!({
			"sub": "SUBJECT",
			"iss": "https://appleid.apple.com",
			"aud": ["CLIENT_ID", "OTHER"],
			"exp": 1_900_000_000,
			"email_verified": "maybe"
		}));
		let claims = decode_claims(&token).expect("Minimal token should decode.");

		assert_eq!(claims.email, None);
		assert_eq!(claims.email_verified, None);
		assert_eq!(claims.is_private_email, None);
		assert_eq!(claims.issued_at, None);
		assert_eq!(claims.audience.len(), 2);
	}

	#[test]
	fn missing_subject_is_fatal() {
		let token = hs256(&json!({
			"iss": "https://appleid.apple.com",
			"aud": "CLIENT_ID",
			"exp": 1_900_000_000
		}));

		assert!(matches!(decode_claims(&token), Err(ClaimsError::MissingSubject)));
	}

	#[test]
	fn missing_audience_is_reported() {
		let token =
			hs256(&json!({ "sub": "SUBJECT", "iss": "https://appleid.apple.com", "exp": 1 }));

		assert!(matches!(decode_claims(&token), Err(ClaimsError::MissingClaim { claim: "aud" })));
	}

	#[test]
	fn rejects_missing_or_malformed_tokens() {
		assert!(matches!(extract(&response_with(None), None), Err(ClaimsError::MissingIdToken)));
		assert!(matches!(decode_claims("not-a-jwt"), Err(ClaimsError::Malformed)));
		assert!(matches!(decode_claims("a.!!!.c"), Err(ClaimsError::Encoding(_))));

		let payload = URL_SAFE_NO_PAD.encode(br#"{"sub": 42}"#);
		let err = decode_claims(&format!("h.{payload}.s"))
			.expect_err("Numeric subject should not deserialize.");

		match err {
			ClaimsError::Payload(inner) => assert_eq!(inner.path().to_string(), "sub"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn key_verifier_gates_extraction() {
		let claims = json!({
			"sub": "SUBJECT",
			"iss": "https://appleid.apple.com",
			"aud": "CLIENT_ID",
			"exp": 4_000_000_000_i64
		});
		let response = response_with(Some(hs256(&claims)));
		let trusted = KeyVerifier::new(DecodingKey::from_secret(b"secret"), Algorithm::HS256)
			.audience("CLIENT_ID");

		assert!(extract(&response, Some(&trusted)).is_ok());

		let wrong_key = KeyVerifier::new(DecodingKey::from_secret(b"other"), Algorithm::HS256);

		assert!(matches!(
			extract(&response, Some(&wrong_key)),
			Err(ClaimsError::Verification { .. })
		));

		let wrong_audience = KeyVerifier::new(DecodingKey::from_secret(b"secret"), Algorithm::HS256)
			.audience("SOMEONE_ELSE");

		assert!(matches!(
			extract(&response, Some(&wrong_audience)),
			Err(ClaimsError::Verification { .. })
		));
	}
}
