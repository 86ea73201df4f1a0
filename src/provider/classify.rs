//! OAuth error-code classification for token endpoint failures.

// self
use crate::_prelude::*;

/// Canonical provider error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization code (expired, reused, or revoked).
	InvalidGrant,
	/// Client authentication failed; usually a bad client assertion.
	InvalidClient,
	/// Request was malformed or missing a parameter.
	InvalidRequest,
	/// Failure is temporary and may succeed later.
	Transient,
	/// Any code this crate does not recognize.
	Other,
}
impl ProviderErrorKind {
	/// Classifies an OAuth `error` code; matching is case-insensitive.
	pub fn from_code(code: &str) -> Self {
		const TABLE: &[(&str, ProviderErrorKind)] = &[
			("invalid_grant", ProviderErrorKind::InvalidGrant),
			("invalid_client", ProviderErrorKind::InvalidClient),
			("unauthorized_client", ProviderErrorKind::InvalidClient),
			("invalid_request", ProviderErrorKind::InvalidRequest),
			("unsupported_grant_type", ProviderErrorKind::InvalidRequest),
			("invalid_scope", ProviderErrorKind::InvalidRequest),
			("temporarily_unavailable", ProviderErrorKind::Transient),
			("server_error", ProviderErrorKind::Transient),
		];

		TABLE
			.iter()
			.find(|(known, _)| code.eq_ignore_ascii_case(known))
			.map(|(_, kind)| *kind)
			.unwrap_or(ProviderErrorKind::Other)
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProviderErrorKind::InvalidGrant => "invalid_grant",
			ProviderErrorKind::InvalidClient => "invalid_client",
			ProviderErrorKind::InvalidRequest => "invalid_request",
			ProviderErrorKind::Transient => "transient",
			ProviderErrorKind::Other => "other",
		}
	}
}
impl Display for ProviderErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn classifies_known_codes_case_insensitively() {
		assert_eq!(ProviderErrorKind::from_code("invalid_grant"), ProviderErrorKind::InvalidGrant);
		assert_eq!(ProviderErrorKind::from_code("INVALID_CLIENT"), ProviderErrorKind::InvalidClient);
		assert_eq!(ProviderErrorKind::from_code("server_error"), ProviderErrorKind::Transient);
	}

	#[test]
	fn unknown_codes_fall_back_to_other() {
		assert_eq!(ProviderErrorKind::from_code("invalid_dance"), ProviderErrorKind::Other);
		assert_eq!(ProviderErrorKind::from_code(""), ProviderErrorKind::Other);
	}
}
