//! First-authorization user data and profile normalization.
//!
//! Apple posts a `user` field only the first time a user authorizes the app. Depending on the
//! host's body parser it arrives either as a JSON object or as a JSON-encoded string; both shapes
//! are collapsed into [`UserInfo`] at ingestion so later stages never re-check the shape.

// self
use crate::{
	_prelude::*,
	auth::IdentityClaims,
	obs::{self, FlowStage},
};

/// User name as posted by Apple.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserName {
	/// Given name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
}

/// First-authorization user data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Name the user chose to share.
	#[serde(default)]
	pub name: Option<UserName>,
	/// Email echoed by Apple; the profile takes its email from the identity token instead.
	#[serde(default)]
	pub email: Option<String>,
}

/// Raw `user` field as received, before normalization.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UserField {
	/// JSON-encoded string (form-encoded bodies).
	Encoded(String),
	/// Already-structured value (JSON bodies or pre-parsed forms).
	Structured(JsonValue),
}
impl UserField {
	/// Normalizes either shape; malformed data yields `None` instead of an error.
	pub fn into_user_info(self) -> Option<UserInfo> {
		let parsed = match self {
			UserField::Encoded(text) => serde_json::from_str::<UserInfo>(&text),
			UserField::Structured(value) => serde_json::from_value::<UserInfo>(value),
		};

		match parsed {
			Ok(info) => Some(info),
			Err(_) => {
				obs::note(FlowStage::Ingest, "Ignoring malformed user field.");

				None
			},
		}
	}
}

/// Serde adapter that accepts either `user` shape and never fails on malformed content.
pub fn deserialize_user<'de, D>(deserializer: D) -> Result<Option<UserInfo>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let field = Option::<UserField>::deserialize(deserializer)?;

	Ok(field.and_then(UserField::into_user_info))
}

/// Normalized identity handed to the verify callback.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedProfile {
	/// Identity token subject.
	pub id: String,
	/// Identity token email.
	pub email: Option<String>,
	/// First-authorization name, when Apple sent one.
	pub name: Option<UserName>,
	/// Token-response payload the profile was built from.
	pub raw: JsonValue,
}

/// Merges identity claims with first-authorization user data.
pub fn normalize(
	claims: &IdentityClaims,
	user: Option<&UserInfo>,
	raw: JsonValue,
) -> NormalizedProfile {
	NormalizedProfile {
		id: claims.subject.clone(),
		email: claims.email.clone(),
		name: user.and_then(|info| info.name.clone()),
		raw,
	}
}
