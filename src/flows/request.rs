//! Inbound request model handed over by the host framework.
//!
//! Apple delivers the callback with `response_mode=form_post`, so the interesting fields live in
//! the form body. The initial request only matters for an optional `state` query parameter.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{UserInfo, deserialize_user},
};

/// Form-posted callback body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackBody {
	/// Authorization code.
	#[serde(default)]
	pub code: Option<String>,
	/// Provider error code (e.g. `user_cancelled_authorize`).
	#[serde(default)]
	pub error: Option<String>,
	/// State echoed from the authorization request.
	#[serde(default)]
	pub state: Option<String>,
	/// First-authorization user data, normalized from either wire shape.
	#[serde(default, deserialize_with = "deserialize_user")]
	pub user: Option<UserInfo>,
}
impl CallbackBody {
	/// Parses an `application/x-www-form-urlencoded` body.
	pub fn from_form(input: &[u8]) -> Result<Self, serde_json::Error> {
		let map = form_urlencoded::parse(input)
			.map(|(key, value)| (key.into_owned(), JsonValue::String(value.into_owned())))
			.collect::<JsonMap<_, _>>();

		serde_json::from_value(JsonValue::Object(map))
	}

	/// Parses a body the host already decoded into JSON.
	pub fn from_json(value: JsonValue) -> Result<Self, serde_json::Error> {
		serde_json::from_value(value)
	}

	/// Non-empty provider error code.
	pub fn error_code(&self) -> Option<&str> {
		self.error.as_deref().filter(|value| !value.is_empty())
	}

	/// Non-empty authorization code.
	pub fn authorization_code(&self) -> Option<&str> {
		self.code.as_deref().filter(|value| !value.is_empty())
	}
}

/// Request as seen by the strategy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackRequest {
	/// Decoded query parameters.
	pub query: BTreeMap<String, String>,
	/// Decoded form body (empty for the initial GET).
	pub body: CallbackBody,
}
impl CallbackRequest {
	/// Creates a request from a raw query string (without the leading `?`).
	pub fn from_query(query: &str) -> Self {
		let query = form_urlencoded::parse(query.as_bytes()).into_owned().collect();

		Self { query, body: CallbackBody::default() }
	}

	/// Creates a request carrying only a callback body.
	pub fn from_body(body: CallbackBody) -> Self {
		Self { query: BTreeMap::new(), body }
	}

	/// State to forward: a non-empty query parameter wins over a non-empty body field.
	pub fn state(&self) -> Option<&str> {
		let non_empty = |value: &&str| !value.is_empty();

		self.query
			.get("state")
			.map(String::as_str)
			.filter(non_empty)
			.or(self.body.state.as_deref().filter(non_empty))
	}
}
