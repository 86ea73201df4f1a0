//! Strategy configuration, builder, and validation.

// std
use std::str::FromStr;
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Apple's authorization endpoint.
pub const AUTHORIZATION_URL: &str = "https://appleid.apple.com/auth/authorize";
/// Apple's token endpoint.
pub const TOKEN_URL: &str = "https://appleid.apple.com/auth/token";
/// Audience Apple expects in client assertions and issues identity tokens from.
pub const APPLE_AUDIENCE: &str = "https://appleid.apple.com";

/// Scopes Apple understands on the authorization request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
	/// Request the user's name on first authorization.
	Name,
	/// Request the user's (possibly relayed) email address.
	Email,
}
impl Scope {
	/// Returns the wire value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Scope::Name => "name",
			Scope::Email => "email",
		}
	}
}
impl FromStr for Scope {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"name" => Ok(Scope::Name),
			"email" => Ok(Scope::Email),
			other => Err(ConfigError::UnsupportedScope { scope: other.to_owned() }),
		}
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Immutable strategy configuration consumed by every flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyConfig {
	/// Services ID registered with Apple; sent as `client_id` and the assertion subject.
	pub client_id: String,
	/// Developer team identifier; the assertion issuer.
	pub team_id: String,
	/// Identifier of the signing key; the assertion `kid` header.
	pub key_id: String,
	/// PKCS#8 PEM encoded P-256 private key.
	pub signing_key: TokenSecret,
	/// Authorization endpoint.
	pub authorization_url: Url,
	/// Token endpoint.
	pub token_url: Url,
	/// Redirect URI registered with Apple, forwarded on both legs when set.
	pub callback_url: Option<Url>,
	/// Requested scopes, kept sorted and deduplicated.
	pub scope: Vec<Scope>,
}
impl StrategyConfig {
	/// Creates a new builder seeded with Apple's default endpoints.
	pub fn builder() -> StrategyConfigBuilder {
		StrategyConfigBuilder::default()
	}

	/// Joins the configured scopes with spaces, or `None` when no scope is requested.
	pub fn scope_param(&self) -> Option<String> {
		if self.scope.is_empty() {
			return None;
		}

		Some(self.scope.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" "))
	}
}

/// Builder for [`StrategyConfig`] values.
#[derive(Debug, Default)]
pub struct StrategyConfigBuilder {
	client_id: Option<String>,
	team_id: Option<String>,
	key_id: Option<String>,
	signing_key: Option<TokenSecret>,
	authorization_url: Option<Url>,
	token_url: Option<Url>,
	callback_url: Option<Url>,
	scope: Vec<Scope>,
}
impl StrategyConfigBuilder {
	/// Sets the Services ID.
	pub fn client_id(mut self, value: impl Into<String>) -> Self {
		self.client_id = Some(value.into());

		self
	}

	/// Sets the developer team identifier.
	pub fn team_id(mut self, value: impl Into<String>) -> Self {
		self.team_id = Some(value.into());

		self
	}

	/// Sets the signing key identifier.
	pub fn key_id(mut self, value: impl Into<String>) -> Self {
		self.key_id = Some(value.into());

		self
	}

	/// Sets the PEM encoded signing key.
	pub fn signing_key(mut self, pem: impl Into<String>) -> Self {
		self.signing_key = Some(TokenSecret::new(pem));

		self
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_url(mut self, url: Url) -> Self {
		self.authorization_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Sets the redirect URI registered with Apple.
	pub fn callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}

	/// Adds a requested scope.
	pub fn scope(mut self, scope: Scope) -> Self {
		self.scope.push(scope);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<StrategyConfig, ConfigError> {
		let client_id = required("client_id", self.client_id)?;
		let team_id = required("team_id", self.team_id)?;
		let key_id = required("key_id", self.key_id)?;
		let signing_key = self
			.signing_key
			.filter(|key| !key.expose().trim().is_empty())
			.ok_or(ConfigError::MissingOption { option: "signing_key" })?;
		let authorization_url = match self.authorization_url {
			Some(url) => url,
			None => parse_url("authorization_url", AUTHORIZATION_URL)?,
		};
		let token_url = match self.token_url {
			Some(url) => url,
			None => parse_url("token_url", TOKEN_URL)?,
		};

		validate_endpoint("authorization", &authorization_url)?;
		validate_endpoint("token", &token_url)?;

		let mut scope = self.scope;

		scope.sort();
		scope.dedup();

		Ok(StrategyConfig {
			client_id,
			team_id,
			key_id,
			signing_key,
			authorization_url,
			token_url,
			callback_url: self.callback_url,
			scope,
		})
	}
}

/// Serde-friendly raw options, e.g. loaded from a config file or environment.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct StrategyOptions {
	/// See [`StrategyConfig::client_id`].
	pub client_id: Option<String>,
	/// See [`StrategyConfig::team_id`].
	pub team_id: Option<String>,
	/// See [`StrategyConfig::key_id`].
	pub key_id: Option<String>,
	/// See [`StrategyConfig::signing_key`].
	pub signing_key: Option<String>,
	/// See [`StrategyConfig::authorization_url`].
	pub authorization_url: Option<String>,
	/// See [`StrategyConfig::token_url`].
	pub token_url: Option<String>,
	/// See [`StrategyConfig::callback_url`].
	pub callback_url: Option<String>,
	/// See [`StrategyConfig::scope`].
	pub scope: Vec<String>,
}
impl TryFrom<StrategyOptions> for StrategyConfig {
	type Error = ConfigError;

	fn try_from(options: StrategyOptions) -> Result<Self, Self::Error> {
		let mut builder = StrategyConfig::builder();

		builder.client_id = options.client_id;
		builder.team_id = options.team_id;
		builder.key_id = options.key_id;
		builder.signing_key = options.signing_key.map(TokenSecret::new);

		if let Some(raw) = options.authorization_url {
			builder.authorization_url = Some(parse_url("authorization_url", &raw)?);
		}
		if let Some(raw) = options.token_url {
			builder.token_url = Some(parse_url("token_url", &raw)?);
		}
		if let Some(raw) = options.callback_url {
			builder.callback_url = Some(parse_url("callback_url", &raw)?);
		}

		for raw in options.scope {
			builder.scope.push(raw.parse()?);
		}

		builder.build()
	}
}

fn required(option: &'static str, value: Option<String>) -> Result<String, ConfigError> {
	value.filter(|v| !v.trim().is_empty()).ok_or(ConfigError::MissingOption { option })
}

fn parse_url(option: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|e| ConfigError::InvalidUrl { option, reason: e.to_string() })
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
