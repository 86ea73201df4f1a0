//! Strategy controller and the per-stage helpers it orchestrates.

pub mod authorize;
pub mod callback;
pub mod exchange;
pub mod outcome;
pub mod request;

pub use authorize::*;
pub use exchange::*;
pub use outcome::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::IdentityTokenVerifier,
	error::ConfigError,
	http::TokenTransport,
	provider::StrategyConfig,
};

/// Sign in with Apple strategy.
///
/// The strategy owns an immutable configuration, the token transport, an optional identity-token
/// verifier, and the application's verify callback. It holds no per-request state, so one
/// instance serves any number of concurrent invocations.
pub struct AppleStrategy<U> {
	/// Validated configuration shared by every invocation.
	pub config: Arc<StrategyConfig>,
	/// Transport used for the code exchange.
	pub transport: Arc<dyn TokenTransport>,
	/// Optional identity-token verifier run before claims are trusted.
	pub verifier: Option<Arc<dyn IdentityTokenVerifier>>,
	verify: Arc<dyn VerifyCallback<U>>,
}
impl<U> AppleStrategy<U> {
	/// Strategy name hosts register the strategy under.
	pub const NAME: &'static str = "apple";

	/// Starts building a strategy for `config`.
	pub fn builder(config: StrategyConfig) -> AppleStrategyBuilder<U> {
		AppleStrategyBuilder { config, transport: None, verifier: None, verify: None }
	}

	/// Returns [`AppleStrategy::NAME`].
	pub fn name(&self) -> &'static str {
		Self::NAME
	}
}
impl<U> Clone for AppleStrategy<U> {
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			verifier: self.verifier.clone(),
			verify: self.verify.clone(),
		}
	}
}
impl<U> Debug for AppleStrategy<U> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppleStrategy")
			.field("config", &self.config)
			.field("verifier_set", &self.verifier.is_some())
			.finish()
	}
}

/// Builder for [`AppleStrategy`].
pub struct AppleStrategyBuilder<U> {
	config: StrategyConfig,
	transport: Option<Arc<dyn TokenTransport>>,
	verifier: Option<Arc<dyn IdentityTokenVerifier>>,
	verify: Option<Arc<dyn VerifyCallback<U>>>,
}
impl<U> AppleStrategyBuilder<U> {
	/// Sets the application verify callback (required).
	pub fn verify(mut self, callback: impl 'static + VerifyCallback<U>) -> Self {
		self.verify = Some(Arc::new(callback));

		self
	}

	/// Overrides the token transport.
	pub fn transport(mut self, transport: impl TokenTransport) -> Self {
		self.transport = Some(Arc::new(transport));

		self
	}

	/// Shares an existing transport handle.
	pub fn shared_transport(mut self, transport: Arc<dyn TokenTransport>) -> Self {
		self.transport = Some(transport);

		self
	}

	/// Installs an identity-token verifier.
	pub fn verifier(mut self, verifier: impl 'static + IdentityTokenVerifier) -> Self {
		self.verifier = Some(Arc::new(verifier));

		self
	}

	/// Validates the builder and returns the strategy.
	///
	/// Without an explicit transport the `reqwest` feature supplies
	/// [`crate::oauth::OAuth2TokenTransport`].
	pub fn build(self) -> Result<AppleStrategy<U>, ConfigError> {
		let verify = self.verify.ok_or(ConfigError::MissingVerifyCallback)?;
		let transport = match self.transport {
			Some(transport) => transport,
			None => default_transport()?,
		};

		Ok(AppleStrategy {
			config: Arc::new(self.config),
			transport,
			verifier: self.verifier,
			verify,
		})
	}
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Result<Arc<dyn TokenTransport>, ConfigError> {
	Ok(Arc::new(crate::oauth::OAuth2TokenTransport::new()?))
}
#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Result<Arc<dyn TokenTransport>, ConfigError> {
	Err(ConfigError::MissingTransport)
}
