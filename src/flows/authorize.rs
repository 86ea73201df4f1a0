//! Authorization redirect construction.

// self
use crate::{
	_prelude::*,
	flows::{AppleStrategy, CallbackRequest},
	provider::StrategyConfig,
};

/// Response mode Apple requires whenever the callback should carry user data.
pub const RESPONSE_MODE: &str = "form_post";

/// Builds the authorization redirect for `request`.
///
/// Parameter order is fixed: `client_id`, `response_type`, `response_mode`, then `redirect_uri`
/// and `scope` when configured, then `state` when the request carries one.
pub fn build_authorization_url(config: &StrategyConfig, request: &CallbackRequest) -> Url {
	let mut url = config.authorization_url.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("response_type", "code");
	pairs.append_pair("response_mode", RESPONSE_MODE);

	if let Some(callback) = &config.callback_url {
		pairs.append_pair("redirect_uri", callback.as_str());
	}
	if let Some(scope) = config.scope_param() {
		pairs.append_pair("scope", &scope);
	}
	if let Some(state) = request.state() {
		pairs.append_pair("state", state);
	}

	drop(pairs);

	url
}

impl<U> AppleStrategy<U> {
	/// Builds the authorization redirect for `request` with this strategy's configuration.
	pub fn authorization_url(&self, request: &CallbackRequest) -> Url {
		build_authorization_url(&self.config, request)
	}
}
