//! Callback dispatch: classifies an inbound request and drives it to exactly one outcome.
//!
//! Inspection order is fixed: an `error` field wins over a `code` field, and a request with
//! neither starts the authorization redirect.

// self
use crate::{
	_prelude::*,
	auth::{self, NormalizedProfile},
	flows::{
		AppleStrategy, CallbackRequest, DeliveryError, Done, FailInfo, Outcome, Responder,
		VerifyResult,
	},
	http::TokenResponse,
	obs::{self, FlowSpan, FlowStage},
};

impl<U> AppleStrategy<U>
where
	U: 'static + Send,
{
	/// Runs one invocation and returns its outcome.
	pub async fn authenticate(&self, request: &CallbackRequest) -> Outcome<U> {
		let body = &request.body;
		let (stage, outcome) = if let Some(code) = body.error_code() {
			(FlowStage::Denial, Outcome::Fail(FailInfo::from_provider_code(code)))
		} else if let Some(code) = body.authorization_code() {
			let span = FlowSpan::new(FlowStage::Exchange);

			(FlowStage::Exchange, span.instrument(self.complete(code, request)).await)
		} else {
			(FlowStage::Authorize, Outcome::Redirect(self.authorization_url(request)))
		};

		let reason = match &outcome {
			Outcome::Error(err) => err.label(),
			_ => obs::NO_REASON,
		};

		obs::record_outcome(stage, outcome.kind(), reason);

		outcome
	}

	/// Runs one invocation and hands the outcome to `responder`.
	///
	/// A spent responder is rejected before any work happens, so the authorization code and the
	/// verify callback are never consumed for an outcome nobody can receive. A host that dropped
	/// its receiver is not an error; the outcome is discarded.
	pub async fn authenticate_into(
		&self,
		request: &CallbackRequest,
		responder: &Responder<U>,
	) -> Result<(), DeliveryError> {
		if responder.is_spent() {
			return Err(DeliveryError::AlreadyDelivered);
		}

		let outcome = self.authenticate(request).await;

		match responder.deliver(outcome) {
			Err(DeliveryError::Disconnected) => {
				obs::note(FlowStage::Exchange, "Outcome receiver dropped before delivery.");

				Ok(())
			},
			other => other,
		}
	}

	async fn complete(&self, code: &str, request: &CallbackRequest) -> Outcome<U> {
		let (tokens, profile) = match self.profile_for(code, request).await {
			Ok(parts) => parts,
			Err(e) => return Outcome::Error(e),
		};
		let (done, rx) = Done::channel();

		self.verify.verify(tokens.access_token, tokens.refresh_token, profile, done);

		match rx.await {
			Ok(VerifyResult::Success { user, info }) => Outcome::Success { user, info },
			Ok(VerifyResult::Fail(info)) => Outcome::Fail(info),
			Ok(VerifyResult::Error(source)) => Outcome::Error(Error::Verify { source }),
			Err(_) => Outcome::Error(Error::VerifyAbandoned),
		}
	}

	async fn profile_for(
		&self,
		code: &str,
		request: &CallbackRequest,
	) -> Result<(TokenResponse, NormalizedProfile)> {
		let tokens = self.exchange_code(code).await?;
		let claims = auth::extract(&tokens, self.verifier.as_deref())?;
		let profile = auth::normalize(&claims, request.body.user.as_ref(), tokens.raw());

		Ok((tokens, profile))
	}
}
