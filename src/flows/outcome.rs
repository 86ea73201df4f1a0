//! Outcome types, the verify callback contract, and single-fire delivery guards.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{NormalizedProfile, TokenSecret},
	error::BoxError,
	obs::OutcomeKind,
};

/// Provider error code Apple sends when the user cancels the consent sheet.
pub const USER_CANCELLED_AUTHORIZE: &str = "user_cancelled_authorize";

/// Informational payload attached to a fail outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailInfo {
	/// Human-readable message.
	pub message: String,
	/// Provider error code that caused the failure, when there was one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
}
impl FailInfo {
	/// Creates an info value without a provider code.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into(), code: None }
	}

	/// Describes a provider error code posted to the callback.
	///
	/// `user_cancelled_authorize` becomes "User cancelled authorize"; other codes are rendered the
	/// same way: underscores become spaces and the first letter is capitalized.
	pub fn from_provider_code(code: &str) -> Self {
		let message = if code == USER_CANCELLED_AUTHORIZE {
			"User cancelled authorize".to_owned()
		} else {
			humanize(code)
		};

		Self { message, code: Some(code.to_owned()) }
	}
}

/// Result of one strategy invocation.
#[derive(Debug)]
pub enum Outcome<U> {
	/// Send the user agent to this URL.
	Redirect(Url),
	/// Authentication failed for an expected reason (denial, verify rejection).
	Fail(FailInfo),
	/// Authentication succeeded.
	Success {
		/// User produced by the verify callback.
		user: U,
		/// Optional info supplied alongside the user.
		info: Option<JsonValue>,
	},
	/// The protocol or a local component failed.
	Error(Error),
}
impl<U> Outcome<U> {
	/// Returns the outcome label.
	pub fn kind(&self) -> OutcomeKind {
		match self {
			Outcome::Redirect(_) => OutcomeKind::Redirect,
			Outcome::Fail(_) => OutcomeKind::Fail,
			Outcome::Success { .. } => OutcomeKind::Success,
			Outcome::Error(_) => OutcomeKind::Error,
		}
	}
}

/// What the verify callback reported through [`Done`].
#[derive(Debug)]
pub enum VerifyResult<U> {
	/// Accept the login.
	Success {
		/// Application user.
		user: U,
		/// Optional info.
		info: Option<JsonValue>,
	},
	/// Reject the login without an error.
	Fail(FailInfo),
	/// Report an application error.
	Error(BoxError),
}

/// Completion handle passed to the verify callback.
///
/// Every method consumes the handle, so a callback can report at most once. It may be moved to
/// another task and completed later; dropping it unused ends the invocation with
/// [`Error::VerifyAbandoned`].
#[derive(Debug)]
pub struct Done<U>(oneshot::Sender<VerifyResult<U>>);
impl<U> Done<U> {
	pub(crate) fn channel() -> (Self, oneshot::Receiver<VerifyResult<U>>) {
		let (tx, rx) = oneshot::channel();

		(Self(tx), rx)
	}

	/// Accepts the login.
	pub fn success(self, user: U) {
		self.report(VerifyResult::Success { user, info: None });
	}

	/// Accepts the login and attaches info.
	pub fn success_with_info(self, user: U, info: JsonValue) {
		self.report(VerifyResult::Success { user, info: Some(info) });
	}

	/// Rejects the login.
	pub fn fail(self, info: FailInfo) {
		self.report(VerifyResult::Fail(info));
	}

	/// Reports an application error.
	pub fn error(self, err: impl Into<BoxError>) {
		self.report(VerifyResult::Error(err.into()));
	}

	/// Reports a prepared result.
	pub fn report(self, result: VerifyResult<U>) {
		// The invocation may already be gone; nothing left to notify.
		let _ = self.0.send(result);
	}
}

/// Application hook that turns a normalized profile into an application user.
pub trait VerifyCallback<U>
where
	Self: Send + Sync,
{
	/// Receives the tokens and profile; must eventually complete `done`.
	fn verify(
		&self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		profile: NormalizedProfile,
		done: Done<U>,
	);
}
impl<U, F> VerifyCallback<U> for F
where
	F: Fn(TokenSecret, Option<TokenSecret>, NormalizedProfile, Done<U>) + Send + Sync,
{
	fn verify(
		&self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		profile: NormalizedProfile,
		done: Done<U>,
	) {
		self(access_token, refresh_token, profile, done)
	}
}

/// Delivery failures reported by [`Responder::deliver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum DeliveryError {
	/// An outcome was already delivered through this responder.
	#[error("An outcome was already delivered.")]
	AlreadyDelivered,
	/// The host dropped the receiving side.
	#[error("The outcome receiver is gone.")]
	Disconnected,
}

/// Single-fire outcome channel for hosts that consume outcomes as callbacks.
#[derive(Debug)]
pub struct Responder<U>(Mutex<Option<oneshot::Sender<Outcome<U>>>>);
impl<U> Responder<U> {
	/// Creates a responder and the receiver the host awaits.
	pub fn channel() -> (Self, oneshot::Receiver<Outcome<U>>) {
		let (tx, rx) = oneshot::channel();

		(Self(Mutex::new(Some(tx))), rx)
	}

	/// Delivers `outcome`; every call after the first is rejected.
	pub fn deliver(&self, outcome: Outcome<U>) -> Result<(), DeliveryError> {
		let tx = self.0.lock().take().ok_or(DeliveryError::AlreadyDelivered)?;

		tx.send(outcome).map_err(|_| DeliveryError::Disconnected)
	}

	/// Returns `true` once an outcome has been delivered (or delivery was attempted).
	pub fn is_spent(&self) -> bool {
		self.0.lock().is_none()
	}
}

fn humanize(code: &str) -> String {
	let spaced = code.replace('_', " ");
	let mut chars = spaced.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => "Authorization failed".to_owned(),
	}
}
