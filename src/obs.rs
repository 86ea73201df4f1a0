//! Optional observability helpers for strategy invocations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_apple.flow` with a `stage` field,
//!   plus debug events when optional callback data is discarded.
//! - Enable `metrics` to increment the `oauth2_apple_outcome_total` counter once per invocation,
//!   labeled by `stage`, `outcome`, and an error `reason`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Stage a strategy invocation was classified into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStage {
	/// No code and no error: redirect to the provider.
	Authorize,
	/// Callback carried an error code.
	Denial,
	/// Callback carried an authorization code.
	Exchange,
	/// Callback body was being parsed.
	Ingest,
}
impl FlowStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStage::Authorize => "authorize",
			FlowStage::Denial => "denial",
			FlowStage::Exchange => "exchange",
			FlowStage::Ingest => "ingest",
		}
	}
}
impl Display for FlowStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal outcome labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
	/// Redirected to the provider.
	Redirect,
	/// User-facing failure (denial or verify rejection).
	Fail,
	/// Authenticated.
	Success,
	/// Protocol or local error.
	Error,
}
impl OutcomeKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OutcomeKind::Redirect => "redirect",
			OutcomeKind::Fail => "fail",
			OutcomeKind::Success => "success",
			OutcomeKind::Error => "error",
		}
	}
}
impl Display for OutcomeKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn stage_labels_are_stable() {
		assert_eq!(FlowStage::Authorize.as_str(), "authorize");
		assert_eq!(FlowStage::Denial.to_string(), "denial");
		assert_eq!(FlowStage::Exchange.as_str(), "exchange");
		assert_eq!(FlowStage::Ingest.as_str(), "ingest");
		assert_eq!(OutcomeKind::Error.to_string(), "error");
	}
}
