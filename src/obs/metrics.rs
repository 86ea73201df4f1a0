// self
use crate::obs::{FlowStage, OutcomeKind};

/// Label used for outcomes that carry no error.
pub const NO_REASON: &str = "none";

/// Records an invocation outcome via the global metrics recorder (when enabled).
///
/// `reason` is [`NO_REASON`] unless the outcome is an error, in which case it is
/// [`crate::error::Error::label`] (the provider error kind for token endpoint rejections).
pub fn record_outcome(stage: FlowStage, outcome: OutcomeKind, reason: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_apple_outcome_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str(),
			"reason" => reason
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome, reason);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_outcome_noop_without_metrics() {
		record_outcome(FlowStage::Exchange, OutcomeKind::Error, "invalid_grant");
		record_outcome(FlowStage::Authorize, OutcomeKind::Redirect, NO_REASON);
	}
}
