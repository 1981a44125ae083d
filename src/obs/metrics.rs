// self
use crate::obs::RedeemOutcome;

/// Records a redemption outcome via the global metrics recorder (when enabled).
pub fn record_redeem_outcome(outcome: RedeemOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oidc_token_redeemer_redeem_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_redeem_outcome_without_recorder() {
		record_redeem_outcome(RedeemOutcome::Failure);
	}
}
