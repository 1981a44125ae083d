//! Optional observability helpers for redemption.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit spans named `oidc_token_redeemer.redeem` with a
//!   `stage` field, plus debug-level diagnostics for unexpected response content types.
//! - Enable `metrics` to increment the `oidc_token_redeemer_redeem_total` counter for every
//!   attempt/success/failure, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each redemption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RedeemOutcome {
	/// Entry to the redeemer.
	Attempt,
	/// A token response was returned.
	Success,
	/// An error was propagated back to the caller.
	Failure,
}
impl RedeemOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RedeemOutcome::Attempt => "attempt",
			RedeemOutcome::Success => "success",
			RedeemOutcome::Failure => "failure",
		}
	}
}
impl Display for RedeemOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
