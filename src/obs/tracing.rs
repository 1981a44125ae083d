// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRedeem<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRedeem<F> = F;

/// A span wrapper used around each redemption.
#[derive(Clone, Debug)]
pub struct RedeemSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RedeemSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oidc_token_redeemer.redeem", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRedeem<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs that a token response did not declare `application/json`.
///
/// Advisory only; the body is still parsed as JSON.
pub fn log_unexpected_content_type(status: u16, content_type: Option<&str>) {
	#[cfg(feature = "tracing")]
	{
		match content_type {
			None => tracing::debug!(
				status,
				"Unexpected token response format. Content-Type header is missing."
			),
			Some(content_type) => tracing::debug!(
				status,
				content_type,
				"Unexpected token response format. Content-Type is not application/json."
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (status, content_type);
	}
}

/// Logs the failure that ends a redemption attempt.
pub fn log_redeem_failure(err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(error = %err, "Token redemption failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}
