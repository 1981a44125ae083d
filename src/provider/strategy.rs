//! Provider strategy hooks that customize token redemption.
//!
//! Implementations decorate outgoing token requests and classify provider errors without tying
//! the redeemer to any particular HTTP client.

// self
use crate::{_prelude::*, redeem::TokenRequest};

/// Strategy hook that allows providers to decorate requests and classify errors.
///
/// Implementors are required to be `Send + Sync`, and the hooks use crate-owned data types so
/// downstream crates never depend on transport-specific structures. Override only what you need;
/// `augment_token_request` has a default no-op implementation.
pub trait ProviderStrategy: Send + Sync {
	/// Maps an OAuth error object into a coarse category.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;

	/// Gives providers a chance to add custom form parameters before dispatching.
	///
	/// Client credentials are stripped from the request after this hook runs, so they cannot be
	/// re-introduced into the body here.
	fn augment_token_request(&self, _request: &mut TokenRequest) {}
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization grant (bad, expired, or replayed code).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes are not acceptable.
	InsufficientScope,
	/// Failure is temporary; the caller may retry with a fresh attempt.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
///
/// Only primitive data is kept (status code, OAuth fields) so strategies stay decoupled from the
/// HTTP stack. Fields hold what the provider actually sent, before placeholders are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// HTTP status code returned by the provider.
	pub http_status: u16,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
}
impl ProviderErrorContext {
	/// Creates a new context for the provided status code.
	pub fn new(http_status: u16) -> Self {
		Self { http_status, oauth_error: None, error_description: None }
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}
}

/// Default strategy that applies RFC-guided heuristics.
///
/// It prioritizes the structured `error` code, then hints inside `error_description`, and finally
/// the HTTP status code.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		classify_oauth_error(ctx.oauth_error.as_deref(), ctx.error_description.as_deref())
			.unwrap_or_else(|| classify_status(ctx.http_status))
	}
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<ProviderErrorKind> {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
		.or_else(|| error_description.and_then(classify_text))
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(ProviderErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ProviderErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(ProviderErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
		|| value.eq_ignore_ascii_case("slow_down")
	{
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_text(text: &str) -> Option<ProviderErrorKind> {
	let lowered = text.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") => Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(ProviderErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") => Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: u16) -> ProviderErrorKind {
	match status {
		401 => ProviderErrorKind::InvalidClient,
		403 => ProviderErrorKind::InsufficientScope,
		429 | 500.. => ProviderErrorKind::Transient,
		_ => ProviderErrorKind::InvalidGrant,
	}
}
