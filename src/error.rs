//! Redeemer-level error types shared across the request builder, response parser, and
//! configuration sources.

// self
use crate::{
	_prelude::*,
	provider::{ProviderConfigurationError, ProviderErrorKind},
};

/// Redeemer-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error returned by a redemption attempt.
///
/// Exactly one of a [`TokenResponse`](crate::redeem::TokenResponse) or this error is produced per
/// attempt. None of the variants are retried by the redeemer; callers decide.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Provider configuration could not be resolved.
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),
	/// Transport failure (DNS, TCP, TLS, timeout, cancellation).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint body could not be parsed as a JSON object.
	#[error(
		"Failed to parse token response body as JSON. Status code: {status}. Content-Type: {}.",
		.content_type.as_deref().unwrap_or("<missing>")
	)]
	MalformedResponse {
		/// HTTP status code of the response.
		status: u16,
		/// Raw `Content-Type` header, if the provider sent one.
		content_type: Option<String>,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Provider answered with a non-2xx status and an OAuth error object.
	#[error(transparent)]
	Provider(#[from] ProtocolError),
}
impl Error {
	/// Returns the provider error when this is an [`Error::Provider`].
	pub fn as_protocol_error(&self) -> Option<&ProtocolError> {
		match self {
			Self::Provider(e) => Some(e),
			_ => None,
		}
	}
}

/// OAuth error object returned by the token endpoint (RFC 6749 §5.2).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error(
	"Token endpoint returned `{error}` (HTTP {http_status}): {error_description} ({error_uri})."
)]
pub struct ProtocolError {
	/// Provider-supplied `error` code, or the configured placeholder.
	pub error: String,
	/// Provider-supplied `error_description`, or the configured placeholder.
	pub error_description: String,
	/// Provider-supplied `error_uri`, or the configured placeholder.
	pub error_uri: String,
	/// HTTP status code of the response.
	pub http_status: u16,
	/// Classification assigned by the provider strategy.
	pub kind: ProviderErrorKind,
	/// Retry-After hint, when the provider sent one.
	pub retry_after: Option<Duration>,
}
impl ProtocolError {
	/// Whether the strategy considers this failure temporary.
	///
	/// The redeemer never acts on this itself.
	pub fn is_retryable(&self) -> bool {
		matches!(self.kind, ProviderErrorKind::Transient)
	}
}

/// Local request construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Client credentials produced an invalid `Authorization` header.
	#[error("Client credentials cannot be encoded into an Authorization header.")]
	InvalidAuthorizationHeader(#[from] oauth2::http::header::InvalidHeaderValue),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while resolving provider configuration.
///
/// These originate outside the redeemer and are propagated unchanged.
#[derive(Debug, ThisError)]
pub enum ConfigurationError {
	/// Provider metadata could not be fetched.
	#[error("Provider configuration is unavailable.")]
	Unavailable {
		/// Source-specific failure.
		#[source]
		source: BoxError,
	},
	/// Provider metadata was fetched but is invalid.
	#[error(transparent)]
	Invalid(#[from] ProviderConfigurationError),
}
impl ConfigurationError {
	/// Wraps a configuration source failure.
	pub fn unavailable(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Unavailable { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO, cancellation).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call timed out or was cancelled before a full response arrived.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// Transport reported a failure without a typed error.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn protocol_error() -> ProtocolError {
		ProtocolError {
			error: "invalid_grant".into(),
			error_description: "code expired".into(),
			error_uri: "https://idp.example.com/errors/invalid_grant".into(),
			http_status: 400,
			kind: ProviderErrorKind::InvalidGrant,
			retry_after: None,
		}
	}

	#[test]
	fn protocol_error_message_carries_every_field() {
		let message = protocol_error().to_string();

		assert!(message.contains("invalid_grant"));
		assert!(message.contains("code expired"));
		assert!(message.contains("https://idp.example.com/errors/invalid_grant"));
		assert!(message.contains("400"));
	}

	#[test]
	fn malformed_response_message_reports_status_and_content_type() {
		let mut de = serde_json::Deserializer::from_str("not json");
		let source =
			serde_path_to_error::deserialize::<_, serde_json::Map<String, serde_json::Value>>(
				&mut de,
			)
			.expect_err("Plain text must not parse as a JSON object.");
		let err = Error::MalformedResponse { status: 200, content_type: None, source };
		let message = err.to_string();

		assert!(message.contains("200"));
		assert!(message.contains("<missing>"));
		assert!(std::error::Error::source(&err).is_some());
	}

	#[test]
	fn only_transient_protocol_errors_are_retryable() {
		let mut err = protocol_error();

		assert!(!err.is_retryable());

		err.kind = ProviderErrorKind::Transient;

		assert!(err.is_retryable());
		assert!(Error::from(err).as_protocol_error().is_some());
	}
}
