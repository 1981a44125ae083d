//! Authorization-code redemption against a provider's token endpoint.
//!
//! [`TokenRedeemer`] performs one exchange per call: it builds the POST with HTTP Basic client
//! authentication ([`request`]), submits it through the injected [`TokenHttpClient`], and turns
//! the reply into a [`TokenResponse`] or a structured [`Error`] ([`response`]). Nothing is
//! retried and no state is shared between calls.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

// crates.io
use oauth2::AsyncHttpClient;
// self
use crate::{
	_prelude::*,
	auth::ClientCredentials,
	error::ConfigurationError,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, RedeemOutcome, RedeemSpan},
	provider::{ProviderConfigurationSource, ProviderStrategy},
};
#[cfg(feature = "reqwest")]
use crate::{
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::DefaultProviderStrategy,
};

#[cfg(feature = "reqwest")]
/// Redeemer specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenRedeemer = TokenRedeemer<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Placeholders applied when a provider error omits optional fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedeemerOptions {
	/// Used when the error body has no `error` code.
	pub missing_error: String,
	/// Used when the error body has no `error_description`.
	pub missing_error_description: String,
	/// Used when the error body has no `error_uri`.
	pub missing_error_uri: String,
}
impl Default for RedeemerOptions {
	fn default() -> Self {
		Self {
			missing_error: "unknown_error".into(),
			missing_error_description: "error_description was not provided".into(),
			missing_error_uri: "error_uri was not provided".into(),
		}
	}
}

/// Redeems authorization codes at a token endpoint using HTTP Basic client authentication.
///
/// The redeemer owns the transport, the transport error mapper, and the provider strategy; the
/// pending request, client credentials, and endpoint are supplied per call. It holds no mutable
/// state, so one instance can serve concurrent sign-ins.
pub struct TokenRedeemer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for the backchannel call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Strategy responsible for provider-specific request additions and error classification.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Placeholders for missing provider error fields.
	pub options: RedeemerOptions,
}
impl<C, M> TokenRedeemer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a redeemer that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
		strategy: Arc<dyn ProviderStrategy>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			strategy,
			options: RedeemerOptions::default(),
		}
	}

	/// Replaces the error placeholders.
	pub fn with_options(mut self, options: RedeemerOptions) -> Self {
		self.options = options;

		self
	}

	/// Exchanges `request` at `token_endpoint`.
	///
	/// Any `client_id`/`client_secret` in `request` is removed; `credentials` travel in the
	/// `Authorization: Basic` header instead. Exactly one HTTP call is made.
	pub async fn redeem(
		&self,
		request: TokenRequest,
		credentials: &ClientCredentials,
		token_endpoint: &Url,
	) -> Result<TokenResponse> {
		let span = RedeemSpan::new("redeem");

		obs::record_redeem_outcome(RedeemOutcome::Attempt);

		let result = span.instrument(self.exchange(request, credentials, token_endpoint)).await;

		match &result {
			Ok(_) => obs::record_redeem_outcome(RedeemOutcome::Success),
			Err(e) => {
				obs::log_redeem_failure(e);
				obs::record_redeem_outcome(RedeemOutcome::Failure);
			},
		}

		result
	}

	/// Resolves the token endpoint from `source`, then calls [`redeem`](Self::redeem).
	///
	/// Resolution failures and configurations that fail
	/// [`validate`](crate::provider::ProviderConfiguration::validate) are returned as
	/// [`Error::Configuration`] without contacting the provider.
	pub async fn redeem_with_configuration<S>(
		&self,
		request: TokenRequest,
		credentials: &ClientCredentials,
		source: &S,
	) -> Result<TokenResponse>
	where
		S: ?Sized + ProviderConfigurationSource,
	{
		let configuration = source.configuration().await?;

		configuration.validate().map_err(ConfigurationError::from)?;

		self.redeem(request, credentials, &configuration.token_endpoint).await
	}

	async fn exchange(
		&self,
		mut request: TokenRequest,
		credentials: &ClientCredentials,
		token_endpoint: &Url,
	) -> Result<TokenResponse> {
		self.strategy.augment_token_request(&mut request);

		let http_request = build_token_http_request(token_endpoint, credentials, request)?;
		let handle = self.http_client.handle();
		let http_response = handle
			.call(http_request)
			.await
			.map_err(|e| self.transport_mapper.map_transport_error(e))?;

		parse_token_response(&http_response, &self.options, self.strategy.as_ref())
	}
}
#[cfg(feature = "reqwest")]
impl TokenRedeemer<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a redeemer with its own reqwest transport and the default provider strategy.
	pub fn new() -> Result<Self> {
		let http_client = ReqwestHttpClient::new()?;

		Ok(Self::with_http_client(
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
			Arc::new(DefaultProviderStrategy),
		))
	}
}
impl<C, M> Clone for TokenRedeemer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			transport_mapper: Arc::clone(&self.transport_mapper),
			strategy: Arc::clone(&self.strategy),
			options: self.options.clone(),
		}
	}
}
impl<C, M> Debug for TokenRedeemer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRedeemer").field("options", &self.options).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn options_deserialize_with_defaults() {
		let options: RedeemerOptions =
			serde_json::from_str(r#"{"missing_error_uri":"n/a"}"#).expect("Options should parse.");

		assert_eq!(options.missing_error_uri, "n/a");
		assert_eq!(options.missing_error, RedeemerOptions::default().missing_error);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn reqwest_redeemer_builds_with_defaults() {
		let redeemer = TokenRedeemer::new().expect("Default redeemer should build.");

		assert_eq!(redeemer.options, RedeemerOptions::default());
		assert!(format!("{redeemer:?}").starts_with("TokenRedeemer"));
	}
}
