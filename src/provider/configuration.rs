//! Provider configuration (token endpoint) and the sources that resolve it.
//!
//! Fetching a discovery document is left to the caller's OIDC client; this module only models the
//! subset the redeemer needs and the contract for handing it over, optionally behind a cache.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{_prelude::*, error::ConfigurationError};

/// Boxed future returned by [`ProviderConfigurationSource`] methods.
pub type ConfigurationFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ConfigurationError>> + 'a + Send>>;

const CLIENT_SECRET_BASIC: &str = "client_secret_basic";

/// Errors raised while constructing or validating a provider configuration.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderConfigurationError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Immutable subset of provider metadata consumed by the redeemer.
///
/// Field names follow the OpenID Provider Metadata document so a fetched discovery document can
/// be deserialized straight into this type and then checked with
/// [`validate`](ProviderConfiguration::validate).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfiguration {
	/// Issuer identifier, when known.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub issuer: Option<Url>,
	/// Token endpoint used for code redemption.
	pub token_endpoint: Url,
	/// Client authentication methods advertised by the provider.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub token_endpoint_auth_methods_supported: Vec<String>,
	/// Accepts plain HTTP on loopback hosts. Only settable through the builder; deserialized
	/// configurations are always held to HTTPS.
	#[serde(skip)]
	pub allow_insecure_http: bool,
}
impl ProviderConfiguration {
	/// Creates a new builder.
	pub fn builder() -> ProviderConfigurationBuilder {
		ProviderConfigurationBuilder::default()
	}

	/// Validates that every endpoint uses HTTPS.
	///
	/// Plain HTTP passes only for loopback hosts on configurations built with
	/// [`allow_insecure_http`](ProviderConfigurationBuilder::allow_insecure_http).
	pub fn validate(&self) -> Result<(), ProviderConfigurationError> {
		validate_endpoint("token", &self.token_endpoint, self.allow_insecure_http)?;

		if let Some(issuer) = self.issuer.as_ref() {
			validate_endpoint("issuer", issuer, self.allow_insecure_http)?;
		}

		Ok(())
	}

	/// Whether the provider accepts `client_secret_basic`.
	///
	/// An empty method list means the provider did not advertise any, in which case OpenID
	/// Connect Discovery defaults to `client_secret_basic`.
	pub fn supports_client_secret_basic(&self) -> bool {
		self.token_endpoint_auth_methods_supported.is_empty()
			|| self
				.token_endpoint_auth_methods_supported
				.iter()
				.any(|method| method == CLIENT_SECRET_BASIC)
	}
}

/// Builder for [`ProviderConfiguration`] values.
#[derive(Debug, Default)]
pub struct ProviderConfigurationBuilder {
	/// Optional issuer identifier.
	pub issuer: Option<Url>,
	/// Token endpoint used for code redemption.
	pub token_endpoint: Option<Url>,
	/// Advertised client authentication methods.
	pub auth_methods: Vec<String>,
	/// Accepts plain HTTP for loopback hosts (local mock providers).
	pub allow_insecure_http: bool,
}
impl ProviderConfigurationBuilder {
	/// Sets the issuer identifier.
	pub fn issuer(mut self, url: Url) -> Self {
		self.issuer = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Records a client authentication method advertised by the provider.
	pub fn auth_method(mut self, method: impl Into<String>) -> Self {
		self.auth_methods.push(method.into());

		self
	}

	/// Allows `http://` endpoints on loopback hosts.
	pub fn allow_insecure_http(mut self, allow: bool) -> Self {
		self.allow_insecure_http = allow;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfiguration, ProviderConfigurationError> {
		let token_endpoint =
			self.token_endpoint.ok_or(ProviderConfigurationError::MissingTokenEndpoint)?;
		let configuration = ProviderConfiguration {
			issuer: self.issuer,
			token_endpoint,
			token_endpoint_auth_methods_supported: self.auth_methods,
			allow_insecure_http: self.allow_insecure_http,
		};

		configuration.validate()?;

		Ok(configuration)
	}
}

/// Resolves provider configuration, possibly asynchronously.
///
/// Failures are reported as [`ConfigurationError`] and the redeemer propagates them unchanged.
/// Resolved values are validated before use, so a source may hand back a discovery document as
/// fetched.
pub trait ProviderConfigurationSource
where
	Self: Send + Sync,
{
	/// Returns the current provider configuration.
	fn configuration(&self) -> ConfigurationFuture<'_, Arc<ProviderConfiguration>>;

	/// Returns the token endpoint from the current, validated configuration.
	fn token_endpoint(&self) -> ConfigurationFuture<'_, Url> {
		Box::pin(async move {
			let configuration = self.configuration().await?;

			configuration.validate()?;

			Ok(configuration.token_endpoint.clone())
		})
	}
}

impl<S> ProviderConfigurationSource for Arc<S>
where
	S: ?Sized + ProviderConfigurationSource,
{
	fn configuration(&self) -> ConfigurationFuture<'_, Arc<ProviderConfiguration>> {
		(**self).configuration()
	}
}

/// Source that always yields the same, already validated configuration.
#[derive(Clone, Debug)]
pub struct StaticConfigurationSource(Arc<ProviderConfiguration>);
impl StaticConfigurationSource {
	/// Wraps a configuration.
	pub fn new(configuration: ProviderConfiguration) -> Self {
		Self(Arc::new(configuration))
	}
}
impl ProviderConfigurationSource for StaticConfigurationSource {
	fn configuration(&self) -> ConfigurationFuture<'_, Arc<ProviderConfiguration>> {
		let configuration = Arc::clone(&self.0);

		Box::pin(async move { Ok(configuration) })
	}
}

/// Caches the first successful resolution of an inner source.
///
/// Concurrent first callers share a single upstream resolution. Failures, including invalid
/// configurations, are not cached, so the next call retries the inner source.
pub struct CachedConfigurationSource<S>
where
	S: ?Sized + ProviderConfigurationSource,
{
	cached: RwLock<Option<Arc<ProviderConfiguration>>>,
	generation: AtomicU64,
	resolve_guard: AsyncMutex<()>,
	source: S,
}
impl<S> CachedConfigurationSource<S>
where
	S: ProviderConfigurationSource,
{
	/// Wraps `source`.
	pub fn new(source: S) -> Self {
		Self {
			cached: RwLock::new(None),
			generation: AtomicU64::new(0),
			resolve_guard: AsyncMutex::new(()),
			source,
		}
	}
}
impl<S> CachedConfigurationSource<S>
where
	S: ?Sized + ProviderConfigurationSource,
{
	/// Drops the cached configuration so the next call resolves again.
	///
	/// A resolution already in flight still answers its callers but is not cached.
	pub fn invalidate(&self) {
		let mut cached = self.cached.write();

		self.generation.fetch_add(1, Ordering::AcqRel);
		*cached = None;
	}

	fn cached(&self) -> Option<Arc<ProviderConfiguration>> {
		self.cached.read().clone()
	}
}
impl<S> ProviderConfigurationSource for CachedConfigurationSource<S>
where
	S: ?Sized + ProviderConfigurationSource,
{
	fn configuration(&self) -> ConfigurationFuture<'_, Arc<ProviderConfiguration>> {
		Box::pin(async move {
			if let Some(configuration) = self.cached() {
				return Ok(configuration);
			}

			let _resolving = self.resolve_guard.lock().await;

			if let Some(configuration) = self.cached() {
				return Ok(configuration);
			}

			let generation = self.generation.load(Ordering::Acquire);
			let configuration = self.source.configuration().await?;

			configuration.validate()?;

			{
				let mut cached = self.cached.write();

				if self.generation.load(Ordering::Acquire) == generation {
					*cached = Some(Arc::clone(&configuration));
				}
			}

			Ok(configuration)
		})
	}
}
impl<S> Debug for CachedConfigurationSource<S>
where
	S: ?Sized + ProviderConfigurationSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedConfigurationSource").field("cached", &self.cached()).finish()
	}
}

fn validate_endpoint(
	name: &'static str,
	url: &Url,
	allow_insecure_http: bool,
) -> Result<(), ProviderConfigurationError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if allow_insecure_http && is_loopback(url) => Ok(()),
		_ => Err(ProviderConfigurationError::InsecureEndpoint {
			endpoint: name,
			url: url.to_string(),
		}),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{sync::atomic::AtomicUsize, time::Duration as StdDuration};
	// self
	use super::*;

	/// Slow source that counts resolutions.
	struct SlowSource {
		configuration: Arc<ProviderConfiguration>,
		resolutions: AtomicUsize,
	}
	impl SlowSource {
		fn new(configuration: ProviderConfiguration) -> Self {
			Self { configuration: Arc::new(configuration), resolutions: AtomicUsize::new(0) }
		}
	}
	impl ProviderConfigurationSource for SlowSource {
		fn configuration(&self) -> ConfigurationFuture<'_, Arc<ProviderConfiguration>> {
			Box::pin(async move {
				self.resolutions.fetch_add(1, Ordering::SeqCst);
				tokio::time::sleep(StdDuration::from_millis(50)).await;

				Ok(Arc::clone(&self.configuration))
			})
		}
	}

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	fn discovered(document: &str) -> ProviderConfiguration {
		serde_json::from_str(document).expect("Discovery document should deserialize.")
	}

	#[test]
	fn builder_rejects_missing_and_insecure_endpoints() {
		let err = ProviderConfiguration::builder()
			.build()
			.expect_err("Builder should reject a missing token endpoint.");

		assert_eq!(err, ProviderConfigurationError::MissingTokenEndpoint);

		let err = ProviderConfiguration::builder()
			.token_endpoint(url("http://idp.example.com/token"))
			.build()
			.expect_err("Builder should reject plain HTTP endpoints.");

		assert!(matches!(
			err,
			ProviderConfigurationError::InsecureEndpoint { endpoint: "token", .. }
		));
	}

	#[test]
	fn insecure_http_is_limited_to_loopback_hosts() {
		let local = ProviderConfiguration::builder()
			.token_endpoint(url("http://127.0.0.1:8080/token"))
			.allow_insecure_http(true)
			.build();

		assert!(local.is_ok());

		let remote = ProviderConfiguration::builder()
			.token_endpoint(url("http://idp.example.com/token"))
			.allow_insecure_http(true)
			.build();

		assert!(remote.is_err());
	}

	#[test]
	fn discovery_subset_deserializes_and_validates() {
		let configuration: ProviderConfiguration = serde_json::from_str(
			r#"{
				"issuer": "https://idp.example.com",
				"authorization_endpoint": "https://idp.example.com/authorize",
				"token_endpoint": "https://idp.example.com/token",
				"token_endpoint_auth_methods_supported": ["client_secret_post"]
			}"#,
		)
		.expect("Discovery document subset should deserialize.");

		assert!(configuration.validate().is_ok());
		assert_eq!(configuration.token_endpoint.as_str(), "https://idp.example.com/token");
		assert!(!configuration.supports_client_secret_basic());
	}

	#[test]
	fn unadvertised_auth_methods_default_to_basic() {
		let configuration = ProviderConfiguration::builder()
			.token_endpoint(url("https://idp.example.com/token"))
			.build()
			.expect("Configuration should build.");

		assert!(configuration.supports_client_secret_basic());
	}

	#[test]
	fn deserialized_configuration_never_allows_plain_http() {
		let configuration = discovered(r#"{"token_endpoint":"http://127.0.0.1:8080/token"}"#);

		assert!(!configuration.allow_insecure_http);
		assert!(matches!(
			configuration.validate(),
			Err(ProviderConfigurationError::InsecureEndpoint { endpoint: "token", .. })
		));
	}

	#[tokio::test]
	async fn sources_reject_insecure_discovered_endpoints() {
		let document = r#"{"token_endpoint":"http://idp.example.com/token"}"#;
		let source = StaticConfigurationSource::new(discovered(document));
		let err = source
			.token_endpoint()
			.await
			.expect_err("Plain HTTP token endpoints must not resolve.");

		assert!(matches!(err, ConfigurationError::Invalid(_)));

		let cached = CachedConfigurationSource::new(SlowSource::new(discovered(document)));

		for _ in 0..2 {
			let err = cached
				.configuration()
				.await
				.expect_err("Invalid configurations must not be served.");

			assert!(matches!(err, ConfigurationError::Invalid(_)));
		}

		assert_eq!(cached.source.resolutions.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn invalidate_during_resolution_discards_the_result() {
		let configuration = ProviderConfiguration::builder()
			.token_endpoint(url("https://idp.example.com/token"))
			.build()
			.expect("Configuration should build.");
		let cached = CachedConfigurationSource::new(SlowSource::new(configuration));
		let (resolved, ()) = tokio::join!(cached.configuration(), async {
			tokio::time::sleep(StdDuration::from_millis(5)).await;
			cached.invalidate();
		});

		resolved.expect("In-flight callers still receive the resolved configuration.");

		assert!(cached.cached().is_none());

		cached.configuration().await.expect("Configuration should resolve again.");
		cached.configuration().await.expect("Configuration should be served from the cache.");

		assert_eq!(cached.source.resolutions.load(Ordering::SeqCst), 2);
	}
}
