//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use oidc_token_redeemer::{
	auth::ClientCredentials,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{
		DefaultTransportErrorMapper, ReqwestTransportErrorMapper,
		oauth2::{
			AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
			http::{HeaderMap, HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
		},
	},
	provider::{DefaultProviderStrategy, ProviderConfiguration, ProviderStrategy},
	redeem::{RedeemerOptions, TokenRedeemer},
	reqwest::{Client, redirect::Policy},
	url::Url,
};
use parking_lot::Mutex;

pub const CLIENT_ID: &str = "web-app";
pub const CLIENT_SECRET: &str = "web-app-secret";
pub const REDIRECT_URI: &str = "https://app.example.com/signin-oidc";
pub const TOKEN_ENDPOINT: &str = "https://idp.example.com/oauth2/token";

pub fn credentials() -> ClientCredentials {
	ClientCredentials::new(CLIENT_ID, CLIENT_SECRET)
}

pub fn redirect_uri() -> Url {
	Url::parse(REDIRECT_URI).expect("Redirect URI fixture should parse.")
}

pub fn token_endpoint() -> Url {
	Url::parse(TOKEN_ENDPOINT).expect("Token endpoint fixture should parse.")
}

/// Reqwest client that accepts the self-signed certificates `httpmock` serves.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

pub fn build_reqwest_test_redeemer(
	options: RedeemerOptions,
) -> TokenRedeemer<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);

	TokenRedeemer::with_http_client(
		test_reqwest_http_client(),
		Arc::new(ReqwestTransportErrorMapper),
		strategy,
	)
	.with_options(options)
}

/// Provider configuration pointing at a local (possibly plain HTTP) mock token endpoint.
pub fn mock_provider_configuration(token_endpoint: &str) -> ProviderConfiguration {
	ProviderConfiguration::builder()
		.token_endpoint(
			Url::parse(token_endpoint).expect("Mock token endpoint should parse successfully."),
		)
		.allow_insecure_http(true)
		.build()
		.expect("Mock provider configuration should build successfully.")
}

#[derive(Debug)]
pub enum FakeTransportError {
	ConnectionReset,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::ConnectionReset => write!(f, "Connection reset by peer."),
		}
	}
}
impl StdError for FakeTransportError {}

/// Snapshot of a request seen by [`FakeHttpClient`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: Method,
	pub uri: String,
	pub headers: HeaderMap,
	pub body: Vec<u8>,
}
impl RecordedRequest {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	pub fn form_pairs(&self) -> Vec<(String, String)> {
		oidc_token_redeemer::url::form_urlencoded::parse(&self.body).into_owned().collect()
	}
}

#[derive(Clone)]
enum FakeBehavior {
	Respond { status: u16, content_type: Option<&'static str>, body: String },
	Fail,
	Hang,
}

/// In-process backchannel that records every request and replays a canned outcome.
#[derive(Clone)]
pub struct FakeHttpClient {
	behavior: FakeBehavior,
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
	calls: Arc<AtomicUsize>,
}
impl FakeHttpClient {
	pub fn respond(status: u16, content_type: Option<&'static str>, body: impl Into<String>) -> Self {
		Self::with_behavior(FakeBehavior::Respond { status, content_type, body: body.into() })
	}

	pub fn json(status: u16, body: impl Into<String>) -> Self {
		Self::respond(status, Some("application/json"), body)
	}

	pub fn failing() -> Self {
		Self::with_behavior(FakeBehavior::Fail)
	}

	pub fn hanging() -> Self {
		Self::with_behavior(FakeBehavior::Hang)
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn with_behavior(behavior: FakeBehavior) -> Self {
		Self { behavior, requests: Default::default(), calls: Default::default() }
	}
}
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpClient;
	type TransportError = FakeTransportError;

	fn handle(&self) -> Self::Handle {
		self.clone()
	}
}
impl<'c> AsyncHttpClient<'c> for FakeHttpClient {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.requests.lock().push(RecordedRequest {
			method: request.method().clone(),
			uri: request.uri().to_string(),
			headers: request.headers().clone(),
			body: request.body().clone(),
		});

		let behavior = self.behavior.clone();

		Box::pin(async move {
			match behavior {
				FakeBehavior::Respond { status, content_type, body } => {
					let mut response = HttpResponse::new(body.into_bytes());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Fake status code should be valid.");

					if let Some(content_type) = content_type {
						response
							.headers_mut()
							.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
					}

					Ok(response)
				},
				FakeBehavior::Fail =>
					Err(HttpClientError::Reqwest(Box::new(FakeTransportError::ConnectionReset))),
				FakeBehavior::Hang => std::future::pending().await,
			}
		})
	}
}

pub type FakeRedeemer = TokenRedeemer<FakeHttpClient, DefaultTransportErrorMapper>;

pub fn fake_redeemer(client: &FakeHttpClient) -> FakeRedeemer {
	TokenRedeemer::with_http_client(
		client.clone(),
		Arc::new(DefaultTransportErrorMapper),
		Arc::new(DefaultProviderStrategy),
	)
}
