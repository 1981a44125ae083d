//! Token-endpoint request parameters and the HTTP request builder.

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue},
	},
};
// self
use crate::{_prelude::*, auth::ClientCredentials, error::ConfigError};

/// Form parameter carrying the client identifier.
pub const CLIENT_ID: &str = "client_id";
/// Form parameter carrying the client secret.
pub const CLIENT_SECRET: &str = "client_secret";
/// Form parameter carrying the grant type.
pub const GRANT_TYPE: &str = "grant_type";
/// Form parameter carrying the authorization code.
pub const CODE: &str = "code";
/// Form parameter carrying the redirect URI used on the authorization request.
pub const REDIRECT_URI: &str = "redirect_uri";
/// Form parameter carrying the PKCE verifier.
pub const CODE_VERIFIER: &str = "code_verifier";
/// Grant type value for authorization-code redemption.
pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";
const REDACTED_PARAMS: [&str; 3] = [CODE, CODE_VERIFIER, CLIENT_SECRET];

/// Ordered token-endpoint parameters awaiting submission.
///
/// Parameters keep their insertion order; inserting an existing name replaces its value in place.
/// The mapping stays mutable until it is handed to the redeemer, which strips `client_id` and
/// `client_secret` before encoding the body.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenRequest {
	params: Vec<(String, String)>,
}
impl TokenRequest {
	/// Creates an empty request.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an `authorization_code` grant request for `code` and `redirect_uri`.
	pub fn authorization_code(code: impl Into<String>, redirect_uri: &Url) -> Self {
		let mut request = Self::new();

		request.insert(GRANT_TYPE, AUTHORIZATION_CODE_GRANT);
		request.insert(CODE, code);
		request.insert(REDIRECT_URI, redirect_uri.as_str());

		request
	}

	/// Adds the PKCE `code_verifier`.
	pub fn with_code_verifier(mut self, verifier: impl Into<String>) -> Self {
		self.insert(CODE_VERIFIER, verifier);

		self
	}

	/// Adds `client_id`, as generic OIDC middleware does.
	///
	/// The redeemer removes it again before submission.
	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.insert(CLIENT_ID, client_id);

		self
	}

	/// Inserts or replaces a parameter.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();

		match self.params.iter_mut().find(|(key, _)| *key == name) {
			Some((_, existing)) => *existing = value,
			None => self.params.push((name, value)),
		}
	}

	/// Returns the value of a parameter.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.params.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
	}

	/// Removes a parameter, returning its value.
	pub fn remove(&mut self, name: &str) -> Option<String> {
		let idx = self.params.iter().position(|(key, _)| key == name)?;

		Some(self.params.remove(idx).1)
	}

	/// Checks whether a parameter is present.
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.params.len()
	}

	/// Returns true when no parameters are set.
	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}

	/// Iterates over `(name, value)` pairs in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.params.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}

	fn strip_client_credentials(&mut self) {
		self.params.retain(|(key, _)| key != CLIENT_ID && key != CLIENT_SECRET);
	}

	fn to_form_body(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new()).extend_pairs(self.iter()).finish()
	}
}
impl<K, V> FromIterator<(K, V)> for TokenRequest
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut request = Self::new();

		for (name, value) in iter {
			request.insert(name, value);
		}

		request
	}
}
impl Debug for TokenRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (name, value) in self.iter() {
			if REDACTED_PARAMS.contains(&name) {
				map.entry(&name, &"<redacted>");
			} else {
				map.entry(&name, &value);
			}
		}

		map.finish()
	}
}

/// Builds the POST request sent to the token endpoint.
///
/// Client credentials travel only in the `Authorization: Basic` header; any `client_id` or
/// `client_secret` left in `request` is dropped before the body is form-encoded.
pub fn build_token_http_request(
	token_endpoint: &Url,
	credentials: &ClientCredentials,
	mut request: TokenRequest,
) -> Result<HttpRequest> {
	request.strip_client_credentials();

	let mut authorization =
		HeaderValue::from_str(&credentials.basic_authorization()).map_err(ConfigError::from)?;

	authorization.set_sensitive(true);

	let http_request = Request::builder()
		.method(Method::POST)
		.uri(token_endpoint.as_str())
		.header(AUTHORIZATION, authorization)
		.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
		.header(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE))
		.body(request.to_form_body().into_bytes())
		.map_err(ConfigError::from)?;

	Ok(http_request)
}
