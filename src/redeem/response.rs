//! Token-endpoint response parsing and error classification.

// crates.io
use oauth2::{
	HttpResponse,
	http::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER},
};
use serde_json::{Map, Value};
use serde_path_to_error::{Error as PathError, Track};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::ProtocolError,
	obs,
	provider::{ProviderErrorContext, ProviderStrategy},
	redeem::RedeemerOptions,
};

const JSON_MEDIA_TYPE: &str = "application/json";
const SECRET_FIELDS: [&str; 3] = ["access_token", "id_token", "refresh_token"];

/// Successful token-endpoint response.
///
/// The JSON object is kept exactly as the provider sent it; the accessors only read from it. ID
/// token validation happens elsewhere.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenResponse(Map<String, Value>);
impl TokenResponse {
	/// Wraps a parsed JSON object.
	pub fn from_map(fields: Map<String, Value>) -> Self {
		Self(fields)
	}

	/// Raw field by name.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// `access_token` field.
	pub fn access_token(&self) -> Option<&str> {
		self.str_field("access_token")
	}

	/// `id_token` field.
	pub fn id_token(&self) -> Option<&str> {
		self.str_field("id_token")
	}

	/// `refresh_token` field.
	pub fn refresh_token(&self) -> Option<&str> {
		self.str_field("refresh_token")
	}

	/// `token_type` field.
	pub fn token_type(&self) -> Option<&str> {
		self.str_field("token_type")
	}

	/// `scope` field.
	pub fn scope(&self) -> Option<&str> {
		self.str_field("scope")
	}

	/// `expires_in`, accepting either a JSON number or a numeric string.
	pub fn expires_in(&self) -> Option<Duration> {
		let secs = match self.0.get("expires_in")? {
			Value::Number(number) => number.as_i64()?,
			Value::String(text) => text.trim().parse().ok()?,
			_ => return None,
		};

		Some(Duration::seconds(secs))
	}

	/// Borrows the underlying JSON object.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	/// Consumes the response, returning the underlying JSON object.
	pub fn into_map(self) -> Map<String, Value> {
		self.0
	}

	fn str_field(&self, name: &str) -> Option<&str> {
		self.0.get(name).and_then(Value::as_str)
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (name, value) in &self.0 {
			if SECRET_FIELDS.contains(&name.as_str()) {
				map.entry(name, &"<redacted>");
			} else {
				map.entry(name, value);
			}
		}

		map.finish()
	}
}

/// Checks whether a `Content-Type` value declares JSON, ignoring case and parameters.
pub fn is_json_content_type(content_type: &str) -> bool {
	content_type
		.split(';')
		.next()
		.map(str::trim)
		.is_some_and(|media_type| media_type.eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

/// Turns a token-endpoint response into a [`TokenResponse`] or an [`Error`].
///
/// The body is parsed as a JSON object regardless of the declared content type; a mismatch is
/// only logged. Parse failures win over the status code. Non-2xx statuses become
/// [`Error::Provider`].
pub fn parse_token_response(
	response: &HttpResponse,
	options: &RedeemerOptions,
	strategy: &dyn ProviderStrategy,
) -> Result<TokenResponse> {
	let status = response.status().as_u16();
	let content_type = response
		.headers()
		.get(CONTENT_TYPE)
		.map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

	if !content_type.as_deref().is_some_and(is_json_content_type) {
		obs::log_unexpected_content_type(status, content_type.as_deref());
	}

	let fields = parse_json_object(response.body())
		.map_err(|source| Error::MalformedResponse { status, content_type, source })?;

	if !response.status().is_success() {
		return Err(protocol_error(status, &fields, response.headers(), options, strategy).into());
	}

	Ok(TokenResponse(fields))
}

// The body must hold exactly one JSON object; trailing bytes are rejected.
fn parse_json_object(body: &[u8]) -> Result<Map<String, Value>, PathError<serde_json::Error>> {
	let mut de = serde_json::Deserializer::from_slice(body);
	let fields = serde_path_to_error::deserialize(&mut de)?;

	de.end().map_err(|e| PathError::new(Track::new().path(), e))?;

	Ok(fields)
}

fn protocol_error(
	status: u16,
	fields: &Map<String, Value>,
	headers: &HeaderMap,
	options: &RedeemerOptions,
	strategy: &dyn ProviderStrategy,
) -> ProtocolError {
	let error = string_field(fields, "error");
	let error_description = string_field(fields, "error_description");
	let error_uri = string_field(fields, "error_uri");
	let mut ctx = ProviderErrorContext::new(status);

	if let Some(error) = &error {
		ctx = ctx.with_oauth_error(error.clone());
	}
	if let Some(description) = &error_description {
		ctx = ctx.with_error_description(description.clone());
	}

	ProtocolError {
		kind: strategy.classify_token_error(&ctx),
		error: error.unwrap_or_else(|| options.missing_error.clone()),
		error_description: error_description
			.unwrap_or_else(|| options.missing_error_description.clone()),
		error_uri: error_uri.unwrap_or_else(|| options.missing_error_uri.clone()),
		http_status: status,
		retry_after: parse_retry_after(headers),
	}
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
	match fields.get(name)? {
		Value::Null => None,
		Value::String(text) => Some(text.clone()),
		other => Some(other.to_string()),
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).ok()?));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
