//! Redeems an authorization code pasted from the browser.
//!
//! The demo generates a PKCE pair, prints the values the authorize request needs, then reads the
//! returned `code` from stdin and exchanges it using HTTP Basic client authentication.

// std
use std::io::{self, Write};
// crates.io
use color_eyre::Result;
// self
use oidc_token_redeemer::{
	auth::{ClientCredentials, PkcePair},
	error::Error,
	provider::{CachedConfigurationSource, ProviderConfiguration, StaticConfigurationSource},
	redeem::{TokenRedeemer, TokenRequest},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let token_endpoint = Url::parse(&prompt("Token endpoint", "https://idp.example.com/token")?)?;
	let redirect_uri =
		Url::parse(&prompt("Redirect URI", "https://app.example.com/signin-oidc")?)?;
	let client_id = prompt("Client ID", "demo-client")?;
	let client_secret = prompt("Client secret", "demo-secret")?;
	let source = CachedConfigurationSource::new(StaticConfigurationSource::new(
		ProviderConfiguration::builder().token_endpoint(token_endpoint).build()?,
	));
	let pkce = PkcePair::generate();

	println!("code_challenge={}", pkce.challenge());
	println!("code_challenge_method={}", pkce.method().as_str());

	let code = prompt("Authorization code", "")?;

	if code.is_empty() {
		println!("No authorization code provided; skipping the exchange.");

		return Ok(());
	}

	let request = TokenRequest::authorization_code(code, &redirect_uri)
		.with_client_id(client_id.clone())
		.with_code_verifier(pkce.verifier());
	let credentials = ClientCredentials::new(client_id, client_secret);
	let redeemer = TokenRedeemer::new()?;

	match redeemer.redeem_with_configuration(request, &credentials, &source).await {
		Ok(response) => {
			println!("Token type: {:?}", response.token_type());
			println!("Expires in: {:?}", response.expires_in());
			println!("ID token present: {}", response.id_token().is_some());
		},
		Err(Error::Provider(err)) => {
			println!("Provider rejected the code ({:?}): {err}", err.kind);
		},
		Err(err) => return Err(err.into()),
	}

	Ok(())
}

fn prompt(message: &str, default: &str) -> Result<String> {
	if default.is_empty() {
		print!("{message}: ");
	} else {
		print!("{message} [{default}]: ");
	}

	io::stdout().flush()?;

	let mut input = String::new();

	io::stdin().read_line(&mut input)?;

	let trimmed = input.trim();

	if trimmed.is_empty() { Ok(default.to_owned()) } else { Ok(trimmed.to_owned()) }
}
