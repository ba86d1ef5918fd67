pub mod blob;
pub mod embedding;
pub mod extractor;
pub mod parser;

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};

/// HTTP client with the request timeout, bearer token, and any
/// provider-specific extra headers baked in as defaults, so call sites only
/// describe the request itself.
pub(crate) fn client(
	timeout_ms: u64,
	api_key: &str,
	default_headers: &Map<String, Value>,
) -> Result<Client> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {api_key}"))?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header values must be strings."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, HeaderValue::from_str(raw)?);
	}

	Ok(Client::builder()
		.timeout(Duration::from_millis(timeout_ms))
		.default_headers(headers)
		.build()?)
}
