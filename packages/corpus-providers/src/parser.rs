use color_eyre::{Result, eyre};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use corpus_domain::PageUnit;

/// Partitions a document into ordered text units via the external parsing
/// endpoint. Elements without text are dropped; page numbers are passed
/// through as reported.
pub async fn partition(
	cfg: &corpus_config::ParserProviderConfig,
	file_name: &str,
	bytes: Vec<u8>,
) -> Result<Vec<PageUnit>> {
	let client = crate::client(cfg.timeout_ms, &cfg.api_key, &cfg.default_headers)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let form = Form::new().part("files", Part::bytes(bytes).file_name(file_name.to_string()));
	let res = client.post(url).multipart(form).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_partition_response(json)
}

fn parse_partition_response(json: Value) -> Result<Vec<PageUnit>> {
	let elements = json
		.as_array()
		.ok_or_else(|| eyre::eyre!("Partition response is not an element array."))?;

	let mut units = Vec::with_capacity(elements.len());
	for element in elements {
		let Some(text) = element.get("text").and_then(|v| v.as_str()) else {
			continue;
		};

		if text.trim().is_empty() {
			continue;
		}

		let page = element
			.get("metadata")
			.and_then(|meta| meta.get("page_number"))
			.and_then(|v| v.as_i64())
			.map(|v| v as i32);

		units.push(PageUnit { page, text: text.to_string() });
	}

	Ok(units)
}
