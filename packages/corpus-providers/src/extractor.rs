use color_eyre::{Result, eyre};
use serde_json::Value;

/// Structured-output completion. The endpoint is asked for a JSON object; the
/// choice content is parsed and re-requested up to three times when it is not
/// valid JSON.
pub async fn complete(cfg: &corpus_config::LlmProviderConfig, messages: &[Value]) -> Result<Value> {
	let client = crate::client(cfg.timeout_ms, &cfg.api_key, &cfg.default_headers)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);

	for _ in 0..3 {
		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"response_format": { "type": "json_object" },
			"messages": messages,
		});
		let res = client.post(&url).json(&body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;
		if let Ok(parsed) = parse_completion_json(json) {
			return Ok(parsed);
		}
	}

	Err(eyre::eyre!("Completion response is not valid JSON."))
}

fn parse_completion_json(json: Value) -> Result<Value> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		let parsed: Value = serde_json::from_str(content)
			.map_err(|_| eyre::eyre!("Completion content is not valid JSON."))?;

		return Ok(parsed);
	}

	if json.is_object() {
		return Ok(json);
	}

	Err(eyre::eyre!("Completion response is missing JSON content."))
}
