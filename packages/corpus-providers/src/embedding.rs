use color_eyre::{Result, eyre};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
	index: Option<usize>,
	embedding: Vec<f32>,
}

/// Batch embedding against an OpenAI-compatible `/embeddings` endpoint. The
/// contract is strictly 1:1 and order-preserving: exactly one vector per
/// input text, reordered by the response `index` field where the endpoint
/// supplies one.
pub async fn embed(
	cfg: &corpus_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = crate::client(cfg.timeout_ms, &cfg.api_key, &cfg.default_headers)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let response = client
		.post(url)
		.json(&body)
		.send()
		.await?
		.error_for_status()?
		.json::<EmbeddingResponse>()
		.await?;

	collect_vectors(response, texts.len())
}

fn collect_vectors(response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
	if response.data.len() != expected {
		return Err(eyre::eyre!(
			"Embedding endpoint returned {} vectors for {expected} texts.",
			response.data.len()
		));
	}

	let mut rows = response
		.data
		.into_iter()
		.enumerate()
		.map(|(position, row)| (row.index.unwrap_or(position), row.embedding))
		.collect::<Vec<_>>();

	rows.sort_by_key(|(index, _)| *index);

	Ok(rows.into_iter().map(|(_, embedding)| embedding).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn response(json: serde_json::Value) -> EmbeddingResponse {
		serde_json::from_value(json).expect("response should deserialize")
	}

	#[test]
	fn restores_input_order_from_the_index_field() {
		let response = response(serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		}));
		let vectors = collect_vectors(response, 2).expect("vectors should collect");

		assert_eq!(vectors, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
	}

	#[test]
	fn falls_back_to_positional_order_without_indices() {
		let response = response(serde_json::json!({
			"data": [
				{ "embedding": [1.0] },
				{ "embedding": [2.0] }
			]
		}));
		let vectors = collect_vectors(response, 2).expect("vectors should collect");

		assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
	}

	#[test]
	fn rejects_a_count_mismatch() {
		let response = response(serde_json::json!({
			"data": [ { "index": 0, "embedding": [1.0] } ]
		}));

		assert!(collect_vectors(response, 2).is_err());
	}

	#[test]
	fn rejects_non_numeric_embedding_values() {
		let raw = serde_json::json!({
			"data": [ { "index": 0, "embedding": [1.0, "oops"] } ]
		});

		assert!(serde_json::from_value::<EmbeddingResponse>(raw).is_err());
	}
}
