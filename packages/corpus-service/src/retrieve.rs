use std::collections::HashMap;

use corpus_domain::{Category, VectorFilter, VectorMatch};
use tracing::debug;
use uuid::Uuid;

use crate::{Error, RagService, Result};

#[derive(Clone, Debug)]
pub struct RetrieveRequest {
	pub owner_id: String,
	pub query: String,
	/// Temporary attachments the caller explicitly attached. The
	/// personal_temp tier is only searched when this is non-empty, and only
	/// within these attachments.
	pub attached_temp_ids: Vec<Uuid>,
}

#[derive(Clone, Debug)]
pub struct RetrievedChunk {
	pub chunk_id: String,
	pub attachment_id: Uuid,
	pub file_name: String,
	pub page: i32,
	pub chunk_index: i32,
	pub score: f32,
	pub content: String,
	pub category: Category,
}

#[derive(Clone, Debug)]
pub struct RetrieveResponse {
	pub chunks: Vec<RetrievedChunk>,
	pub excerpts: String,
}

impl RagService {
	/// Tiered similarity retrieval: personal permanent, attached temporary,
	/// then global, each capped at `top_k`. Chunk content comes from the
	/// relational store; a match whose row is gone is dropped.
	pub async fn retrieve(&self, req: &RetrieveRequest) -> Result<RetrieveResponse> {
		if req.query.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "Query must not be empty.".to_string() });
		}

		let embeddings = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &[req.query.clone()])
			.await?;
		let Some(vector) = embeddings.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};
		let top_k = self.cfg.retrieval.top_k as u64;
		let mut matches: Vec<VectorMatch> = Vec::new();

		for category in Category::retrieval_tiers() {
			if category == Category::PersonalTemp && req.attached_temp_ids.is_empty() {
				continue;
			}

			let namespace = category.namespace(&req.owner_id);
			let mut filter = VectorFilter::category(category);

			if category == Category::PersonalTemp {
				filter.attachment_ids = Some(req.attached_temp_ids.clone());
			}

			matches.extend(self.stores.vectors.query(&namespace, &vector, &filter, top_k).await?);
		}

		let ids = matches.iter().map(|hit| hit.chunk_id.clone()).collect::<Vec<_>>();
		let rows = self.stores.metadata.fetch_chunks_by_ids(&ids).await?;
		let by_id = rows.iter().map(|row| (row.chunk_id.as_str(), row)).collect::<HashMap<_, _>>();
		let mut chunks = Vec::with_capacity(matches.len());

		for hit in &matches {
			let Some(row) = by_id.get(hit.chunk_id.as_str()) else {
				debug!(chunk_id = %hit.chunk_id, "Dropping similarity match without a chunk row.");

				continue;
			};

			chunks.push(RetrievedChunk {
				chunk_id: row.chunk_id.clone(),
				attachment_id: row.attachment_id,
				file_name: hit.meta.file_name.clone(),
				page: row.page,
				chunk_index: row.chunk_index,
				score: hit.score,
				content: row.content.clone(),
				category: hit.meta.category,
			});
		}

		let excerpts = format_excerpts(&chunks);

		Ok(RetrieveResponse { chunks, excerpts })
	}
}

pub(crate) fn format_excerpts(chunks: &[RetrievedChunk]) -> String {
	chunks
		.iter()
		.map(|chunk| {
			format!(
				"[{} - page {}, chunk {}]\n{}",
				chunk.file_name, chunk.page, chunk.chunk_index, chunk.content
			)
		})
		.collect::<Vec<_>>()
		.join("\n\n")
}
