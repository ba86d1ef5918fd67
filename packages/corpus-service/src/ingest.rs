use corpus_chunking::ChunkingConfig;
use corpus_domain::{
	Category, ChunkMeta, ProcessingState, SectionScan, VectorRecord, assign_pages, chunk_id,
	merge_adjacent, scan_sections,
};
use corpus_storage::models::{Attachment, ChunkRow};
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Error, RagService, Result, classify, sections};

// Vector upserts are capped per call so one large document cannot produce an
// oversized request.
pub(crate) const VECTOR_UPSERT_BATCH: usize = 50;

#[derive(Clone, Debug)]
pub struct IngestRequest {
	pub attachment_id: Uuid,
	pub owner_id: String,
	pub file_name: String,
	pub category: Category,
	pub storage_path: String,
}

#[derive(Clone, Debug)]
pub struct IngestReport {
	pub attachment_id: Uuid,
	pub chunks: usize,
}

impl RagService {
	/// Full ingestion of one attachment: download, partition, classify,
	/// extract sections, chunk, embed, and index. The processing status moves
	/// to `processing` first and ends at `ready` or `error`.
	pub async fn ingest_attachment(&self, req: &IngestRequest) -> Result<IngestReport> {
		let now = OffsetDateTime::now_utc();
		let attachment = Attachment {
			attachment_id: req.attachment_id,
			owner_id: req.owner_id.clone(),
			file_name: req.file_name.clone(),
			category: req.category.as_str().to_string(),
			is_temp: req.category.is_temp(),
			storage_path: req.storage_path.clone(),
			created_at: now,
		};

		self.stores.metadata.upsert_attachment(&attachment).await?;
		self.stores
			.metadata
			.upsert_status(req.attachment_id, ProcessingState::Processing.as_str(), None, now)
			.await?;

		match self.run_pipeline(req).await {
			Ok(report) => {
				self.stores
					.metadata
					.upsert_status(
						req.attachment_id,
						ProcessingState::Ready.as_str(),
						None,
						OffsetDateTime::now_utc(),
					)
					.await?;
				info!(
					attachment_id = %req.attachment_id,
					chunks = report.chunks,
					"Attachment ingested."
				);

				Ok(report)
			},
			Err(err) => {
				let message = err.to_string();

				if let Err(status_err) = self
					.stores
					.metadata
					.upsert_status(
						req.attachment_id,
						ProcessingState::Error.as_str(),
						Some(&message),
						OffsetDateTime::now_utc(),
					)
					.await
				{
					warn!(
						attachment_id = %req.attachment_id,
						error = %status_err,
						"Failed to record the error status."
					);
				}

				Err(err)
			},
		}
	}

	async fn run_pipeline(&self, req: &IngestRequest) -> Result<IngestReport> {
		let bytes = self
			.providers
			.blob
			.download(&self.cfg.providers.blob, &req.storage_path, req.category.is_temp())
			.await?;
		let units = self
			.providers
			.parser
			.partition(&self.cfg.providers.parser, &req.file_name, bytes)
			.await?;

		if units.is_empty() {
			return Err(Error::Provider { message: "Parser returned no text units.".to_string() });
		}

		let paged = assign_pages(&units);
		let sample = sample_text(&paged, self.cfg.ingestion.classify_sample_chars);
		let profile = classify::classify(
			&self.cfg.providers.llm,
			self.providers.extractor.as_ref(),
			&req.file_name,
			&sample,
		)
		.await;
		let merged = merge_adjacent(&paged);
		let chunk_cfg = ChunkingConfig {
			max_tokens: self.cfg.chunking.max_tokens,
			overlap_tokens: self.cfg.chunking.overlap_tokens,
		};
		let namespace = req.category.namespace(&req.owner_id);
		let created_at = OffsetDateTime::now_utc();
		let mut rows = Vec::new();
		let mut metas = Vec::new();
		let mut texts = Vec::new();
		let mut next_index = 0_i32;

		for (page, text) in &merged {
			// Headings are only recognizable in the unit text; each chunk then
			// keeps the identifiers its own window contains.
			let unit_scan =
				if profile.has_sections { scan_sections(text) } else { SectionScan::default() };

			for chunk in corpus_chunking::split_text(text, &chunk_cfg, self.codec.as_ref())? {
				let scan = if profile.has_sections {
					sections::extract_sections(
						&self.cfg.providers.llm,
						self.providers.extractor.as_ref(),
						profile.document_type,
						&unit_scan,
						&chunk.text,
					)
					.await
				} else {
					SectionScan::default()
				};

				rows.push(ChunkRow {
					chunk_id: chunk_id(req.attachment_id, next_index),
					attachment_id: req.attachment_id,
					chunk_index: next_index,
					page: *page,
					content: chunk.text.clone(),
					main_sections: scan.main_sections.clone(),
					reference_sections: scan.reference_sections.clone(),
					created_at,
				});
				metas.push(ChunkMeta {
					attachment_id: req.attachment_id,
					file_name: req.file_name.clone(),
					page: *page,
					chunk_index: next_index,
					document_type: profile.document_type,
					main_sections: scan.main_sections,
					reference_sections: scan.reference_sections,
					category: req.category,
				});
				texts.push(chunk.text);

				next_index += 1;
			}
		}

		if texts.is_empty() {
			return Err(Error::Provider { message: "Document produced no chunks.".to_string() });
		}

		let vectors =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;

		if vectors.len() != texts.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding count mismatch: {} texts, {} vectors.",
					texts.len(),
					vectors.len()
				),
			});
		}

		for row in &rows {
			self.stores.metadata.upsert_chunk(row).await?;
		}

		let records = rows
			.iter()
			.zip(metas)
			.zip(vectors)
			.map(|((row, meta), vector)| VectorRecord {
				chunk_id: row.chunk_id.clone(),
				vector,
				meta,
			})
			.collect::<Vec<_>>();

		for batch in records.chunks(VECTOR_UPSERT_BATCH) {
			self.stores.vectors.upsert(&namespace, batch).await?;
		}

		Ok(IngestReport { attachment_id: req.attachment_id, chunks: rows.len() })
	}
}

/// Leading sample of the parsed text used for classification, truncated on a
/// character boundary.
fn sample_text(paged: &[(i32, String)], max_chars: usize) -> String {
	let mut out = String::new();

	for (_, text) in paged {
		if !out.is_empty() {
			out.push('\n');
		}

		out.push_str(text);

		if out.chars().count() >= max_chars {
			break;
		}
	}

	out.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sample_truncates_on_char_boundary() {
		let paged = vec![(1, "héllo wörld".to_string()), (2, "more".to_string())];
		let sample = sample_text(&paged, 7);

		assert_eq!(sample, "héllo w");
	}

	#[test]
	fn sample_joins_pages_until_budget() {
		let paged = vec![(1, "ab".to_string()), (2, "cd".to_string()), (3, "ef".to_string())];

		assert_eq!(sample_text(&paged, 100), "ab\ncd\nef");
	}
}
