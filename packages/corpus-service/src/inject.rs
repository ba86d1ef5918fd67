use corpus_domain::{Category, ProcessingState};
use tracing::warn;
use uuid::Uuid;

use crate::{IngestRequest, RagService, Result, RetrieveRequest};

pub const EXCERPTS_HEADER: &str = "Relevant Document Excerpts";

#[derive(Clone, Debug)]
pub struct InjectRequest {
	pub owner_id: String,
	pub system_prompt: String,
	pub query: String,
	pub attached_temp_ids: Vec<Uuid>,
}

#[derive(Clone, Debug)]
pub struct InjectResponse {
	pub system_prompt: String,
	pub query: String,
}

impl RagService {
	/// Chat entry point: lazily ingests any attached document that has not
	/// reached `ready`, retrieves context, and appends the excerpt block to
	/// the system prompt. The user query passes through unchanged.
	pub async fn inject(&self, req: &InjectRequest) -> Result<InjectResponse> {
		for attachment_id in &req.attached_temp_ids {
			let status = self.stores.metadata.get_status(*attachment_id).await?;
			let state = status.as_ref().and_then(|row| ProcessingState::parse(&row.status));

			if !ProcessingState::needs_ingestion(state) {
				continue;
			}

			let Some(attachment) = self.stores.metadata.get_attachment(*attachment_id).await?
			else {
				warn!(
					attachment_id = %attachment_id,
					"Attached document has no attachment row; skipping."
				);

				continue;
			};
			let Some(category) = Category::parse(&attachment.category) else {
				warn!(
					attachment_id = %attachment_id,
					category = %attachment.category,
					"Attachment carries an unknown category; skipping."
				);

				continue;
			};
			let ingest = IngestRequest {
				attachment_id: *attachment_id,
				owner_id: attachment.owner_id.clone(),
				file_name: attachment.file_name.clone(),
				category,
				storage_path: attachment.storage_path.clone(),
			};

			if let Err(err) = self.ingest_attachment(&ingest).await {
				warn!(
					attachment_id = %attachment_id,
					error = %err,
					"On-demand ingestion failed; retrieval continues without it."
				);
			}
		}

		let retrieved = self
			.retrieve(&RetrieveRequest {
				owner_id: req.owner_id.clone(),
				query: req.query.clone(),
				attached_temp_ids: req.attached_temp_ids.clone(),
			})
			.await?;
		let system_prompt = if retrieved.chunks.is_empty() {
			req.system_prompt.clone()
		} else {
			format!("{}\n\n{EXCERPTS_HEADER}\n{}", req.system_prompt, retrieved.excerpts)
		};

		Ok(InjectResponse { system_prompt, query: req.query.clone() })
	}
}
