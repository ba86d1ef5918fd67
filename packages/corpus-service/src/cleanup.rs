use corpus_domain::ProcessingState;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::{RagService, Result};

#[derive(Clone, Debug)]
pub enum CleanupScope {
	Owner(String),
	AllOwners,
}

#[derive(Clone, Debug, Default)]
pub struct CleanupReport {
	pub scanned: usize,
	pub purged: usize,
	pub skipped_processing: usize,
	pub vector_failures: usize,
	pub blob_failures: usize,
}

impl RagService {
	/// Purges temporary attachments older than the configured TTL: vectors,
	/// blob, and relational rows. An attachment still in `processing` is left
	/// for a later run. Vector and blob failures are logged and counted but
	/// never block the relational deletes.
	pub async fn cleanup_expired(&self, scope: &CleanupScope) -> Result<CleanupReport> {
		let cutoff = OffsetDateTime::now_utc() - Duration::days(self.cfg.lifecycle.temp_ttl_days);
		let owner = match scope {
			CleanupScope::Owner(owner) => Some(owner.as_str()),
			CleanupScope::AllOwners => None,
		};
		let expired = self.stores.metadata.list_expired_temp(owner, cutoff).await?;
		let mut report = CleanupReport { scanned: expired.len(), ..Default::default() };

		for attachment in expired {
			let status = self.stores.metadata.get_status(attachment.attachment_id).await?;

			if status.as_ref().and_then(|row| ProcessingState::parse(&row.status))
				== Some(ProcessingState::Processing)
			{
				info!(
					attachment_id = %attachment.attachment_id,
					"Skipping expired attachment that is still processing."
				);

				report.skipped_processing += 1;

				continue;
			}

			let chunk_ids = self.stores.metadata.list_chunk_ids(attachment.attachment_id).await?;

			if let Err(err) = self.stores.vectors.delete(&chunk_ids).await {
				warn!(
					attachment_id = %attachment.attachment_id,
					error = %err,
					"Vector deletion failed; relational rows are still removed."
				);

				report.vector_failures += 1;
			}
			if let Err(err) = self
				.providers
				.blob
				.remove(&self.cfg.providers.blob, &attachment.storage_path, attachment.is_temp)
				.await
			{
				warn!(
					attachment_id = %attachment.attachment_id,
					error = %err,
					"Blob removal failed; relational rows are still removed."
				);

				report.blob_failures += 1;
			}

			self.stores.metadata.delete_chunks(attachment.attachment_id).await?;
			self.stores.metadata.delete_status(attachment.attachment_id).await?;
			self.stores.metadata.delete_attachment(attachment.attachment_id).await?;

			report.purged += 1;
		}

		info!(
			scanned = report.scanned,
			purged = report.purged,
			skipped = report.skipped_processing,
			"Expired temporary attachments cleaned up."
		);

		Ok(report)
	}

	/// Removes chunk and status rows whose attachment row no longer exists.
	pub async fn reconcile_orphans(&self) -> Result<(u64, u64)> {
		let (chunks, statuses) = self.stores.metadata.delete_orphans().await?;

		if chunks > 0 || statuses > 0 {
			info!(chunks, statuses, "Removed orphaned rows.");
		}

		Ok((chunks, statuses))
	}
}
