use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{Attachment, ChunkRow, ProcessingStatusRow},
};

pub async fn upsert_attachment<'e, E>(executor: E, attachment: &Attachment) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO attachments (
\tattachment_id,
\towner_id,
\tfile_name,
\tcategory,
\tis_temp,
\tstorage_path,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7)
ON CONFLICT (attachment_id) DO UPDATE
SET
\towner_id = EXCLUDED.owner_id,
\tfile_name = EXCLUDED.file_name,
\tcategory = EXCLUDED.category,
\tis_temp = EXCLUDED.is_temp,
\tstorage_path = EXCLUDED.storage_path",
	)
	.bind(attachment.attachment_id)
	.bind(attachment.owner_id.as_str())
	.bind(attachment.file_name.as_str())
	.bind(attachment.category.as_str())
	.bind(attachment.is_temp)
	.bind(attachment.storage_path.as_str())
	.bind(attachment.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_attachment<'e, E>(executor: E, attachment_id: Uuid) -> Result<Option<Attachment>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Attachment>(
		"\
SELECT
\tattachment_id,
\towner_id,
\tfile_name,
\tcategory,
\tis_temp,
\tstorage_path,
\tcreated_at
FROM attachments
WHERE attachment_id = $1
LIMIT 1",
	)
	.bind(attachment_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn delete_attachment<'e, E>(executor: E, attachment_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM attachments WHERE attachment_id = $1")
		.bind(attachment_id)
		.execute(executor)
		.await?;

	Ok(())
}

/// Temporary attachments created at or before the cutoff, optionally limited
/// to one owner.
pub async fn list_expired_temp<'e, E>(
	executor: E,
	owner_id: Option<&str>,
	cutoff: OffsetDateTime,
) -> Result<Vec<Attachment>>
where
	E: PgExecutor<'e>,
{
	let rows = match owner_id {
		Some(owner_id) => {
			sqlx::query_as::<_, Attachment>(
				"\
SELECT
\tattachment_id,
\towner_id,
\tfile_name,
\tcategory,
\tis_temp,
\tstorage_path,
\tcreated_at
FROM attachments
WHERE owner_id = $1 AND is_temp AND created_at <= $2
ORDER BY created_at ASC",
			)
			.bind(owner_id)
			.bind(cutoff)
			.fetch_all(executor)
			.await?
		},
		None => {
			sqlx::query_as::<_, Attachment>(
				"\
SELECT
\tattachment_id,
\towner_id,
\tfile_name,
\tcategory,
\tis_temp,
\tstorage_path,
\tcreated_at
FROM attachments
WHERE is_temp AND created_at <= $1
ORDER BY created_at ASC",
			)
			.bind(cutoff)
			.fetch_all(executor)
			.await?
		},
	};

	Ok(rows)
}

pub async fn upsert_status<'e, E>(
	executor: E,
	attachment_id: Uuid,
	status: &str,
	error_message: Option<&str>,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO processing_status (attachment_id, status, error_message, last_updated)
VALUES ($1,$2,$3,$4)
ON CONFLICT (attachment_id) DO UPDATE
SET
\tstatus = EXCLUDED.status,
\terror_message = EXCLUDED.error_message,
\tlast_updated = EXCLUDED.last_updated",
	)
	.bind(attachment_id)
	.bind(status)
	.bind(error_message)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_status<'e, E>(
	executor: E,
	attachment_id: Uuid,
) -> Result<Option<ProcessingStatusRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ProcessingStatusRow>(
		"\
SELECT attachment_id, status, error_message, last_updated
FROM processing_status
WHERE attachment_id = $1
LIMIT 1",
	)
	.bind(attachment_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn delete_status<'e, E>(executor: E, attachment_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM processing_status WHERE attachment_id = $1")
		.bind(attachment_id)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn upsert_chunk<'e, E>(executor: E, chunk: &ChunkRow) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO chunks (
\tchunk_id,
\tattachment_id,
\tchunk_index,
\tpage,
\tcontent,
\tmain_sections,
\treference_sections,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
ON CONFLICT (chunk_id) DO UPDATE
SET
\tpage = EXCLUDED.page,
\tcontent = EXCLUDED.content,
\tmain_sections = EXCLUDED.main_sections,
\treference_sections = EXCLUDED.reference_sections",
	)
	.bind(chunk.chunk_id.as_str())
	.bind(chunk.attachment_id)
	.bind(chunk.chunk_index)
	.bind(chunk.page)
	.bind(chunk.content.as_str())
	.bind(&chunk.main_sections)
	.bind(&chunk.reference_sections)
	.bind(chunk.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn list_chunk_ids<'e, E>(executor: E, attachment_id: Uuid) -> Result<Vec<String>>
where
	E: PgExecutor<'e>,
{
	let ids = sqlx::query_scalar::<_, String>(
		"SELECT chunk_id FROM chunks WHERE attachment_id = $1 ORDER BY chunk_index ASC",
	)
	.bind(attachment_id)
	.fetch_all(executor)
	.await?;

	Ok(ids)
}

pub async fn count_chunks<'e, E>(executor: E, attachment_id: Uuid) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chunks WHERE attachment_id = $1")
		.bind(attachment_id)
		.fetch_one(executor)
		.await?;

	Ok(count)
}

pub async fn fetch_chunks_by_ids<'e, E>(executor: E, chunk_ids: &[String]) -> Result<Vec<ChunkRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ChunkRow>(
		"\
SELECT
\tchunk_id,
\tattachment_id,
\tchunk_index,
\tpage,
\tcontent,
\tmain_sections,
\treference_sections,
\tcreated_at
FROM chunks
WHERE chunk_id = ANY($1)",
	)
	.bind(chunk_ids)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn delete_chunks<'e, E>(executor: E, attachment_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM chunks WHERE attachment_id = $1")
		.bind(attachment_id)
		.execute(executor)
		.await?;

	Ok(())
}

/// Deletes chunk and status rows whose attachment row no longer exists.
/// Returns (orphaned chunks removed, orphaned status rows removed).
pub async fn delete_orphans<'e, E>(executor: E) -> Result<(u64, u64)>
where
	E: PgExecutor<'e> + Copy,
{
	let chunks = sqlx::query(
		"\
DELETE FROM chunks c
WHERE NOT EXISTS (
\tSELECT 1 FROM attachments a WHERE a.attachment_id = c.attachment_id
)",
	)
	.execute(executor)
	.await?
	.rows_affected();
	let statuses = sqlx::query(
		"\
DELETE FROM processing_status s
WHERE NOT EXISTS (
\tSELECT 1 FROM attachments a WHERE a.attachment_id = s.attachment_id
)",
	)
	.execute(executor)
	.await?
	.rows_affected();

	Ok((chunks, statuses))
}
