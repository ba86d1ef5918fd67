use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Attachment {
	pub attachment_id: Uuid,
	pub owner_id: String,
	pub file_name: String,
	pub category: String,
	pub is_temp: bool,
	pub storage_path: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ProcessingStatusRow {
	pub attachment_id: Uuid,
	pub status: String,
	pub error_message: Option<String>,
	pub last_updated: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ChunkRow {
	pub chunk_id: String,
	pub attachment_id: Uuid,
	pub chunk_index: i32,
	pub page: i32,
	pub content: String,
	pub main_sections: Vec<String>,
	pub reference_sections: Vec<String>,
	pub created_at: OffsetDateTime,
}
