use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, DocumentType};

/// Denormalized chunk metadata mirrored into the vector index payload so the
/// index can filter without touching the relational store.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ChunkMeta {
	pub attachment_id: Uuid,
	pub file_name: String,
	pub page: i32,
	pub chunk_index: i32,
	pub document_type: DocumentType,
	pub main_sections: Vec<String>,
	pub reference_sections: Vec<String>,
	pub category: Category,
}

/// One record to upsert: the string chunk id, its embedding, and the
/// payload metadata.
#[derive(Clone, Debug)]
pub struct VectorRecord {
	pub chunk_id: String,
	pub vector: Vec<f32>,
	pub meta: ChunkMeta,
}

/// Closed filter vocabulary for similarity queries. The category is always
/// present; the attachment restriction only exists for the personal_temp
/// tier.
#[derive(Clone, Debug)]
pub struct VectorFilter {
	pub category: Category,
	pub attachment_ids: Option<Vec<Uuid>>,
}
impl VectorFilter {
	pub fn category(category: Category) -> Self {
		Self { category, attachment_ids: None }
	}

	pub fn matches(&self, meta: &ChunkMeta) -> bool {
		if meta.category != self.category {
			return false;
		}

		match &self.attachment_ids {
			Some(ids) => ids.contains(&meta.attachment_id),
			None => true,
		}
	}
}

/// One ranked similarity match.
#[derive(Clone, Debug)]
pub struct VectorMatch {
	pub chunk_id: String,
	pub score: f32,
	pub meta: ChunkMeta,
}
