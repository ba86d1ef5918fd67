use std::{
	collections::HashMap,
	sync::{
		Mutex,
		atomic::{AtomicBool, Ordering},
	},
};

use corpus_domain::{ChunkMeta, VectorFilter, VectorMatch, VectorRecord};
use corpus_service::{BoxFuture, MetadataStore, VectorIndex};
use corpus_storage::models::{Attachment, ChunkRow, ProcessingStatusRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Default)]
struct MetadataState {
	attachments: HashMap<Uuid, Attachment>,
	statuses: HashMap<Uuid, ProcessingStatusRow>,
	chunks: HashMap<String, ChunkRow>,
}

/// Relational store double with the same keyed-upsert semantics as the
/// Postgres implementation.
pub struct InMemoryMetadata {
	state: Mutex<MetadataState>,
}
impl InMemoryMetadata {
	pub fn new() -> Self {
		Self { state: Mutex::new(MetadataState::default()) }
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, MetadataState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	/// Inserts an attachment row as-is, including its `created_at`.
	pub fn seed_attachment(&self, attachment: Attachment) {
		self.lock().attachments.insert(attachment.attachment_id, attachment);
	}

	pub fn attachment(&self, attachment_id: Uuid) -> Option<Attachment> {
		self.lock().attachments.get(&attachment_id).cloned()
	}

	pub fn status(&self, attachment_id: Uuid) -> Option<ProcessingStatusRow> {
		self.lock().statuses.get(&attachment_id).cloned()
	}

	pub fn chunk_count(&self, attachment_id: Uuid) -> usize {
		self.lock().chunks.values().filter(|row| row.attachment_id == attachment_id).count()
	}

	pub fn chunk(&self, chunk_id: &str) -> Option<ChunkRow> {
		self.lock().chunks.get(chunk_id).cloned()
	}

	pub fn remove_chunk(&self, chunk_id: &str) {
		self.lock().chunks.remove(chunk_id);
	}
}
impl Default for InMemoryMetadata {
	fn default() -> Self {
		Self::new()
	}
}
impl MetadataStore for InMemoryMetadata {
	fn upsert_attachment<'a>(
		&'a self,
		attachment: &'a Attachment,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		let mut state = self.lock();
		let mut row = attachment.clone();

		// The keyed upsert never rewrites created_at.
		if let Some(existing) = state.attachments.get(&attachment.attachment_id) {
			row.created_at = existing.created_at;
		}

		state.attachments.insert(row.attachment_id, row);

		Box::pin(async { Ok(()) })
	}

	fn get_attachment<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<Option<Attachment>>> {
		let row = self.lock().attachments.get(&attachment_id).cloned();

		Box::pin(async move { Ok(row) })
	}

	fn delete_attachment<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		self.lock().attachments.remove(&attachment_id);

		Box::pin(async { Ok(()) })
	}

	fn list_expired_temp<'a>(
		&'a self,
		owner_id: Option<&'a str>,
		cutoff: OffsetDateTime,
	) -> BoxFuture<'a, corpus_storage::Result<Vec<Attachment>>> {
		let mut rows = self
			.lock()
			.attachments
			.values()
			.filter(|row| {
				row.is_temp
					&& row.created_at <= cutoff
					&& owner_id.is_none_or(|owner| row.owner_id == owner)
			})
			.cloned()
			.collect::<Vec<_>>();

		rows.sort_by_key(|row| row.created_at);

		Box::pin(async move { Ok(rows) })
	}

	fn upsert_status<'a>(
		&'a self,
		attachment_id: Uuid,
		status: &'a str,
		error_message: Option<&'a str>,
		now: OffsetDateTime,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		self.lock().statuses.insert(attachment_id, ProcessingStatusRow {
			attachment_id,
			status: status.to_string(),
			error_message: error_message.map(str::to_string),
			last_updated: now,
		});

		Box::pin(async { Ok(()) })
	}

	fn get_status<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<Option<ProcessingStatusRow>>> {
		let row = self.lock().statuses.get(&attachment_id).cloned();

		Box::pin(async move { Ok(row) })
	}

	fn delete_status<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		self.lock().statuses.remove(&attachment_id);

		Box::pin(async { Ok(()) })
	}

	fn upsert_chunk<'a>(&'a self, chunk: &'a ChunkRow) -> BoxFuture<'a, corpus_storage::Result<()>> {
		let mut state = self.lock();
		let mut row = chunk.clone();

		if let Some(existing) = state.chunks.get(&chunk.chunk_id) {
			row.created_at = existing.created_at;
		}

		state.chunks.insert(row.chunk_id.clone(), row);

		Box::pin(async { Ok(()) })
	}

	fn list_chunk_ids<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<Vec<String>>> {
		let mut rows = self
			.lock()
			.chunks
			.values()
			.filter(|row| row.attachment_id == attachment_id)
			.map(|row| (row.chunk_index, row.chunk_id.clone()))
			.collect::<Vec<_>>();

		rows.sort_by_key(|(chunk_index, _)| *chunk_index);

		let ids = rows.into_iter().map(|(_, chunk_id)| chunk_id).collect();

		Box::pin(async move { Ok(ids) })
	}

	fn fetch_chunks_by_ids<'a>(
		&'a self,
		chunk_ids: &'a [String],
	) -> BoxFuture<'a, corpus_storage::Result<Vec<ChunkRow>>> {
		let state = self.lock();
		let rows = chunk_ids.iter().filter_map(|id| state.chunks.get(id).cloned()).collect();

		Box::pin(async move { Ok(rows) })
	}

	fn delete_chunks<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		self.lock().chunks.retain(|_, row| row.attachment_id != attachment_id);

		Box::pin(async { Ok(()) })
	}

	fn delete_orphans<'a>(&'a self) -> BoxFuture<'a, corpus_storage::Result<(u64, u64)>> {
		let mut state = self.lock();
		let live = state.attachments.keys().copied().collect::<Vec<_>>();
		let chunks_before = state.chunks.len();

		state.chunks.retain(|_, row| live.contains(&row.attachment_id));

		let statuses_before = state.statuses.len();

		state.statuses.retain(|attachment_id, _| live.contains(attachment_id));

		let removed = (
			(chunks_before - state.chunks.len()) as u64,
			(statuses_before - state.statuses.len()) as u64,
		);

		Box::pin(async move { Ok(removed) })
	}
}

/// Cosine-scoring vector index double keyed by namespace.
pub struct InMemoryVectors {
	state: Mutex<HashMap<String, HashMap<String, (Vec<f32>, ChunkMeta)>>>,
	fail_deletes: AtomicBool,
}
impl InMemoryVectors {
	pub fn new() -> Self {
		Self { state: Mutex::new(HashMap::new()), fail_deletes: AtomicBool::new(false) }
	}

	fn lock(
		&self,
	) -> std::sync::MutexGuard<'_, HashMap<String, HashMap<String, (Vec<f32>, ChunkMeta)>>> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	/// Makes every subsequent delete fail, for failure-path tests.
	pub fn set_fail_deletes(&self, fail: bool) {
		self.fail_deletes.store(fail, Ordering::SeqCst);
	}

	pub fn point_count(&self, namespace: &str) -> usize {
		self.lock().get(namespace).map_or(0, HashMap::len)
	}

	pub fn contains(&self, namespace: &str, chunk_id: &str) -> bool {
		self.lock().get(namespace).is_some_and(|points| points.contains_key(chunk_id))
	}

	pub fn meta(&self, namespace: &str, chunk_id: &str) -> Option<ChunkMeta> {
		self.lock().get(namespace)?.get(chunk_id).map(|(_, meta)| meta.clone())
	}
}
impl Default for InMemoryVectors {
	fn default() -> Self {
		Self::new()
	}
}
impl VectorIndex for InMemoryVectors {
	fn ensure_collection<'a>(&'a self) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(async { Ok(()) })
	}

	fn upsert<'a>(
		&'a self,
		namespace: &'a str,
		records: &'a [VectorRecord],
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		let mut state = self.lock();
		let points = state.entry(namespace.to_string()).or_default();

		for record in records {
			points.insert(record.chunk_id.clone(), (record.vector.clone(), record.meta.clone()));
		}

		Box::pin(async { Ok(()) })
	}

	fn query<'a>(
		&'a self,
		namespace: &'a str,
		vector: &'a [f32],
		filter: &'a VectorFilter,
		top_k: u64,
	) -> BoxFuture<'a, corpus_storage::Result<Vec<VectorMatch>>> {
		let state = self.lock();
		let mut hits = state
			.get(namespace)
			.into_iter()
			.flatten()
			.filter(|(_, (_, meta))| filter.matches(meta))
			.map(|(chunk_id, (stored, meta))| VectorMatch {
				chunk_id: chunk_id.clone(),
				score: cosine(vector, stored),
				meta: meta.clone(),
			})
			.collect::<Vec<_>>();

		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(top_k as usize);

		Box::pin(async move { Ok(hits) })
	}

	fn delete<'a>(&'a self, chunk_ids: &'a [String]) -> BoxFuture<'a, corpus_storage::Result<()>> {
		if self.fail_deletes.load(Ordering::SeqCst) {
			return Box::pin(async {
				Err(corpus_storage::Error::InvalidArgument(
					"Simulated vector deletion failure.".to_string(),
				))
			});
		}

		let mut state = self.lock();

		for points in state.values_mut() {
			for chunk_id in chunk_ids {
				points.remove(chunk_id);
			}
		}

		Box::pin(async { Ok(()) })
	}
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 { 0.0 } else { dot / (norm_a * norm_b) }
}
