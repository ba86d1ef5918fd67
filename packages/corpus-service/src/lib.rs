pub mod classify;
pub mod cleanup;
pub mod ingest;
pub mod inject;
pub mod retrieve;
pub mod sections;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

pub use classify::Classification;
pub use cleanup::{CleanupReport, CleanupScope};
use corpus_chunking::TokenCodec;
use corpus_config::{
	BlobStoreConfig, Config, EmbeddingProviderConfig, LlmProviderConfig, ParserProviderConfig,
};
use corpus_domain::{PageUnit, VectorFilter, VectorMatch, VectorRecord};
use corpus_providers::{blob, embedding, extractor, parser};
use corpus_storage::{
	db::Db,
	metadata,
	models::{Attachment, ChunkRow, ProcessingStatusRow},
	qdrant::QdrantStore,
};
pub use error::{Error, Result};
pub use ingest::{IngestReport, IngestRequest};
pub use inject::{InjectRequest, InjectResponse};
pub use retrieve::{RetrieveRequest, RetrieveResponse, RetrievedChunk};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait ExtractorProvider
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>>;
}

pub trait DocumentParser
where
	Self: Send + Sync,
{
	fn partition<'a>(
		&'a self,
		cfg: &'a ParserProviderConfig,
		file_name: &'a str,
		bytes: Vec<u8>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PageUnit>>>;
}

pub trait BlobStore
where
	Self: Send + Sync,
{
	fn download<'a>(
		&'a self,
		cfg: &'a BlobStoreConfig,
		storage_path: &'a str,
		is_temp: bool,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>>;

	fn remove<'a>(
		&'a self,
		cfg: &'a BlobStoreConfig,
		storage_path: &'a str,
		is_temp: bool,
	) -> BoxFuture<'a, color_eyre::Result<()>>;
}

pub trait MetadataStore
where
	Self: Send + Sync,
{
	fn upsert_attachment<'a>(
		&'a self,
		attachment: &'a Attachment,
	) -> BoxFuture<'a, corpus_storage::Result<()>>;

	fn get_attachment<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<Option<Attachment>>>;

	fn delete_attachment<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<()>>;

	fn list_expired_temp<'a>(
		&'a self,
		owner_id: Option<&'a str>,
		cutoff: OffsetDateTime,
	) -> BoxFuture<'a, corpus_storage::Result<Vec<Attachment>>>;

	fn upsert_status<'a>(
		&'a self,
		attachment_id: Uuid,
		status: &'a str,
		error_message: Option<&'a str>,
		now: OffsetDateTime,
	) -> BoxFuture<'a, corpus_storage::Result<()>>;

	fn get_status<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<Option<ProcessingStatusRow>>>;

	fn delete_status<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<()>>;

	fn upsert_chunk<'a>(&'a self, chunk: &'a ChunkRow) -> BoxFuture<'a, corpus_storage::Result<()>>;

	fn list_chunk_ids<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<Vec<String>>>;

	fn fetch_chunks_by_ids<'a>(
		&'a self,
		chunk_ids: &'a [String],
	) -> BoxFuture<'a, corpus_storage::Result<Vec<ChunkRow>>>;

	fn delete_chunks<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<()>>;

	fn delete_orphans<'a>(&'a self) -> BoxFuture<'a, corpus_storage::Result<(u64, u64)>>;
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn ensure_collection<'a>(&'a self) -> BoxFuture<'a, corpus_storage::Result<()>>;

	fn upsert<'a>(
		&'a self,
		namespace: &'a str,
		records: &'a [VectorRecord],
	) -> BoxFuture<'a, corpus_storage::Result<()>>;

	fn query<'a>(
		&'a self,
		namespace: &'a str,
		vector: &'a [f32],
		filter: &'a VectorFilter,
		top_k: u64,
	) -> BoxFuture<'a, corpus_storage::Result<Vec<VectorMatch>>>;

	fn delete<'a>(&'a self, chunk_ids: &'a [String]) -> BoxFuture<'a, corpus_storage::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub extractor: Arc<dyn ExtractorProvider>,
	pub parser: Arc<dyn DocumentParser>,
	pub blob: Arc<dyn BlobStore>,
}

#[derive(Clone)]
pub struct Stores {
	pub metadata: Arc<dyn MetadataStore>,
	pub vectors: Arc<dyn VectorIndex>,
}

pub struct RagService {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
	pub codec: Arc<dyn TokenCodec>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl ExtractorProvider for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(extractor::complete(cfg, messages))
	}
}

impl DocumentParser for DefaultProviders {
	fn partition<'a>(
		&'a self,
		cfg: &'a ParserProviderConfig,
		file_name: &'a str,
		bytes: Vec<u8>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PageUnit>>> {
		Box::pin(parser::partition(cfg, file_name, bytes))
	}
}

impl BlobStore for DefaultProviders {
	fn download<'a>(
		&'a self,
		cfg: &'a BlobStoreConfig,
		storage_path: &'a str,
		is_temp: bool,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>> {
		Box::pin(blob::download(cfg, storage_path, is_temp))
	}

	fn remove<'a>(
		&'a self,
		cfg: &'a BlobStoreConfig,
		storage_path: &'a str,
		is_temp: bool,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(blob::remove(cfg, storage_path, is_temp))
	}
}

pub struct PgMetadataStore {
	pub pool: sqlx::PgPool,
}
impl MetadataStore for PgMetadataStore {
	fn upsert_attachment<'a>(
		&'a self,
		attachment: &'a Attachment,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(metadata::upsert_attachment(&self.pool, attachment))
	}

	fn get_attachment<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<Option<Attachment>>> {
		Box::pin(metadata::get_attachment(&self.pool, attachment_id))
	}

	fn delete_attachment<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(metadata::delete_attachment(&self.pool, attachment_id))
	}

	fn list_expired_temp<'a>(
		&'a self,
		owner_id: Option<&'a str>,
		cutoff: OffsetDateTime,
	) -> BoxFuture<'a, corpus_storage::Result<Vec<Attachment>>> {
		Box::pin(metadata::list_expired_temp(&self.pool, owner_id, cutoff))
	}

	fn upsert_status<'a>(
		&'a self,
		attachment_id: Uuid,
		status: &'a str,
		error_message: Option<&'a str>,
		now: OffsetDateTime,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(metadata::upsert_status(&self.pool, attachment_id, status, error_message, now))
	}

	fn get_status<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<Option<ProcessingStatusRow>>> {
		Box::pin(metadata::get_status(&self.pool, attachment_id))
	}

	fn delete_status<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(metadata::delete_status(&self.pool, attachment_id))
	}

	fn upsert_chunk<'a>(&'a self, chunk: &'a ChunkRow) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(metadata::upsert_chunk(&self.pool, chunk))
	}

	fn list_chunk_ids<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<Vec<String>>> {
		Box::pin(metadata::list_chunk_ids(&self.pool, attachment_id))
	}

	fn fetch_chunks_by_ids<'a>(
		&'a self,
		chunk_ids: &'a [String],
	) -> BoxFuture<'a, corpus_storage::Result<Vec<ChunkRow>>> {
		Box::pin(metadata::fetch_chunks_by_ids(&self.pool, chunk_ids))
	}

	fn delete_chunks<'a>(
		&'a self,
		attachment_id: Uuid,
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(metadata::delete_chunks(&self.pool, attachment_id))
	}

	fn delete_orphans<'a>(&'a self) -> BoxFuture<'a, corpus_storage::Result<(u64, u64)>> {
		Box::pin(metadata::delete_orphans(&self.pool))
	}
}

pub struct QdrantIndex {
	pub store: QdrantStore,
}
impl VectorIndex for QdrantIndex {
	fn ensure_collection<'a>(&'a self) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(self.store.ensure_collection())
	}

	fn upsert<'a>(
		&'a self,
		namespace: &'a str,
		records: &'a [VectorRecord],
	) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(self.store.upsert(namespace, records))
	}

	fn query<'a>(
		&'a self,
		namespace: &'a str,
		vector: &'a [f32],
		filter: &'a VectorFilter,
		top_k: u64,
	) -> BoxFuture<'a, corpus_storage::Result<Vec<VectorMatch>>> {
		Box::pin(self.store.query(namespace, vector, filter, top_k))
	}

	fn delete<'a>(&'a self, chunk_ids: &'a [String]) -> BoxFuture<'a, corpus_storage::Result<()>> {
		Box::pin(self.store.delete(chunk_ids))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		extractor: Arc<dyn ExtractorProvider>,
		parser: Arc<dyn DocumentParser>,
		blob: Arc<dyn BlobStore>,
	) -> Self {
		Self { embedding, extractor, parser, blob }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			embedding: provider.clone(),
			extractor: provider.clone(),
			parser: provider.clone(),
			blob: provider,
		}
	}
}

impl RagService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore, codec: Arc<dyn TokenCodec>) -> Self {
		let stores = Stores {
			metadata: Arc::new(PgMetadataStore { pool: db.pool }),
			vectors: Arc::new(QdrantIndex { store: qdrant }),
		};

		Self { cfg, stores, providers: Providers::default(), codec }
	}

	pub fn with_parts(
		cfg: Config,
		stores: Stores,
		providers: Providers,
		codec: Arc<dyn TokenCodec>,
	) -> Self {
		Self { cfg, stores, providers, codec }
	}
}
