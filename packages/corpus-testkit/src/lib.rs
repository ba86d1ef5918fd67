//! In-memory doubles for the service seams, so pipeline behavior is testable
//! without Postgres, Qdrant, or any provider endpoint.

pub mod codec;
pub mod live;
pub mod providers;
pub mod stores;

use std::sync::Arc;

pub use codec::WordCodec;
use corpus_config::{
	BlobStoreConfig, Chunking, Config, EmbeddingProviderConfig, Ingestion, Lifecycle,
	LlmProviderConfig, ParserProviderConfig, Postgres, Providers, Qdrant, Retrieval, Storage,
};
use corpus_service::{Providers as ServiceProviders, RagService, Stores};
pub use providers::{
	DeterministicEmbedder, FailingExtractor, ScriptedExtractor, ShortEmbedder, StaticBlob,
	StaticParser,
};
use serde_json::Map;
pub use stores::{InMemoryMetadata, InMemoryVectors};

pub const TEST_VECTOR_DIM: u32 = 8;

/// A config wired to nothing. Provider endpoints are never dialed because the
/// fixture swaps every provider for an in-memory double.
pub fn test_config() -> Config {
	Config {
		storage: Storage {
			postgres: Postgres { dsn: "postgres://unused/corpus".into(), pool_max_conns: 1 },
			qdrant: Qdrant {
				url: "http://unused:6334".into(),
				collection: "corpus_test".into(),
				vector_dim: TEST_VECTOR_DIM,
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".into(),
				api_base: "http://unused".into(),
				api_key: "test-key".into(),
				path: "/v1/embeddings".into(),
				model: "test-embed".into(),
				dimensions: TEST_VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				provider_id: "test".into(),
				api_base: "http://unused".into(),
				api_key: "test-key".into(),
				path: "/v1/chat/completions".into(),
				model: "test-llm".into(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			parser: ParserProviderConfig {
				api_base: "http://unused".into(),
				api_key: "test-key".into(),
				path: "/general/v0/general".into(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			blob: BlobStoreConfig {
				api_base: "http://unused".into(),
				api_key: "test-key".into(),
				temp_bucket: "temp".into(),
				permanent_bucket: "perm".into(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		chunking: Chunking { max_tokens: 40, overlap_tokens: 8, tokenizer_repo: None },
		ingestion: Ingestion::default(),
		retrieval: Retrieval::default(),
		lifecycle: Lifecycle::default(),
	}
}

/// One in-memory double of every seam, pre-wired into a [`RagService`].
pub struct Fixture {
	pub metadata: Arc<InMemoryMetadata>,
	pub vectors: Arc<InMemoryVectors>,
	pub embedder: Arc<DeterministicEmbedder>,
	pub extractor: Arc<ScriptedExtractor>,
	pub parser: Arc<StaticParser>,
	pub blob: Arc<StaticBlob>,
}
impl Fixture {
	pub fn new() -> Self {
		Self {
			metadata: Arc::new(InMemoryMetadata::new()),
			vectors: Arc::new(InMemoryVectors::new()),
			embedder: Arc::new(DeterministicEmbedder::new(TEST_VECTOR_DIM as usize)),
			extractor: Arc::new(ScriptedExtractor::new(Vec::new())),
			parser: Arc::new(StaticParser::new(Vec::new())),
			blob: Arc::new(StaticBlob::new()),
		}
	}

	pub fn stores(&self) -> Stores {
		Stores { metadata: self.metadata.clone(), vectors: self.vectors.clone() }
	}

	pub fn providers(&self) -> ServiceProviders {
		ServiceProviders {
			embedding: self.embedder.clone(),
			extractor: self.extractor.clone(),
			parser: self.parser.clone(),
			blob: self.blob.clone(),
		}
	}

	pub fn service(&self) -> RagService {
		self.service_with(test_config(), self.providers())
	}

	pub fn service_with(&self, cfg: Config, providers: ServiceProviders) -> RagService {
		RagService::with_parts(cfg, self.stores(), providers, Arc::new(WordCodec::new()))
	}
}

impl Default for Fixture {
	fn default() -> Self {
		Self::new()
	}
}
