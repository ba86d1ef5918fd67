use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub chunking: Chunking,
	#[serde(default)]
	pub ingestion: Ingestion,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub lifecycle: Lifecycle,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
	pub parser: ParserProviderConfig,
	pub blob: BlobStoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ParserProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct BlobStoreConfig {
	pub api_base: String,
	pub api_key: String,
	pub temp_bucket: String,
	pub permanent_bucket: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Chunking {
	pub max_tokens: u32,
	pub overlap_tokens: u32,
	pub tokenizer_repo: Option<String>,
}
impl Default for Chunking {
	fn default() -> Self {
		Self { max_tokens: 1_500, overlap_tokens: 250, tokenizer_repo: None }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ingestion {
	pub classify_sample_chars: usize,
}
impl Default for Ingestion {
	fn default() -> Self {
		Self { classify_sample_chars: 2_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { top_k: 8 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Lifecycle {
	pub temp_ttl_days: i64,
}
impl Default for Lifecycle {
	fn default() -> Self {
		Self { temp_ttl_days: 7 }
	}
}
