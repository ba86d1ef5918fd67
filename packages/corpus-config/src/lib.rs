mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	BlobStoreConfig, Chunking, Config, EmbeddingProviderConfig, Ingestion, Lifecycle,
	LlmProviderConfig, ParserProviderConfig, Postgres, Providers, Qdrant, Retrieval, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation { message: "storage.qdrant.url must be non-empty.".to_string() });
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.chunking.max_tokens == 0 {
		return Err(Error::Validation {
			message: "chunking.max_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.overlap_tokens >= cfg.chunking.max_tokens {
		return Err(Error::Validation {
			message: "chunking.overlap_tokens must be less than chunking.max_tokens.".to_string(),
		});
	}
	if cfg.ingestion.classify_sample_chars == 0 {
		return Err(Error::Validation {
			message: "ingestion.classify_sample_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.lifecycle.temp_ttl_days <= 0 {
		return Err(Error::Validation {
			message: "lifecycle.temp_ttl_days must be greater than zero.".to_string(),
		});
	}

	for (label, bucket) in [
		("temp_bucket", &cfg.providers.blob.temp_bucket),
		("permanent_bucket", &cfg.providers.blob.permanent_bucket),
	] {
		if bucket.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.blob.{label} must be non-empty."),
			});
		}
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
		("parser", &cfg.providers.parser.api_key),
		("blob", &cfg.providers.blob.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.chunking.tokenizer_repo.as_deref().map(|repo| repo.trim().is_empty()).unwrap_or(false) {
		cfg.chunking.tokenizer_repo = None;
	}
}
