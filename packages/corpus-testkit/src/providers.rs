use std::{
	collections::{HashMap, VecDeque},
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use color_eyre::eyre;
use corpus_config::{
	BlobStoreConfig, EmbeddingProviderConfig, LlmProviderConfig, ParserProviderConfig,
};
use corpus_domain::PageUnit;
use corpus_service::{BlobStore, BoxFuture, DocumentParser, EmbeddingProvider, ExtractorProvider};
use serde_json::Value;

/// Byte-histogram embedder: identical texts embed identically, so cosine
/// ranking in tests is predictable without a model.
pub struct DeterministicEmbedder {
	dims: usize,
}
impl DeterministicEmbedder {
	pub fn new(dims: usize) -> Self {
		Self { dims }
	}

	pub fn vector(&self, text: &str) -> Vec<f32> {
		let mut out = vec![0.0_f32; self.dims];

		for byte in text.bytes() {
			out[byte as usize % self.dims] += 1.0;
		}

		let norm = out.iter().map(|x| x * x).sum::<f32>().sqrt();

		if norm > 0.0 {
			for value in &mut out {
				*value /= norm;
			}
		}

		out
	}
}
impl EmbeddingProvider for DeterministicEmbedder {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		let vectors = texts.iter().map(|text| self.vector(text)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Returns one vector fewer than requested, to exercise the count-mismatch
/// guard.
pub struct ShortEmbedder {
	inner: DeterministicEmbedder,
}
impl ShortEmbedder {
	pub fn new(dims: usize) -> Self {
		Self { inner: DeterministicEmbedder::new(dims) }
	}
}
impl EmbeddingProvider for ShortEmbedder {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		let mut vectors = texts.iter().map(|text| self.inner.vector(text)).collect::<Vec<_>>();

		vectors.pop();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Replays queued JSON responses in call order; an exhausted script fails the
/// call.
pub struct ScriptedExtractor {
	responses: Mutex<VecDeque<Value>>,
	calls: AtomicUsize,
}
impl ScriptedExtractor {
	pub fn new(responses: Vec<Value>) -> Self {
		Self { responses: Mutex::new(responses.into()), calls: AtomicUsize::new(0) }
	}

	pub fn push(&self, response: Value) {
		self.responses.lock().unwrap_or_else(|err| err.into_inner()).push_back(response);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl ExtractorProvider for ScriptedExtractor {
	fn extract<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let next = self.responses.lock().unwrap_or_else(|err| err.into_inner()).pop_front();

		Box::pin(async move { next.ok_or_else(|| eyre::eyre!("Extractor script exhausted.")) })
	}
}

/// Fails every call, for provider-outage paths.
pub struct FailingExtractor;
impl ExtractorProvider for FailingExtractor {
	fn extract<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(async { Err(eyre::eyre!("Extractor endpoint unavailable.")) })
	}
}

/// Serves a fixed unit list and counts calls, doubling as a parse spy.
pub struct StaticParser {
	units: Mutex<Vec<PageUnit>>,
	calls: AtomicUsize,
}
impl StaticParser {
	pub fn new(units: Vec<PageUnit>) -> Self {
		Self { units: Mutex::new(units), calls: AtomicUsize::new(0) }
	}

	pub fn set_units(&self, units: Vec<PageUnit>) {
		*self.units.lock().unwrap_or_else(|err| err.into_inner()) = units;
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl DocumentParser for StaticParser {
	fn partition<'a>(
		&'a self,
		_cfg: &'a ParserProviderConfig,
		_file_name: &'a str,
		_bytes: Vec<u8>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PageUnit>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let units = self.units.lock().unwrap_or_else(|err| err.into_inner()).clone();

		Box::pin(async move { Ok(units) })
	}
}

/// Path-keyed blob double that records removals.
pub struct StaticBlob {
	objects: Mutex<HashMap<String, Vec<u8>>>,
	removed: Mutex<Vec<String>>,
}
impl StaticBlob {
	pub fn new() -> Self {
		Self { objects: Mutex::new(HashMap::new()), removed: Mutex::new(Vec::new()) }
	}

	pub fn insert(&self, storage_path: &str, bytes: Vec<u8>) {
		self.objects
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.insert(storage_path.to_string(), bytes);
	}

	pub fn removed(&self) -> Vec<String> {
		self.removed.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl Default for StaticBlob {
	fn default() -> Self {
		Self::new()
	}
}
impl BlobStore for StaticBlob {
	fn download<'a>(
		&'a self,
		_cfg: &'a BlobStoreConfig,
		storage_path: &'a str,
		_is_temp: bool,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>> {
		let bytes =
			self.objects.lock().unwrap_or_else(|err| err.into_inner()).get(storage_path).cloned();

		Box::pin(async move {
			bytes.ok_or_else(|| eyre::eyre!("No blob stored at {storage_path}."))
		})
	}

	fn remove<'a>(
		&'a self,
		_cfg: &'a BlobStoreConfig,
		storage_path: &'a str,
		_is_temp: bool,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		self.removed.lock().unwrap_or_else(|err| err.into_inner()).push(storage_path.to_string());
		self.objects.lock().unwrap_or_else(|err| err.into_inner()).remove(storage_path);

		Box::pin(async { Ok(()) })
	}
}
