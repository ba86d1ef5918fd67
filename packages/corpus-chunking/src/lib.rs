pub use tokenizers::Tokenizer;

pub type TokenizerError = tokenizers::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("chunking max_tokens must be greater than zero.")]
	ZeroMaxTokens,
	#[error("chunking overlap_tokens ({overlap_tokens}) must be less than max_tokens ({max_tokens}).")]
	OverlapTooLarge { max_tokens: u32, overlap_tokens: u32 },
	#[error("Tokenizer error: {0}")]
	Tokenizer(TokenizerError),
}
impl From<TokenizerError> for Error {
	fn from(err: TokenizerError) -> Self {
		Self::Tokenizer(err)
	}
}

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub max_tokens: u32,
	pub overlap_tokens: u32,
}
impl ChunkingConfig {
	/// The window advance in tokens. Guarded by [`validate`](Self::validate).
	pub fn stride(&self) -> usize {
		(self.max_tokens - self.overlap_tokens) as usize
	}

	pub fn validate(&self) -> Result<()> {
		if self.max_tokens == 0 {
			return Err(Error::ZeroMaxTokens);
		}
		if self.overlap_tokens >= self.max_tokens {
			return Err(Error::OverlapTooLarge {
				max_tokens: self.max_tokens,
				overlap_tokens: self.overlap_tokens,
			});
		}

		Ok(())
	}
}

#[derive(Clone, Debug)]
pub struct Chunk {
	pub chunk_index: i32,
	pub text: String,
}

/// Encode/decode seam over the tokenizer so chunking is testable without a
/// pretrained download.
pub trait TokenCodec
where
	Self: Send + Sync,
{
	fn encode_ids(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;
	fn decode_ids(&self, ids: &[u32]) -> Result<String, TokenizerError>;
}

impl TokenCodec for Tokenizer {
	fn encode_ids(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
		Ok(self.encode(text, false)?.get_ids().to_vec())
	}

	fn decode_ids(&self, ids: &[u32]) -> Result<String, TokenizerError> {
		self.decode(ids, true)
	}
}

pub fn load_tokenizer(repo: &str) -> Result<Tokenizer, TokenizerError> {
	Tokenizer::from_pretrained(repo, None)
}

/// Lazy, restartable sequence of overlapping token windows. Each call to
/// [`token_windows`] starts over from the first window.
pub struct TokenWindows<'a> {
	codec: &'a dyn TokenCodec,
	ids: Vec<u32>,
	size: usize,
	stride: usize,
	position: usize,
	chunk_index: i32,
}
impl Iterator for TokenWindows<'_> {
	type Item = Result<Chunk>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.position >= self.ids.len() {
			return None;
		}

		let end = (self.position + self.size).min(self.ids.len());
		let window = &self.ids[self.position..end];
		let chunk_index = self.chunk_index;

		self.position += self.stride;
		self.chunk_index += 1;

		match self.codec.decode_ids(window) {
			Ok(text) => Some(Ok(Chunk { chunk_index, text })),
			Err(err) => {
				tracing::error!(error = %err, chunk_index, "Tokenizer failed to decode a window.");

				Some(Err(err.into()))
			},
		}
	}
}

pub fn token_windows<'a>(
	text: &str,
	cfg: &ChunkingConfig,
	codec: &'a dyn TokenCodec,
) -> Result<TokenWindows<'a>> {
	cfg.validate()?;

	let ids = codec.encode_ids(text)?;

	Ok(TokenWindows {
		codec,
		ids,
		size: cfg.max_tokens as usize,
		stride: cfg.stride(),
		position: 0,
		chunk_index: 0,
	})
}

pub fn split_text(text: &str, cfg: &ChunkingConfig, codec: &dyn TokenCodec) -> Result<Vec<Chunk>> {
	token_windows(text, cfg, codec)?.collect()
}
