use std::sync::Mutex;

use corpus_chunking::{TokenCodec, TokenizerError};

/// Whitespace token codec: each word is one token, ids index a vocabulary
/// built on first sight. Lossless at the token level, with no pretrained
/// download.
pub struct WordCodec {
	vocab: Mutex<Vec<String>>,
}
impl WordCodec {
	pub fn new() -> Self {
		Self { vocab: Mutex::new(Vec::new()) }
	}
}
impl Default for WordCodec {
	fn default() -> Self {
		Self::new()
	}
}
impl TokenCodec for WordCodec {
	fn encode_ids(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
		let mut vocab = self.vocab.lock().unwrap_or_else(|err| err.into_inner());

		Ok(text
			.split_whitespace()
			.map(|word| {
				if let Some(id) = vocab.iter().position(|known| known == word) {
					id as u32
				} else {
					vocab.push(word.to_string());

					(vocab.len() - 1) as u32
				}
			})
			.collect())
	}

	fn decode_ids(&self, ids: &[u32]) -> Result<String, TokenizerError> {
		let vocab = self.vocab.lock().unwrap_or_else(|err| err.into_inner());

		Ok(ids.iter().map(|id| vocab[*id as usize].as_str()).collect::<Vec<_>>().join(" "))
	}
}
