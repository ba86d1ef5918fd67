pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	#[error("Chunking error: {message}")]
	Chunking { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<corpus_storage::Error> for Error {
	fn from(err: corpus_storage::Error) -> Self {
		match err {
			corpus_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			corpus_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			corpus_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<corpus_chunking::Error> for Error {
	fn from(err: corpus_chunking::Error) -> Self {
		Self::Chunking { message: err.to_string() }
	}
}
