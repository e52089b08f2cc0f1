use thiserror::Error;

/// Errors raised while loading or querying an n-gram store.
///
/// A lookup that simply finds nothing is never an error: stores return an
/// empty candidate list instead. Everything here is a real failure and is
/// propagated to the caller of `BackoffSuggester::suggest` unchanged.
#[derive(Debug, Error)]
pub enum Error {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	#[error("cannot decode snapshot: {0}")]
	Decode(#[source] postcard::Error),

	#[error("cannot encode snapshot: {0}")]
	Encode(#[source] postcard::Error),

	#[error("malformed listing at line {line}: {reason}")]
	Listing { line: usize, reason: String },

	#[error("graph store unreachable: {0}")]
	Unreachable(#[from] reqwest::Error),

	#[error("graph store query failed: {0}")]
	Query(String),

	#[error("malformed graph store response: {0}")]
	Malformed(String),

	#[error("invalid store configuration: {0}")]
	Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
