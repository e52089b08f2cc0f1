use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use crate::error::Result;
use super::graph_store::{GraphConfig, GraphStore};
use super::ngram_table::NgramTable;

/// Unigrams returned when the backoff reaches order 1.
pub const DEFAULT_UNIGRAMS: [&str; 3] = ["the", "to", "a"];

/// Default snapshot path of the in-memory store.
pub const DEFAULT_TABLE_PATH: &str = "ngrams.bin";

pub(crate) fn default_unigrams() -> Vec<String> {
	DEFAULT_UNIGRAMS.iter().map(|w| (*w).to_owned()).collect()
}

/// Lookup capability over a precomputed n-gram table.
///
/// Implementations answer one question: given a context of up to `order - 1`
/// words, which words follow it, best first?
///
/// # Contract
/// - An unknown context yields an empty list, never an error.
/// - Errors are reserved for backing store failures (I/O, transport,
///   malformed reads) and are propagated to the caller as-is.
/// - A returned list holds no duplicate words.
///
/// Stores are shared read-only between concurrent requests, hence the
/// `Send + Sync` bound.
pub trait NgramStore: Send + Sync {
	/// Returns the ranked continuations recorded for `context` at `order` (>= 2).
	fn lookup(&self, context: &str, order: usize) -> Result<Cow<'_, [String]>>;

	/// Most frequent unigrams, used as the order-1 base case.
	fn unigrams(&self) -> &[String];

	/// Returns the continuations of `context` for an n-gram of size `order`.
	///
	/// Order 1 does not look at the context: it always answers with the
	/// fixed unigram fallback so the backoff chain terminates.
	fn continuations(&self, context: &str, order: usize) -> Result<Cow<'_, [String]>> {
		if order <= 1 {
			debug!("Returning default unigrams");
			return Ok(Cow::Borrowed(self.unigrams()));
		}
		self.lookup(context, order)
	}
}

impl<S: NgramStore + ?Sized> NgramStore for Box<S> {
	fn lookup(&self, context: &str, order: usize) -> Result<Cow<'_, [String]>> {
		(**self).lookup(context, order)
	}

	fn unigrams(&self) -> &[String] {
		(**self).unigrams()
	}

	fn continuations(&self, context: &str, order: usize) -> Result<Cow<'_, [String]>> {
		(**self).continuations(context, order)
	}
}

impl<S: NgramStore + ?Sized> NgramStore for Arc<S> {
	fn lookup(&self, context: &str, order: usize) -> Result<Cow<'_, [String]>> {
		(**self).lookup(context, order)
	}

	fn unigrams(&self) -> &[String] {
		(**self).unigrams()
	}

	fn continuations(&self, context: &str, order: usize) -> Result<Cow<'_, [String]>> {
		(**self).continuations(context, order)
	}
}

/// Settings of the in-memory store.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
	/// Snapshot (`.bin`) or plain text listing (`.tsv`) to load.
	#[serde(default = "default_table_path")]
	pub path: PathBuf,

	#[serde(default = "default_unigrams")]
	pub unigrams: Vec<String>,
}

fn default_table_path() -> PathBuf {
	PathBuf::from(DEFAULT_TABLE_PATH)
}

impl Default for MemoryConfig {
	fn default() -> Self {
		Self { path: default_table_path(), unigrams: default_unigrams() }
	}
}

/// Which backing store to open at startup.
///
/// Deserialized from a `kind`-tagged table:
/// ```toml
/// [store]
/// kind = "graph"
/// url = "http://localhost:7474"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
	Memory(MemoryConfig),
	Graph(GraphConfig),
}

impl Default for StoreConfig {
	fn default() -> Self {
		StoreConfig::Memory(MemoryConfig::default())
	}
}

impl StoreConfig {
	/// Opens the configured store.
	///
	/// # Errors
	/// - Snapshot or listing cannot be read (memory store)
	/// - Invalid endpoint or client settings (graph store)
	pub fn open(&self) -> Result<Box<dyn NgramStore>> {
		match self {
			StoreConfig::Memory(config) => {
				let table = NgramTable::open(&config.path)?.with_unigrams(config.unigrams.clone());
				Ok(Box::new(table))
			}
			StoreConfig::Graph(config) => Ok(Box::new(GraphStore::new(config)?)),
		}
	}
}
