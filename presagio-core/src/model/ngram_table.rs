use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::{build_output_path, read_file};
use super::store::{default_unigrams, NgramStore};

/// Immutable in-memory n-gram table.
///
/// Maps a context (the trailing words of a normalized phrase, joined by
/// single spaces) to its continuations in non-increasing likelihood order.
/// Contexts of every order share the same map: a context's word count
/// already identifies its order.
///
/// # Responsibilities
/// - Load from a postcard snapshot or a plain text listing
/// - Answer exact-context lookups for the backoff suggester
///
/// # Invariants
/// - No duplicate words within one context's continuations
/// - Never mutated once shared with a suggester
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NgramTable {
	/// Context → ranked continuations.
	/// Example: { "want to" => ["go", "be"] }
	entries: HashMap<String, Vec<String>>,

	/// Order-1 fallback, supplied by configuration rather than persisted.
	#[serde(skip, default = "default_unigrams")]
	unigrams: Vec<String>,
}

impl Default for NgramTable {
	fn default() -> Self {
		Self { entries: HashMap::new(), unigrams: default_unigrams() }
	}
}

impl NgramTable {
	/// Creates an empty table with the default unigram fallback.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a table from `(context, continuations)` pairs.
	///
	/// Continuations keep their given order; repeated words are dropped.
	pub fn from_entries<I, C, W>(entries: I) -> Self
	where
		I: IntoIterator<Item = (C, W)>,
		C: Into<String>,
		W: IntoIterator,
		W::Item: Into<String>,
	{
		let mut table = Self::new();
		for (context, words) in entries {
			table.insert(context, words);
		}
		table
	}

	/// Replaces the order-1 fallback list.
	pub fn with_unigrams(mut self, unigrams: Vec<String>) -> Self {
		self.unigrams = unigrams;
		self
	}

	/// Records the continuations of `context`, replacing any previous ones.
	///
	/// Only the first occurrence of a word is kept, so the invariant holds
	/// even for sloppy inputs.
	pub fn insert<C, W>(&mut self, context: C, words: W)
	where
		C: Into<String>,
		W: IntoIterator,
		W::Item: Into<String>,
	{
		let mut seen = HashSet::new();
		let words: Vec<String> = words
			.into_iter()
			.map(Into::into)
			.filter(|word| seen.insert(word.clone()))
			.collect();
		self.entries.insert(context.into(), words);
	}

	/// Returns the continuations recorded for an exact context.
	pub fn get(&self, context: &str) -> Option<&[String]> {
		self.entries.get(context).map(Vec::as_slice)
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Loads a table, preferring a binary snapshot next to `filepath`.
	///
	/// - If `<stem>.bin` exists beside `filepath`, it is decoded with `postcard`.
	/// - Otherwise `filepath` is parsed as a listing and a `<stem>.bin`
	///   snapshot is written for the next start.
	///
	/// Failing to write the snapshot only logs a warning: the parsed table
	/// is still usable.
	pub fn open<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let snapshot_path = build_output_path(&filepath, "bin")?;
		if snapshot_path.exists() {
			let table = Self::load(&snapshot_path)?;
			info!("Reloaded ngram table from {} ({} contexts)", snapshot_path.display(), table.len());
			return Ok(table);
		}

		let table = Self::read_listing(&filepath)?;
		info!("Parsed ngram listing {} ({} contexts)", filepath.as_ref().display(), table.len());
		if let Err(e) = table.save(&snapshot_path) {
			warn!("Cannot write snapshot {}: {}", snapshot_path.display(), e);
		}
		Ok(table)
	}

	/// Decodes a postcard snapshot.
	pub fn load<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let bytes = std::fs::read(filepath)?;
		postcard::from_bytes(&bytes).map_err(Error::Decode)
	}

	/// Encodes the table as a postcard snapshot.
	///
	/// The unigram fallback is configuration and is not written.
	pub fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self).map_err(Error::Encode)?;
		std::fs::write(filepath, bytes)?;
		Ok(())
	}

	/// Parses a plain text listing.
	///
	/// One context per line: `<context>\t<word> <word> ...`, words in rank
	/// order. Blank lines and `#` comments are skipped.
	///
	/// # Errors
	/// Returns `Error::Listing` for a line without a tab separator.
	pub fn read_listing<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let mut table = Self::new();
		for (index, line) in read_file(filepath)?.iter().enumerate() {
			if line.trim().is_empty() || line.starts_with('#') {
				continue;
			}
			let (context, words) = line.split_once('\t').ok_or_else(|| Error::Listing {
				line: index + 1,
				reason: "expected <context>\\t<words>".to_owned(),
			})?;
			table.insert(context, words.split_whitespace());
		}
		Ok(table)
	}
}

impl NgramStore for NgramTable {
	fn lookup(&self, context: &str, _order: usize) -> Result<Cow<'_, [String]>> {
		match self.get(context) {
			Some(words) => {
				debug!("Returning {:?}", words);
				Ok(Cow::Borrowed(words))
			}
			None => {
				debug!("Nothing found.");
				Ok(Cow::Owned(Vec::new()))
			}
		}
	}

	fn unigrams(&self) -> &[String] {
		&self.unigrams
	}
}
