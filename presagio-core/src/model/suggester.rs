use std::collections::HashSet;

use log::debug;
use serde::Deserialize;

use crate::error::Result;
use super::normalizer::normalize;
use super::store::NgramStore;

/// Highest n-gram order held by the tables.
pub const MAX_ORDER: usize = 4;

/// Orders queried by the backoff, most specific first.
const ORDERS: [usize; MAX_ORDER] = [4, 3, 2, 1];

/// Corpus artifact that is never suggested.
pub const NOISE_TOKEN: &str = "'";

pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Output settings of a `BackoffSuggester`.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestOptions {
	/// Number of suggestions returned when the caller does not ask for a
	/// specific count.
	#[serde(default = "default_max_results")]
	pub max_results: usize,

	/// Return suggestions in reverse discovery order (best last).
	#[serde(default)]
	pub reverse: bool,
}

fn default_max_results() -> usize {
	DEFAULT_MAX_RESULTS
}

impl Default for SuggestOptions {
	fn default() -> Self {
		Self { max_results: DEFAULT_MAX_RESULTS, reverse: false }
	}
}

/// Predicts the next word of a phrase by backing off from 4-grams to unigrams.
///
/// # Behavior
/// - Orders are queried strictly from 4 down to 1.
/// - Each order only fills the slots left by higher orders: accepted words
///   are never reordered or displaced.
/// - A word is kept at its first (highest order) occurrence only.
/// - The search stops after the first order that brings the count to
///   the requested maximum.
///
/// A context without continuations moves on to the next order. A store
/// failure aborts the whole suggestion: it is returned to the caller and
/// never replaced by a shorter or empty result.
pub struct BackoffSuggester<S> {
	store: S,
	options: SuggestOptions,
}

impl<S: NgramStore> BackoffSuggester<S> {
	pub fn new(store: S, options: SuggestOptions) -> Self {
		Self { store, options }
	}

	pub fn options(&self) -> &SuggestOptions {
		&self.options
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	/// Suggests up to `options.max_results` continuations of `phrase`.
	pub fn suggest_default(&self, phrase: &str) -> Result<Vec<String>> {
		self.suggest(phrase, self.options.max_results)
	}

	/// Suggests up to `max_results` distinct continuations of `phrase`.
	///
	/// # Returns
	/// - Words in discovery order (reversed if `options.reverse` is set)
	/// - Possibly fewer than `max_results`, possibly empty
	///
	/// # Errors
	/// Any store failure, unchanged.
	pub fn suggest(&self, phrase: &str, max_results: usize) -> Result<Vec<String>> {
		if max_results == 0 {
			return Ok(Vec::new());
		}

		let phrase = normalize(phrase);
		let words: Vec<&str> = phrase.split(' ').collect();
		let mut accepted = Accepted::new();

		for order in ORDERS {
			let context = context_for(&words, order);
			debug!(
				"Attempting to find suggestions for [{}] using a {}-gram, searching for [{}]",
				phrase, order, context
			);

			let candidates = self.store.continuations(&context, order)?;
			accepted.extend(candidates.iter());

			if accepted.len() >= max_results {
				break;
			}
		}

		let mut results = accepted.into_words();
		results.truncate(max_results);
		if self.options.reverse {
			results.reverse();
		}
		Ok(results)
	}
}

/// Lookup key for an n-gram of size `order`: the trailing `order - 1` words,
/// or the whole phrase when it is shorter than that.
fn context_for(words: &[&str], order: usize) -> String {
	let keep = order.saturating_sub(1).min(words.len());
	words[words.len() - keep..].join(" ")
}

/// Suggestions accepted so far, in discovery order.
struct Accepted {
	words: Vec<String>,
	seen: HashSet<String>,
}

impl Accepted {
	fn new() -> Self {
		Self { words: Vec::new(), seen: HashSet::new() }
	}

	fn extend<'a>(&mut self, candidates: impl Iterator<Item = &'a String>) {
		for word in candidates {
			if word == NOISE_TOKEN || self.seen.contains(word) {
				continue;
			}
			self.seen.insert(word.clone());
			self.words.push(word.clone());
		}
	}

	fn len(&self) -> usize {
		self.words.len()
	}

	fn into_words(self) -> Vec<String> {
		self.words
	}
}

#[cfg(test)]
mod tests {
	use std::borrow::Cow;
	use std::collections::HashMap;
	use std::sync::Mutex;

	use super::*;
	use crate::error::Error;
	use crate::model::ngram_table::NgramTable;

	/// Fixture store keyed by `(context, order)` that records every query.
	struct FixtureStore {
		entries: HashMap<(String, usize), Vec<String>>,
		unigrams: Vec<String>,
		failing_order: Option<usize>,
		queries: Mutex<Vec<(String, usize)>>,
	}

	impl FixtureStore {
		fn new(unigrams: &[&str]) -> Self {
			Self {
				entries: HashMap::new(),
				unigrams: unigrams.iter().map(|w| (*w).to_owned()).collect(),
				failing_order: None,
				queries: Mutex::new(Vec::new()),
			}
		}

		fn with(mut self, context: &str, order: usize, words: &[&str]) -> Self {
			self.entries
				.insert((context.to_owned(), order), words.iter().map(|w| (*w).to_owned()).collect());
			self
		}

		fn failing_at(mut self, order: usize) -> Self {
			self.failing_order = Some(order);
			self
		}

		fn queries(&self) -> Vec<(String, usize)> {
			self.queries.lock().unwrap().clone()
		}
	}

	impl NgramStore for FixtureStore {
		fn lookup(&self, context: &str, order: usize) -> Result<Cow<'_, [String]>> {
			self.queries.lock().unwrap().push((context.to_owned(), order));
			if self.failing_order == Some(order) {
				return Err(Error::Query("connection reset".to_owned()));
			}
			Ok(self
				.entries
				.get(&(context.to_owned(), order))
				.map(|words| Cow::Borrowed(words.as_slice()))
				.unwrap_or_default())
		}

		fn unigrams(&self) -> &[String] {
			&self.unigrams
		}

		fn continuations(&self, context: &str, order: usize) -> Result<Cow<'_, [String]>> {
			if order <= 1 {
				self.queries.lock().unwrap().push((context.to_owned(), order));
				return Ok(Cow::Borrowed(self.unigrams()));
			}
			self.lookup(context, order)
		}
	}

	fn suggester(store: FixtureStore) -> BackoffSuggester<FixtureStore> {
		BackoffSuggester::new(store, SuggestOptions::default())
	}

	#[test]
	fn fills_remaining_slots_from_unigrams() {
		let store = FixtureStore::new(&["the", "to", "a"]).with("want to", 3, &["go", "be"]);
		let suggester = suggester(store);
		assert_eq!(suggester.suggest("I want to", 3).unwrap(), vec!["go", "be", "the"]);
	}

	#[test]
	fn unknown_phrase_returns_unigrams_verbatim() {
		let suggester = suggester(FixtureStore::new(&["the", "to", "a"]));
		assert_eq!(suggester.suggest("zzz qqq", 3).unwrap(), vec!["the", "to", "a"]);
	}

	#[test]
	fn zero_results_queries_nothing() {
		let suggester = suggester(FixtureStore::new(&["the", "to", "a"]));
		assert!(suggester.suggest("I want to", 0).unwrap().is_empty());
		assert!(suggester.store().queries().is_empty());
	}

	#[test]
	fn contexts_shrink_with_order() {
		let suggester = suggester(FixtureStore::new(&[]));
		suggester.suggest("So I want to", 3).unwrap();
		assert_eq!(
			suggester.store().queries(),
			vec![
				("i want to".to_owned(), 4),
				("want to".to_owned(), 3),
				("to".to_owned(), 2),
				(String::new(), 1),
			]
		);
	}

	#[test]
	fn short_phrase_uses_whole_phrase_as_context() {
		let suggester = suggester(FixtureStore::new(&[]));
		suggester.suggest("Hello", 3).unwrap();
		let queries = suggester.store().queries();
		assert_eq!(queries[0], ("^hello".to_owned(), 4));
		assert_eq!(queries[1], ("^hello".to_owned(), 3));
		assert_eq!(queries[2], ("^hello".to_owned(), 2));
	}

	#[test]
	fn empty_phrase_still_reaches_the_fallback() {
		let store = FixtureStore::new(&["the", "to", "a"]);
		let suggester = suggester(store);
		assert_eq!(suggester.suggest("", 3).unwrap(), vec!["the", "to", "a"]);
		assert_eq!(suggester.store().queries()[0], ("^".to_owned(), 4));
	}

	#[test]
	fn stops_after_the_order_that_fills_the_list() {
		let store = FixtureStore::new(&["the"])
			.with("^i want to", 4, &["go", "be", "see", "do"])
			.with("want to", 3, &["eat"]);
		let suggester = suggester(store);
		assert_eq!(suggester.suggest("I want to", 3).unwrap(), vec!["go", "be", "see"]);
		assert_eq!(suggester.store().queries(), vec![("^i want to".to_owned(), 4)]);
	}

	#[test]
	fn higher_order_keeps_its_position() {
		let store = FixtureStore::new(&["to", "the", "a"])
			.with("^i want to", 4, &["the"])
			.with("want to", 3, &["go", "the"]);
		let suggester = suggester(store);
		assert_eq!(suggester.suggest("I want to", 5).unwrap(), vec!["the", "go", "to", "a"]);
	}

	#[test]
	fn noise_token_is_never_suggested() {
		let store = FixtureStore::new(&["'", "the"]).with("want to", 3, &["'", "go"]);
		let suggester = suggester(store);
		let results = suggester.suggest("I want to", 5).unwrap();
		assert_eq!(results, vec!["go", "the"]);
		assert!(!results.iter().any(|w| w == NOISE_TOKEN));
	}

	#[test]
	fn results_are_bounded_and_distinct() {
		let store = FixtureStore::new(&["the", "to", "a", "i", "you"])
			.with("^i want to", 4, &["go", "be"])
			.with("want to", 3, &["be", "go", "see"])
			.with("to", 2, &["the", "be", "get"]);
		let suggester = suggester(store);
		for max_results in 1..=8 {
			for phrase in ["I want to", "i WANT to!", "", "zzz", "want to"] {
				let results = suggester.suggest(phrase, max_results).unwrap();
				assert!(results.len() <= max_results);
				assert!(!results.is_empty());
				let distinct: HashSet<&String> = results.iter().collect();
				assert_eq!(distinct.len(), results.len(), "{:?}", results);
			}
		}
	}

	#[test]
	fn store_failure_is_propagated() {
		let store = FixtureStore::new(&["the", "to", "a"])
			.with("^i want to", 4, &["go"])
			.failing_at(3);
		let suggester = suggester(store);
		assert!(matches!(suggester.suggest("I want to", 3), Err(Error::Query(_))));
		// Nothing below the failing order is consulted.
		assert_eq!(suggester.store().queries().len(), 2);
	}

	#[test]
	fn reverse_flips_the_final_list() {
		let store = FixtureStore::new(&["the", "to", "a"]).with("want to", 3, &["go", "be"]);
		let suggester = BackoffSuggester::new(store, SuggestOptions { max_results: 3, reverse: true });
		assert_eq!(suggester.suggest_default("I want to").unwrap(), vec!["the", "be", "go"]);
	}

	#[test]
	fn default_count_comes_from_options() {
		let store = FixtureStore::new(&["the", "to", "a", "i", "you"]);
		let suggester = BackoffSuggester::new(store, SuggestOptions { max_results: 5, reverse: false });
		assert_eq!(suggester.suggest_default("zzz").unwrap(), vec!["the", "to", "a", "i", "you"]);
	}

	#[test]
	fn works_over_an_in_memory_table() {
		let table = NgramTable::from_entries([
			("^i want to", vec!["go"]),
			("want to", vec!["go", "be"]),
			("to", vec!["the", "be"]),
		]);
		let suggester = BackoffSuggester::new(table, SuggestOptions::default());
		assert_eq!(suggester.suggest("I want to", 3).unwrap(), vec!["go", "be", "the"]);
	}
}
