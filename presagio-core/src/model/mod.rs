//! Top-level module for the suggestion system.
//!
//! This module provides the word-level n-gram backoff pipeline, including:
//! - Phrase cleanup before lookup (`normalizer`)
//! - The lookup capability shared by every backing store (`store`)
//! - An immutable in-memory table (`NgramTable`)
//! - A store backed by an external graph database (`GraphStore`)
//! - The backoff search itself (`BackoffSuggester`)

/// Phrase normalization applied before any lookup.
pub mod normalizer;

/// `NgramStore` capability, unigram fallback and store selection.
pub mod store;

/// In-memory n-gram table loaded once from a snapshot or a listing.
///
/// Keyed by exact context string, valued by ranked continuations.
pub mod ngram_table;

/// N-gram store querying an external graph database over HTTP.
pub mod graph_store;

/// Backoff search over an `NgramStore`, from 4-grams down to unigrams.
pub mod suggester;
