//! Next-word suggestion library backed by precomputed n-gram tables.
//!
//! This crate provides the suggestion pipeline used by the presagio server:
//! - Phrase normalization (`normalize`)
//! - A pluggable n-gram lookup capability (`NgramStore`)
//! - An in-memory table and an external graph store behind that capability
//! - Backoff search from 4-grams down to the unigram fallback (`BackoffSuggester`)
//!
//! Loading and configuration helpers are public so binaries can select a
//! store at startup; file handling utilities stay internal.

/// Normalization, n-gram stores and the backoff suggester.
pub mod model;

/// Crate-wide error type.
pub mod error;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use error::Error;
