use std::sync::LazyLock;

use regex::Regex;

/// Marker prepended to every normalized phrase.
///
/// Tables are built with the same marker at sentence starts, so `^i want`
/// only matches contexts that opened a sentence.
pub const START_MARKER: char = '^';

static NOT_ALPHA_SPACE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[^[:alpha:][:space:]']").expect("static pattern"));

static SPACES: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[[:space:]]+").expect("static pattern"));

/// Normalizes a raw phrase into the form used as table keys.
///
/// - Drops every character that is not an ASCII letter, whitespace or `'`
/// - Collapses whitespace runs into a single space
/// - Lowercases
/// - Prepends `START_MARKER`
///
/// Total and idempotent: the marker itself is stripped on a second pass
/// and put back.
pub fn normalize(phrase: &str) -> String {
	let clean = NOT_ALPHA_SPACE.replace_all(phrase, "");
	let clean = SPACES.replace_all(&clean, " ");

	let mut normalized = String::with_capacity(clean.len() + 1);
	normalized.push(START_MARKER);
	normalized.push_str(&clean.to_lowercase());
	normalized
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_marks_start() {
		assert_eq!(normalize("I want to"), "^i want to");
	}

	#[test]
	fn strips_punctuation_and_digits() {
		assert_eq!(normalize("Hello, world! 42 times"), "^hello world times");
	}

	#[test]
	fn keeps_apostrophes() {
		assert_eq!(normalize("Don't stop"), "^don't stop");
	}

	#[test]
	fn collapses_whitespace_runs() {
		assert_eq!(normalize("a \t\n  b"), "^a b");
	}

	#[test]
	fn empty_phrase_is_only_the_marker() {
		assert_eq!(normalize(""), "^");
		assert_eq!(normalize("?!."), "^");
	}

	#[test]
	fn is_idempotent() {
		for phrase in ["", "  Leading space", "I'm  GOING\thome.", "^^caret", "x y z "] {
			let once = normalize(phrase);
			assert_eq!(normalize(&once), once, "phrase {:?}", phrase);
		}
	}
}
