use std::borrow::Cow;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use super::store::{default_unigrams, NgramStore};

/// Continuations of a context node, heaviest `PRECEDED` edges first.
const CONTINUATIONS_QUERY: &str = "MATCH (a {phrase: $phrase})-[p:PRECEDED]->(n) \
	RETURN n.word, p.p ORDER BY p.p DESC LIMIT $limit";

/// Settings of the graph store.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
	/// Base URL of the graph database HTTP API (e.g. `http://localhost:7474`).
	pub url: String,

	#[serde(default = "default_database")]
	pub database: String,

	#[serde(default)]
	pub username: Option<String>,

	#[serde(default)]
	pub password: Option<String>,

	/// Maximum continuations read per context.
	#[serde(default = "default_limit")]
	pub limit: usize,

	/// Deadline of a single lookup, connection included.
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,

	#[serde(default = "default_unigrams")]
	pub unigrams: Vec<String>,
}

fn default_database() -> String {
	"neo4j".to_owned()
}

fn default_limit() -> usize {
	5
}

fn default_timeout_secs() -> u64 {
	20
}

/// N-gram store backed by a graph database.
///
/// Each context is a node carrying a `phrase` property; its continuations
/// are the nodes reached through weighted `PRECEDED` edges. Every lookup is
/// an independent blocking HTTP call to the transactional endpoint, so the
/// store holds no mutable state and can be shared between requests.
pub struct GraphStore {
	client: Client,
	endpoint: String,
	credentials: Option<(String, Option<String>)>,
	limit: usize,
	unigrams: Vec<String>,
}

impl GraphStore {
	/// Builds a store from its configuration.
	///
	/// No request is sent here; an unreachable database surfaces on the
	/// first lookup.
	///
	/// # Errors
	/// - Empty URL or zero limit
	/// - HTTP client construction failure
	pub fn new(config: &GraphConfig) -> Result<Self> {
		let base = config.url.trim_end_matches('/');
		if base.is_empty() {
			return Err(Error::Config("graph store url is empty".to_owned()));
		}
		if config.limit == 0 {
			return Err(Error::Config("graph store limit must be >= 1".to_owned()));
		}

		let client = Client::builder()
			.timeout(Duration::from_secs(config.timeout_secs))
			.build()?;

		Ok(Self {
			client,
			endpoint: format!("{}/db/{}/tx/commit", base, config.database),
			credentials: config.username.clone().map(|user| (user, config.password.clone())),
			limit: config.limit,
			unigrams: config.unigrams.clone(),
		})
	}

	/// URL the statements are posted to.
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	fn statement(&self, context: &str) -> Value {
		json!({
			"statements": [{
				"statement": CONTINUATIONS_QUERY,
				"parameters": { "phrase": context, "limit": self.limit },
			}]
		})
	}
}

impl NgramStore for GraphStore {
	fn lookup(&self, context: &str, _order: usize) -> Result<Cow<'_, [String]>> {
		let mut request = self.client.post(&self.endpoint).json(&self.statement(context));
		if let Some((user, password)) = &self.credentials {
			request = request.basic_auth(user, password.as_ref());
		}

		let body = request.send()?.error_for_status()?.text()?;
		let rows = parse_rows(&body)?;

		let mut words = Vec::with_capacity(rows.len());
		for (word, weight) in rows {
			debug!("{} -> {} (with probability {})", context, word, weight);
			words.push(word);
		}
		if words.is_empty() {
			debug!("Nothing found.");
		}
		Ok(Cow::Owned(words))
	}

	fn unigrams(&self) -> &[String] {
		&self.unigrams
	}
}

#[derive(Deserialize)]
struct CommitResponse {
	#[serde(default)]
	results: Vec<StatementResult>,
	#[serde(default)]
	errors: Vec<StatementError>,
}

#[derive(Deserialize)]
struct StatementResult {
	#[serde(default)]
	data: Vec<Row>,
}

#[derive(Deserialize)]
struct Row {
	row: Vec<Value>,
}

#[derive(Deserialize)]
struct StatementError {
	code: String,
	message: String,
}

/// Extracts `(word, weight)` rows from a transactional endpoint response.
///
/// Rows keep the server's order (descending weight). A repeated word keeps
/// its first row only.
fn parse_rows(body: &str) -> Result<Vec<(String, Value)>> {
	let response: CommitResponse =
		serde_json::from_str(body).map_err(|e| Error::Malformed(e.to_string()))?;

	if let Some(error) = response.errors.first() {
		return Err(Error::Query(format!("{}: {}", error.code, error.message)));
	}

	let mut rows: Vec<(String, Value)> = Vec::new();
	for result in response.results {
		for Row { row } in result.data {
			let mut columns = row.into_iter();
			let word = match columns.next() {
				Some(Value::String(word)) => word,
				other => return Err(Error::Malformed(format!("expected a word, got {:?}", other))),
			};
			if rows.iter().any(|(seen, _)| *seen == word) {
				continue;
			}
			rows.push((word, columns.next().unwrap_or(Value::Null)));
		}
	}
	Ok(rows)
}
