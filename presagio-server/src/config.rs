use std::path::Path;

use presagio_core::model::store::StoreConfig;
use presagio_core::model::suggester::SuggestOptions;
use serde::Deserialize;

/// Server configuration, read from an optional TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub server: ServerConfig,

	#[serde(default)]
	pub suggest: SuggestOptions,

	#[serde(default)]
	pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
	#[serde(default = "default_address")]
	pub address: String,

	#[serde(default = "default_port")]
	pub port: u16,

	/// Worker threads; one per CPU when unset.
	#[serde(default)]
	pub workers: Option<usize>,

	/// Read/write deadline for client connections.
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
}

fn default_address() -> String {
	"0.0.0.0".to_owned()
}

fn default_port() -> u16 {
	8080
}

fn default_timeout_secs() -> u64 {
	20
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			address: default_address(),
			port: default_port(),
			workers: None,
			timeout_secs: default_timeout_secs(),
		}
	}
}

impl ServerConfig {
	pub fn workers(&self) -> usize {
		self.workers.filter(|n| *n > 0).unwrap_or_else(num_cpus::get)
	}
}

/// Loads the configuration file, or the defaults when no file is given.
pub fn load(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
	match path {
		Some(path) => {
			log::info!("loading config: {}", path.display());
			let content = std::fs::read_to_string(path)?;
			Ok(toml::from_str(&content)?)
		}
		None => Ok(Config::default()),
	}
}
