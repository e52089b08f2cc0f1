mod config;

use std::path::PathBuf;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{get, middleware, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{error, info};
use serde::{Deserialize, Serialize};

use presagio_core::model::store::{NgramStore, StoreConfig};
use presagio_core::model::suggester::BackoffSuggester;

use config::ServerConfig;

type Suggester = BackoffSuggester<Box<dyn NgramStore>>;

#[derive(Parser)]
#[command(name = "presagio-server")]
#[command(about = "Next-word suggestions over HTTP from a precomputed n-gram table")]
struct Cli {
	/// Path to a TOML config file. Defaults apply when omitted.
	#[arg(long)]
	config: Option<PathBuf>,

	/// Port to listen on, overriding the config file.
	#[arg(long, env = "PORT")]
	port: Option<u16>,
}

/// Query parameters of the suggestion endpoint
#[derive(Deserialize)]
struct SuggestParams {
	q: Option<String>,
	limit: Option<usize>,
}

/// Suggestions together with the query that produced them.
#[derive(Serialize)]
struct SuggestionResponse {
	q: String,
	suggestions: Vec<String>,
}

/// Suggestion endpoint, mounted as the default service.
///
/// Answers `{"q": ..., "suggestions": [...]}` for the phrase in `q`.
/// The lookup runs on the blocking pool since a store may wait on the
/// network. A store failure is logged and answered with a 500.
async fn get_suggestions(data: web::Data<Suggester>, query: web::Query<SuggestParams>) -> impl Responder {
	let query = query.into_inner();
	let q = query.q.unwrap_or_default();
	let limit = query.limit.unwrap_or(data.options().max_results);

	let suggester = data.clone();
	let phrase = q.clone();
	let result = web::block(move || suggester.suggest(&phrase, limit)).await;

	match result {
		Ok(Ok(suggestions)) => HttpResponse::Ok().json(SuggestionResponse { q, suggestions }),
		Ok(Err(e)) => {
			error!("HTTP 500: {}", e);
			HttpResponse::InternalServerError().body("Internal Server Error")
		}
		Err(e) => {
			error!("HTTP 500: {}", e);
			HttpResponse::InternalServerError().body("Internal Server Error")
		}
	}
}

#[get("/favicon.ico")]
async fn get_favicon() -> impl Responder {
	HttpResponse::NotFound().finish()
}

/// Echoes the request origin back, as any page may embed the suggestions.
fn cors() -> Cors {
	Cors::default()
		.allow_any_origin()
		.allowed_methods(vec!["GET", "POST"])
		.max_age(3600)
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_favicon)
		.default_service(web::route().to(get_suggestions));
}

async fn serve(suggester: web::Data<Suggester>, server: ServerConfig) -> std::io::Result<()> {
	let timeout = Duration::from_secs(server.timeout_secs);
	info!("Listening on {}:{}", server.address, server.port);

	HttpServer::new(move || {
		App::new()
			.app_data(suggester.clone())
			.wrap(cors())
			.wrap(middleware::Logger::default())
			.configure(routes)
	})
		.workers(server.workers())
		.client_request_timeout(timeout)
		.client_disconnect_timeout(timeout)
		.bind((server.address.as_str(), server.port))?
		.run()
		.await
}

fn init_logger() {
	env_logger::Builder::new()
		.filter_level(log::LevelFilter::Info)
		.parse_env("RUST_LOG")
		.init();
}

/// Main entry point for the server.
///
/// Opens the configured store before the runtime starts: the graph store
/// uses a blocking HTTP client that must not be created inside it.
fn main() -> Result<(), Box<dyn std::error::Error>> {
	init_logger();

	let cli = Cli::parse();
	let mut config = config::load(cli.config.as_deref())?;
	match cli.port {
		Some(port) => config.server.port = port,
		None => info!("$PORT was unset, defaulting to {}", config.server.port),
	}

	match &config.store {
		StoreConfig::Memory(memory) => info!("Loading ngram table from {}", memory.path.display()),
		StoreConfig::Graph(graph) => info!("Querying graph store at {}", graph.url),
	}
	let store = config.store.open()?;
	let suggester = web::Data::new(BackoffSuggester::new(store, config.suggest.clone()));

	actix_web::rt::System::new().block_on(serve(suggester, config.server))?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::borrow::Cow;

	use actix_web::http::StatusCode;
	use actix_web::test;
	use serde_json::{json, Value};

	use presagio_core::model::ngram_table::NgramTable;
	use presagio_core::model::suggester::SuggestOptions;
	use presagio_core::Error;

	use super::*;

	struct BrokenStore(Vec<String>);

	impl NgramStore for BrokenStore {
		fn lookup(&self, _: &str, _: usize) -> Result<Cow<'_, [String]>, Error> {
			Err(Error::Query("connection refused".to_owned()))
		}

		fn unigrams(&self) -> &[String] {
			&self.0
		}
	}

	fn data(store: Box<dyn NgramStore>) -> web::Data<Suggester> {
		web::Data::new(BackoffSuggester::new(store, SuggestOptions::default()))
	}

	fn table() -> Box<dyn NgramStore> {
		Box::new(NgramTable::from_entries([("want to", vec!["go", "be"])]))
	}

	#[actix_web::test]
	async fn answers_with_query_and_suggestions() {
		let app = test::init_service(App::new().app_data(data(table())).wrap(cors()).configure(routes)).await;
		let req = test::TestRequest::get().uri("/?q=I%20want%20to").to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body, json!({"q": "I want to", "suggestions": ["go", "be", "the"]}));
	}

	#[actix_web::test]
	async fn missing_query_gets_the_fallback() {
		let app = test::init_service(App::new().app_data(data(table())).wrap(cors()).configure(routes)).await;
		let req = test::TestRequest::get().uri("/").to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body, json!({"q": "", "suggestions": ["the", "to", "a"]}));
	}

	#[actix_web::test]
	async fn limit_overrides_the_default_count() {
		let app = test::init_service(App::new().app_data(data(table())).wrap(cors()).configure(routes)).await;
		let req = test::TestRequest::get().uri("/?q=I%20want%20to&limit=1").to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["suggestions"], json!(["go"]));
	}

	#[actix_web::test]
	async fn echoes_the_request_origin() {
		let app = test::init_service(App::new().app_data(data(table())).wrap(cors()).configure(routes)).await;
		let req = test::TestRequest::get()
			.uri("/?q=hello")
			.insert_header(("Origin", "http://example.com"))
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);
		assert_eq!(
			resp.headers().get("access-control-allow-origin").unwrap(),
			"http://example.com"
		);
	}

	#[actix_web::test]
	async fn favicon_is_not_found() {
		let app = test::init_service(App::new().app_data(data(table())).wrap(cors()).configure(routes)).await;
		let req = test::TestRequest::get().uri("/favicon.ico").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::NOT_FOUND);
	}

	#[actix_web::test]
	async fn store_failure_is_a_server_error() {
		let store: Box<dyn NgramStore> = Box::new(BrokenStore(vec!["the".to_owned()]));
		let app = test::init_service(App::new().app_data(data(store)).wrap(cors()).configure(routes)).await;
		let req = test::TestRequest::get().uri("/?q=I%20want%20to").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
