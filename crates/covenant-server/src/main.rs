//! covenant-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! SQLite store, wires up whichever optional capabilities are
//! configured (analysis, OCR, mail), spawns the scheduled rule loops,
//! and serves the JSON API over HTTP.

mod settings;
mod tasks;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use covenant_ai::{ContractAnalyzer, OpenAiCompletionClient};
use covenant_alerts::{AlertEngine, DisabledMailer, EmailSender, HttpMailer};
use covenant_api::ApiState;
use covenant_extract::{HttpOcrClient, TextExtractor};
use covenant_store_sqlite::SqliteStore;
use settings::ServerConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Covenant contract-compliance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

/// Relay through the configured endpoint, or report every send as
/// failed so alerts stay queued.
enum Mailer {
  Http(HttpMailer),
  Disabled(DisabledMailer),
}

impl EmailSender for Mailer {
  async fn send<'a>(
    &'a self,
    recipient: &'a str,
    subject: &'a str,
    html_body: &'a str,
  ) -> bool {
    match self {
      Mailer::Http(mailer) => mailer.send(recipient, subject, html_body).await,
      Mailer::Disabled(mailer) => {
        mailer.send(recipient, subject, html_body).await
      }
    }
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg: ServerConfig = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("COVENANT").separator("__"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  std::fs::create_dir_all(&cfg.upload_dir).with_context(|| {
    format!("failed to create upload dir {:?}", cfg.upload_dir)
  })?;

  let store = SqliteStore::open(&cfg.db_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.db_path))?;

  let http = reqwest::Client::builder()
    .timeout(Duration::from_secs(30))
    .build()
    .context("failed to build HTTP client")?;

  // Each capability is optional; absence degrades, never aborts.
  let analyzer = cfg.openai.as_ref().map(|ai| {
    Arc::new(ContractAnalyzer::new(OpenAiCompletionClient::new(
      http.clone(),
      ai.base_url.clone(),
      ai.api_key.clone(),
      ai.model.clone(),
    )))
  });
  if analyzer.is_none() {
    tracing::warn!("no [openai] config, contracts will not be analyzed");
  }

  let ocr = cfg.ocr.as_ref().map(|ocr| {
    HttpOcrClient::new(http.clone(), ocr.analyze_url.clone(), ocr.key.clone())
  });
  if ocr.is_none() {
    tracing::warn!("no [ocr] config, scanned documents will be rejected");
  }
  let extractor = Arc::new(TextExtractor::with_optional_ocr(ocr));

  let mailer = match cfg.mail.as_ref() {
    Some(mail) => Mailer::Http(HttpMailer::new(
      http.clone(),
      mail.endpoint.clone(),
      mail.token.clone(),
      mail.from.clone(),
    )),
    None => {
      tracing::warn!("no [mail] config, notification emails stay queued");
      Mailer::Disabled(DisabledMailer)
    }
  };

  let engine = Arc::new(AlertEngine::new(store.clone(), mailer));
  tasks::spawn_rule_loops(engine, &cfg.schedule);

  let state = ApiState {
    store:      Arc::new(store),
    analyzer,
    extractor,
    upload_dir: cfg.upload_dir.clone(),
  };
  let app = axum::Router::new()
    .nest("/api", covenant_api::api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", cfg.host, cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
