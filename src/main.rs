use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crm_invoicing::{
  adapters::http::{
    InvoiceRouteDependencies, RequestIdMiddleware, configure_invoice_routes,
    configure_metrics_routes,
  },
  domain::invoice::{InvoiceService, InvoiceServiceDependencies},
  infrastructure::{
    config::Config,
    email::{BrandedInvoiceMailer, EmailProvider, SendGridProvider},
    metrics,
    pdf::PrintPdfRenderer,
    persistence::postgres::{
      PostgresClientRepository, PostgresInvoiceRepository, PostgresServiceRepository,
    },
  },
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  // Initialize tracing subscriber for logging
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "crm_invoicing=debug,actix_web=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tracing::info!("Starting CRM invoicing service");

  let config = Config::load().context("Failed to load configuration")?;
  tracing::info!("Configuration loaded successfully");

  // Set up database connection pool with timeout
  let db_pool = tokio::time::timeout(
    Duration::from_secs(config.database.connect_timeout_seconds),
    PgPoolOptions::new()
      .max_connections(config.database.max_connections)
      .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_seconds))
      .connect(&config.database.url),
  )
  .await
  .map_err(|_| {
    tracing::error!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      config.database.connect_timeout_seconds
    );
    anyhow::anyhow!(
      "Database connection timed out after {} seconds",
      config.database.connect_timeout_seconds
    )
  })?
  .context("Could not connect to database")?;

  tracing::info!("Database connection pool created");

  tracing::info!("Running database migrations");
  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .context("Failed to run database migrations")?;
  tracing::info!("Database migrations completed");

  metrics::init_metrics();

  // Initialize repositories
  let invoice_repo = Arc::new(PostgresInvoiceRepository::new(db_pool.clone()));
  let client_repo = Arc::new(PostgresClientRepository::new(db_pool.clone()));
  let service_repo = Arc::new(PostgresServiceRepository::new(db_pool.clone()));

  // Branding is fixed for the lifetime of the process
  let brand = config.brand.clone();
  if let Some(logo) = brand.logo_path() {
    if !logo.exists() {
      tracing::warn!(path = %logo.display(), "Brand logo not found, invoices render without it");
    }
  }

  let renderer = Arc::new(PrintPdfRenderer::new(brand.clone()));

  let provider = Arc::new(
    SendGridProvider::new(&config.email).context("Failed to initialize e-mail provider")?,
  );
  if !provider.is_configured() {
    tracing::warn!("SENDGRID API key is not configured; invoice e-mails will be rejected");
  }
  let mailer = Arc::new(
    BrandedInvoiceMailer::new(provider, brand.clone(), Some(&config.email))
      .context("Failed to initialize invoice mailer")?,
  );

  let invoice_service = Arc::new(InvoiceService::new(InvoiceServiceDependencies {
    invoice_repo,
    client_repo,
    service_repo,
    renderer,
    mailer,
    brand,
  }));
  let invoice_routes = InvoiceRouteDependencies::new(invoice_service);

  let server_host = config.server.host.clone();
  let server_port = config.server.port;

  tracing::info!("Starting HTTP server on {}:{}", server_host, server_port);

  HttpServer::new(move || {
    App::new()
      .wrap(RequestIdMiddleware::new())
      .wrap(Logger::default())
      .service(
        web::scope("/api/invoices")
          .configure(|cfg| configure_invoice_routes(cfg, invoice_routes.clone())),
      )
      .configure(configure_metrics_routes)
  })
  .bind((server_host.as_str(), server_port))?
  .run()
  .await?;

  Ok(())
}
