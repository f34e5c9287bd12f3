use std::sync::Arc;

use followup_agent::config::AppConfig;
use followup_agent::deliver::{Deliverer, Mailer};
use followup_agent::drafter::{Drafter, TemplateSet};
use followup_agent::enrich::ScraperClient;
use followup_agent::llm::create_provider;
use followup_agent::pipeline::Pipeline;
use followup_agent::secrets::{HttpSecretStore, SecretResolver};
use followup_agent::server;
use followup_agent::table::{ContactSource, TableClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let once = std::env::args().any(|a| a == "--once");

    // Secret resolver: managed store when configured, env otherwise
    let resolver = match std::env::var("SECRET_STORE_URL") {
        Ok(url) => {
            let token = std::env::var("SECRET_STORE_TOKEN")
                .ok()
                .map(secrecy::SecretString::from);
            SecretResolver::with_store(Arc::new(HttpSecretStore::new(url, token)?))
        }
        Err(_) => SecretResolver::env_only(),
    };

    let config = AppConfig::load(&resolver).await?;

    eprintln!("📬 Follow-up Agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!(
        "   Delivery: {:?}{}",
        config.mailer.mode,
        if config.mailer.dry_run { " (dry run)" } else { "" }
    );
    eprintln!(
        "   Enrichment: {}",
        config
            .scraper
            .as_ref()
            .map(|s| s.base_url.as_str())
            .unwrap_or("disabled")
    );

    // ── Wire the pipeline ───────────────────────────────────────────
    let source: Arc<dyn ContactSource> = Arc::new(TableClient::new(config.table.clone())?);
    let llm = create_provider(&config.llm)?;

    let templates = match &config.template_dir {
        Some(dir) => TemplateSet::from_dir(dir)?,
        None => TemplateSet::builtin(),
    };

    let drafter = Drafter::new(llm, templates, config.drafter.clone());
    let deliverer: Arc<dyn Deliverer> = Arc::new(Mailer::new(config.mailer.clone()));
    let scraper = match &config.scraper {
        Some(sc) => Some(ScraperClient::new(sc.clone())?),
        None => None,
    };

    let pipeline = Arc::new(Pipeline::new(
        source,
        config.policy.clone(),
        scraper,
        drafter,
        Arc::clone(&deliverer),
    ));

    if once {
        let report = pipeline.run().await?;
        eprintln!(
            "   Done: {} fetched, {} due, {} drafted",
            report.fetched,
            report.due,
            report.drafts.len()
        );
        return Ok(());
    }

    // ── Serve ───────────────────────────────────────────────────────
    let app = server::routes(pipeline, deliverer);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    eprintln!("   Listening on http://0.0.0.0:{}  (GET /run)\n", config.port);
    tracing::info!(port = config.port, "Follow-up agent server started");
    axum::serve(listener, app).await?;

    Ok(())
}
