use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use blusanta_cloud::auth::{AccessTokenSource, GcpTokenSource};
use blusanta_cloud::compute::GceCompute;
use blusanta_cloud::messaging::{GupshupConfig, GupshupMessenger};
use blusanta_cloud::sheet::{GoogleSheetsClient, SheetConfig};
use blusanta_cloud::storage::{GcsStorage, ObjectStorage};
use blusanta_cloud::transliteration::InputToolsTransliterator;
use blusanta_cloud::tts::{ElevenLabsClient, ElevenLabsConfig};
use blusanta_events::{EventBus, NotificationRouter, Notifier, SheetSync, TemplateIds};
use blusanta_pipeline::{CampaignConfig, PgAssessmentStore, Pipeline, PipelineDeps, PipelineTimings};
use blusanta_stitcher::HttpStitchHost;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blusanta_api::config::ServerConfig;
use blusanta_api::router::build_app_router;
use blusanta_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blusanta_api=debug,blusanta_pipeline=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let campaign = CampaignConfig::from_env().context("Invalid campaign configuration")?;
    tracing::info!(
        avatar = %campaign.avatar_name,
        bucket = %campaign.bucket,
        hosts = campaign.stitch_hosts.len(),
        "Loaded campaign configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = blusanta_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    blusanta_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    blusanta_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- External services ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .context("Failed to build HTTP client")?;

    let tokens: Arc<dyn AccessTokenSource> = Arc::new(
        GcpTokenSource::discover()
            .await
            .context("Failed to discover Google Cloud credentials")?,
    );
    let project_id = std::env::var("GCP_PROJECT_ID").context("GCP_PROJECT_ID must be set")?;
    let signer_email = std::env::var("GCP_SERVICE_ACCOUNT_EMAIL").ok();

    let storage: Arc<dyn ObjectStorage> =
        Arc::new(GcsStorage::new(http.clone(), Arc::clone(&tokens), signer_email));
    let compute = Arc::new(GceCompute::new(http.clone(), Arc::clone(&tokens), project_id));
    let tts = Arc::new(ElevenLabsClient::new(
        http.clone(),
        ElevenLabsConfig::from_env().context("Invalid ElevenLabs configuration")?,
    ));
    let transliterator = Arc::new(InputToolsTransliterator::new(http.clone()));
    let stitch_host = Arc::new(HttpStitchHost::new(
        http.clone(),
        campaign.stitch_host_port,
        campaign.stitch_auth_token.clone(),
    ));

    let messenger = Arc::new(GupshupMessenger::new(
        http.clone(),
        GupshupConfig::from_env().context("Invalid Gupshup configuration")?,
    ));
    let notifier = Arc::new(Notifier::new(
        messenger,
        TemplateIds::from_env().context("Missing WhatsApp template ids")?,
    ));
    let sheet = Arc::new(GoogleSheetsClient::new(
        http,
        Arc::clone(&tokens),
        SheetConfig::from_env().context("Invalid QC sheet configuration")?,
    ));
    tracing::info!("External service clients created");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // Spawn sheet sync (mirrors submissions and completions into the QC sheet).
    let sheet_handle = tokio::spawn(SheetSync::new(sheet).run(event_bus.subscribe()));

    // Spawn notification router (sends submission receipts over WhatsApp).
    let router_handle = tokio::spawn(
        NotificationRouter::new(Arc::clone(&notifier)).run(event_bus.subscribe()),
    );
    tracing::info!("Event services started (sheet sync, notification router)");

    // --- Pipeline ---
    let cancel = CancellationToken::new();
    let deps = PipelineDeps {
        store: Arc::new(PgAssessmentStore::new(pool.clone(), campaign.avatar_name.clone())),
        storage: Arc::clone(&storage),
        compute,
        tts,
        transliterator,
        stitch_host,
    };
    let pipeline = Arc::new(Pipeline::new(
        deps,
        &campaign,
        &config.webhook_base_url,
        PipelineTimings::default(),
        cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        campaign: Arc::new(campaign),
        storage,
        notifier,
        event_bus: Arc::clone(&event_bus),
        pipeline,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let ip: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop the stage loops at their next pause; the job in flight keeps its
    // database state and is picked up again by the retry backstop.
    cancel.cancel();

    // Drop the event bus sender to close the broadcast channel.
    // This signals sheet sync and the notification router to shut down.
    drop(event_bus);
    let grace = Duration::from_secs(5);
    let _ = tokio::time::timeout(grace, sheet_handle).await;
    let _ = tokio::time::timeout(grace, router_handle).await;
    tracing::info!("Event services shut down");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
