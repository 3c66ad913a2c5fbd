//! Telegram Membership Bot - Main entry point.

use anyhow::Context;
use member_bot::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    commands::Dispatcher,
    config::Config,
    context::{AppContext, Extensions},
    error::AppResult,
};
use member_store::MemberStore;
use std::net::SocketAddr;
use std::sync::Arc;
use telegram_client::TelegramClient;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log.level);

    info!("Starting Telegram Membership Bot...");

    // Initialize Telegram client
    let telegram = TelegramClient::new(
        &config.telegram.api_url,
        config.telegram.bot_token.clone(),
        config.telegram.timeout,
    )
    .context("Failed to create Telegram client")?;

    if !telegram.is_configured() {
        warn!("TELEGRAM__BOT_TOKEN is not set - webhook will answer 500 until configured");
    } else {
        match telegram.get_me().await {
            Ok(me) => info!(
                "Telegram bot healthy - @{}",
                me.username.as_deref().unwrap_or("unknown")
            ),
            Err(e) => warn!("Telegram getMe failed - will retry on requests: {}", e),
        }

        if let Some(url) = config.telegram.webhook_url.as_deref() {
            match telegram
                .set_webhook(url, config.telegram.webhook_secret.as_deref())
                .await
            {
                Ok(()) => info!("Webhook registered at {}", url),
                Err(e) => warn!("Failed to register webhook at {}: {}", url, e),
            }
        }
    }

    // Initialize member store
    let store = if config.store.persist {
        MemberStore::open(config.store.path.clone())
            .await
            .with_context(|| format!("Failed to open member store at {:?}", config.store.path))?
    } else {
        info!("Persistence disabled, using in-memory member store");
        MemberStore::memory()
    };
    let store = Arc::new(store);
    info!("Member store ready with {} members", store.count().await);

    // Build the dispatch context
    let telegram_configured = telegram.is_configured();
    let ctx = AppContext::new(
        Arc::new(telegram),
        store.clone(),
        &config.bot,
        Extensions::new(),
    );
    info!(
        "Registered {} built-in commands, {} extensions",
        ctx.builtin_commands().len(),
        ctx.command_registry().extension_count()
    );

    let state = AppState::new(Dispatcher::new(Arc::new(ctx)), store, telegram_configured)
        .with_webhook_secret(config.telegram.webhook_secret.clone())
        .with_admin_token(config.admin.token.clone());

    if state.admin_token.is_none() {
        warn!("ADMIN__TOKEN is not set - admin API is disabled");
    }

    let rate_limit = RateLimitState::new(config.rate_limit.admin_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit);

    // Bind to address
    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
