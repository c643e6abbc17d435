use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_list::{build_router, config::Config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scout_list=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!(
        "Starting scout list UI for {} (language {}, timezone {})",
        config.event_service.base_url,
        config.ui.language,
        config.ui.timezone
    );

    let app_state = Arc::new(AppState::new(config.clone())?);

    // Warm the listing snapshot; pages reload on demand if this fails.
    match app_state.reload().await {
        Ok(listing) => tracing::info!("Loaded {} events", listing.events.len()),
        Err(e) => tracing::warn!("Initial listing fetch failed: {}", e),
    }

    let thread_shutdown = Arc::new(AtomicBool::new(false));
    let (app, submit_cleaner) = build_router(app_state, thread_shutdown.clone())?;

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server_fut = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    let signal_fut = async {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = ctrl_c => {},
                        _ = term.recv() => {},
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to bind SIGTERM: {}", e);
                    let _ = ctrl_c.await;
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }

        tracing::info!("Shutdown signal received");
    };

    tokio::select! {
        res = server_fut => {
            if let Err(e) = res {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = signal_fut => {
            tracing::info!("Server future dropped to stop accepting new connections");
        }
    }

    thread_shutdown.store(true, Ordering::SeqCst);
    if let Err(e) = submit_cleaner.join() {
        tracing::warn!("Submit cleanup thread join failed: {:?}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
