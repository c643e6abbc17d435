use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

use axum::body::Body;
use axum::{routing::get, Router};
use http::StatusCode;
use tokio::sync::RwLock;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod i18n;
pub mod middleware;
pub mod models;
pub mod render;
pub mod routes;
pub mod services;

use config::Config;
use models::Listing;
use services::events::{EventService, EventServiceError};

pub struct AppState {
    pub config: Config,
    pub events: EventService,
    /// Latest listing fetched from the event service.
    listing: RwLock<Option<Listing>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, EventServiceError> {
        let events = EventService::new(&config.event_service)?;
        Ok(Self {
            config,
            events,
            listing: RwLock::new(None),
        })
    }

    /// Fetch a fresh listing and make it the current snapshot. Concurrent
    /// reloads are not sequenced; the last one to finish wins.
    pub async fn reload(&self) -> Result<Listing, EventServiceError> {
        let listing = self.events.fetch_listing().await?;
        *self.listing.write().await = Some(listing.clone());
        Ok(listing)
    }

    /// The current snapshot, fetching one if none has been loaded yet.
    pub async fn snapshot(&self) -> Result<Listing, EventServiceError> {
        if let Some(listing) = self.listing.read().await.clone() {
            return Ok(listing);
        }
        self.reload().await
    }

    pub async fn cached_event_count(&self) -> Option<usize> {
        self.listing.read().await.as_ref().map(|l| l.events.len())
    }
}

fn rate_limited_response(error: GovernorError) -> http::Response<Body> {
    let (status, body, retry_after, extra_headers) = match error {
        GovernorError::TooManyRequests { wait_time, headers } => (
            StatusCode::TOO_MANY_REQUESTS,
            serde_json::json!({
                "error": {
                    "code": "RATE_LIMITED",
                    "message": "Rate limit exceeded",
                    "details": { "retry_after_seconds": wait_time }
                }
            }),
            Some(wait_time),
            headers,
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": {
                    "code": "INVALID_REQUEST",
                    "message": "Unable to determine client IP for rate limiting"
                }
            }),
            None,
            None,
        ),
        GovernorError::Other { code, msg, headers } => (
            StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            serde_json::json!({
                "error": {
                    "code": "RATE_LIMIT_ERROR",
                    "message": msg.unwrap_or_else(|| "Rate limiting error".to_string())
                }
            }),
            None,
            headers,
        ),
    };

    let mut resp = http::Response::new(Body::from(body.to_string()));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    if let Some(hmap) = extra_headers {
        for (name, value) in hmap.iter() {
            resp.headers_mut().append(name.clone(), value.clone());
        }
    }
    if let Some(seconds) = retry_after {
        resp.headers_mut()
            .insert(http::header::RETRY_AFTER, http::HeaderValue::from(seconds));
    }
    resp
}

/// Build the application router.
///
/// Also starts the thread that prunes the submit rate limiter; it exits once
/// `shutdown` is set.
pub fn build_router(
    state: Arc<AppState>,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<(Router, JoinHandle<()>)> {
    let rate = &state.config.rate_limit;

    let mut submit_builder = GovernorConfigBuilder::default().key_extractor(SmartIpKeyExtractor);
    submit_builder
        .per_second(rate.submit_per_second)
        .burst_size(rate.submit_burst)
        .error_handler(rate_limited_response);
    let submit_gov_conf = Arc::new(
        submit_builder
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Failed to build submit governor config"))?,
    );

    let submit_cleaner = {
        let limiter = submit_gov_conf.limiter().clone();
        let interval = Duration::from_secs(60);
        std::thread::spawn(move || {
            let tick = Duration::from_secs(1);
            loop {
                for _ in 0..interval.as_secs() {
                    if shutdown.load(Ordering::SeqCst) {
                        tracing::info!("Submit rate limiter cleanup thread exiting");
                        return;
                    }
                    std::thread::sleep(tick);
                }
                tracing::debug!("submit rate limiter size: {}", limiter.len());
                limiter.retain_recent();
            }
        })
    };

    let submit_rate_layer = GovernorLayer {
        config: submit_gov_conf,
    };

    let static_dir = state.config.server.static_dir.clone();

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        // View and edit pages
        .merge(routes::list::router())
        // Submission to the event service (rate limited per client IP)
        .nest(
            "/submit",
            routes::list::submit_router().layer(submit_rate_layer),
        )
        .nest("/api/stats", routes::stats::router())
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::csp::csp_middleware))
        .layer(TraceLayer::new_for_http());

    Ok((app, submit_cleaner))
}
