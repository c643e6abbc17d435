use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::AppResult;
use crate::services::session::EditSession;
use crate::services::stats::StatsRow;
use crate::services::table::EditTable;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_stats))
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub events: usize,
    pub stats: Vec<StatsRow>,
    pub generated_at: String,
}

/// Per-scouter statistics for a freshly fetched listing.
async fn get_stats(State(state): State<Arc<AppState>>) -> AppResult<Json<StatsResponse>> {
    let listing = state.reload().await?;
    let session = EditSession::new(EditTable::from_listing(
        &listing,
        state.config.ui.table_settings(),
    ));

    Ok(Json(StatsResponse {
        events: listing.events.len(),
        stats: session.stats().to_vec(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    }))
}
