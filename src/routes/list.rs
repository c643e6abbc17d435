use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::Listing;
use crate::render;
use crate::services::form::{EditAction, EditForm};
use crate::services::session::EditSession;
use crate::services::table::EditTable;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(view_page))
        .route("/edit", get(edit_page).post(edit_action))
}

/// Password-gated submission, mounted separately so it can be rate limited.
pub fn submit_router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(submit))
}

#[derive(Debug, Deserialize)]
pub struct ViewParams {
    pub status: Option<String>,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn lang(state: &AppState) -> &str {
    &state.config.ui.language
}

fn new_session(state: &AppState, listing: &Listing) -> EditSession {
    EditSession::new(EditTable::from_listing(
        listing,
        state.config.ui.table_settings(),
    ))
}

/// Rebuild the session from a posted form. Locks and `schedule_info` come
/// from the latest listing snapshot.
async fn session_from_form(state: &AppState, form: &EditForm) -> AppResult<(EditSession, Listing)> {
    let snapshot = state.snapshot().await?;
    let table = EditTable::from_form(&form.rows, &snapshot, state.config.ui.table_settings());
    Ok((EditSession::new(table), snapshot))
}

fn render_edit(state: &AppState, session: &EditSession, message: String) -> AppResult<Html<String>> {
    let page = render::edit_page(session, lang(state), message);
    Ok(Html(page.render()?))
}

/// Read-only table, reloaded on every request.
async fn view_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> AppResult<Html<String>> {
    let listing = state.reload().await?;
    let session = new_session(&state, &listing);

    let message = match params.status.as_deref() {
        Some("ok") => crate::i18n::tr(Some(lang(&state)), "submit.ok", None),
        _ => String::new(),
    };

    let page = render::list_page(&listing, &session, lang(&state), now_millis(), message);
    Ok(Html(page.render()?))
}

/// Editable table, reloaded and discarding unsaved edits.
async fn edit_page(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let listing = state.reload().await?;
    let session = new_session(&state, &listing);
    render_edit(&state, &session, String::new())
}

async fn edit_action(
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Html<String>> {
    let form = EditForm::from_pairs(pairs)?;
    let (mut session, _) = session_from_form(&state, &form).await?;

    match &form.action {
        EditAction::Add => {
            let id = session.add_row(now_millis());
            tracing::debug!("Added row {}", id);
        }
        EditAction::Delete(id) => {
            if !session.delete_row(id) {
                tracing::debug!("Row {} is locked or unknown, not deleted", id);
            }
        }
        EditAction::Refresh => {}
        EditAction::Submit => {
            return Err(AppError::BadRequest(
                "Submissions must be posted to /submit".to_string(),
            ));
        }
    }

    render_edit(&state, &session, String::new())
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = EditForm::from_pairs(pairs)?;
    let (session, snapshot) = session_from_form(&state, &form).await?;

    let events = session.submission(&snapshot);
    let outcome = state.events.submit(&form.password, &events).await;

    if outcome.is_accepted() {
        return Ok(Redirect::to("/?status=ok").into_response());
    }

    // Edits stay on the page; the password field is rendered empty.
    let message = outcome.message(lang(&state));
    Ok(render_edit(&state, &session, message)?.into_response())
}
