use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::EventServiceConfig;
use crate::i18n;
use crate::models::{Event, Listing, ListingPayload, SubmitRequest};

#[derive(Debug, thiserror::Error)]
pub enum EventServiceError {
    #[error("Event service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Event service returned {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Event service returned an unreadable listing: {0}")]
    Decode(reqwest::Error),

    #[error("Invalid event service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result of a submission attempt. Failures are reported to the user, not
/// raised.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted,
    WrongPassword,
    /// Any other status; `status` is 0 when no response was received.
    Failed { status: u16, reason: String },
}

impl SubmitOutcome {
    pub fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            SubmitOutcome::Accepted
        } else if status == StatusCode::UNAUTHORIZED {
            SubmitOutcome::WrongPassword
        } else {
            SubmitOutcome::Failed {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            }
        }
    }

    /// Outcome of a request that never produced a status line.
    pub fn transport_failure() -> Self {
        SubmitOutcome::Failed {
            status: 0,
            reason: "error".to_string(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }

    pub fn message(&self, lang: &str) -> String {
        match self {
            SubmitOutcome::Accepted => i18n::tr(Some(lang), "submit.ok", None),
            SubmitOutcome::WrongPassword => i18n::tr(Some(lang), "submit.wrong_password", None),
            SubmitOutcome::Failed { status, reason } => {
                let status = status.to_string();
                i18n::tr(
                    Some(lang),
                    "submit.failed",
                    Some(&[("status", status.as_str()), ("reason", reason.as_str())]),
                )
            }
        }
    }
}

/// Resolve `path` below `base`, keeping any path prefix the base URL has.
fn endpoint(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    base.join(path.trim_start_matches('/'))
}

/// Client of the external event service.
#[derive(Debug, Clone)]
pub struct EventService {
    client: Client,
    events_url: Url,
    edit_url: Url,
}

impl EventService {
    pub fn new(config: &EventServiceConfig) -> Result<Self, EventServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let base = Url::parse(&config.base_url)?;

        Ok(Self {
            client,
            events_url: endpoint(&base, &config.events_path)?,
            edit_url: endpoint(&base, &config.edit_path)?,
        })
    }

    /// Fetch events and known names, sorted for display.
    pub async fn fetch_listing(&self) -> Result<Listing, EventServiceError> {
        tracing::debug!("Fetching listing from {}", self.events_url);

        let response = self.client.get(self.events_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EventServiceError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let payload: ListingPayload = response.json().await.map_err(EventServiceError::Decode)?;
        let listing = Listing::from(payload).normalized();

        tracing::debug!(
            "Fetched {} events and {} names",
            listing.events.len(),
            listing.names.len()
        );

        Ok(listing)
    }

    /// Send the full event list in a single request. Not retried.
    pub async fn submit(&self, password: &str, events: &[Event]) -> SubmitOutcome {
        tracing::debug!("Submitting {} events to {}", events.len(), self.edit_url);
        for event in events {
            tracing::trace!("  {}", event);
        }

        let body = SubmitRequest { password, events };
        let outcome = match self.client.post(self.edit_url.clone()).json(&body).send().await {
            Ok(response) => SubmitOutcome::from_status(response.status()),
            Err(e) => {
                tracing::warn!("Submission request failed: {}", e);
                SubmitOutcome::transport_failure()
            }
        };

        match &outcome {
            SubmitOutcome::Accepted => tracing::info!("Submission of {} events accepted", events.len()),
            SubmitOutcome::WrongPassword => tracing::warn!("Submission rejected: wrong password"),
            SubmitOutcome::Failed { status, reason } => {
                tracing::warn!("Submission failed with {}: {}", status, reason)
            }
        }

        outcome
    }
}
