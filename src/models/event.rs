use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Opaque server-owned scheduling payload. Never interpreted, only carried
/// back on submission.
pub type ScheduleInfo = Value;

/// A scheduled game as exchanged with the event service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    /// Milliseconds since the Unix epoch.
    #[serde(deserialize_with = "lenient_millis", default)]
    pub datetime: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(deserialize_with = "nullable_list", default)]
    pub scouters: Vec<String>,
    #[serde(default)]
    pub schedule_info: Option<ScheduleInfo>,
}

impl Event {
    /// Externally scheduled events are owned by the event service.
    pub fn is_scheduled(&self) -> bool {
        matches!(&self.schedule_info, Some(v) if !v.is_null())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} {} vs {}",
            self.id,
            self.datetime,
            self.league.as_deref().unwrap_or("-"),
            self.opponent.as_deref().unwrap_or("-"),
        )
    }
}

/// Events plus the known scouter names, as returned by the listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub events: Vec<Event>,
    #[serde(deserialize_with = "nullable_list", default)]
    pub names: Vec<String>,
}

impl Listing {
    /// Events sorted by datetime (stable), names sorted and deduplicated.
    pub fn normalized(mut self) -> Self {
        self.events.sort_by_key(|e| e.datetime);
        self.names.sort();
        self.names.dedup();
        self
    }

    pub fn find(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }
}

/// Row shape of the earliest listing endpoint: a bare array, no ids and three
/// fixed scouter columns.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyEvent {
    #[serde(deserialize_with = "lenient_millis", default)]
    pub datetime: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub scouter1: Option<String>,
    #[serde(default)]
    pub scouter2: Option<String>,
    #[serde(default)]
    pub scouter3: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListingPayload {
    Current(Listing),
    Legacy(Vec<LegacyEvent>),
}

impl From<ListingPayload> for Listing {
    fn from(payload: ListingPayload) -> Self {
        match payload {
            ListingPayload::Current(listing) => listing,
            ListingPayload::Legacy(rows) => {
                let events: Vec<Event> = rows
                    .into_iter()
                    .enumerate()
                    .map(|(index, row)| Event {
                        id: index.to_string(),
                        datetime: row.datetime,
                        location: row.location,
                        league: row.league,
                        opponent: row.opponent,
                        scouters: [row.scouter1, row.scouter2, row.scouter3]
                            .into_iter()
                            .flatten()
                            .filter(|s| !s.is_empty())
                            .collect(),
                        schedule_info: None,
                    })
                    .collect();

                let names = events
                    .iter()
                    .flat_map(|e| e.scouters.iter().cloned())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();

                Listing { events, names }
            }
        }
    }
}

/// Body of the submission endpoint.
#[derive(Serialize)]
pub struct SubmitRequest<'a> {
    pub password: &'a str,
    pub events: &'a [Event],
}

// ============================================================================
// Lenient field decoding
// ============================================================================

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| serde::de::Error::custom("datetime out of range")),
        Value::String(s) => Ok(parse_datetime_string(&s)),
        other => Err(serde::de::Error::custom(format!(
            "expected datetime, got {}",
            other
        ))),
    }
}

/// RFC 3339 strings keep their offset; naive strings are taken as UTC.
/// Anything unparseable becomes 0.
fn parse_datetime_string(s: &str) -> i64 {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.timestamp_millis();
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
        .unwrap_or(0)
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Option<String>>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect())
}
