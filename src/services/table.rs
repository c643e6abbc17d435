use std::str::FromStr;

use chrono_tz::Tz;

use crate::models::{Event, Listing};
use crate::services::datetime;

/// Which fields of an externally scheduled event stay locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPolicy {
    /// Every field is locked.
    Full,
    /// Date, time and text fields are locked; scouter slots stay editable.
    Scouters,
}

impl FromStr for LockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(LockPolicy::Full),
            "scouters" => Ok(LockPolicy::Scouters),
            other => Err(format!("unknown lock policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSettings {
    pub timezone: Tz,
    pub scouter_slots: usize,
    pub lock_policy: LockPolicy,
}

impl Default for TableSettings {
    fn default() -> Self {
        TableSettings {
            timezone: chrono_tz::Europe::Berlin,
            scouter_slots: 3,
            lock_policy: LockPolicy::Full,
        }
    }
}

/// One row of the editable table, holding raw input values.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRow {
    pub id: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub league: String,
    pub opponent: String,
    /// Selected scouters in slot order; may contain empty selections.
    pub scouters: Vec<String>,
    /// Set for externally scheduled events.
    pub locked: bool,
    /// Exact datetime of a locked event, submitted unchanged.
    pub fixed_datetime: Option<i64>,
}

/// Field values posted for a row. `None` means the control was not submitted
/// (disabled), so the current value is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowUpdate {
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub league: Option<String>,
    pub opponent: Option<String>,
    pub scouters: Option<Vec<String>>,
}

impl EditRow {
    pub fn from_event(event: &Event, tz: Tz) -> Self {
        EditRow {
            id: event.id.clone(),
            date: datetime::input_date(event.datetime, tz),
            time: datetime::input_time(event.datetime, tz),
            location: event.location.clone().unwrap_or_default(),
            league: event.league.clone().unwrap_or_default(),
            opponent: event.opponent.clone().unwrap_or_default(),
            scouters: event.scouters.clone(),
            locked: event.is_scheduled(),
            fixed_datetime: event.is_scheduled().then_some(event.datetime),
        }
    }

    pub fn blank(id: String) -> Self {
        EditRow {
            id,
            date: String::new(),
            time: String::new(),
            location: String::new(),
            league: String::new(),
            opponent: String::new(),
            scouters: Vec::new(),
            locked: false,
            fixed_datetime: None,
        }
    }

    pub fn fields_editable(&self) -> bool {
        !self.locked
    }

    pub fn scouters_editable(&self, policy: LockPolicy) -> bool {
        !self.locked || policy == LockPolicy::Scouters
    }

    pub fn deletable(&self) -> bool {
        !self.locked
    }

    /// Scouter selections padded with empty slots up to `slots`.
    pub fn padded_scouters(&self, slots: usize) -> Vec<String> {
        let mut scouters = self.scouters.clone();
        if scouters.len() < slots {
            scouters.resize(slots, String::new());
        }
        scouters
    }

    /// Apply posted values, ignoring fields the lock policy keeps fixed.
    pub fn apply(&mut self, update: &RowUpdate, policy: LockPolicy) {
        if self.fields_editable() {
            let fields = [
                (&mut self.date, &update.date),
                (&mut self.time, &update.time),
                (&mut self.location, &update.location),
                (&mut self.league, &update.league),
                (&mut self.opponent, &update.opponent),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    *field = value.trim().to_string();
                }
            }
        }
        if self.scouters_editable(policy) {
            if let Some(scouters) = &update.scouters {
                self.scouters = scouters.clone();
            }
        }
    }

    fn extract(&self, tz: Tz) -> EventRecord {
        EventRecord {
            id: self.id.clone(),
            datetime: self
                .fixed_datetime
                .unwrap_or_else(|| datetime::parse_local(&self.date, &self.time, tz)),
            location: self.location.clone(),
            league: self.league.clone(),
            opponent: self.opponent.clone(),
            scouters: self
                .scouters
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect(),
        }
    }
}

/// Event-shaped record read back from the table, without `schedule_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub datetime: i64,
    pub location: String,
    pub league: String,
    pub opponent: String,
    pub scouters: Vec<String>,
}

/// A row id together with the values posted for it, in form order.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedRow {
    pub id: String,
    pub update: RowUpdate,
}

/// The editable table: rows in display order plus the selectable names.
#[derive(Debug, Clone)]
pub struct EditTable {
    rows: Vec<EditRow>,
    names: Vec<String>,
    settings: TableSettings,
}

impl EditTable {
    pub fn from_listing(listing: &Listing, settings: TableSettings) -> Self {
        EditTable {
            rows: listing
                .events
                .iter()
                .map(|e| EditRow::from_event(e, settings.timezone))
                .collect(),
            names: listing.names.clone(),
            settings,
        }
    }

    /// Rebuild the table from posted rows.
    ///
    /// Locking is decided by the listing snapshot, never by the form: a row
    /// whose id matches a scheduled event stays locked whatever was posted.
    pub fn from_form(posted: &[PostedRow], listing: &Listing, settings: TableSettings) -> Self {
        let rows = posted
            .iter()
            .map(|p| {
                let mut row = listing
                    .find(&p.id)
                    .map(|e| EditRow::from_event(e, settings.timezone))
                    .unwrap_or_else(|| EditRow::blank(p.id.clone()));
                row.apply(&p.update, settings.lock_policy);
                row
            })
            .collect();

        EditTable {
            rows,
            names: listing.names.clone(),
            settings,
        }
    }

    pub fn rows(&self) -> &[EditRow] {
        &self.rows
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn settings(&self) -> TableSettings {
        self.settings
    }

    /// Append a blank row whose id is derived from `now_millis`, bumped until
    /// unique. Returns the new id.
    pub fn add_row(&mut self, now_millis: i64) -> String {
        let mut candidate = now_millis;
        while self.rows.iter().any(|r| r.id == candidate.to_string()) {
            candidate += 1;
        }
        let id = candidate.to_string();
        let mut row = EditRow::blank(id.clone());
        row.scouters = vec![String::new(); self.settings.scouter_slots];
        self.rows.push(row);
        id
    }

    /// Remove an editable row. Locked or unknown rows are left alone.
    pub fn delete_row(&mut self, id: &str) -> bool {
        match self.rows.iter().position(|r| r.id == id) {
            Some(index) if self.rows[index].deletable() => {
                self.rows.remove(index);
                true
            }
            _ => false,
        }
    }

    pub fn extract(&self) -> Vec<EventRecord> {
        self.rows
            .iter()
            .map(|r| r.extract(self.settings.timezone))
            .collect()
    }
}

/// Turn extracted records into events, carrying over `schedule_info` from the
/// original event with the same id.
pub fn reattach_schedule_info(records: Vec<EventRecord>, originals: &Listing) -> Vec<Event> {
    records
        .into_iter()
        .map(|r| {
            let schedule_info = originals
                .find(&r.id)
                .and_then(|e| e.schedule_info.clone())
                .filter(|v| !v.is_null());
            Event {
                id: r.id,
                datetime: r.datetime,
                location: Some(r.location),
                league: Some(r.league),
                opponent: Some(r.opponent),
                scouters: r.scouters,
                schedule_info,
            }
        })
        .collect()
}
