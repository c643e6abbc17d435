use crate::models::{Event, Listing};
use crate::services::stats::{self, StatsRow};
use crate::services::table::{self, EditTable};

/// Editable table together with its derived statistics.
///
/// Every mutation goes through this type and recomputes the statistics, so
/// `stats()` always reflects `table()`.
#[derive(Debug, Clone)]
pub struct EditSession {
    table: EditTable,
    stats: Vec<StatsRow>,
    /// Row added by the last `add_row`, focused when rendering.
    focus: Option<String>,
}

impl EditSession {
    pub fn new(table: EditTable) -> Self {
        let mut session = EditSession {
            table,
            stats: Vec::new(),
            focus: None,
        };
        session.recompute();
        session
    }

    fn recompute(&mut self) {
        self.stats = stats::compute(&self.table.extract(), self.table.names());
    }

    pub fn add_row(&mut self, now_millis: i64) -> String {
        let id = self.table.add_row(now_millis);
        self.focus = Some(id.clone());
        self.recompute();
        id
    }

    pub fn delete_row(&mut self, id: &str) -> bool {
        let removed = self.table.delete_row(id);
        if removed {
            self.recompute();
        }
        removed
    }

    pub fn table(&self) -> &EditTable {
        &self.table
    }

    pub fn stats(&self) -> &[StatsRow] {
        &self.stats
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// Events ready for submission, with `schedule_info` taken from `originals`.
    pub fn submission(&self, originals: &Listing) -> Vec<Event> {
        table::reattach_schedule_info(self.table.extract(), originals)
    }
}
