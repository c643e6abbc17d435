use askama::Template;

use crate::i18n;
use crate::models::Listing;
use crate::services::datetime;
use crate::services::session::EditSession;
use crate::services::stats::StatsRow;
use crate::services::table::{EditRow, TableSettings};

/// Localized headings and button captions shared by both pages.
pub struct Labels {
    pub title: String,
    pub nav_edit: String,
    pub nav_view: String,
    pub datetime: String,
    pub location: String,
    pub league: String,
    pub opponent: String,
    pub scouters: String,
    pub stats_name: String,
    pub stats_c1: String,
    pub stats_c2: String,
    pub stats_c3: String,
    pub stats_total: String,
    pub add_row: String,
    pub delete: String,
    pub refresh: String,
    pub password: String,
    pub submit: String,
}

impl Labels {
    pub fn new(lang: &str) -> Self {
        let t = |key: &str| i18n::tr(Some(lang), key, None);
        Labels {
            title: t("app.title"),
            nav_edit: t("nav.edit"),
            nav_view: t("nav.view"),
            datetime: t("table.datetime"),
            location: t("table.location"),
            league: t("table.league"),
            opponent: t("table.opponent"),
            scouters: t("table.scouters"),
            stats_name: t("stats.name"),
            stats_c1: t("stats.category1"),
            stats_c2: t("stats.category2"),
            stats_c3: t("stats.category3"),
            stats_total: t("stats.total"),
            add_row: t("edit.add_row"),
            delete: t("edit.delete"),
            refresh: t("edit.refresh"),
            password: t("edit.password"),
            submit: t("edit.submit"),
        }
    }
}

pub struct ViewRow {
    /// `past` or `upcoming`
    pub class: &'static str,
    /// First upcoming row, target of the scroll anchor.
    pub next: bool,
    pub date: String,
    pub time: String,
    pub location: String,
    pub league: String,
    pub opponent: String,
    pub scouters: Vec<String>,
}

pub struct OptionView {
    pub value: String,
    pub selected: bool,
}

pub struct EditRowView {
    pub id: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub league: String,
    pub opponent: String,
    pub fields_editable: bool,
    pub scouters_editable: bool,
    pub deletable: bool,
    pub focus: bool,
    pub selects: Vec<Vec<OptionView>>,
}

#[derive(Template)]
#[template(path = "list.html")]
pub struct ListPage {
    pub lang: String,
    pub mode: &'static str,
    pub labels: Labels,
    pub rows: Vec<ViewRow>,
    pub stats: Vec<StatsRow>,
    pub message: String,
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditPage {
    pub lang: String,
    pub mode: &'static str,
    pub labels: Labels,
    pub rows: Vec<EditRowView>,
    pub stats: Vec<StatsRow>,
    pub message: String,
}

pub fn view_rows(listing: &Listing, settings: &TableSettings, lang: &str, now_millis: i64) -> Vec<ViewRow> {
    let mut next_seen = false;
    listing
        .events
        .iter()
        .map(|event| {
            let upcoming = event.datetime >= now_millis;
            let next = upcoming && !next_seen;
            next_seen |= upcoming;

            let mut scouters = event.scouters.clone();
            if scouters.len() < settings.scouter_slots {
                scouters.resize(settings.scouter_slots, String::new());
            }

            ViewRow {
                class: if upcoming { "upcoming" } else { "past" },
                next,
                date: datetime::format_date(event.datetime, settings.timezone, lang),
                time: datetime::format_time(event.datetime, settings.timezone, lang),
                location: event.location.clone().unwrap_or_default(),
                league: event.league.clone().unwrap_or_default(),
                opponent: event.opponent.clone().unwrap_or_default(),
                scouters,
            }
        })
        .collect()
}

/// Options for one scouter select: an empty choice, every known name, and the
/// current value if it is not a known name.
fn select_options(selected: &str, names: &[String]) -> Vec<OptionView> {
    let mut values: Vec<&str> = std::iter::once("")
        .chain(names.iter().map(String::as_str))
        .collect();
    if !values.contains(&selected) {
        values.push(selected);
    }
    values
        .into_iter()
        .map(|v| OptionView {
            value: v.to_string(),
            selected: v == selected,
        })
        .collect()
}

fn edit_row_view(row: &EditRow, names: &[String], settings: &TableSettings, focus: bool) -> EditRowView {
    EditRowView {
        id: row.id.clone(),
        date: row.date.clone(),
        time: row.time.clone(),
        location: row.location.clone(),
        league: row.league.clone(),
        opponent: row.opponent.clone(),
        fields_editable: row.fields_editable(),
        scouters_editable: row.scouters_editable(settings.lock_policy),
        deletable: row.deletable(),
        focus,
        selects: row
            .padded_scouters(settings.scouter_slots)
            .iter()
            .map(|s| select_options(s, names))
            .collect(),
    }
}

pub fn list_page(listing: &Listing, session: &EditSession, lang: &str, now_millis: i64, message: String) -> ListPage {
    let settings = session.table().settings();
    ListPage {
        lang: lang.to_string(),
        mode: "view",
        labels: Labels::new(lang),
        rows: view_rows(listing, &settings, lang, now_millis),
        stats: session.stats().to_vec(),
        message,
    }
}

pub fn edit_page(session: &EditSession, lang: &str, message: String) -> EditPage {
    let table = session.table();
    let settings = table.settings();
    EditPage {
        lang: lang.to_string(),
        mode: "edit",
        labels: Labels::new(lang),
        rows: table
            .rows()
            .iter()
            .map(|r| edit_row_view(r, table.names(), &settings, session.focus() == Some(r.id.as_str())))
            .collect(),
        stats: session.stats().to_vec(),
        message,
    }
}
