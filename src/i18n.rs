/*
Display language support.

This module provides:
- Embedded DE/EN translation tables (compile-time embedded JSON).
- `tr` to look up a key in a given language with optional `{name}` params.
- `normalize_language` / `is_supported_language` for configured tags.

Usage:
    use crate::i18n;
    let msg = i18n::tr(Some("en"), "submit.wrong_password", None);
    let msg = i18n::tr(None, "submit.failed", Some(&[("status", "500"), ("reason", "Internal Server Error")]));

Notes:
- Default language is `de`. Missing keys fall back to the default language,
  then to the key itself.
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "de";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const DE_JSON: &str = r#"
{
  "app.title": "Scouting-Liste",
  "nav.edit": "Bearbeiten",
  "nav.view": "Ansicht",
  "table.datetime": "Datum / Zeit",
  "table.location": "Halle",
  "table.league": "Liga",
  "table.opponent": "Gegner",
  "table.scouters": "Scouter",
  "stats.name": "Name",
  "stats.category1": "BBL / Euro",
  "stats.category2": "ProB",
  "stats.category3": "Sonstige",
  "stats.total": "Summe",
  "edit.add_row": "Neue Zeile",
  "edit.delete": "Löschen",
  "edit.refresh": "Statistik aktualisieren",
  "edit.password": "Passwort",
  "edit.submit": "Speichern",
  "submit.ok": "Ok",
  "submit.wrong_password": "Passwort falsch",
  "submit.failed": "{status}: {reason}",
  "weekday.mon": "Mo.",
  "weekday.tue": "Di.",
  "weekday.wed": "Mi.",
  "weekday.thu": "Do.",
  "weekday.fri": "Fr.",
  "weekday.sat": "Sa.",
  "weekday.sun": "So."
}
"#;

const EN_JSON: &str = r#"
{
  "app.title": "Scouting list",
  "nav.edit": "Edit",
  "nav.view": "View",
  "table.datetime": "Date / Time",
  "table.location": "Venue",
  "table.league": "League",
  "table.opponent": "Opponent",
  "table.scouters": "Scouters",
  "stats.name": "Name",
  "stats.category1": "BBL / Euro",
  "stats.category2": "ProB",
  "stats.category3": "Other",
  "stats.total": "Total",
  "edit.add_row": "Add row",
  "edit.delete": "Delete",
  "edit.refresh": "Update statistics",
  "edit.password": "Password",
  "edit.submit": "Save",
  "submit.ok": "Ok",
  "submit.wrong_password": "Wrong password",
  "submit.failed": "{status}: {reason}",
  "weekday.mon": "Mon",
  "weekday.tue": "Tue",
  "weekday.wed": "Wed",
  "weekday.thu": "Thu",
  "weekday.fri": "Fri",
  "weekday.sat": "Sat",
  "weekday.sun": "Sun"
}
"#;

fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    let de_map: HashMap<String, String> = serde_json::from_str(DE_JSON).unwrap_or_else(|e| {
        panic!("failed to parse DE_JSON in i18n module: {}", e);
    });
    out.insert("de".to_string(), de_map);

    let en_map: HashMap<String, String> = serde_json::from_str(EN_JSON).unwrap_or_else(|e| {
        panic!("failed to parse EN_JSON in i18n module: {}", e);
    });
    out.insert("en".to_string(), en_map);

    out
}

fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

/// Normalize a language tag into a short, lowercase code (e.g. "de-DE" -> "de").
pub fn normalize_language(lang: &str) -> String {
    lang.split('-').next().unwrap_or(lang).trim().to_lowercase()
}

pub fn is_supported_language(lang: &str) -> bool {
    translations().contains_key(lang)
}

/// Translate a key using an explicit language (or default if None).
///
/// Placeholders use single braces (`{status}`). If no translation is found the
/// default language value is used, and failing that the key itself.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let map = translations();

    let desired = lang.unwrap_or(DEFAULT_LANG);

    let val = map
        .get(desired)
        .and_then(|m| m.get(key))
        .cloned()
        .or_else(|| map.get(DEFAULT_LANG).and_then(|m| m.get(key)).cloned())
        .unwrap_or_else(|| key.to_string());

    match params {
        Some(params) => params
            .iter()
            .fold(val, |s, (k, v)| s.replace(&format!("{{{}}}", k), v)),
        None => val,
    }
}
