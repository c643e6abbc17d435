use std::str::FromStr;

use crate::services::table::{PostedRow, RowUpdate};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FormError {
    #[error("Row {0} posted more than once")]
    DuplicateRow(String),

    #[error("Field {0} refers to an unknown row")]
    UnknownRow(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// Button pressed on the edit page.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    Add,
    Delete(String),
    Refresh,
    Submit,
}

impl FromStr for EditAction {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(EditAction::Add),
            "refresh" => Ok(EditAction::Refresh),
            "submit" => Ok(EditAction::Submit),
            other => match other.strip_prefix("delete:") {
                Some(id) if !id.is_empty() => Ok(EditAction::Delete(id.to_string())),
                _ => Err(FormError::UnknownAction(other.to_string())),
            },
        }
    }
}

/// Decoded edit form.
///
/// Rows are announced by `row=<id>` in table order; their fields arrive as
/// `date.<id>`, `time.<id>`, `location.<id>`, `league.<id>`, `opponent.<id>`
/// and repeated `scouter.<id>`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm {
    pub rows: Vec<PostedRow>,
    pub password: String,
    pub action: EditAction,
}

impl EditForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, FormError> {
        let mut rows: Vec<PostedRow> = Vec::new();
        for (key, value) in &pairs {
            if key == "row" {
                if rows.iter().any(|r| &r.id == value) {
                    return Err(FormError::DuplicateRow(value.clone()));
                }
                rows.push(PostedRow {
                    id: value.clone(),
                    update: RowUpdate::default(),
                });
            }
        }

        let mut password = String::new();
        let mut action = EditAction::Refresh;

        for (key, value) in pairs {
            match key.as_str() {
                "row" => continue,
                "password" => password = value,
                "action" => action = value.parse()?,
                _ => {
                    let Some((field, id)) = key.split_once('.') else {
                        continue;
                    };
                    let row = rows
                        .iter_mut()
                        .find(|r| r.id == id)
                        .ok_or_else(|| FormError::UnknownRow(key.clone()))?;
                    let update = &mut row.update;
                    match field {
                        "date" => update.date = Some(value),
                        "time" => update.time = Some(value),
                        "location" => update.location = Some(value),
                        "league" => update.league = Some(value),
                        "opponent" => update.opponent = Some(value),
                        "scouter" => update.scouters.get_or_insert_with(Vec::new).push(value),
                        _ => {}
                    }
                }
            }
        }

        Ok(EditForm {
            rows,
            password,
            action,
        })
    }
}
