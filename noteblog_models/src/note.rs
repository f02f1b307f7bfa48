use chrono::DateTime;
use chrono::Utc;

use crate::record::record_model;

/// A short text written by a user
///
/// Both dates are set by the server: `created_date` once, `last_modified_date` on every update.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

record_model!(Note, row = NoteRow, changeset = NoteChangeset, table = note);
