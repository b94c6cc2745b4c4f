//! Loan entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Book, UserId};

/// A borrowed book joined with the contact details of the user holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub book: Book,
    pub borrower_id: UserId,
    pub borrower_name: String,
    pub borrower_email: String,
}

/// Half-open interval `(after, until]` of due dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub after: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl DueWindow {
    /// Creates a window covering `(after, until]`.
    pub fn new(after: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self { after, until }
    }

    /// Returns true if `due` falls inside the window.
    pub fn contains(&self, due: DateTime<Utc>) -> bool {
        due > self.after && due <= self.until
    }
}
