//! Database row types. Distinct from folio-types API models to keep the DB
//! layer independent of any particular collection's schema.

use chrono::{DateTime, Utc};

pub struct DocumentRow {
    pub id: String,
    /// JSON object holding the collection's own fields.
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Descending `created_at`; ties broken by most recent insert.
    NewestFirst,
    /// Whatever order SQLite returns.
    Unordered,
}
