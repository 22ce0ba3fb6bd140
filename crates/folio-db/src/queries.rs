use crate::Database;
use crate::models::{DocumentRow, ListOrder};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

impl Database {
    /// Insert a new document and return the identifier the store assigned.
    pub fn insert_document(
        &self,
        collection: &str,
        body: &str,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (collection, id, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    collection,
                    &id,
                    body,
                    created_at.map(format_timestamp),
                    updated_at.map(format_timestamp),
                ],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn list_documents(&self, collection: &str, order: ListOrder) -> Result<Vec<DocumentRow>> {
        self.with_conn(|conn| query_documents(conn, collection, order))
    }

    pub fn get_document(&self, collection: &str, id: &str) -> Result<Option<DocumentRow>> {
        self.with_conn(|conn| query_document(conn, collection, id))
    }

    /// Replace a document's body wholesale. `created_at` is never touched;
    /// `updated_at` is overwritten only when one is given.
    /// Returns false when no document matched.
    pub fn replace_document(
        &self,
        collection: &str,
        id: &str,
        body: &str,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE documents
                 SET body = ?1, updated_at = COALESCE(?2, updated_at)
                 WHERE collection = ?3 AND id = ?4",
                rusqlite::params![body, updated_at.map(format_timestamp), collection, id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Returns false when no document matched.
    pub fn delete_document(&self, collection: &str, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                [collection, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn count_documents(&self, collection: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                [collection],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }
}

/// Fixed-width RFC 3339 so that string order in SQLite equals time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|ts| ts.with_timezone(&Utc))
            .with_context(|| format!("corrupt timestamp '{}'", s))
    })
    .transpose()
}

type RawRow = (String, String, Option<String>, Option<String>);

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_document((id, body, created_at, updated_at): RawRow) -> Result<DocumentRow> {
    Ok(DocumentRow {
        created_at: parse_timestamp(created_at).with_context(|| format!("document {}", id))?,
        updated_at: parse_timestamp(updated_at).with_context(|| format!("document {}", id))?,
        id,
        body,
    })
}

fn query_documents(conn: &Connection, collection: &str, order: ListOrder) -> Result<Vec<DocumentRow>> {
    let sql = match order {
        ListOrder::NewestFirst => {
            "SELECT id, body, created_at, updated_at FROM documents
             WHERE collection = ?1
             ORDER BY created_at DESC, rowid DESC"
        }
        ListOrder::Unordered => {
            "SELECT id, body, created_at, updated_at FROM documents WHERE collection = ?1"
        }
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([collection], read_raw)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(into_document).collect()
}

fn query_document(conn: &Connection, collection: &str, id: &str) -> Result<Option<DocumentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, body, created_at, updated_at FROM documents
         WHERE collection = ?1 AND id = ?2",
    )?;

    let row = stmt.query_row([collection, id], read_raw).optional()?;

    row.map(into_document).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn insert_assigns_distinct_ids() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_document("blogs", r#"{"title":"a"}"#, Some(at(0)), Some(at(0))).unwrap();
        let b = db.insert_document("blogs", r#"{"title":"b"}"#, Some(at(0)), Some(at(0))).unwrap();
        assert_ne!(a, b);
        assert!(a.parse::<Uuid>().is_ok());

        let row = db.get_document("blogs", &a).unwrap().unwrap();
        assert_eq!(row.body, r#"{"title":"a"}"#);
        assert_eq!(row.created_at, Some(at(0)));
    }

    #[test]
    fn collections_are_isolated() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_document("blogs", "{}", None, None).unwrap();
        assert!(db.get_document("projects", &id).unwrap().is_none());
        assert!(!db.delete_document("projects", &id).unwrap());
        assert_eq!(db.count_documents("blogs").unwrap(), 1);
        assert_eq!(db.count_documents("projects").unwrap(), 0);
    }

    #[test]
    fn newest_first_sorts_on_created_at_not_insert_order() {
        let db = Database::open_in_memory().unwrap();
        db.insert_document("blogs", r#""middle""#, Some(at(10)), None).unwrap();
        db.insert_document("blogs", r#""oldest""#, Some(at(1)), None).unwrap();
        db.insert_document("blogs", r#""newest""#, Some(at(20)), None).unwrap();

        let bodies: Vec<String> = db
            .list_documents("blogs", ListOrder::NewestFirst)
            .unwrap()
            .into_iter()
            .map(|r| r.body)
            .collect();
        assert_eq!(bodies, vec![r#""newest""#, r#""middle""#, r#""oldest""#]);
    }

    #[test]
    fn replace_keeps_created_at_and_refreshes_updated_at() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_document("projects", r#"{"v":1}"#, Some(at(0)), Some(at(0))).unwrap();

        assert!(db.replace_document("projects", &id, r#"{"v":2}"#, Some(at(5))).unwrap());

        let row = db.get_document("projects", &id).unwrap().unwrap();
        assert_eq!(row.body, r#"{"v":2}"#);
        assert_eq!(row.created_at, Some(at(0)));
        assert_eq!(row.updated_at, Some(at(5)));
    }

    #[test]
    fn replace_and_delete_report_missing_documents() {
        let db = Database::open_in_memory().unwrap();
        let missing = Uuid::new_v4().to_string();
        assert!(!db.replace_document("blogs", &missing, "{}", Some(at(0))).unwrap());

        let id = db.insert_document("blogs", "{}", None, None).unwrap();
        assert!(db.delete_document("blogs", &id).unwrap());
        assert!(!db.delete_document("blogs", &id).unwrap());
    }

    #[test]
    fn timestamps_keep_microseconds() {
        let db = Database::open_in_memory().unwrap();
        let ts = at(0) + chrono::Duration::microseconds(123_456);
        let id = db.insert_document("contacts", "{}", Some(ts), None).unwrap();
        let row = db.get_document("contacts", &id).unwrap().unwrap();
        assert_eq!(row.created_at, Some(ts));
        assert_eq!(row.updated_at, None);
    }

    #[test]
    fn on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.db");

        let id = {
            let db = Database::open(&path).unwrap();
            db.insert_document("about", r#"{"bio":"hi"}"#, None, Some(at(3))).unwrap()
        };

        let db = Database::open(&path).unwrap();
        let row = db.get_document("about", &id).unwrap().unwrap();
        assert_eq!(row.body, r#"{"bio":"hi"}"#);
        assert_eq!(row.updated_at, Some(at(3)));
    }
}
