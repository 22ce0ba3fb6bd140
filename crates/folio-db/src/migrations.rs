use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Every collection shares one table; `collection` partitions it. `body` is
/// the JSON of the resource's own fields, timestamps live in their own
/// columns so listing can sort on them.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            collection  TEXT NOT NULL,
            id          TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT,
            updated_at  TEXT,
            PRIMARY KEY (collection, id)
        );

        CREATE INDEX IF NOT EXISTS idx_documents_created
            ON documents(collection, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
