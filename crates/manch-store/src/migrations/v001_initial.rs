//! v001 -- Initial schema creation.
//!
//! One `documents` table holds every namespace: record bodies are flat
//! JSON, `created_at` is denormalized out of the body for the query
//! ordering clause, and `seq` preserves insertion order.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Documents
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS documents (
    namespace  TEXT NOT NULL,
    key        TEXT NOT NULL,          -- UUID v4
    body       TEXT NOT NULL,          -- flat JSON object
    created_at TEXT,                   -- ISO-8601; NULL for legacy rows
    seq        INTEGER NOT NULL,       -- insertion sequence

    PRIMARY KEY (namespace, key)
);

CREATE INDEX IF NOT EXISTS idx_documents_ns_created
    ON documents(namespace, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
