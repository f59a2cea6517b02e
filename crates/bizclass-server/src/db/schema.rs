// db/schema.rs
// Taxonomy schema and migrations

use anyhow::Result;
use rusqlite::Connection;

/// Run all schema setup and migrations.
///
/// Idempotent: tables are created with IF NOT EXISTS and migrations check for
/// existing columns before altering.
pub fn run_all_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_topic_accuracy(conn)?;
    Ok(())
}

/// Older databases stored topic mappings without a calibration weight.
fn migrate_topic_accuracy(conn: &Connection) -> Result<()> {
    if !column_exists(conn, "industry_topics", "accuracy")? {
        tracing::info!("Adding accuracy column to industry_topics");
        conn.execute_batch(
            "ALTER TABLE industry_topics ADD COLUMN accuracy REAL NOT NULL DEFAULT 0.5;",
        )?;
    }
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|n| n == column))
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS industries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    description TEXT
);

-- Single words or multi-word phrases, lowercase
CREATE TABLE IF NOT EXISTS industry_keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    industry_id INTEGER NOT NULL REFERENCES industries(id) ON DELETE CASCADE,
    keyword TEXT NOT NULL,
    weight REAL NOT NULL DEFAULT 0.5,
    UNIQUE(industry_id, keyword)
);
CREATE INDEX IF NOT EXISTS idx_industry_keywords_keyword ON industry_keywords(keyword);

-- relevance: how strongly the topic indicates the industry
-- accuracy: historical classification accuracy of this mapping (calibration)
CREATE TABLE IF NOT EXISTS industry_topics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic TEXT NOT NULL,
    industry_id INTEGER NOT NULL REFERENCES industries(id) ON DELETE CASCADE,
    relevance REAL NOT NULL DEFAULT 0.5,
    accuracy REAL NOT NULL DEFAULT 0.5,
    UNIQUE(topic, industry_id)
);

-- keyword x entity co-occurrence patterns
CREATE TABLE IF NOT EXISTS keyword_patterns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL,
    entity TEXT NOT NULL,
    industry_id INTEGER NOT NULL REFERENCES industries(id) ON DELETE CASCADE,
    strength REAL NOT NULL DEFAULT 0.5,
    UNIQUE(keyword, entity, industry_id)
);
CREATE INDEX IF NOT EXISTS idx_keyword_patterns_pair ON keyword_patterns(keyword, entity);

CREATE TABLE IF NOT EXISTS classification_codes (
    code_type TEXT NOT NULL,
    code TEXT NOT NULL,
    description TEXT NOT NULL,
    PRIMARY KEY (code_type, code)
);

CREATE TABLE IF NOT EXISTS industry_codes (
    industry_id INTEGER NOT NULL REFERENCES industries(id) ON DELETE CASCADE,
    code_type TEXT NOT NULL,
    code TEXT NOT NULL,
    relevance REAL NOT NULL DEFAULT 0.5,
    PRIMARY KEY (industry_id, code_type, code)
);

CREATE TABLE IF NOT EXISTS code_keywords (
    code_type TEXT NOT NULL,
    code TEXT NOT NULL,
    keyword TEXT NOT NULL,
    weight REAL NOT NULL DEFAULT 0.5,
    PRIMARY KEY (code_type, code, keyword)
);
CREATE INDEX IF NOT EXISTS idx_code_keywords_keyword ON code_keywords(keyword);

CREATE TABLE IF NOT EXISTS code_crosswalks (
    from_type TEXT NOT NULL,
    from_code TEXT NOT NULL,
    to_type TEXT NOT NULL,
    to_code TEXT NOT NULL,
    confidence REAL NOT NULL DEFAULT 0.8,
    PRIMARY KEY (from_type, from_code, to_type, to_code)
);

-- Second-tier result cache shared between processes
CREATE TABLE IF NOT EXISTS classification_cache (
    cache_key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_classification_cache_expires ON classification_cache(expires_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_all_migrations(&conn).unwrap();
        run_all_migrations(&conn).unwrap();
        assert!(column_exists(&conn, "industry_topics", "accuracy").unwrap());
    }

    #[test]
    fn test_accuracy_migration_on_legacy_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE industries (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, category TEXT NOT NULL, description TEXT);
             CREATE TABLE industry_topics (id INTEGER PRIMARY KEY, topic TEXT NOT NULL, industry_id INTEGER NOT NULL, relevance REAL NOT NULL DEFAULT 0.5, UNIQUE(topic, industry_id));",
        )
        .unwrap();
        assert!(!column_exists(&conn, "industry_topics", "accuracy").unwrap());
        run_all_migrations(&conn).unwrap();
        assert!(column_exists(&conn, "industry_topics", "accuracy").unwrap());
    }
}
