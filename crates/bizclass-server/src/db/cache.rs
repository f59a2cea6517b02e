// db/cache.rs
// Shared result cache table (second tier behind the in-process cache)

use rusqlite::{Connection, OptionalExtension, params};

/// Fetch a live entry. Expired rows are treated as absent.
pub fn cache_get_sync(conn: &Connection, key: &str, now: i64) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT payload FROM classification_cache WHERE cache_key = ?1 AND expires_at > ?2",
        params![key, now],
        |row| row.get(0),
    )
    .optional()
}

/// Upsert an entry; the previous payload is replaced, never mutated.
pub fn cache_put_sync(
    conn: &Connection,
    key: &str,
    payload: &str,
    now: i64,
    ttl_secs: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO classification_cache (cache_key, payload, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(cache_key) DO UPDATE SET
            payload = excluded.payload,
            created_at = excluded.created_at,
            expires_at = excluded.expires_at",
        params![key, payload, now, now + ttl_secs],
    )
}

/// Delete expired entries, returning how many were removed
pub fn cache_purge_expired_sync(conn: &Connection, now: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM classification_cache WHERE expires_at <= ?1",
        [now],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_all_migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_all_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_put_get() {
        let conn = conn();
        cache_put_sync(&conn, "k", "{\"a\":1}", 100, 60).unwrap();
        assert_eq!(cache_get_sync(&conn, "k", 120).unwrap().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_expired_is_absent() {
        let conn = conn();
        cache_put_sync(&conn, "k", "v", 100, 60).unwrap();
        assert!(cache_get_sync(&conn, "k", 160).unwrap().is_none());
        assert_eq!(cache_purge_expired_sync(&conn, 160).unwrap(), 1);
    }

    #[test]
    fn test_upsert_replaces() {
        let conn = conn();
        cache_put_sync(&conn, "k", "old", 100, 60).unwrap();
        cache_put_sync(&conn, "k", "new", 110, 60).unwrap();
        assert_eq!(cache_get_sync(&conn, "k", 111).unwrap().as_deref(), Some("new"));
    }
}
