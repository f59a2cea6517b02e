// db/pool.rs
// Async connection pool using deadpool-sqlite
//
// # Async Database Access Patterns
//
// ## Preferred Pattern: pool.run()
// Use `pool.run()` from store implementations. It converts errors to
// `ClassifierError` automatically:
// ```ignore
// let hits = pool.run(move |conn| lookup_keywords(conn, &keywords)).await?;
// ```
//
// ## Lower-Level: pool.interact()
// Use `pool.interact()` when you need `anyhow::Result`, e.g. in migrations
// and seeding.
//
// ## In-memory testing
// Use the shared cache URI (`file:memdb_xxx?mode=memory&cache=shared`) so all
// pool connections see the same database state. `open_in_memory()` does this.

use crate::error::ClassifierError;
use anyhow::{Context, Result};
use deadpool_sqlite::{Config, Hook, Pool, Runtime};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Check if a rusqlite error is SQLITE_BUSY or SQLITE_LOCKED.
///
/// SQLITE_BUSY occurs with file-based databases under write contention.
/// SQLITE_LOCKED occurs with shared-cache in-memory databases when another
/// connection holds a write lock on the same table.
fn is_rusqlite_contention(err: &rusqlite::Error) -> bool {
    use rusqlite::ffi;
    matches!(
        err,
        rusqlite::Error::SqliteFailure(
            ffi::Error {
                code: ffi::ErrorCode::DatabaseBusy | ffi::ErrorCode::DatabaseLocked,
                ..
            },
            _,
        )
    )
}

fn is_contention(err: &ClassifierError) -> bool {
    match err {
        ClassifierError::Db(rusqlite_err) => is_rusqlite_contention(rusqlite_err),
        _ => false,
    }
}

/// Retry delays for SQLite contention backoff (50ms, 250ms, 1s).
const RETRY_DELAYS: [std::time::Duration; 3] = [
    std::time::Duration::from_millis(50),
    std::time::Duration::from_millis(250),
    std::time::Duration::from_millis(1000),
];

/// Retry an async operation while it keeps failing with SQLite contention.
async fn retry_with_backoff<F, Fut, R, E>(
    mut op: F,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<R, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<R, E>>,
    E: std::fmt::Display,
{
    for (attempt, delay) in RETRY_DELAYS.iter().enumerate() {
        match op().await {
            Ok(result) => return Ok(result),
            Err(e) if is_retryable(&e) => {
                tracing::warn!(
                    "SQLite contention on attempt {}/{}, retrying in {:?}",
                    attempt + 1,
                    RETRY_DELAYS.len(),
                    delay
                );
                tokio::time::sleep(*delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    // Final attempt (no retry after this)
    op().await
}

/// Database pool wrapper with per-connection setup.
pub struct DatabasePool {
    pool: Pool,
}

/// Whether to use a file path or shared in-memory URI.
enum DbStorage {
    File(PathBuf),
    InMemory,
}

impl DatabasePool {
    /// Open a pooled database at the given path.
    pub async fn open(path: &Path) -> Result<Self> {
        Self::open_internal(DbStorage::File(path.to_path_buf())).await
    }

    /// Open a pooled in-memory database.
    ///
    /// Uses a shared cache URI so all connections access the same in-memory database.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open_internal(DbStorage::InMemory).await
    }

    async fn open_internal(storage: DbStorage) -> Result<Self> {
        let (conn_str, hook) = match storage {
            DbStorage::File(p) => {
                ensure_parent_directory(&p)?;
                let s = p.to_string_lossy().to_string();
                (s, make_file_post_create_hook(p))
            }
            DbStorage::InMemory => {
                let uri = format!(
                    "file:memdb_{}?mode=memory&cache=shared",
                    uuid::Uuid::new_v4().simple()
                );
                (uri, make_memory_post_create_hook())
            }
        };

        let cfg = Config::new(&conn_str);
        let pool = cfg
            .builder(Runtime::Tokio1)
            .context("Failed to create pool builder")?
            .max_size(8)
            .post_create(hook)
            .build()
            .context("Failed to build connection pool")?;

        let db_pool = Self { pool };
        db_pool.run_migrations().await?;
        Ok(db_pool)
    }

    /// Run a closure with a connection from the pool.
    ///
    /// The closure runs on the blocking thread pool, so it won't block the
    /// async runtime.
    pub async fn interact<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get connection from pool")?;

        conn.interact(move |conn| f(conn))
            .await
            .map_err(|e| anyhow::anyhow!("interact failed: {e}"))?
    }

    /// Run a closure and convert every failure into `ClassifierError`.
    pub async fn run<F, R, E>(&self, f: F) -> Result<R, ClassifierError>
    where
        F: FnOnce(&Connection) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: Into<ClassifierError> + Send + 'static,
    {
        self.pool
            .get()
            .await
            .map_err(|e| ClassifierError::Store(format!("Failed to get connection: {}", e)))?
            .interact(move |conn| f(conn).map_err(Into::into))
            .await
            .map_err(|e| ClassifierError::Store(format!("Database error: {}", e)))?
    }

    /// Like [`run`](Self::run) but with retry on SQLite contention errors.
    ///
    /// The closure must be `Clone` to support retries.
    pub async fn run_with_retry<F, R, E>(&self, f: F) -> Result<R, ClassifierError>
    where
        F: FnOnce(&Connection) -> Result<R, E> + Send + Clone + 'static,
        R: Send + 'static,
        E: Into<ClassifierError> + Send + 'static,
    {
        retry_with_backoff(
            || {
                let f_clone = f.clone();
                self.run(f_clone)
            },
            is_contention,
        )
        .await
    }

    async fn run_migrations(&self) -> Result<()> {
        self.interact(|conn| {
            super::schema::run_all_migrations(conn)?;
            if let Err(e) = conn.execute_batch("PRAGMA optimize") {
                tracing::debug!("PRAGMA optimize skipped: {}", e);
            }
            Ok(())
        })
        .await
    }

    /// Connection counts, reported by `/api/stats`.
    pub fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }
}

/// Pool status for monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub size: usize,
    pub available: usize,
    pub waiting: usize,
}

/// Ensure parent directory exists with secure permissions (0o700 on Unix).
fn ensure_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
        #[cfg(unix)]
        {
            let mut perms = std::fs::metadata(parent)?.permissions();
            perms.set_mode(0o700);
            std::fs::set_permissions(parent, perms)?;
        }
    }
    Ok(())
}

/// Create a post_create hook for file-based databases.
fn make_file_post_create_hook(path: PathBuf) -> Hook {
    Hook::async_fn(move |conn, _metrics| {
        let path_for_perms = path.clone();
        Box::pin(async move {
            conn.interact(move |conn| {
                setup_connection(conn)?;

                #[cfg(unix)]
                if let Ok(metadata) = std::fs::metadata(&path_for_perms) {
                    let mut perms = metadata.permissions();
                    perms.set_mode(0o600);
                    if let Err(e) = std::fs::set_permissions(&path_for_perms, perms) {
                        tracing::warn!("Failed to set database file permissions to 0600: {}", e);
                    }
                }
                #[cfg(not(unix))]
                let _ = &path_for_perms;

                Ok::<_, rusqlite::Error>(())
            })
            .await
            .map_err(|e| {
                deadpool_sqlite::HookError::Message(format!("interact failed: {e}").into())
            })?
            .map_err(|e| {
                deadpool_sqlite::HookError::Message(format!("connection setup failed: {e}").into())
            })
        })
    })
}

/// Create a post_create hook for in-memory databases.
///
/// WAL mode is not applicable to in-memory DBs.
fn make_memory_post_create_hook() -> Hook {
    Hook::async_fn(|conn, _metrics| {
        Box::pin(async move {
            conn.interact(|conn| {
                conn.execute_batch(
                    "PRAGMA foreign_keys=ON; \
                     PRAGMA busy_timeout=5000;",
                )?;
                Ok::<_, rusqlite::Error>(())
            })
            .await
            .map_err(|e| {
                deadpool_sqlite::HookError::Message(format!("interact failed: {e}").into())
            })?
            .map_err(|e| {
                deadpool_sqlite::HookError::Message(format!("connection setup failed: {e}").into())
            })
        })
    })
}

/// Configure a connection after it's created.
fn setup_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL; \
         PRAGMA foreign_keys=ON; \
         PRAGMA busy_timeout=5000; \
         PRAGMA synchronous=NORMAL;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_in_memory() {
        let pool = DatabasePool::open_in_memory()
            .await
            .expect("Failed to open in-memory pool");

        let id = pool
            .interact(|conn| {
                conn.execute(
                    "INSERT INTO industries (name, category) VALUES (?, ?)",
                    rusqlite::params!["Test Industry", "test"],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .expect("Failed to insert");
        assert!(id > 0);

        // Verify from another connection in the pool (tests shared cache)
        let name: String = pool
            .run(move |conn| {
                conn.query_row("SELECT name FROM industries WHERE id = ?", [id], |row| {
                    row.get(0)
                })
            })
            .await
            .expect("Failed to query");
        assert_eq!(name, "Test Industry");
    }

    #[tokio::test]
    async fn test_pool_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("taxonomy.db");
        let pool = DatabasePool::open(&path).await.expect("open file pool");
        assert!(path.exists());
        assert_eq!(pool.status().waiting, 0);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let pool = std::sync::Arc::new(
            DatabasePool::open_in_memory()
                .await
                .expect("Failed to open pool"),
        );

        let mut handles = Vec::new();
        for i in 0..10 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.run_with_retry(move |conn| {
                    conn.execute(
                        "INSERT INTO industries (name, category) VALUES (?, ?)",
                        rusqlite::params![format!("industry-{i}"), "test"],
                    )
                })
                .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().expect("Insert failed");
        }

        let count: i64 = pool
            .run(|conn| conn.query_row("SELECT COUNT(*) FROM industries", [], |row| row.get(0)))
            .await
            .expect("Count failed");
        assert_eq!(count, 10);
    }

    #[tokio::test]
    async fn test_pool_status() {
        let pool = DatabasePool::open_in_memory().await.unwrap();
        let status = pool.status();
        assert!(status.size <= 8);
    }
}
