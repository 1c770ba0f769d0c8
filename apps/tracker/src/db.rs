use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-write; the file is created if it does not exist yet.
    Create,
    /// Read-only; the file must exist.
    ReadOnly,
}

/// Opens a small SQLite connection pool for a local database file.
pub async fn open_sqlite(path: &Path, mode: OpenMode) -> Result<SqlitePool, sqlx::Error> {
    info!("Opening SQLite database {}", path.display());

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(mode == OpenMode::Create)
        .read_only(mode == OpenMode::ReadOnly);

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await?;

    Ok(pool)
}
