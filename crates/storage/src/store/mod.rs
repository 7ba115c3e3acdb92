#![forbid(unsafe_code)]

mod advisors;
mod error;
mod favorites;
mod reports;
mod requests;
mod schema;
mod shared;
mod sql;

pub use error::StoreError;
pub use requests::*;
pub use shared::SharedStore;

use adv_core::{Advisor, AdvisorId};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, ErrorCode, Row};
use schema::install_schema;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE_NAME: &str = "advisors.db";

/// Unicode lowercase, registered on every connection. SQLite's own `lower()`
/// folds ASCII only.
const FOLD_CASE_FN: &str = "fold_case";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: Option<PathBuf>,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_functions(&conn)?;
        install_schema(&conn)?;

        tracing::info!(path = %db_path.display(), "opened advisors store");
        Ok(Self {
            conn,
            storage_dir: Some(storage_dir),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_functions(&conn)?;
        install_schema(&conn)?;
        Ok(Self {
            conn,
            storage_dir: None,
        })
    }

    /// `None` for in-memory stores.
    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }
}

const ADVISOR_COLUMNS: &str = "id, first_name, last_name, title, firm, branch, team_name, city, province, email, linkedin_url, website_url";

fn advisor_from_row(row: &Row<'_>) -> Result<Advisor, StoreError> {
    let raw_id: String = row.get(0)?;
    let id = AdvisorId::try_new(raw_id).map_err(|_| StoreError::InvalidInput("invalid advisor id"))?;
    Ok(Advisor {
        id,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        title: row.get(3)?,
        firm: row.get(4)?,
        branch: row.get(5)?,
        team_name: row.get(6)?,
        city: row.get(7)?,
        province: row.get(8)?,
        email: row.get(9)?,
        linkedin_url: row.get(10)?,
        website_url: row.get(11)?,
    })
}

fn register_functions(conn: &Connection) -> Result<(), StoreError> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|value| value.to_lowercase()))
        },
    )?;
    Ok(())
}

fn map_insert_conflict(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::NameAlreadyExists;
    }
    StoreError::Sql(err)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message
                    .as_deref()
                    .is_some_and(|value| value.contains("UNIQUE constraint failed"))
        }
        _ => false,
    }
}

fn to_sqlite_i64(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn normalize_name(value: &str) -> Result<String, StoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::InvalidInput("name must not be empty"));
    }
    Ok(value.to_string())
}

fn now_ms() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}
