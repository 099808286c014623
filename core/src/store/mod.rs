//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine and reports call store methods and never execute SQL directly.

use crate::error::{parse_date, RiskResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

mod complaint;
mod profile;

pub use profile::ScoringRun;

pub struct RiskStore {
    conn: Connection,
}

impl RiskStore {
    pub fn open(path: &str) -> RiskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RiskResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> RiskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_complaints.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_risk_profiles.sql"))?;
        Ok(())
    }

    fn count(&self, sql: &str) -> RiskResult<i64> {
        self.conn
            .query_row(sql, params![], |row| row.get(0))
            .map_err(Into::into)
    }
}

fn date_text(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn opt_date(value: Option<String>) -> RiskResult<Option<NaiveDate>> {
    value.as_deref().map(parse_date).transpose()
}
