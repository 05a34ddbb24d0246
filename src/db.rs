use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

pub fn connect(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    info!("Connecting to database {}", path.display());
    let conn =
        Connection::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

#[cfg(test)]
pub fn connect_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Uniqueness lives in expression indexes so a missing link or end date
/// compares equal to another missing one (plain UNIQUE treats NULLs as distinct).
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS persons (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            name         TEXT NOT NULL,
            profile_link TEXT,
            birth_date   TEXT,
            death_date   TEXT,
            occupation   TEXT,
            nationality  TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_persons_identity
            ON persons(name, COALESCE(profile_link, ''));

        CREATE TABLE IF NOT EXISTS tenure_periods (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id  INTEGER NOT NULL REFERENCES persons(id),
            start_date TEXT NOT NULL,
            end_date   TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_periods_identity
            ON tenure_periods(person_id, start_date, COALESCE(end_date, ''));
        CREATE INDEX IF NOT EXISTS idx_periods_person ON tenure_periods(person_id);
        ",
    )?;
    info!("Tables created or verified");
    Ok(())
}

// ── Records ──

/// A contiguous term in office. `end == None` means open-ended or unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenurePeriod {
    pub start: String,
    pub end: Option<String>,
}

impl TenurePeriod {
    /// Trims both sides; a blank end collapses to `None`.
    pub fn new(start: &str, end: Option<&str>) -> Self {
        Self {
            start: start.trim().to_string(),
            end: end.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRecord {
    pub name: String,
    pub profile_link: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub occupation: Option<String>,
    pub nationality: Option<String>,
    pub periods: Vec<TenurePeriod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredPerson {
    pub id: i64,
    #[serde(flatten)]
    pub record: PersonRecord,
}

// ── Writes ──

pub fn person_exists(conn: &Connection, name: &str, profile_link: Option<&str>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM persons
         WHERE name = ?1 AND COALESCE(profile_link, '') = COALESCE(?2, '')",
        params![name, profile_link],
        |r| r.get(0),
    )?;
    let exists = count > 0;
    debug!("Person exists: {} - {}", exists, name);
    Ok(exists)
}

/// Inserts the person row, ignoring a duplicate `(name, profile_link)`.
/// On conflict the id of the already stored row is returned.
pub fn insert_person(conn: &Connection, person: &PersonRecord) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;
    let inserted = tx.execute(
        "INSERT OR IGNORE INTO persons
         (name, profile_link, birth_date, death_date, occupation, nationality)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            person.name,
            person.profile_link,
            person.birth_date,
            person.death_date,
            person.occupation,
            person.nationality,
        ],
    )?;
    let id = if inserted > 0 {
        tx.last_insert_rowid()
    } else {
        find_person_id(&tx, &person.name, person.profile_link.as_deref())?
            .context("Conflicting person row not found")?
    };
    tx.commit()?;
    if inserted > 0 {
        info!("Person inserted: {}", person.name);
    }
    Ok(id)
}

/// Inserts one tenure row, ignoring a duplicate `(person_id, start, end)`.
pub fn insert_period(conn: &Connection, person_id: i64, period: &TenurePeriod) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    let inserted = tx.execute(
        "INSERT OR IGNORE INTO tenure_periods (person_id, start_date, end_date)
         VALUES (?1, ?2, ?3)",
        params![person_id, period.start, period.end],
    )?;
    tx.commit()?;
    if inserted > 0 {
        info!("Period inserted for person ID {}", person_id);
    }
    Ok(())
}

// ── Reads ──

pub fn list_periods(conn: &Connection, person_id: i64) -> Result<Vec<TenurePeriod>> {
    let mut stmt = conn.prepare(
        "SELECT start_date, end_date FROM tenure_periods WHERE person_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![person_id], |row| {
            Ok(TenurePeriod {
                start: row.get(0)?,
                end: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Fetched periods for person ID {}: {} records", person_id, rows.len());
    Ok(rows)
}

pub fn list_persons(conn: &Connection) -> Result<Vec<StoredPerson>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, profile_link, birth_date, death_date, occupation, nationality
         FROM persons ORDER BY id",
    )?;
    let mut persons = stmt
        .query_map([], |row| {
            Ok(StoredPerson {
                id: row.get(0)?,
                record: PersonRecord {
                    name: row.get(1)?,
                    profile_link: row.get(2)?,
                    birth_date: row.get(3)?,
                    death_date: row.get(4)?,
                    occupation: row.get(5)?,
                    nationality: row.get(6)?,
                    periods: Vec::new(),
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for p in &mut persons {
        p.record.periods = list_periods(conn, p.id)?;
    }
    info!("Fetched all persons: {} records", persons.len());
    Ok(persons)
}

pub fn find_person_id(
    conn: &Connection,
    name: &str,
    profile_link: Option<&str>,
) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM persons
             WHERE name = ?1 AND COALESCE(profile_link, '') = COALESCE(?2, '')",
            params![name, profile_link],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

// ── Stats ──

pub struct Stats {
    pub persons: usize,
    pub periods: usize,
    pub without_profile: usize,
    pub open_periods: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let persons: usize = conn.query_row("SELECT COUNT(*) FROM persons", [], |r| r.get(0))?;
    let periods: usize =
        conn.query_row("SELECT COUNT(*) FROM tenure_periods", [], |r| r.get(0))?;
    let without_profile: usize = conn.query_row(
        "SELECT COUNT(*) FROM persons WHERE profile_link IS NULL",
        [],
        |r| r.get(0),
    )?;
    let open_periods: usize = conn.query_row(
        "SELECT COUNT(*) FROM tenure_periods WHERE end_date IS NULL",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        persons,
        periods,
        without_profile,
        open_periods,
    })
}
