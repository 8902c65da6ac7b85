// Local SQLite driver

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::{DatabaseDriver, DriverConnection, EMPLOYEES_QUERY};
use crate::error::DriverError;
use crate::models::BackendId;

/// Path value that selects a seeded in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Sample rows from the classic `employees` dataset
const DEMO_EMPLOYEES: &[(i64, &str, &str)] = &[
    (10001, "Georgi", "Facello"),
    (10002, "Bezalel", "Simmel"),
    (10003, "Parto", "Bamford"),
    (10004, "Chirstian", "Koblick"),
    (10005, "Kyoichi", "Maliniak"),
    (10006, "Anneke", "Preusig"),
    (10007, "Tzvetan", "Zielinski"),
    (10008, "Saniya", "Kalloufi"),
    (10009, "Sumant", "Peac"),
    (10010, "Duangkaew", "Piveteau"),
    (10011, "Mary", "Sluis"),
    (10012, "Patricio", "Bridgland"),
];

/// Where the SQLite driver reads from
#[derive(Debug, Clone, PartialEq)]
pub enum SqliteSource {
    /// A fresh in-memory database seeded on every connect
    InMemory,
    /// An existing database file, opened read-only
    File(PathBuf),
}

/// Driver reading from a local SQLite database
pub struct SqliteDriver {
    source: SqliteSource,
}

impl SqliteDriver {
    pub fn new(source: SqliteSource) -> Self {
        Self { source }
    }

    pub fn in_memory() -> Self {
        Self::new(SqliteSource::InMemory)
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn backend(&self) -> BackendId {
        BackendId::new("sqlite")
    }

    async fn connect(&self) -> Result<Box<dyn DriverConnection>, DriverError> {
        let source = self.source.clone();
        let conn = run_blocking(move || SqliteConnection::open(&source)).await?;
        Ok(Box::new(conn))
    }
}

/// rusqlite calls block; keep them off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, DriverError>
where
    F: FnOnce() -> Result<T, DriverError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DriverError::Query(format!("sqlite task failed: {}", e)))?
}

struct SqliteConnection {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteConnection {
    fn open(source: &SqliteSource) -> Result<Self, DriverError> {
        let conn = match source {
            SqliteSource::InMemory => {
                let conn = Connection::open_in_memory()
                    .map_err(|e| DriverError::Connect(e.to_string()))?;
                seed_employees(&conn)?;
                conn
            }
            SqliteSource::File(path) => {
                Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
                    |e| DriverError::Connect(format!("{}: {}", path.display(), e)),
                )?
            }
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl DriverConnection for SqliteConnection {
    async fn read_batch(&mut self) -> Result<Value, DriverError> {
        let conn = Arc::clone(&self.conn);
        run_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| DriverError::Query("sqlite connection lock poisoned".to_string()))?;
            read_employees(&conn)
        })
        .await
    }
}

fn read_employees(conn: &Connection) -> Result<Value, DriverError> {
    let mut stmt = conn.prepare_cached(EMPLOYEES_QUERY)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(json!({
                "emp_no": row.get::<_, i64>(0)?,
                "first_name": row.get::<_, Option<String>>(1)?,
                "last_name": row.get::<_, Option<String>>(2)?,
            }))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::Array(rows))
}

/// Create and fill the `employees` table
pub fn seed_employees(conn: &Connection) -> Result<(), DriverError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS employees (
            emp_no INTEGER PRIMARY KEY,
            first_name TEXT,
            last_name TEXT
        );",
    )?;

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO employees (emp_no, first_name, last_name) VALUES (?1, ?2, ?3)",
    )?;
    for (emp_no, first_name, last_name) in DEMO_EMPLOYEES {
        stmt.execute(rusqlite::params![emp_no, first_name, last_name])?;
    }

    Ok(())
}
