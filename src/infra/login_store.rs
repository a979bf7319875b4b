// ============================================================
// Layer 6 - Login Record Stores
// ============================================================
// Where the chat login gate writes its presence records.
//
//   file         - append-only JSON lines, one record per line
//   spreadsheet  - CSV with header Name,Employee_ID,Login_Time
//   relational   - SQLite table login_records
//
// Every failure comes back as ChatbotError::ExternalStore; the
// chat surface turns that into a soft warning.

use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use rusqlite::{params, Connection};

use crate::domain::error::{ChatbotError, ChatbotResult};
use crate::domain::session::LoginRecord;
use crate::domain::traits::LoginStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceBackend {
    #[default]
    File,
    Spreadsheet,
    Relational,
}

impl PersistenceBackend {
    /// File name used when the caller does not pick a path.
    pub fn default_path(self) -> &'static str {
        match self {
            PersistenceBackend::File        => "login_records.jsonl",
            PersistenceBackend::Spreadsheet => "login_records.csv",
            PersistenceBackend::Relational  => "login_records.db",
        }
    }
}

impl fmt::Display for PersistenceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceBackend::File        => f.write_str("file"),
            PersistenceBackend::Spreadsheet => f.write_str("spreadsheet"),
            PersistenceBackend::Relational  => f.write_str("relational"),
        }
    }
}

impl FromStr for PersistenceBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json"         => Ok(PersistenceBackend::File),
            "spreadsheet" | "csv"   => Ok(PersistenceBackend::Spreadsheet),
            "relational" | "sqlite" => Ok(PersistenceBackend::Relational),
            other => Err(format!(
                "unknown persistence backend '{other}' (expected file, spreadsheet or relational)"
            )),
        }
    }
}

/// Open the store for `backend` at `path`.
pub fn open_login_store(backend: PersistenceBackend, path: impl AsRef<Path>) -> ChatbotResult<Box<dyn LoginStore>> {
    let path = path.as_ref();
    tracing::debug!("Opening {} login store at '{}'", backend, path.display());
    Ok(match backend {
        PersistenceBackend::File        => Box::new(FileLoginStore::new(path)),
        PersistenceBackend::Spreadsheet => Box::new(SpreadsheetLoginStore::new(path)),
        PersistenceBackend::Relational  => Box::new(RelationalLoginStore::open(path)?),
    })
}

fn store_err(path: &Path, e: impl fmt::Display) -> ChatbotError {
    ChatbotError::ExternalStore(format!("'{}': {e}", path.display()))
}

fn ensure_parent(path: &Path) -> ChatbotResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| store_err(parent, e))
        }
        _ => Ok(()),
    }
}

// ─── JSON lines ───────────────────────────────────────────────────────────────
pub struct FileLoginStore {
    path: PathBuf,
}

impl FileLoginStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LoginStore for FileLoginStore {
    fn record(&self, record: &LoginRecord) -> ChatbotResult<()> {
        ensure_parent(&self.path)?;
        let line = serde_json::to_string(record).map_err(|e| store_err(&self.path, e))?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| store_err(&self.path, e))?;
        writeln!(f, "{line}").map_err(|e| store_err(&self.path, e))
    }

    fn load_all(&self) -> ChatbotResult<Vec<LoginRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let f = fs::File::open(&self.path).map_err(|e| store_err(&self.path, e))?;
        let mut records = Vec::new();
        for line in BufReader::new(f).lines() {
            let line = line.map_err(|e| store_err(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line).map_err(|e| store_err(&self.path, e))?);
        }
        Ok(records)
    }
}

// ─── CSV ──────────────────────────────────────────────────────────────────────
pub const SPREADSHEET_HEADER: [&str; 3] = ["Name", "Employee_ID", "Login_Time"];

pub struct SpreadsheetLoginStore {
    path: PathBuf,
}

impl SpreadsheetLoginStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LoginStore for SpreadsheetLoginStore {
    fn record(&self, record: &LoginRecord) -> ChatbotResult<()> {
        ensure_parent(&self.path)?;
        let is_new = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| store_err(&self.path, e))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if is_new {
            writer.write_record(SPREADSHEET_HEADER).map_err(|e| store_err(&self.path, e))?;
        }
        writer.serialize(record).map_err(|e| store_err(&self.path, e))?;
        writer.flush().map_err(|e| store_err(&self.path, e))
    }

    fn load_all(&self) -> ChatbotResult<Vec<LoginRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| store_err(&self.path, e))?;
        reader
            .deserialize()
            .collect::<Result<Vec<LoginRecord>, _>>()
            .map_err(|e| store_err(&self.path, e))
    }
}

// ─── SQLite ───────────────────────────────────────────────────────────────────
pub struct RelationalLoginStore {
    conn: Connection,
    path: PathBuf,
}

impl RelationalLoginStore {
    pub fn open(path: impl Into<PathBuf>) -> ChatbotResult<Self> {
        let path = path.into();
        ensure_parent(&path)?;
        let conn = Connection::open(&path).map_err(|e| store_err(&path, e))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS login_records (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                employee_id TEXT NOT NULL,
                login_time  TEXT NOT NULL
            );",
        )
        .map_err(|e| store_err(&path, e))?;
        Ok(Self { conn, path })
    }
}

impl LoginStore for RelationalLoginStore {
    fn record(&self, record: &LoginRecord) -> ChatbotResult<()> {
        self.conn
            .execute(
                "INSERT INTO login_records (name, employee_id, login_time) VALUES (?1, ?2, ?3)",
                params![record.name, record.employee_id, record.login_time],
            )
            .map_err(|e| store_err(&self.path, e))?;
        Ok(())
    }

    fn load_all(&self) -> ChatbotResult<Vec<LoginRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, employee_id, login_time FROM login_records ORDER BY id")
            .map_err(|e| store_err(&self.path, e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LoginRecord {
                    name:        row.get(0)?,
                    employee_id: row.get(1)?,
                    login_time:  row.get(2)?,
                })
            })
            .map_err(|e| store_err(&self.path, e))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|e| store_err(&self.path, e))
    }
}
