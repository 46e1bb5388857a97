//! Durable storage for the two catalog collections.
//!
//! Collections are written as newline-delimited JSON (JSONL), one entity
//! per line. Every save truncates and rewrites the whole file; a crash
//! mid-write can leave a partial file behind.

use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Content, User};

/// Errors raised while reading or writing a collection
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed record at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Load/save contract the store delegates durability to
pub trait Persistence {
    fn load_content(&self) -> Result<Vec<Content>, PersistenceError>;

    fn load_users(&self) -> Result<Vec<User>, PersistenceError>;

    /// Replace the stored content collection
    fn save_content(&self, content: &[&Content]) -> Result<(), PersistenceError>;

    /// Replace the stored user collection
    fn save_users(&self, users: &[&User]) -> Result<(), PersistenceError>;
}

/// File-backed persistence using one JSONL file per collection
#[derive(Debug, Clone)]
pub struct JsonlPersistence {
    content_path: PathBuf,
    users_path: PathBuf,
}

impl JsonlPersistence {
    pub fn new(content_path: impl Into<PathBuf>, users_path: impl Into<PathBuf>) -> Self {
        Self {
            content_path: content_path.into(),
            users_path: users_path.into(),
        }
    }

    /// Build from the resolved configuration
    pub fn from_config(config: &crate::config::ResolvedConfig) -> Self {
        Self::new(config.content_file.clone(), config.users_file.clone())
    }

    pub fn content_path(&self) -> &Path {
        &self.content_path
    }

    pub fn users_path(&self) -> &Path {
        &self.users_path
    }
}

impl Persistence for JsonlPersistence {
    fn load_content(&self) -> Result<Vec<Content>, PersistenceError> {
        read_jsonl(&self.content_path)
    }

    fn load_users(&self) -> Result<Vec<User>, PersistenceError> {
        read_jsonl(&self.users_path)
    }

    fn save_content(&self, content: &[&Content]) -> Result<(), PersistenceError> {
        write_jsonl(&self.content_path, content)
    }

    fn save_users(&self, users: &[&User]) -> Result<(), PersistenceError> {
        write_jsonl(&self.users_path, users)
    }
}

/// Read every record until EOF; a missing file is an empty collection
fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, PersistenceError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let io_err = |source: std::io::Error| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| PersistenceError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }

    debug!(path = %path.display(), records = records.len(), "Loaded collection");
    Ok(records)
}

/// Overwrite `path` with one JSON line per record
fn write_jsonl<T: Serialize>(path: &Path, records: &[&T]) -> Result<(), PersistenceError> {
    let io_err = |source: std::io::Error| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;

    debug!(path = %path.display(), records = records.len(), "Saved collection");
    Ok(())
}

/// In-memory persistence that keeps the last saved snapshots
///
/// Useful for embedding the store without durability and for observing
/// which collections a mutation wrote.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    content: RefCell<Vec<Content>>,
    users: RefCell<Vec<User>>,
    content_saves: Cell<usize>,
    user_saves: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously "stored" collections
    pub fn seeded(content: Vec<Content>, users: Vec<User>) -> Self {
        Self {
            content: RefCell::new(content),
            users: RefCell::new(users),
            ..Self::default()
        }
    }

    /// Make every subsequent save fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn content_saves(&self) -> usize {
        self.content_saves.get()
    }

    pub fn user_saves(&self) -> usize {
        self.user_saves.get()
    }

    pub fn stored_content(&self) -> Vec<Content> {
        self.content.borrow().clone()
    }

    pub fn stored_users(&self) -> Vec<User> {
        self.users.borrow().clone()
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.fail_writes.get() {
            return Err(PersistenceError::Unavailable(
                "writes disabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl Persistence for MemoryPersistence {
    fn load_content(&self) -> Result<Vec<Content>, PersistenceError> {
        Ok(self.content.borrow().clone())
    }

    fn load_users(&self) -> Result<Vec<User>, PersistenceError> {
        Ok(self.users.borrow().clone())
    }

    fn save_content(&self, content: &[&Content]) -> Result<(), PersistenceError> {
        self.check_writable()?;
        *self.content.borrow_mut() = content.iter().map(|c| (*c).clone()).collect();
        self.content_saves.set(self.content_saves.get() + 1);
        Ok(())
    }

    fn save_users(&self, users: &[&User]) -> Result<(), PersistenceError> {
        self.check_writable()?;
        *self.users.borrow_mut() = users.iter().map(|u| (*u).clone()).collect();
        self.user_saves.set(self.user_saves.get() + 1);
        Ok(())
    }
}
