//! Recent calculator runs, newest first, capped at [`MAX_ENTRIES`].
//!
//! Persistence is best effort: a failed read loads as empty and a failed
//! write is logged and ignored, leaving the in-memory list as the source of
//! truth.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::{CalculatorInput, Summary};
use crate::error::HistoryError;

pub const MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub input: CalculatorInput,
    pub summary: Summary,
}

pub trait HistoryBackend: Send {
    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError>;
    fn store(&mut self, entries: &[HistoryEntry]) -> Result<(), HistoryError>;
}

/// JSON array on disk.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryBackend for FileBackend {
    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes a sibling temp file and renames it over the target, so readers
    /// see either the old list or the new one.
    fn store(&mut self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let raw = serde_json::to_vec(entries)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&raw)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: Vec<HistoryEntry>,
}

impl HistoryBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self.entries.clone())
    }

    fn store(&mut self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        self.entries = entries.to_vec();
        Ok(())
    }
}

pub struct HistoryStore {
    backend: Box<dyn HistoryBackend>,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Loads whatever the backend holds; unreadable data starts empty.
    pub fn load(backend: impl HistoryBackend + 'static) -> Self {
        let mut entries = match backend.load() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("ignoring unreadable history: {err}");
                Vec::new()
            }
        };
        entries.truncate(MAX_ENTRIES);
        Self {
            backend: Box::new(backend),
            entries,
        }
    }

    pub fn in_memory() -> Self {
        Self::load(MemoryBackend::default())
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn save_entry(
        &mut self,
        input: CalculatorInput,
        summary: Summary,
        name: Option<String>,
    ) -> String {
        let entry = HistoryEntry {
            id: uuid7::uuid7().to_string(),
            timestamp: now_millis(),
            name,
            input,
            summary,
        };
        let id = entry.id.clone();

        self.entries.insert(0, entry);
        self.entries.truncate(MAX_ENTRIES);
        self.persist();
        id
    }

    pub fn delete_entry(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    pub fn get_entry(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn rename_entry(&mut self, id: &str, name: impl Into<String>) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) else {
            return false;
        };
        entry.name = Some(name.into());
        self.persist();
        true
    }

    fn persist(&mut self) {
        if let Err(err) = self.backend.store(&self.entries) {
            warn!("history not persisted: {err}");
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
