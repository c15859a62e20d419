/// Unlock ledger: per-animal found counts, persisted across sessions.
///
/// ## Storage
///   A flat key-value store. One key per animal: `found_<animal_id>`,
///   value = the count as a decimal string. Counts are read once at
///   startup (missing or unparsable = 0) and written through on every
///   increment.
///
/// ## File format (`progress.dat`)
///   ```
///   found_cow=7
///   found_pig=2
///   ```
///   Written to a temp file, then renamed over the old one, so a crash
///   mid-write leaves the previous counts intact.
///
/// Counts only ever go up. Persistence failures are logged and ignored:
/// the in-memory count still advances and the game keeps running.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::animal::Catalog;
use crate::domain::rules;
use crate::error::StoreError;

pub const KEY_PREFIX: &str = "found_";
const PROGRESS_FILE: &str = "progress.dat";

pub fn key_for(animal_id: &str) -> String {
    format!("{KEY_PREFIX}{animal_id}")
}

// ══════════════════════════════════════════════════════════════
// Key-value stores
// ══════════════════════════════════════════════════════════════

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store (tests, or when no writable directory exists).
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    #[allow(dead_code)]
    pub fn with_entries(pairs: &[(&str, &str)]) -> Self {
        MemoryStore {
            entries: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            read_only: false,
        }
    }

    /// A store whose writes always fail.
    #[allow(dead_code)]
    pub fn read_only(pairs: &[(&str, &str)]) -> Self {
        MemoryStore { read_only: true, ..MemoryStore::with_entries(pairs) }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only { return Err(StoreError::ReadOnly); }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store. The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. A missing file is an
    /// empty store; any other read error is returned.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => parse_entries(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(FileStore { path, entries })
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serialize_entries(&self.entries)).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

fn parse_entries(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn serialize_entries(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(entries.len() * 16);
    for (k, v) in entries {
        out.push_str(&format!("{k}={v}\n"));
    }
    out
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Where `progress.dat` lives.
///
/// `override_dir` (from config) wins. Otherwise: the executable's
/// directory if writable, then `~/.local/share/hidden-animals`, then CWD.
pub fn progress_path(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.join(PROGRESS_FILE);
    }
    save_dir().join(PROGRESS_FILE)
}

fn save_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs (/usr/games/...) are not writable
            let probe = parent.join(".write_test_hidden_animals");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/hidden-animals");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Ledger
// ══════════════════════════════════════════════════════════════

pub struct UnlockLedger {
    store: Box<dyn KeyValueStore>,
    counts: HashMap<String, u32>,
}

impl UnlockLedger {
    /// Read the count of every catalog animal from `store`.
    pub fn load(store: Box<dyn KeyValueStore>, catalog: &Catalog) -> Self {
        let mut counts = HashMap::with_capacity(catalog.len());
        for animal in catalog.iter() {
            let key = key_for(animal.id);
            let count = match store.get(&key) {
                None => 0,
                Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
                    warn!(%key, value = %raw, "unparsable found count, treating as 0");
                    0
                }),
            };
            counts.insert(animal.id.to_string(), count);
        }
        debug!(?counts, "unlock ledger loaded");
        UnlockLedger { store, counts }
    }

    /// Ledger over an empty in-memory store.
    pub fn in_memory(catalog: &Catalog) -> Self {
        UnlockLedger::load(Box::new(MemoryStore::default()), catalog)
    }

    pub fn count_for(&self, animal_id: &str) -> u32 {
        self.counts.get(animal_id).copied().unwrap_or(0)
    }

    /// Add one find and write it through. Returns the new count.
    pub fn record_found(&mut self, animal_id: &str) -> u32 {
        let count = self.counts.entry(animal_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        let new_count = *count;
        if let Err(e) = self.store.set(&key_for(animal_id), &new_count.to_string()) {
            warn!(animal_id, count = new_count, error = %e, "failed to persist found count");
        }
        new_count
    }

    pub fn is_unlocked(&self, catalog: &Catalog, index: usize) -> bool {
        rules::is_unlocked(catalog.as_slice(), index, |id| self.count_for(id))
    }

    pub fn unlock_flags(&self, catalog: &Catalog) -> Vec<bool> {
        rules::unlock_flags(catalog.as_slice(), |id| self.count_for(id))
    }

    pub fn finds_remaining(&self, catalog: &Catalog, index: usize) -> Option<u32> {
        rules::finds_remaining(catalog.as_slice(), index, |id| self.count_for(id))
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
