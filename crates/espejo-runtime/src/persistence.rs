#![forbid(unsafe_code)]

//! Persistence for diary progress and reconstruction records.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ProgressStore                           │
//! │   - Typed load/save for the two persisted records             │
//! │   - JSON encoding via serde_json                              │
//! │   - Falls back to empty progress on unreadable data           │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     StorageBackend                            │
//! │   - MemoryStorage: in-memory (tests, no browser)              │
//! │   - LocalStorage: window.localStorage (espejo-frontend)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Unavailable` | Storage disabled or absent | Load falls back, save returns error |
//! | `StorageError::Backend` | Quota exceeded, host exception | Returned to caller |
//! | `StorageError::Serialization` | Stored value is not valid JSON | Load falls back to empty progress |
//! | `StorageError::Corruption` | Valid JSON of the wrong shape | Load falls back to empty progress |
//! | Missing entry | First visit | Empty progress |

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use espejo_core::diary::{DIARY_DAYS, DiaryProgress};
use espejo_core::generators::ReconstructionRecord;

/// Storage key of the 21-flag diary progress array.
pub const DIARY_PROGRESS_KEY: &str = "diarioEspejoProgress";
/// Storage key of the last reconstruction record.
pub const RECONSTRUCTION_KEY: &str = "reconstruccionIdentidad";

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend is not available (e.g. storage disabled by the browser).
    Unavailable(String),
    /// The backend rejected the operation.
    Backend(String),
    /// Serialization or deserialization error.
    Serialization(String),
    /// Stored data parsed but has the wrong shape.
    Corruption(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
            StorageError::Backend(msg) => write!(f, "storage backend error: {msg}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Storage Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// String key/value storage.
///
/// Methods take `&self`; implementations use interior mutability. Everything
/// runs on the UI thread, so there is no `Send + Sync` requirement.
pub trait StorageBackend {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Read the value stored under `key`, `None` if absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Check if the backend is available and functional.
    fn is_available(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Storage
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory storage backend for tests and storage-less environments.
#[derive(Default)]
pub struct MemoryStorage {
    data: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create memory storage pre-populated with entries.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: RefCell::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.data
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("entries", &self.len())
            .finish()
    }
}

/// Shared handles delegate to the inner backend, so tests can keep a
/// reference to the storage they hand over.
impl<B: StorageBackend + ?Sized> StorageBackend for std::rc::Rc<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Progress Store
// ─────────────────────────────────────────────────────────────────────────────

/// Typed access to the persisted records.
pub struct ProgressStore {
    backend: Box<dyn StorageBackend>,
}

impl ProgressStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Name of the underlying backend.
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Read diary progress, reporting every failure.
    ///
    /// `Ok(None)` means nothing was stored yet.
    pub fn try_load_diary_progress(&self) -> StorageResult<Option<DiaryProgress>> {
        if !self.backend.is_available() {
            return Err(StorageError::Unavailable(self.backend.name().to_string()));
        }
        let Some(raw) = self.backend.get(DIARY_PROGRESS_KEY)? else {
            return Ok(None);
        };
        let flags: Vec<bool> = serde_json::from_str(&raw)?;
        DiaryProgress::from_slice(&flags).map(Some).ok_or_else(|| {
            StorageError::Corruption(format!(
                "expected {DIARY_DAYS} progress flags, found {}",
                flags.len()
            ))
        })
    }

    /// Read diary progress, falling back to empty progress.
    ///
    /// Unreadable data is logged and treated like a first visit.
    #[must_use]
    pub fn load_diary_progress(&self) -> DiaryProgress {
        match self.try_load_diary_progress() {
            Ok(Some(progress)) => {
                tracing::debug!(
                    completed = progress.completed_count(),
                    "loaded diary progress"
                );
                progress
            }
            Ok(None) => DiaryProgress::new(),
            Err(err) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %err,
                    "stored diary progress unreadable, starting fresh"
                );
                DiaryProgress::new()
            }
        }
    }

    /// Persist the full progress array.
    pub fn save_diary_progress(&self, progress: &DiaryProgress) -> StorageResult<()> {
        let json = serde_json::to_string(progress)?;
        self.backend.set(DIARY_PROGRESS_KEY, &json)
    }

    /// Persist a reconstruction record, replacing the previous one.
    pub fn save_reconstruction(&self, record: &ReconstructionRecord) -> StorageResult<()> {
        let json = serde_json::to_string(record)?;
        self.backend.set(RECONSTRUCTION_KEY, &json)
    }
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// Backend that rejects every operation.
    struct Unplugged;

    impl StorageBackend for Unplugged {
        fn name(&self) -> &str {
            "Unplugged"
        }
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Backend("unplugged".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Backend("quota exceeded".into()))
        }
        fn is_available(&self) -> bool {
            false
        }
    }

    fn progress_with(completed: usize) -> DiaryProgress {
        let mut flags = [false; DIARY_DAYS];
        for flag in flags.iter_mut().take(completed) {
            *flag = true;
        }
        DiaryProgress::from_flags(flags)
    }

    #[test]
    fn memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.get("k").unwrap().is_none());
        assert!(storage.is_empty());
        storage.set("k", "v").unwrap();
        storage.set("k", "w").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("w"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn missing_progress_is_empty() {
        let store = ProgressStore::new(MemoryStorage::new());
        assert_eq!(store.try_load_diary_progress().unwrap(), None);
        assert_eq!(store.load_diary_progress(), DiaryProgress::new());
    }

    #[test]
    fn saved_progress_is_a_plain_bool_array() {
        let storage = Rc::new(MemoryStorage::new());
        let store = ProgressStore::new(Rc::clone(&storage));
        store.save_diary_progress(&progress_with(2)).unwrap();

        let raw = storage.get(DIARY_PROGRESS_KEY).unwrap().unwrap();
        let flags: Vec<bool> = serde_json::from_str(&raw).unwrap();
        assert_eq!(flags.len(), DIARY_DAYS);
        assert_eq!(&flags[..3], &[true, true, false]);
        assert_eq!(store.load_diary_progress(), progress_with(2));
    }

    #[test]
    fn corrupt_json_falls_back_to_empty() {
        let store = ProgressStore::new(MemoryStorage::with_entries([(
            DIARY_PROGRESS_KEY,
            "{not json",
        )]));
        assert!(matches!(
            store.try_load_diary_progress(),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(store.load_diary_progress(), DiaryProgress::new());
    }

    #[test]
    fn wrong_length_falls_back_to_empty() {
        let store = ProgressStore::new(MemoryStorage::with_entries([(
            DIARY_PROGRESS_KEY,
            "[true,true,true]",
        )]));
        assert_eq!(
            store.try_load_diary_progress(),
            Err(StorageError::Corruption(
                "expected 21 progress flags, found 3".into()
            ))
        );
        assert_eq!(store.load_diary_progress(), DiaryProgress::new());
    }

    #[test]
    fn null_value_falls_back_to_empty() {
        let store =
            ProgressStore::new(MemoryStorage::with_entries([(DIARY_PROGRESS_KEY, "null")]));
        assert_eq!(store.load_diary_progress(), DiaryProgress::new());
    }

    #[test]
    fn unavailable_backend_degrades() {
        let store = ProgressStore::new(Unplugged);
        assert!(matches!(
            store.try_load_diary_progress(),
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(store.load_diary_progress(), DiaryProgress::new());
        assert_eq!(
            store.save_diary_progress(&progress_with(1)),
            Err(StorageError::Backend("quota exceeded".into()))
        );
    }

    #[test]
    fn reconstruction_overwrites_previous_record() {
        let storage = Rc::new(MemoryStorage::new());
        let store = ProgressStore::new(Rc::clone(&storage));

        let first = ReconstructionRecord {
            quien_fui: "niña".into(),
            quien_rompio: "la duda".into(),
            quien_soy: "Roble".into(),
        };
        let second = ReconstructionRecord {
            quien_soy: "Fénix renacida".into(),
            ..first.clone()
        };
        store.save_reconstruction(&first).unwrap();
        store.save_reconstruction(&second).unwrap();

        let raw = storage.get(RECONSTRUCTION_KEY).unwrap().unwrap();
        let stored: ReconstructionRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, second);
        assert!(raw.contains("\"quienSoy\":\"Fénix renacida\""));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            StorageError::Unavailable("LocalStorage".into()).to_string(),
            "storage unavailable: LocalStorage"
        );
        assert_eq!(
            StorageError::Corruption("bad".into()).to_string(),
            "storage corruption: bad"
        );
    }
}
