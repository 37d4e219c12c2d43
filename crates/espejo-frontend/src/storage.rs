#![forbid(unsafe_code)]

//! `window.localStorage` as a [`StorageBackend`].

use espejo_runtime::persistence::{StorageBackend, StorageError, StorageResult};
use web_sys::Storage;

use crate::js_error_text;

/// Browser local storage. Resolved lazily on every call so a storage that
/// becomes unavailable (private mode, quota policy) surfaces as an error
/// rather than a stale handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageBackend;

impl LocalStorageBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> StorageResult<Storage> {
        let window =
            web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_error_text(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
    }
}

impl StorageBackend for LocalStorageBackend {
    fn name(&self) -> &str {
        "localStorage"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::Backend(js_error_text(&e)))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Backend(js_error_text(&e)))
    }

    fn is_available(&self) -> bool {
        self.storage().is_ok()
    }
}
