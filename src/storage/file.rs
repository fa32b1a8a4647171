// File and directory contracts with in-memory implementations

use crate::types::*;
use crate::storage_error;
use crate::utils::StringValidator;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// A named blob-like entity with a canonical URI
#[async_trait]
pub trait StorageEntity: Send + Sync {
    fn name(&self) -> &str;

    fn uri(&self) -> &Url;

    async fn delete(&self) -> NexusResult<()>;
}

#[async_trait]
pub trait File: StorageEntity {
    fn content_type(&self) -> &str;

    /// Replace the file content with `content`
    async fn upload_text(&self, content: &str) -> NexusResult<()>;

    async fn download_text(&self) -> NexusResult<String>;
}

#[async_trait]
pub trait Directory: StorageEntity {
    /// Create (or replace) an empty file named `name` in this directory
    async fn create_file(&self, name: &str, content_type: &str) -> NexusResult<Arc<dyn File>>;

    /// Names of the files currently in the directory, sorted
    async fn list_files(&self) -> NexusResult<Vec<String>>;
}

#[derive(Debug)]
struct FileState {
    content_type: String,
    content: Mutex<String>,
}

type FileTable = DashMap<String, Arc<FileState>>;

/// In-process [`Directory`] addressed as `memory://{name}/`
pub struct MemoryDirectory {
    name: String,
    uri: Url,
    files: Arc<FileTable>,
    // Held while checking or changing whether the directory exists, so a
    // file is never added after `delete` has cleared the table.
    deleted: Mutex<bool>,
}

impl MemoryDirectory {
    pub fn new(name: impl Into<String>) -> NexusResult<Self> {
        let name = StringValidator::entity_name(name, "directory name")?;
        let uri = Url::parse(&format!("memory://{}/", name))
            .map_err(|e| NexusError::Validation(format!("directory name '{}' is not addressable: {}", name, e)))?;
        Ok(Self {
            name,
            uri,
            files: Arc::new(DashMap::new()),
            deleted: Mutex::new(false),
        })
    }

    /// Lock the directory state, failing if it was deleted
    fn ensure_exists(&self) -> NexusResult<MutexGuard<'_, bool>> {
        let deleted = self
            .deleted
            .lock()
            .map_err(|_| storage_error!(self.name.clone(), "directory lock poisoned"))?;
        if *deleted {
            return Err(NexusError::NotFound(format!("directory '{}' was deleted", self.name)));
        }
        Ok(deleted)
    }
}

#[async_trait]
impl StorageEntity for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn uri(&self) -> &Url {
        &self.uri
    }

    async fn delete(&self) -> NexusResult<()> {
        let mut deleted = self.ensure_exists()?;
        *deleted = true;
        self.files.clear();
        Ok(())
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn create_file(&self, name: &str, content_type: &str) -> NexusResult<Arc<dyn File>> {
        let name = StringValidator::entity_name(name, "file name")?;
        let content_type = StringValidator::not_blank(content_type, "content type")?;
        let uri = self
            .uri
            .join(&name)
            .map_err(|e| storage_error!(self.name.clone(), format!("cannot address file '{}': {}", name, e)))?;

        let state = Arc::new(FileState {
            content_type,
            content: Mutex::new(String::new()),
        });
        {
            let _exists = self.ensure_exists()?;
            self.files.insert(name.clone(), state.clone());
        }

        Ok(Arc::new(MemoryFile {
            name,
            uri,
            files: self.files.clone(),
            state,
        }))
    }

    async fn list_files(&self) -> NexusResult<Vec<String>> {
        let _exists = self.ensure_exists()?;
        let mut names: Vec<String> = self.files.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}

/// Handle to a file in a [`MemoryDirectory`].
///
/// The handle goes stale once the file is deleted or replaced by a newer
/// file with the same name.
pub struct MemoryFile {
    name: String,
    uri: Url,
    files: Arc<FileTable>,
    state: Arc<FileState>,
}

impl MemoryFile {
    fn ensure_current(&self) -> NexusResult<()> {
        let current = self
            .files
            .get(&self.name)
            .map_or(false, |entry| Arc::ptr_eq(entry.value(), &self.state));
        if current {
            Ok(())
        } else {
            Err(NexusError::NotFound(format!("file '{}' no longer exists", self.uri)))
        }
    }
}

#[async_trait]
impl StorageEntity for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn uri(&self) -> &Url {
        &self.uri
    }

    async fn delete(&self) -> NexusResult<()> {
        self.ensure_current()?;
        self.files
            .remove_if(&self.name, |_, state| Arc::ptr_eq(state, &self.state));
        Ok(())
    }
}

#[async_trait]
impl File for MemoryFile {
    fn content_type(&self) -> &str {
        &self.state.content_type
    }

    async fn upload_text(&self, content: &str) -> NexusResult<()> {
        self.ensure_current()?;
        let mut guard = self
            .state
            .content
            .lock()
            .map_err(|_| storage_error!(self.name.clone(), "file lock poisoned"))?;
        *guard = content.to_string();
        Ok(())
    }

    async fn download_text(&self) -> NexusResult<String> {
        self.ensure_current()?;
        self.state
            .content
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| storage_error!(self.name.clone(), "file lock poisoned"))
    }
}

impl std::fmt::Debug for MemoryFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFile")
            .field("uri", &self.uri.as_str())
            .field("content_type", &self.state.content_type)
            .finish()
    }
}
