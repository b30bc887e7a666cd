//! Durable Backing Store
//!
//! Optional persistence behind the in-memory cache. It is consulted only on
//! an in-memory miss and written through on population.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::cache::Entity;
use crate::error::StoreError;

// == Durable Store ==
/// Persistence layer keyed by entity id, storing the bare entity shape.
#[async_trait]
pub trait DurableStore<E: Entity>: Send + Sync {
    /// Loads the entity stored under `id`, if any.
    async fn load(&self, id: &str) -> Result<Option<E>, StoreError>;

    /// Inserts or replaces the entity under its own id.
    async fn save(&self, entity: &E) -> Result<(), StoreError>;

    /// Removes the entity stored under `id`. Missing ids are not an error.
    async fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// Removes every stored entity.
    async fn clear(&self) -> Result<(), StoreError>;
}

// == Delete Policy ==
/// Whether `delete` and `clear` on the cache reach the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Durable copies outlive in-memory invalidation (archive semantics)
    #[default]
    Retain,
    /// Invalidation removes the durable copy as well
    Propagate,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(DeletePolicy::Retain),
            "propagate" => Ok(DeletePolicy::Propagate),
            other => Err(format!("unknown delete policy: {}", other)),
        }
    }
}

// == File Store ==
/// Directory-backed store: one JSON document per entity.
///
/// File names are the hex-encoded id, so any id maps to a single flat file
/// inside the directory. Writes go to a temporary file unique to that write
/// and are then renamed into place, so concurrent saves of one id never
/// share a partially written file.
#[derive(Debug, Clone)]
pub struct FileStore<E> {
    dir: PathBuf,
    _entity: PhantomData<fn() -> E>,
}

const DOCUMENT_EXT: &str = "json";
const TEMP_EXT: &str = "tmp";

/// Sequence for temp file names, shared by every store in the process
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

impl<E: Entity> FileStore<E> {
    // == Open ==
    /// Opens (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        debug!("Durable store opened at {}", dir.display());
        Ok(Self {
            dir,
            _entity: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", encode_id(id), DOCUMENT_EXT))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "{}.{}-{}.{}",
            encode_id(id),
            process::id(),
            seq,
            TEMP_EXT
        ))
    }
}

#[async_trait]
impl<E: Entity> DurableStore<E> for FileStore<E> {
    async fn load(&self, id: &str) -> Result<Option<E>, StoreError> {
        match fs::read(self.document_path(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, entity: &E) -> Result<(), StoreError> {
        let path = self.document_path(entity.id());
        let temp = self.temp_path(entity.id());
        let bytes = serde_json::to_vec(entity)?;

        fs::write(&temp, bytes).await?;
        if let Err(err) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.document_path(id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_document = path
                .extension()
                .is_some_and(|ext| ext == DOCUMENT_EXT || ext == TEMP_EXT);
            if is_document {
                fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }
}

/// Lowercase hex encoding of the id bytes.
fn encode_id(id: &str) -> String {
    id.bytes().map(|b| format!("{:02x}", b)).collect()
}
