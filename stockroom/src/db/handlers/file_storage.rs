//! Attachment content storage backends.
//!
//! Record metadata lives in the `assets` table; the bytes of an attachment go
//! through one of these backends, keyed by an opaque storage key persisted on
//! the record. Blob storage and record persistence are not transactionally
//! coupled, so callers delete blobs best-effort after the row operation.

use crate::db::{
    errors::{DbError, Result},
    models::file_storage::{FileStorageRequest, FileStorageResponse},
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Trait for attachment storage backends
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store content and return the generated storage key
    async fn store(&self, request: FileStorageRequest) -> Result<FileStorageResponse>;

    /// Retrieve content by storage key
    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>>;

    /// Delete content by storage key. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> Result<()>;

    /// Check whether content exists for a storage key
    async fn exists(&self, storage_key: &str) -> Result<bool>;
}

// ============================================================================
// Local filesystem backend
// ============================================================================

/// Stores attachment content under a base directory, sharded by the first two
/// characters of a generated UUID to keep directory fan-out bounded.
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, request: FileStorageRequest) -> Result<FileStorageResponse> {
        let blob_id = uuid::Uuid::new_v4().to_string();
        let shard = &blob_id[..2];
        let relative_path = format!("{}/{}.bin", shard, blob_id);
        let full_path = self.base_path.join(&relative_path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&request.content).await?;
        file.sync_all().await?;

        Ok(FileStorageResponse {
            storage_key: relative_path,
        })
    }

    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(storage_key);
        match fs::read(&full_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DbError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, storage_key: &str) -> Result<()> {
        let full_path = self.base_path.join(storage_key);
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, storage_key: &str) -> Result<bool> {
        Ok(fs::try_exists(self.base_path.join(storage_key)).await?)
    }
}

// ============================================================================
// PostgreSQL large-object backend
// ============================================================================

/// Stores attachment content as Postgres large objects, keyed by OID.
///
/// Uses the pool shared with the main application schema; attachment traffic
/// in this system is small enough not to warrant a dedicated pool.
pub struct PostgresFileStorage {
    pool: PgPool,
}

impl PostgresFileStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_oid(storage_key: &str) -> Result<i32> {
        storage_key
            .parse()
            .map_err(|_| DbError::Other(anyhow::anyhow!("Invalid postgres OID: {}", storage_key)))
    }
}

// INV_WRITE / INV_READ flags for lo_open
const LO_WRITE: i32 = 131072;
const LO_READ: i32 = 262144;

#[async_trait]
impl FileStorage for PostgresFileStorage {
    async fn store(&self, request: FileStorageRequest) -> Result<FileStorageResponse> {
        let mut tx = self.pool.begin().await?;

        let oid: i32 = sqlx::query_scalar("SELECT lo_create(0)::int4").fetch_one(&mut *tx).await?;
        let fd: i32 = sqlx::query_scalar("SELECT lo_open($1, $2)")
            .bind(oid)
            .bind(LO_WRITE)
            .fetch_one(&mut *tx)
            .await?;

        const CHUNK_SIZE: usize = 8192;
        for chunk in request.content.chunks(CHUNK_SIZE) {
            sqlx::query("SELECT lowrite($1, $2)").bind(fd).bind(chunk).execute(&mut *tx).await?;
        }

        sqlx::query("SELECT lo_close($1)").bind(fd).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(FileStorageResponse {
            storage_key: oid.to_string(),
        })
    }

    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>> {
        let oid = Self::parse_oid(storage_key)?;
        let mut tx = self.pool.begin().await?;

        let fd: i32 = sqlx::query_scalar("SELECT lo_open($1, $2)")
            .bind(oid)
            .bind(LO_READ)
            .fetch_one(&mut *tx)
            .await
            .map_err(|_| DbError::NotFound)?;

        let mut content = Vec::new();
        loop {
            let chunk: Vec<u8> = sqlx::query_scalar("SELECT loread($1, 8192)").bind(fd).fetch_one(&mut *tx).await?;
            if chunk.is_empty() {
                break;
            }
            content.extend_from_slice(&chunk);
        }

        sqlx::query("SELECT lo_close($1)").bind(fd).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(content)
    }

    async fn delete(&self, storage_key: &str) -> Result<()> {
        let oid = Self::parse_oid(storage_key)?;
        // lo_unlink errors on a missing OID; tolerate that to keep delete idempotent
        let _ = sqlx::query("SELECT lo_unlink($1)").bind(oid).execute(&self.pool).await;
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> Result<bool> {
        let oid = Self::parse_oid(storage_key)?;
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_largeobject_metadata WHERE oid = $1)")
            .bind(oid)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// HashMap-backed storage used in memory mode and in tests. Content is lost
/// on restart.
#[derive(Default)]
pub struct MemoryFileStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn store(&self, request: FileStorageRequest) -> Result<FileStorageResponse> {
        let storage_key = uuid::Uuid::new_v4().to_string();
        self.blobs
            .write()
            .expect("blob lock poisoned")
            .insert(storage_key.clone(), request.content);
        Ok(FileStorageResponse { storage_key })
    }

    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .expect("blob lock poisoned")
            .get(storage_key)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    async fn delete(&self, storage_key: &str) -> Result<()> {
        self.blobs.write().expect("blob lock poisoned").remove(storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> Result<bool> {
        Ok(self.blobs.read().expect("blob lock poisoned").contains_key(storage_key))
    }
}
