//! Asset repository: query and mutation operations over inventory records.
//!
//! The [`AssetRepository`] trait is the seam between the HTTP boundary and
//! persistence. [`PgAssets`] is the production implementation;
//! [`MemoryAssets`](super::memory::MemoryAssets) backs memory mode and tests.

use crate::db::{
    errors::{DbError, Result},
    handlers::file_storage::FileStorage,
    models::assets::{AssetDraft, AssetRecord, AssetType, AttachmentDownload, NewAttachment},
    models::file_storage::FileStorageRequest,
};
use crate::types::AssetId;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;

/// Filter criteria for listing assets.
///
/// All criteria are optional and combined with AND; an unset criterion never
/// restricts the result. Results are always ordered by date descending with
/// creation time as a stable tie-break.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    /// Case-insensitive substring match against name OR description
    pub query: Option<String>,
    /// Exact asset type match
    pub asset_type: Option<AssetType>,
    /// Inclusive lower date bound
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive substring match against the tags field
    pub tags: Option<String>,
}

impl AssetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn asset_type(mut self, asset_type: AssetType) -> Self {
        self.asset_type = Some(asset_type);
        self
    }

    pub fn date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }
}

/// Repository interface for inventory records.
///
/// Mutations that target an existing record (`update`, `delete`, `download`)
/// fail with [`DbError::NotFound`] when the id does not exist; `download`
/// distinguishes a missing record (error) from a record without an
/// attachment (`Ok(None)`).
#[async_trait::async_trait]
pub trait AssetRepository: Send + Sync {
    /// Create a record, storing the attachment (if any) and classifying the
    /// asset type from its content type unless the caller chose one.
    async fn create(&self, draft: &AssetDraft, attachment: Option<NewAttachment>) -> Result<AssetRecord>;

    /// Fetch a record by id.
    async fn get(&self, id: AssetId) -> Result<Option<AssetRecord>>;

    /// List records matching the filter, newest date first.
    async fn list(&self, filter: &AssetFilter) -> Result<Vec<AssetRecord>>;

    /// Overwrite every editable field of an existing record. A supplied
    /// attachment replaces the prior one (and its recorded size); without one
    /// the existing attachment is untouched. Type classification is not
    /// re-applied here.
    async fn update(&self, id: AssetId, draft: &AssetDraft, attachment: Option<NewAttachment>) -> Result<AssetRecord>;

    /// Remove a record and its attachment. Returns the removed record.
    async fn delete(&self, id: AssetId) -> Result<AssetRecord>;

    /// Fetch the attachment content of a record for download.
    async fn download(&self, id: AssetId) -> Result<Option<AttachmentDownload>>;
}

/// PostgreSQL-backed asset repository.
pub struct PgAssets {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
}

impl PgAssets {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self { pool, storage }
    }

    /// Store attachment bytes, returning the storage key. The caller owns
    /// cleanup if the subsequent row operation fails.
    async fn store_attachment(&self, attachment: &NewAttachment) -> Result<String> {
        let response = self
            .storage
            .store(FileStorageRequest {
                content: attachment.content.clone(),
                content_type: attachment.content_type.clone(),
            })
            .await?;
        Ok(response.storage_key)
    }
}

#[async_trait::async_trait]
impl AssetRepository for PgAssets {
    async fn create(&self, draft: &AssetDraft, attachment: Option<NewAttachment>) -> Result<AssetRecord> {
        let asset_type = draft.resolve_type(attachment.as_ref());

        // Store content first so we never persist a dangling storage key.
        let stored = match &attachment {
            Some(a) => Some((self.store_attachment(a).await?, a)),
            None => None,
        };
        let (file_key, file_name, file_content_type, file_size) = match &stored {
            Some((key, a)) => (
                Some(key.clone()),
                Some(a.filename.clone()),
                Some(a.content_type.clone()),
                Some(a.content.len() as i64),
            ),
            None => (None, None, None, None),
        };

        let inserted = sqlx::query_as::<_, AssetRecord>(
            r#"
            INSERT INTO assets (
                name, quantity, description, asset_type, tags, date,
                file_name, file_key, file_content_type, file_size
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(draft.quantity)
        .bind(&draft.description)
        .bind(asset_type)
        .bind(&draft.tags)
        .bind(Utc::now().date_naive())
        .bind(&file_name)
        .bind(&file_key)
        .bind(&file_content_type)
        .bind(file_size)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(record) => Ok(record),
            Err(e) => {
                // The row never landed; drop the orphaned blob best-effort.
                if let Some((key, _)) = &stored {
                    let _ = self.storage.delete(key).await;
                }
                Err(e.into())
            }
        }
    }

    async fn get(&self, id: AssetId) -> Result<Option<AssetRecord>> {
        let record = sqlx::query_as::<_, AssetRecord>("SELECT * FROM assets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list(&self, filter: &AssetFilter) -> Result<Vec<AssetRecord>> {
        let mut query = sqlx::QueryBuilder::new("SELECT * FROM assets WHERE 1=1");

        if let Some(q) = &filter.query {
            query.push(" AND (name ILIKE ");
            query.push_bind(format!("%{}%", q));
            query.push(" OR description ILIKE ");
            query.push_bind(format!("%{}%", q));
            query.push(")");
        }

        if let Some(asset_type) = filter.asset_type {
            query.push(" AND asset_type = ");
            query.push_bind(asset_type);
        }

        if let Some(date_from) = filter.date_from {
            query.push(" AND date >= ");
            query.push_bind(date_from);
        }

        if let Some(date_to) = filter.date_to {
            query.push(" AND date <= ");
            query.push_bind(date_to);
        }

        if let Some(tags) = &filter.tags {
            query.push(" AND tags ILIKE ");
            query.push_bind(format!("%{}%", tags));
        }

        query.push(" ORDER BY date DESC, created_at DESC");

        let records = query.build_query_as::<AssetRecord>().fetch_all(&self.pool).await?;
        Ok(records)
    }

    async fn update(&self, id: AssetId, draft: &AssetDraft, attachment: Option<NewAttachment>) -> Result<AssetRecord> {
        let existing = self.get(id).await?.ok_or(DbError::NotFound)?;

        // Full overwrite; classification is not re-applied on edit.
        let asset_type = draft.asset_type.unwrap_or_default();

        let record = if let Some(a) = &attachment {
            let new_key = self.store_attachment(a).await?;

            let updated = sqlx::query_as::<_, AssetRecord>(
                r#"
                UPDATE assets
                SET name = $2, quantity = $3, description = $4, asset_type = $5, tags = $6,
                    file_name = $7, file_key = $8, file_content_type = $9, file_size = $10,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&draft.name)
            .bind(draft.quantity)
            .bind(&draft.description)
            .bind(asset_type)
            .bind(&draft.tags)
            .bind(&a.filename)
            .bind(&new_key)
            .bind(&a.content_type)
            .bind(a.content.len() as i64)
            .fetch_one(&self.pool)
            .await;

            match updated {
                Ok(record) => {
                    // Replacement succeeded; the old blob is unreferenced now.
                    if let Some(old_key) = &existing.file_key {
                        let _ = self.storage.delete(old_key).await;
                    }
                    record
                }
                Err(e) => {
                    let _ = self.storage.delete(&new_key).await;
                    return Err(e.into());
                }
            }
        } else {
            sqlx::query_as::<_, AssetRecord>(
                r#"
                UPDATE assets
                SET name = $2, quantity = $3, description = $4, asset_type = $5, tags = $6,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&draft.name)
            .bind(draft.quantity)
            .bind(&draft.description)
            .bind(asset_type)
            .bind(&draft.tags)
            .fetch_one(&self.pool)
            .await?
        };

        Ok(record)
    }

    async fn delete(&self, id: AssetId) -> Result<AssetRecord> {
        let record = sqlx::query_as::<_, AssetRecord>("DELETE FROM assets WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;

        if let Some(key) = &record.file_key {
            let _ = self.storage.delete(key).await;
        }

        Ok(record)
    }

    async fn download(&self, id: AssetId) -> Result<Option<AttachmentDownload>> {
        let record = self.get(id).await?.ok_or(DbError::NotFound)?;

        let Some(key) = &record.file_key else {
            return Ok(None);
        };

        let content = self.storage.retrieve(key).await?;
        Ok(Some(AttachmentDownload {
            filename: record.file_name.unwrap_or_else(|| id.to_string()),
            content_type: record
                .file_content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::file_storage::MemoryFileStorage;

    fn png_attachment(name: &str) -> NewAttachment {
        NewAttachment {
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            content: b"\x89PNG fake".to_vec(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_classifies_attachment(pool: PgPool) {
        let repo = PgAssets::new(pool, Arc::new(MemoryFileStorage::new()));

        let record = repo
            .create(&AssetDraft::named("logo"), Some(png_attachment("logo.png")))
            .await
            .unwrap();

        assert_eq!(record.asset_type, AssetType::Image);
        assert_eq!(record.file_size, Some(9));
        assert_eq!(record.file_name.as_deref(), Some("logo.png"));
        assert!(record.file_key.is_some());
        assert_eq!(record.date, Utc::now().date_naive());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_overwrites_all_fields(pool: PgPool) {
        let repo = PgAssets::new(pool, Arc::new(MemoryFileStorage::new()));

        let mut draft = AssetDraft::named("camera");
        draft.tags = "gear,video".to_string();
        draft.quantity = 4;
        let record = repo.create(&draft, None).await.unwrap();

        // Update with a draft that omits tags and quantity: both reset.
        let updated = repo.update(record.id, &AssetDraft::named("camera mk2"), None).await.unwrap();
        assert_eq!(updated.name, "camera mk2");
        assert_eq!(updated.quantity, 1);
        assert_eq!(updated.tags, "");
        assert_eq!(updated.asset_type, AssetType::Other);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_replaces_attachment(pool: PgPool) {
        let storage = Arc::new(MemoryFileStorage::new());
        let repo = PgAssets::new(pool, storage.clone());

        let record = repo
            .create(&AssetDraft::named("clip"), Some(png_attachment("v1.png")))
            .await
            .unwrap();
        let old_key = record.file_key.clone().unwrap();

        let replacement = NewAttachment {
            filename: "v2.bin".to_string(),
            content_type: "application/octet-stream".to_string(),
            content: vec![0u8; 42],
        };
        let updated = repo.update(record.id, &AssetDraft::named("clip"), Some(replacement)).await.unwrap();

        assert_eq!(updated.file_name.as_deref(), Some("v2.bin"));
        assert_eq!(updated.file_size, Some(42));
        assert_ne!(updated.file_key.as_deref(), Some(old_key.as_str()));
        assert!(!storage.exists(&old_key).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_removes_record_and_blob(pool: PgPool) {
        let storage = Arc::new(MemoryFileStorage::new());
        let repo = PgAssets::new(pool, storage.clone());

        let record = repo
            .create(&AssetDraft::named("doomed"), Some(png_attachment("doomed.png")))
            .await
            .unwrap();
        let key = record.file_key.clone().unwrap();

        let deleted = repo.delete(record.id).await.unwrap();
        assert_eq!(deleted.id, record.id);
        assert!(repo.get(record.id).await.unwrap().is_none());
        assert!(!storage.exists(&key).await.unwrap());

        // Deleting again is NotFound and leaves the store unchanged
        assert!(matches!(repo.delete(record.id).await, Err(DbError::NotFound)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_filters_combine_with_and(pool: PgPool) {
        let repo = PgAssets::new(pool, Arc::new(MemoryFileStorage::new()));

        let mut a = AssetDraft::named("Tripod stand");
        a.description = "aluminium stand".to_string();
        a.tags = "gear,studio".to_string();
        repo.create(&a, None).await.unwrap();

        let mut b = AssetDraft::named("Backdrop");
        b.description = "green screen".to_string();
        b.tags = "studio".to_string();
        repo.create(&b, Some(png_attachment("backdrop.png"))).await.unwrap();

        // Free-text match against description, case-insensitive
        let found = repo.list(&AssetFilter::new().query("STAND")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Tripod stand");

        // AND: tag matches both, type only matches the image
        let found = repo
            .list(&AssetFilter::new().tags("studio").asset_type(AssetType::Image))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Backdrop");

        // No criteria returns everything
        let all = repo.list(&AssetFilter::new()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_date_bounds_inclusive(pool: PgPool) {
        let repo = PgAssets::new(pool, Arc::new(MemoryFileStorage::new()));
        let record = repo.create(&AssetDraft::named("dated"), None).await.unwrap();
        let d = record.date;

        let hit = repo.list(&AssetFilter::new().date_from(d).date_to(d)).await.unwrap();
        assert_eq!(hit.len(), 1);

        let miss = repo
            .list(&AssetFilter::new().date_from(d.succ_opt().unwrap()))
            .await
            .unwrap();
        assert!(miss.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_download_without_attachment(pool: PgPool) {
        let repo = PgAssets::new(pool, Arc::new(MemoryFileStorage::new()));
        let record = repo.create(&AssetDraft::named("bare"), None).await.unwrap();

        assert!(repo.download(record.id).await.unwrap().is_none());
        assert!(matches!(repo.download(AssetId::new_v4()).await, Err(DbError::NotFound)));
    }
}
