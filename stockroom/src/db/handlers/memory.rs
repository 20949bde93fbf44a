//! In-memory asset repository.
//!
//! Backs the `memory` database mode and the handler tests. Records and
//! attachment content live in a HashMap behind an RwLock and are lost on
//! restart. Semantics mirror [`PgAssets`](super::assets::PgAssets) exactly.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use crate::db::{
    errors::{DbError, Result},
    handlers::assets::{AssetFilter, AssetRepository},
    models::assets::{AssetDraft, AssetRecord, AssetType, AttachmentDownload, NewAttachment},
};
use crate::types::AssetId;

/// A record together with its attachment content (if any).
#[derive(Clone)]
struct StoredAsset {
    record: AssetRecord,
    content: Option<Vec<u8>>,
}

/// In-memory implementation of [`AssetRepository`].
#[derive(Default)]
pub struct MemoryAssets {
    assets: RwLock<HashMap<AssetId, StoredAsset>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(record: &AssetRecord, filter: &AssetFilter) -> bool {
    if let Some(q) = &filter.query {
        let q = q.to_lowercase();
        if !record.name.to_lowercase().contains(&q) && !record.description.to_lowercase().contains(&q) {
            return false;
        }
    }
    if let Some(asset_type) = filter.asset_type {
        if record.asset_type != asset_type {
            return false;
        }
    }
    if let Some(from) = filter.date_from {
        if record.date < from {
            return false;
        }
    }
    if let Some(to) = filter.date_to {
        if record.date > to {
            return false;
        }
    }
    if let Some(tags) = &filter.tags {
        if !record.tags.to_lowercase().contains(&tags.to_lowercase()) {
            return false;
        }
    }
    true
}

#[async_trait::async_trait]
impl AssetRepository for MemoryAssets {
    async fn create(&self, draft: &AssetDraft, attachment: Option<NewAttachment>) -> Result<AssetRecord> {
        let now = Utc::now();
        let record = AssetRecord {
            id: AssetId::new_v4(),
            name: draft.name.clone(),
            quantity: draft.quantity,
            description: draft.description.clone(),
            asset_type: draft.resolve_type(attachment.as_ref()),
            tags: draft.tags.clone(),
            date: now.date_naive(),
            file_name: attachment.as_ref().map(|a| a.filename.clone()),
            file_key: attachment.as_ref().map(|_| AssetId::new_v4().to_string()),
            file_content_type: attachment.as_ref().map(|a| a.content_type.clone()),
            file_size: attachment.as_ref().map(|a| a.content.len() as i64),
            created_at: now,
            updated_at: now,
        };

        self.assets.write().expect("asset lock poisoned").insert(
            record.id,
            StoredAsset {
                record: record.clone(),
                content: attachment.map(|a| a.content),
            },
        );

        Ok(record)
    }

    async fn get(&self, id: AssetId) -> Result<Option<AssetRecord>> {
        Ok(self
            .assets
            .read()
            .expect("asset lock poisoned")
            .get(&id)
            .map(|stored| stored.record.clone()))
    }

    async fn list(&self, filter: &AssetFilter) -> Result<Vec<AssetRecord>> {
        let assets = self.assets.read().expect("asset lock poisoned");
        let mut records: Vec<AssetRecord> = assets
            .values()
            .filter(|stored| matches(&stored.record, filter))
            .map(|stored| stored.record.clone())
            .collect();

        // Newest date first; creation time then id as stable tie-breaks
        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.created_at.cmp(&a.created_at))
                .then(a.id.cmp(&b.id))
        });

        Ok(records)
    }

    async fn update(&self, id: AssetId, draft: &AssetDraft, attachment: Option<NewAttachment>) -> Result<AssetRecord> {
        let mut assets = self.assets.write().expect("asset lock poisoned");
        let stored = assets.get_mut(&id).ok_or(DbError::NotFound)?;

        let record = &mut stored.record;
        record.name = draft.name.clone();
        record.quantity = draft.quantity;
        record.description = draft.description.clone();
        record.asset_type = draft.asset_type.unwrap_or_default();
        record.tags = draft.tags.clone();
        record.updated_at = Utc::now();

        if let Some(a) = attachment {
            record.file_name = Some(a.filename.clone());
            record.file_key = Some(AssetId::new_v4().to_string());
            record.file_content_type = Some(a.content_type.clone());
            record.file_size = Some(a.content.len() as i64);
            stored.content = Some(a.content);
        }

        Ok(stored.record.clone())
    }

    async fn delete(&self, id: AssetId) -> Result<AssetRecord> {
        self.assets
            .write()
            .expect("asset lock poisoned")
            .remove(&id)
            .map(|stored| stored.record)
            .ok_or(DbError::NotFound)
    }

    async fn download(&self, id: AssetId) -> Result<Option<AttachmentDownload>> {
        let assets = self.assets.read().expect("asset lock poisoned");
        let stored = assets.get(&id).ok_or(DbError::NotFound)?;

        let Some(content) = &stored.content else {
            return Ok(None);
        };

        Ok(Some(AttachmentDownload {
            filename: stored.record.file_name.clone().unwrap_or_else(|| id.to_string()),
            content_type: stored
                .record
                .file_content_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            content: content.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn attachment(name: &str, content_type: &str) -> NewAttachment {
        NewAttachment {
            filename: name.to_string(),
            content_type: content_type.to_string(),
            content: b"content".to_vec(),
        }
    }

    /// Insert a record and backdate it, so ordering and bound tests can work
    /// with distinct dates.
    async fn create_on(repo: &MemoryAssets, name: &str, date: NaiveDate) -> AssetRecord {
        let record = repo.create(&AssetDraft::named(name), None).await.unwrap();
        let mut assets = repo.assets.write().unwrap();
        let stored = assets.get_mut(&record.id).unwrap();
        stored.record.date = date;
        stored.record.clone()
    }

    #[tokio::test]
    async fn test_no_criteria_returns_all_newest_first() {
        let repo = MemoryAssets::new();
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        create_on(&repo, "oldest", d - Duration::days(2)).await;
        create_on(&repo, "newest", d).await;
        create_on(&repo, "middle", d - Duration::days(1)).await;

        let all = repo.list(&AssetFilter::new()).await.unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn test_date_from_is_inclusive() {
        let repo = MemoryAssets::new();
        let d = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let record = create_on(&repo, "dated", d).await;

        let hit = repo.list(&AssetFilter::new().date_from(d)).await.unwrap();
        assert!(hit.iter().any(|r| r.id == record.id));

        let miss = repo.list(&AssetFilter::new().date_from(d + Duration::days(1))).await.unwrap();
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn test_create_auto_detects_image_type() {
        let repo = MemoryAssets::new();
        let record = repo
            .create(&AssetDraft::named("photo"), Some(attachment("photo.png", "image/png")))
            .await
            .unwrap();
        assert_eq!(record.asset_type, AssetType::Image);
    }

    #[tokio::test]
    async fn test_explicit_type_is_not_overridden() {
        let repo = MemoryAssets::new();
        let mut draft = AssetDraft::named("spec sheet");
        draft.asset_type = Some(AssetType::Document);
        let record = repo
            .create(&draft, Some(attachment("sheet.png", "image/png")))
            .await
            .unwrap();
        assert_eq!(record.asset_type, AssetType::Document);
    }

    #[tokio::test]
    async fn test_edit_omitting_tags_resets_them() {
        let repo = MemoryAssets::new();
        let mut draft = AssetDraft::named("mic");
        draft.tags = "audio,studio".to_string();
        let record = repo.create(&draft, None).await.unwrap();

        let updated = repo.update(record.id, &AssetDraft::named("mic"), None).await.unwrap();
        assert_eq!(updated.tags, "");
    }

    #[tokio::test]
    async fn test_edit_keeps_attachment_when_no_file_supplied() {
        let repo = MemoryAssets::new();
        let record = repo
            .create(&AssetDraft::named("clip"), Some(attachment("clip.mp4", "video/mp4")))
            .await
            .unwrap();

        let updated = repo.update(record.id, &AssetDraft::named("clip v2"), None).await.unwrap();
        assert_eq!(updated.file_name.as_deref(), Some("clip.mp4"));
        assert_eq!(updated.file_size, record.file_size);
        // ...but the type was reset to the draft's default: full overwrite
        assert_eq!(updated.asset_type, AssetType::Other);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_not_found_and_store_unchanged() {
        let repo = MemoryAssets::new();
        repo.create(&AssetDraft::named("survivor"), None).await.unwrap();

        let result = repo.delete(AssetId::new_v4()).await;
        assert!(matches!(result, Err(DbError::NotFound)));
        assert_eq!(repo.list(&AssetFilter::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_download_without_file_is_none() {
        let repo = MemoryAssets::new();
        let record = repo.create(&AssetDraft::named("bare"), None).await.unwrap();
        assert!(repo.download(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_free_text_and_tag_match_case_insensitive() {
        let repo = MemoryAssets::new();
        let mut draft = AssetDraft::named("Light Panel");
        draft.description = "Bi-color LED".to_string();
        draft.tags = "Studio,Lighting".to_string();
        repo.create(&draft, None).await.unwrap();

        assert_eq!(repo.list(&AssetFilter::new().query("led")).await.unwrap().len(), 1);
        assert_eq!(repo.list(&AssetFilter::new().tags("lighting")).await.unwrap().len(), 1);
        assert!(repo.list(&AssetFilter::new().query("led").tags("outdoor")).await.unwrap().is_empty());
    }
}
