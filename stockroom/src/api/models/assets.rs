//! HTTP-facing request and response models for the assets API.

use crate::db::handlers::AssetFilter;
use crate::db::models::assets::{AssetRecord, AssetType};
use crate::errors::Error;
use crate::types::AssetId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for the library listing.
///
/// Browsers submit empty strings for untouched form inputs, so every
/// criterion arrives as an optional string and blank values are dropped
/// before the filter is built.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListAssetsQuery {
    /// Free-text search against name and description
    pub q: Option<String>,
    /// Exact asset type (image, video, audio, document, other)
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    /// Inclusive lower date bound (YYYY-MM-DD)
    pub date_from: Option<String>,
    /// Inclusive upper date bound (YYYY-MM-DD)
    pub date_to: Option<String>,
    /// Substring match against the tags field
    pub tags: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, Error> {
    value.parse().map_err(|_| Error::BadRequest {
        message: format!("Invalid {} value '{}': expected YYYY-MM-DD", field, value),
    })
}

impl ListAssetsQuery {
    pub fn into_filter(self) -> Result<AssetFilter, Error> {
        let mut filter = AssetFilter::new();

        if let Some(q) = non_blank(self.q) {
            filter = filter.query(q);
        }
        if let Some(t) = non_blank(self.asset_type) {
            let asset_type: AssetType = t.parse().map_err(|e: String| Error::BadRequest { message: e })?;
            filter = filter.asset_type(asset_type);
        }
        if let Some(from) = non_blank(self.date_from) {
            filter = filter.date_from(parse_date("date_from", &from)?);
        }
        if let Some(to) = non_blank(self.date_to) {
            filter = filter.date_to(parse_date("date_to", &to)?);
        }
        if let Some(tags) = non_blank(self.tags) {
            filter = filter.tags(tags);
        }

        Ok(filter)
    }
}

/// A single asset as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssetResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AssetId,
    pub name: String,
    pub quantity: i32,
    pub description: String,
    pub asset_type: AssetType,
    pub tags: String,
    pub date: NaiveDate,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AssetRecord> for AssetResponse {
    fn from(record: AssetRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            quantity: record.quantity,
            description: record.description,
            asset_type: record.asset_type,
            tags: record.tags,
            date: record.date,
            file_name: record.file_name,
            file_size: record.file_size,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Structured mutation outcome for asynchronous callers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub asset_id: Option<AssetId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_criteria_are_ignored() {
        let query = ListAssetsQuery {
            q: Some("".to_string()),
            asset_type: Some("  ".to_string()),
            date_from: None,
            date_to: Some("".to_string()),
            tags: Some("studio".to_string()),
        };
        let filter = query.into_filter().unwrap();
        assert!(filter.query.is_none());
        assert!(filter.asset_type.is_none());
        assert!(filter.date_to.is_none());
        assert_eq!(filter.tags.as_deref(), Some("studio"));
    }

    #[test]
    fn test_invalid_date_is_bad_request() {
        let query = ListAssetsQuery {
            date_from: Some("03/10/2024".to_string()),
            ..Default::default()
        };
        assert!(query.into_filter().is_err());
    }

    #[test]
    fn test_type_criterion_parses() {
        let query = ListAssetsQuery {
            asset_type: Some("video".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.asset_type, Some(AssetType::Video));
    }
}
