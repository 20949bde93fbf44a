//! Domain model for inventory asset records.

use crate::types::AssetId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Classification of an asset, stored as text in the `assets` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
    Audio,
    Document,
    #[default]
    Other,
}

impl AssetType {
    /// Classify an attachment by its declared content type.
    ///
    /// Returns `Other` for anything outside the recognized media families and
    /// the fixed document MIME types (PDF and legacy Word).
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image/") {
            AssetType::Image
        } else if content_type.starts_with("video/") {
            AssetType::Video
        } else if content_type.starts_with("audio/") {
            AssetType::Audio
        } else if matches!(content_type, "application/pdf" | "application/msword") {
            AssetType::Document
        } else {
            AssetType::Other
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssetType::Image => "image",
            AssetType::Video => "video",
            AssetType::Audio => "audio",
            AssetType::Document => "document",
            AssetType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "image" => Ok(AssetType::Image),
            "video" => Ok(AssetType::Video),
            "audio" => Ok(AssetType::Audio),
            "document" => Ok(AssetType::Document),
            "other" => Ok(AssetType::Other),
            _ => Err(format!("Unknown asset type: {}", s)),
        }
    }
}

/// A persisted inventory record.
///
/// The four `file_*` columns are all NULL together when no attachment is
/// present; `file_size` is recomputed whenever the attachment is replaced.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssetRecord {
    pub id: AssetId,
    pub name: String,
    pub quantity: i32,
    pub description: String,
    pub asset_type: AssetType,
    pub tags: String,
    pub date: NaiveDate,
    pub file_name: Option<String>,
    pub file_key: Option<String>,
    pub file_content_type: Option<String>,
    pub file_size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssetRecord {
    pub fn has_attachment(&self) -> bool {
        self.file_key.is_some()
    }
}

/// The complete set of editable fields for create and update.
///
/// Update semantics are full-overwrite: every field in the draft replaces the
/// stored value, so callers must supply defaults for anything they omit.
/// `asset_type` stays optional so create can distinguish "caller picked a
/// type" from "classify the attachment for me".
#[derive(Debug, Clone)]
pub struct AssetDraft {
    pub name: String,
    pub quantity: i32,
    pub description: String,
    pub asset_type: Option<AssetType>,
    pub tags: String,
}

impl Default for AssetDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            quantity: 1,
            description: String::new(),
            asset_type: None,
            tags: String::new(),
        }
    }
}

impl AssetDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The type to persist on create: an explicit non-default choice wins,
    /// otherwise the attachment's declared content type decides.
    pub fn resolve_type(&self, attachment: Option<&NewAttachment>) -> AssetType {
        match self.asset_type {
            Some(t) if t != AssetType::Other => t,
            _ => attachment
                .map(|a| AssetType::from_content_type(&a.content_type))
                .unwrap_or_default(),
        }
    }
}

/// An uploaded file on its way into storage.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// An attachment retrieved for download.
#[derive(Debug, Clone)]
pub struct AttachmentDownload {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}
