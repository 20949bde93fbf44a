//! Asset library handlers: list, upload, edit, delete, download.
//!
//! Mutations support two caller styles, decided here at the boundary and
//! nowhere deeper: asynchronous callers (identified by the
//! `X-Requested-With: XMLHttpRequest` header) receive a structured
//! success/failure payload, plain form submissions receive a redirect back to
//! the library carrying a human-readable message. Persistence failures are
//! softened into user-visible messages on both paths; a missing record id
//! stays a hard 404, matching the get-or-404 behavior of the source system.

use crate::api::models::assets::{AssetResponse, ListAssetsQuery, MutationResponse};
use crate::db::errors::DbError;
use crate::db::models::assets::{AssetDraft, AssetType, NewAttachment};
use crate::errors::{Error, Result};
use crate::types::AssetId;
use crate::AppState;
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};

/// Does the caller expect a structured JSON reply?
fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// Redirect back to the library with a message in the query string.
fn redirect_with_message(message: &str) -> Response {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("message", message)
        .finish();
    Redirect::to(&format!("/library?{}", query)).into_response()
}

/// Render a mutation outcome in the shape the caller asked for.
fn mutation_reply(headers: &HeaderMap, success: bool, message: String, asset_id: Option<AssetId>) -> Response {
    if wants_json(headers) {
        Json(MutationResponse {
            success,
            message,
            asset_id,
        })
        .into_response()
    } else {
        redirect_with_message(&message)
    }
}

fn asset_not_found(id: AssetId) -> Error {
    Error::NotFound {
        resource: "Asset".to_string(),
        id: id.to_string(),
    }
}

/// Parse the shared asset form: editable fields plus an optional file part.
///
/// Missing fields fall back to their defaults (quantity 1, empty strings, no
/// explicit type); this is what gives Edit its full-overwrite semantics.
async fn parse_asset_form(mut multipart: Multipart) -> Result<(AssetDraft, Option<NewAttachment>)> {
    let mut draft = AssetDraft::default();
    let mut attachment = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {}", e),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "name" => {
                draft.name = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read name: {}", e),
                })?;
            }
            "quantity" => {
                let value = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read quantity: {}", e),
                })?;
                if !value.trim().is_empty() {
                    draft.quantity = value.trim().parse().map_err(|_| Error::BadRequest {
                        message: format!("Invalid quantity '{}': must be an integer", value),
                    })?;
                }
            }
            "description" => {
                draft.description = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read description: {}", e),
                })?;
            }
            "asset_type" => {
                let value = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read asset_type: {}", e),
                })?;
                if !value.trim().is_empty() {
                    let parsed: AssetType = value.trim().parse().map_err(|e: String| Error::BadRequest { message: e })?;
                    draft.asset_type = Some(parsed);
                }
            }
            "tags" => {
                draft.tags = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read tags: {}", e),
                })?;
            }
            "file" => {
                let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                // Browsers send an empty file part when the input is left blank
                if filename.is_empty() {
                    continue;
                }
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| mime_guess::from_path(&filename).first_or_octet_stream().to_string());
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadRequest {
                        message: format!("Failed to read file: {}", e),
                    })?
                    .to_vec();

                attachment = Some(NewAttachment {
                    filename,
                    content_type,
                    content,
                });
            }
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    Ok((draft, attachment))
}

#[utoipa::path(
    get,
    path = "/api/v1/assets",
    tag = "assets",
    summary = "List assets",
    description = "List assets matching the search and filter criteria, newest date first.",
    params(ListAssetsQuery),
    responses(
        (status = 200, description = "Matching assets", body = Vec<AssetResponse>),
        (status = 400, description = "Invalid filter value")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_assets(State(state): State<AppState>, Query(query): Query<ListAssetsQuery>) -> Result<Json<Vec<AssetResponse>>> {
    let filter = query.into_filter()?;
    let records = state.repo.list(&filter).await?;
    Ok(Json(records.into_iter().map(AssetResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/assets/{id}",
    tag = "assets",
    summary = "Get asset",
    params(("id" = String, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset details", body = AssetResponse),
        (status = 404, description = "Asset not found")
    )
)]
#[tracing::instrument(skip_all, fields(asset_id = %id))]
pub async fn get_asset(State(state): State<AppState>, Path(id): Path<AssetId>) -> Result<Json<AssetResponse>> {
    let record = state.repo.get(id).await?.ok_or_else(|| asset_not_found(id))?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/assets",
    tag = "assets",
    summary = "Upload asset",
    description = "Create an asset from a multipart form, optionally with a file attachment. \
                   When no explicit type is chosen the attachment's content type decides.",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: name, quantity, description, asset_type, tags, file"
    ),
    responses(
        (status = 200, description = "Mutation outcome", body = MutationResponse),
        (status = 303, description = "Redirect with message (form submissions)"),
        (status = 400, description = "Malformed form data")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_asset(State(state): State<AppState>, headers: HeaderMap, multipart: Multipart) -> Result<Response> {
    let (draft, attachment) = parse_asset_form(multipart).await?;
    let name = draft.name.clone();

    match state.repo.create(&draft, attachment).await {
        Ok(record) => {
            tracing::info!(asset_id = %record.id, name = %record.name, "Asset uploaded");
            Ok(mutation_reply(
                &headers,
                true,
                format!("Asset \"{}\" uploaded successfully!", name),
                Some(record.id),
            ))
        }
        Err(e) => {
            tracing::warn!(name = %name, error = %e, "Asset upload failed");
            Ok(mutation_reply(&headers, false, format!("Error uploading asset: {}", e), None))
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/assets/{id}",
    tag = "assets",
    summary = "Edit asset",
    description = "Overwrite every editable field of an asset. Omitted fields reset to their \
                   defaults; a supplied file replaces the prior attachment.",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: name, quantity, description, asset_type, tags, file"
    ),
    params(("id" = String, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Mutation outcome", body = MutationResponse),
        (status = 303, description = "Redirect with message (form submissions)"),
        (status = 404, description = "Asset not found")
    )
)]
#[tracing::instrument(skip_all, fields(asset_id = %id))]
pub async fn update_asset(
    State(state): State<AppState>,
    Path(id): Path<AssetId>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response> {
    let (draft, attachment) = parse_asset_form(multipart).await?;

    match state.repo.update(id, &draft, attachment).await {
        Ok(record) => {
            tracing::info!(asset_id = %record.id, "Asset updated");
            Ok(mutation_reply(
                &headers,
                true,
                format!("Asset \"{}\" updated successfully!", record.name),
                Some(record.id),
            ))
        }
        Err(DbError::NotFound) => Err(asset_not_found(id)),
        Err(e) => {
            tracing::warn!(asset_id = %id, error = %e, "Asset update failed");
            Ok(mutation_reply(&headers, false, format!("Error updating asset: {}", e), None))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/assets/{id}",
    tag = "assets",
    summary = "Delete asset",
    params(("id" = String, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Mutation outcome", body = MutationResponse),
        (status = 303, description = "Redirect with message (form submissions)"),
        (status = 404, description = "Asset not found")
    )
)]
#[tracing::instrument(skip_all, fields(asset_id = %id))]
pub async fn delete_asset(State(state): State<AppState>, Path(id): Path<AssetId>, headers: HeaderMap) -> Result<Response> {
    match state.repo.delete(id).await {
        Ok(record) => {
            tracing::info!(asset_id = %id, "Asset deleted");
            Ok(mutation_reply(
                &headers,
                true,
                format!("Asset \"{}\" deleted successfully!", record.name),
                None,
            ))
        }
        Err(DbError::NotFound) => Err(asset_not_found(id)),
        Err(e) => {
            tracing::warn!(asset_id = %id, error = %e, "Asset deletion failed");
            Ok(mutation_reply(&headers, false, format!("Error deleting asset: {}", e), None))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/assets/{id}/download",
    tag = "assets",
    summary = "Download asset file",
    description = "Stream the attached file as a binary attachment response.",
    params(("id" = String, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "Asset not found, or no file attached")
    )
)]
#[tracing::instrument(skip_all, fields(asset_id = %id))]
pub async fn download_asset(State(state): State<AppState>, Path(id): Path<AssetId>) -> Result<Response> {
    let download = match state.repo.download(id).await {
        Ok(Some(download)) => download,
        Ok(None) => return Err(Error::NoAttachment { id: id.to_string() }),
        Err(DbError::NotFound) => return Err(asset_not_found(id)),
        Err(e) => return Err(e.into()),
    };

    let disposition = format!("attachment; filename=\"{}\"", download.filename.replace('"', ""));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, download.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.content,
    )
        .into_response())
}
