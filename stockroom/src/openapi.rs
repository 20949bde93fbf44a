//! OpenAPI documentation for the asset management API.

use utoipa::OpenApi;

use crate::api;
use crate::api::models::assets::{AssetResponse, MutationResponse};
use crate::api::models::auth::{LoginRequest, LoginResponse};
use crate::db::models::assets::AssetType;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        description = "Inventory asset management: searchable asset library, file attachments, \
                       and a role-gated login."
    ),
    paths(
        api::handlers::assets::list_assets,
        api::handlers::assets::upload_asset,
        api::handlers::assets::get_asset,
        api::handlers::assets::update_asset,
        api::handlers::assets::delete_asset,
        api::handlers::assets::download_asset,
        api::handlers::auth::login,
    ),
    components(schemas(AssetResponse, MutationResponse, AssetType, LoginRequest, LoginResponse)),
    tags(
        (name = "assets", description = "Asset library operations"),
        (name = "auth", description = "Login gate")
    )
)]
pub struct ApiDoc;
