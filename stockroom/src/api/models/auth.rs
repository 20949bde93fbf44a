//! HTTP-facing models for the access gate.

use crate::auth::{LibraryView, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login: the granted role and the landing view for it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub role: Role,
    pub view: LibraryView,
    pub message: String,
}
