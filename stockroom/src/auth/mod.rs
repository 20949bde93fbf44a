//! Access gate: credential verification and role-to-view mapping.
//!
//! Deliberately stateless: no sessions, tokens, hashing, or lockout. Each
//! login submission is evaluated independently. The [`CredentialStore`] trait
//! keeps the lookup pluggable so a real identity backend can replace the
//! static account table without touching call sites.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use utoipa::ToSchema;

/// The three fixed roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    /// The landing view for this role. All three views display the same
    /// record set; they differ only in the capabilities the template exposes.
    pub fn destination(self) -> LibraryView {
        match self {
            Role::Admin => LibraryView::Library,
            Role::Editor => LibraryView::EditorLibrary,
            Role::Viewer => LibraryView::ViewerLibrary,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Editor => write!(f, "editor"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

/// Destination view templates, named after the frontend pages they select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LibraryView {
    Library,
    EditorLibrary,
    ViewerLibrary,
}

/// Successful authentication outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: Role,
    pub view: LibraryView,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("User '{username}' does not exist.")]
    UnknownUser { username: String },

    #[error("Wrong password for {username}.")]
    WrongPassword { username: String },
}

/// Pluggable credential-and-role lookup.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Verify a username/password pair, returning the role and landing view.
    async fn authenticate(&self, username: &str, password: &str) -> Result<RoleGrant, AuthError>;
}

/// Credential store over a fixed account table from configuration.
///
/// Passwords are compared in the clear, matching the source system; this is a
/// development gate, not an authentication mechanism.
pub struct StaticCredentialStore {
    accounts: HashMap<String, (String, Role)>,
}

impl StaticCredentialStore {
    pub fn new(accounts: impl IntoIterator<Item = (String, String, Role)>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|(username, password, role)| (username, (password, role)))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn authenticate(&self, username: &str, password: &str) -> Result<RoleGrant, AuthError> {
        let (expected, role) = self.accounts.get(username).ok_or_else(|| AuthError::UnknownUser {
            username: username.to_string(),
        })?;

        if password != expected {
            return Err(AuthError::WrongPassword {
                username: username.to_string(),
            });
        }

        Ok(RoleGrant {
            role: *role,
            view: role.destination(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StaticCredentialStore {
        StaticCredentialStore::new([
            ("admin".to_string(), "admin".to_string(), Role::Admin),
            ("editor".to_string(), "editor".to_string(), Role::Editor),
            ("viewer".to_string(), "viewer".to_string(), Role::Viewer),
        ])
    }

    #[tokio::test]
    async fn test_known_accounts_map_to_roles_and_views() {
        let store = store();

        let grant = store.authenticate("admin", "admin").await.unwrap();
        assert_eq!(grant.role, Role::Admin);
        assert_eq!(grant.view, LibraryView::Library);

        let grant = store.authenticate("editor", "editor").await.unwrap();
        assert_eq!(grant.role, Role::Editor);
        assert_eq!(grant.view, LibraryView::EditorLibrary);

        let grant = store.authenticate("viewer", "viewer").await.unwrap();
        assert_eq!(grant.role, Role::Viewer);
        assert_eq!(grant.view, LibraryView::ViewerLibrary);
    }

    #[tokio::test]
    async fn test_wrong_password_names_the_user() {
        let store = store();
        let err = store.authenticate("editor", "wrong").await.unwrap_err();
        assert_eq!(
            err,
            AuthError::WrongPassword {
                username: "editor".to_string()
            }
        );
        assert_eq!(err.to_string(), "Wrong password for editor.");
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = store();
        let err = store.authenticate("nobody", "x").await.unwrap_err();
        assert_eq!(
            err,
            AuthError::UnknownUser {
                username: "nobody".to_string()
            }
        );
    }
}
