//! Request/response types for the file storage backends.

/// Content handed to a storage backend.
#[derive(Debug, Clone)]
pub struct FileStorageRequest {
    pub content: Vec<u8>,
    pub content_type: String,
}

/// Result of storing content: the backend-generated key used for later
/// retrieval and deletion.
#[derive(Debug, Clone)]
pub struct FileStorageResponse {
    pub storage_key: String,
}
