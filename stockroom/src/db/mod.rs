//! Persistence layer: repository interfaces, models, and storage backends.

pub mod errors;
pub mod handlers;
pub mod models;
