pub mod assets;
pub mod auth;
