pub mod api;
pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod media;
pub mod registry;
pub mod shutdown;
