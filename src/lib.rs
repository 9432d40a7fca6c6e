pub mod admin;
pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod i18n;
pub mod model;
pub mod query;
pub mod scheduler;
pub mod security;
pub mod store;
pub mod translation;
