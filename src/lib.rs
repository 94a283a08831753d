//! inkpad: a blog API with feeds, metas, comments and friend links.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
