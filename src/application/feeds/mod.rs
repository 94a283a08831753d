mod commands;
mod queries;
mod service;
pub mod types;

pub use service::*;
pub use types::{CreateFeedCommand, FeedError, ListFeedsQuery, UpdateFeedCommand, ensure_non_empty};
