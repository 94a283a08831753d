pub mod auth;
pub mod comments;
pub mod error;
pub mod feeds;
pub mod friends;
pub mod metas;
pub mod pagination;
pub mod repos;
pub mod site_config;
pub mod users;
