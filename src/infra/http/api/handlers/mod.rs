//! API handlers grouped by resource.
//!
//! Every handler receives the [`Viewer`](crate::application::auth::Viewer)
//! resolved by the auth middleware and converts service errors into
//! [`HttpError`](crate::application::error::HttpError) with `?`.

mod comments;
mod config;
mod feeds;
mod friends;
mod metas;
mod system;
mod users;

pub use comments::*;
pub use config::*;
pub use feeds::*;
pub use friends::*;
pub use metas::*;
pub use system::*;
pub use users::*;
