//! Cache key definitions.
//!
//! Listing keys carry every parameter that shapes the result so distinct
//! pages never collide, and share a prefix so one sweep drops them all.

use crate::application::pagination::PageRequest;
use crate::domain::types::MetaType;

/// Feed list pages and the timeline.
pub const FEEDS_PREFIX: &str = "feeds_";
/// Cached search hits.
pub const SEARCH_PREFIX: &str = "search_";
/// Meta aggregate listings.
pub const META_PREFIX: &str = "meta_";
/// Resolved configuration scopes.
pub const CONFIG_PREFIX: &str = "config_";

const FEED_DETAIL_PREFIX: &str = "feed_";

/// `feeds_<type>_<pageIndex>_<limit>`; `kind` is the raw query value.
pub fn feed_list(kind: Option<&str>, page: PageRequest) -> String {
    format!(
        "{FEEDS_PREFIX}{}_{}_{}",
        kind.unwrap_or_default(),
        page.index,
        page.limit
    )
}

pub fn feed_timeline() -> String {
    format!("{FEEDS_PREFIX}timeline")
}

/// Detail key for a feed fetched by numeric id or by alias.
pub fn feed_detail(id_or_alias: impl std::fmt::Display) -> String {
    format!("{FEED_DETAIL_PREFIX}{id_or_alias}")
}

/// Detail key for a raw lookup string, or `None` when the lookup is a
/// non-canonical number (`02`, `+2`) that invalidation could not address.
pub fn feed_lookup(id_or_alias: &str) -> Option<String> {
    match id_or_alias.parse::<i64>() {
        Ok(id) if id.to_string() != id_or_alias => None,
        _ => Some(feed_detail(id_or_alias)),
    }
}

pub fn search(keyword: &str) -> String {
    format!("{SEARCH_PREFIX}{keyword}")
}

pub fn meta_list(kind: Option<MetaType>) -> String {
    format!(
        "{META_PREFIX}list_{}",
        kind.map(MetaType::as_str).unwrap_or("all")
    )
}

pub fn config_scope(scope: &str) -> String {
    format!("{CONFIG_PREFIX}{scope}")
}
