//! Cache invalidation triggers.
//!
//! Write paths call these after a successful mutation. Invalidation is
//! coarse: every listing family is swept and rebuilt on the
//! next read.

use std::sync::Arc;

use tracing::debug;

use super::keys::{self, FEEDS_PREFIX, META_PREFIX, SEARCH_PREFIX};
use super::store::QueryCache;

#[derive(Clone)]
pub struct CacheTrigger {
    cache: Arc<QueryCache>,
}

impl CacheTrigger {
    pub fn new(cache: Arc<QueryCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// A feed was created, updated, re-pinned or deleted.
    ///
    /// Sweeps list, search and meta aggregates and drops the detail keys for
    /// the id, the old alias and the new alias.
    pub fn feed_changed(&self, id: i64, alias: Option<&str>, new_alias: Option<&str>) {
        let swept = self.cache.delete_prefix(FEEDS_PREFIX)
            + self.cache.delete_prefix(SEARCH_PREFIX)
            + self.cache.delete_prefix(META_PREFIX);
        self.cache.delete(&keys::feed_detail(id));

        debug!(
            target = "inkpad::cache::trigger",
            feed_id = id,
            alias = alias.unwrap_or(""),
            new_alias = new_alias.unwrap_or(""),
            swept,
            "Feed cache invalidated"
        );

        for alias in [alias, new_alias].into_iter().flatten() {
            self.cache.delete(&keys::feed_detail(alias));
        }
    }

    /// Stored configuration for `scope` changed.
    pub fn config_changed(&self, scope: &str) {
        self.cache.delete(&keys::config_scope(scope));
    }
}
