//! Tags and categories: listing, lookup and binding to feeds.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::auth::Viewer;
use crate::application::repos::{CreateMetaParams, FeedMetasRepo, MetasRepo, RepoError};
use crate::cache::{CacheTrigger, keys};
use crate::domain::alias::alias_or_none;
use crate::domain::entities::{FeedAggregate, MetaRecord, MetaWithCount};
use crate::domain::types::MetaType;

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("meta not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct MetaDetail {
    pub meta: MetaRecord,
    pub feeds: Vec<FeedAggregate>,
}

/// Replaces the metas bound to a feed for one relation type.
#[derive(Clone)]
pub struct MetaBinder {
    metas: Arc<dyn MetasRepo>,
    feed_metas: Arc<dyn FeedMetasRepo>,
}

impl MetaBinder {
    pub fn new(metas: Arc<dyn MetasRepo>, feed_metas: Arc<dyn FeedMetasRepo>) -> Self {
        Self { metas, feed_metas }
    }

    /// Clears the `(feed_id, kind)` join rows, then binds each distinct
    /// name, creating missing metas on the way. The resulting set always
    /// equals `names`, whatever was bound before.
    pub async fn bind(
        &self,
        feed_id: i64,
        names: &[String],
        kind: MetaType,
    ) -> Result<(), RepoError> {
        self.feed_metas.clear_feed_metas(feed_id, kind).await?;

        let mut seen = HashSet::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let meta_id = self.resolve_or_create(name, kind).await?;
            self.feed_metas
                .insert_feed_meta(feed_id, meta_id, kind)
                .await?;
        }

        debug!(
            target = "inkpad::metas::binder",
            feed_id,
            kind = kind.as_str(),
            bound = seen.len(),
            "Bound metas to feed"
        );
        Ok(())
    }

    async fn resolve_or_create(&self, name: &str, kind: MetaType) -> Result<i64, RepoError> {
        if let Some(existing) = self.metas.find_by_name(name, kind).await? {
            return Ok(existing.id);
        }

        let created = self
            .metas
            .create_meta(CreateMetaParams {
                name: name.to_string(),
                alias: alias_or_none(name),
                kind,
            })
            .await?;
        Ok(created.id)
    }
}

#[derive(Clone)]
pub struct MetaService {
    metas: Arc<dyn MetasRepo>,
    cache: CacheTrigger,
}

impl MetaService {
    pub fn new(metas: Arc<dyn MetasRepo>, cache: CacheTrigger) -> Self {
        Self { metas, cache }
    }

    /// Lists metas with their feed counts. An unrecognised type matches
    /// nothing.
    pub async fn list(&self, kind: Option<&str>) -> Result<Vec<MetaWithCount>, MetaError> {
        let kind = match kind.filter(|raw| !raw.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<MetaType>() {
                Ok(kind) => Some(kind),
                Err(()) => return Ok(Vec::new()),
            },
        };

        let metas = self.metas.clone();
        self.cache
            .cache()
            .get_or_set(&keys::meta_list(kind), || async move {
                metas.list_with_counts(kind).await.map_err(MetaError::from)
            })
            .await
    }

    /// Finds a meta by alias or name along with the feeds visible to the
    /// viewer.
    pub async fn detail(&self, viewer: Viewer, name: &str) -> Result<MetaDetail, MetaError> {
        let meta = self
            .metas
            .find_by_alias_or_name(name)
            .await?
            .ok_or(MetaError::NotFound)?;
        let feeds = self
            .metas
            .list_feeds_for_meta(meta.id, viewer.admin)
            .await?;
        Ok(MetaDetail { meta, feeds })
    }
}
