use tracing::warn;

use crate::application::auth::Viewer;
use crate::application::pagination::{FeedPage, PageRequest};
use crate::application::repos::FeedListFilter;
use crate::application::site_config::{COUNTER_ENABLED, ConfigScope};
use crate::cache::keys;
use crate::domain::entities::{FeedAggregate, TimelineEntry};
use crate::domain::types::FeedStatus;

use super::service::FeedService;
use super::types::{FeedError, ListFeedsQuery};

impl FeedService {
    /// Paged feed listing. Only the public listing is cached; draft and
    /// private listings require an admin viewer.
    pub async fn list(
        &self,
        viewer: Viewer,
        query: ListFeedsQuery,
    ) -> Result<FeedPage<FeedAggregate>, FeedError> {
        let kind = query.kind.as_deref();
        let filter = match kind {
            Some("draft") => FeedListFilter::Status(FeedStatus::Draft),
            Some("private") => FeedListFilter::Status(FeedStatus::Private),
            _ => FeedListFilter::PublishedPosts,
        };
        if matches!(filter, FeedListFilter::Status(_)) && !viewer.admin {
            return Err(FeedError::PermissionDenied);
        }

        let page = PageRequest::new(query.page, query.limit);
        let cacheable = matches!(kind, None | Some("") | Some("publish"));
        let key = keys::feed_list(kind, page);
        let cache = self.cache.cache();
        if cacheable && let Some(hit) = cache.get::<FeedPage<FeedAggregate>>(&key) {
            return Ok(hit);
        }

        let size = self.reader.count_feeds(filter).await?;
        if size == 0 {
            return Ok(FeedPage::empty());
        }
        if page.offset() >= size {
            return Ok(FeedPage {
                size,
                data: Vec::new(),
                has_next: false,
            });
        }

        let rows = self
            .reader
            .list_feeds(filter, page.offset(), page.fetch_limit())
            .await?;
        let result = FeedPage::from_overfetched(size, rows, page);
        if cacheable {
            cache.set(&key, &result);
        }
        Ok(result)
    }

    pub async fn timeline(&self) -> Result<Vec<TimelineEntry>, FeedError> {
        let reader = self.reader.clone();
        self.cache
            .cache()
            .get_or_set(&keys::feed_timeline(), || async move {
                reader.list_timeline().await.map_err(FeedError::from)
            })
            .await
    }

    /// Loads a feed by id or alias and counts the view.
    ///
    /// The returned aggregate always reports the incremented view count.
    /// It is written back only when `client.counter.enabled` is set, in
    /// which case the detail entries are dropped so the next read sees the
    /// stored value. Lookups without a canonical key bypass the cache.
    pub async fn get(&self, viewer: Viewer, id_or_alias: &str) -> Result<FeedAggregate, FeedError> {
        let key = keys::feed_lookup(id_or_alias);
        let reader = self.reader.clone();
        let lookup = id_or_alias.to_string();
        let load = || async move {
            reader
                .find_aggregate(&lookup)
                .await?
                .ok_or(FeedError::NotFound)
        };
        let mut aggregate = match key.as_deref() {
            Some(key) => self.cache.cache().get_or_set(key, load).await?,
            None => load().await?,
        };

        if aggregate.feed.status != FeedStatus::Publish && !viewer.can_manage(aggregate.feed.uid) {
            return Err(FeedError::PermissionDenied);
        }

        let views = aggregate.feed.views + 1;
        if self
            .config
            .flag(ConfigScope::Client, COUNTER_ENABLED, false)
            .await
        {
            let id = aggregate.feed.id;
            match self.writer.update_views(id, views).await {
                Ok(()) => {
                    let cache = self.cache.cache();
                    if let Some(key) = key.as_deref() {
                        cache.delete(key);
                    }
                    cache.delete(&keys::feed_detail(id));
                    if let Some(alias) = aggregate.feed.alias.as_deref() {
                        cache.delete(&keys::feed_detail(alias));
                    }
                }
                Err(err) => warn!(
                    target = "inkpad::feeds",
                    feed_id = id,
                    error = %err,
                    "Failed to persist view count"
                ),
            }
        }
        aggregate.feed.views = views;
        Ok(aggregate)
    }

    /// Substring search. The cache holds every hit; viewers other than
    /// admins only see published feeds.
    pub async fn search(
        &self,
        viewer: Viewer,
        keyword: &str,
        page: PageRequest,
    ) -> Result<FeedPage<FeedAggregate>, FeedError> {
        if keyword.trim().is_empty() {
            return Ok(FeedPage::empty());
        }

        let reader = self.reader.clone();
        let lookup = keyword.to_string();
        let hits: Vec<FeedAggregate> = self
            .cache
            .cache()
            .get_or_set(&keys::search(keyword), || async move {
                reader.search_feeds(&lookup).await.map_err(FeedError::from)
            })
            .await?;

        let visible = hits
            .into_iter()
            .filter(|hit| viewer.admin || hit.feed.status == FeedStatus::Publish)
            .collect();
        Ok(FeedPage::slice(visible, page))
    }
}
