use std::sync::Arc;

use crate::application::metas::MetaBinder;
use crate::application::repos::{FeedsRepo, FeedsWriteRepo};
use crate::application::site_config::SiteConfigService;
use crate::cache::CacheTrigger;

#[derive(Clone)]
pub struct FeedService {
    pub(crate) reader: Arc<dyn FeedsRepo>,
    pub(crate) writer: Arc<dyn FeedsWriteRepo>,
    pub(crate) binder: MetaBinder,
    pub(crate) config: SiteConfigService,
    pub(crate) cache: CacheTrigger,
}

impl FeedService {
    pub fn new(
        reader: Arc<dyn FeedsRepo>,
        writer: Arc<dyn FeedsWriteRepo>,
        binder: MetaBinder,
        config: SiteConfigService,
        cache: CacheTrigger,
    ) -> Self {
        Self {
            reader,
            writer,
            binder,
            config,
            cache,
        }
    }
}
