//! In-memory repositories and service wiring shared by the integration
//! tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime, macros::datetime};

use inkpad::application::auth::{AuthService, Viewer};
use inkpad::application::comments::CommentService;
use inkpad::application::feeds::FeedService;
use inkpad::application::friends::FriendService;
use inkpad::application::metas::{MetaBinder, MetaService};
use inkpad::application::repos::{
    CommentsRepo, CreateCommentParams, CreateFeedParams, CreateFriendParams, CreateMetaParams,
    CreateUserTokenParams, FeedListFilter, FeedMetasRepo, FeedsRepo, FeedsWriteRepo, FriendsRepo,
    InfoRepo, MetasRepo, RepoError, UpdateFeedParams, UpdateFriendParams, UpsertUserParams,
    UserTokensRepo, UsersRepo,
};
use inkpad::application::site_config::SiteConfigService;
use inkpad::application::users::{GrantUserCommand, UserService};
use inkpad::cache::{CacheConfig, CacheTrigger, QueryCache};
use inkpad::domain::entities::{
    CommentRecord, CommentWithAuthor, FeedAggregate, FeedRecord, FriendRecord, InfoRecord,
    MetaRecord, MetaRef, MetaWithCount, TimelineEntry, UserRecord, UserTokenRecord,
};
use inkpad::domain::types::{FeedProperty, FeedStatus, MetaType};
use inkpad::infra::http::{ApiState, DatabaseProbe};

const EPOCH: OffsetDateTime = datetime!(2024-01-01 00:00:00 UTC);

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<UserRecord>,
    tokens: Vec<UserTokenRecord>,
    feeds: Vec<FeedRecord>,
    metas: Vec<MetaRecord>,
    feed_metas: Vec<(i64, i64, MetaType)>,
    comments: Vec<CommentRecord>,
    friends: Vec<FriendRecord>,
    info: BTreeMap<String, String>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Deterministic, strictly increasing timestamps.
    fn tick(&self) -> OffsetDateTime {
        EPOCH + Duration::seconds(self.next_id)
    }

    fn aggregate(&self, feed: &FeedRecord) -> FeedAggregate {
        let author = self
            .users
            .iter()
            .find(|user| user.id == feed.uid)
            .map(UserRecord::summary);
        let metas = self
            .feed_metas
            .iter()
            .filter(|(feed_id, _, _)| *feed_id == feed.id)
            .filter_map(|(_, meta_id, _)| self.metas.iter().find(|meta| meta.id == *meta_id))
            .map(|meta| MetaRef {
                id: meta.id,
                name: meta.name.clone(),
                kind: meta.kind,
            })
            .collect();
        FeedAggregate {
            feed: feed.clone(),
            author,
            metas,
        }
    }

    fn listed(&self, filter: FeedListFilter) -> Vec<&FeedRecord> {
        let mut feeds: Vec<&FeedRecord> = self
            .feeds
            .iter()
            .filter(|feed| match filter {
                FeedListFilter::PublishedPosts => {
                    feed.status == FeedStatus::Publish && feed.property == FeedProperty::Post
                }
                FeedListFilter::Status(status) => feed.status == status,
            })
            .collect();
        feeds.sort_by(|a, b| b.top.cmp(&a.top).then(b.created_at.cmp(&a.created_at)));
        feeds
    }
}

/// Every repository trait backed by one set of in-memory tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// Feed reads that reached the store, i.e. cache misses.
    pub feed_reads: AtomicUsize,
    pub meta_reads: AtomicUsize,
    pub fail_view_updates: AtomicBool,
    pub fail_meta_binding: AtomicBool,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    pub fn feed_reads(&self) -> usize {
        self.feed_reads.load(Ordering::SeqCst)
    }

    pub fn seed_user(&self, username: &str, admin: bool) -> i64 {
        let mut tables = self.tables();
        let id = tables.next_id();
        let at = tables.tick();
        tables.users.push(UserRecord {
            id,
            username: username.to_string(),
            openid: format!("openid-{username}"),
            avatar: None,
            permission: admin,
            created_at: at,
            updated_at: at,
        });
        id
    }

    pub fn seed_feed(
        &self,
        uid: i64,
        title: &str,
        status: FeedStatus,
        alias: Option<&str>,
    ) -> i64 {
        let mut tables = self.tables();
        let id = tables.next_id();
        let at = tables.tick();
        tables.feeds.push(FeedRecord {
            id,
            alias: alias.map(str::to_string),
            title: title.to_string(),
            summary: String::new(),
            content: format!("{title} body"),
            property: FeedProperty::Post,
            top: 0,
            uid,
            allow_comment: true,
            status,
            views: 0,
            created_at: at,
            updated_at: at,
        });
        id
    }

    pub fn set_allow_comment(&self, feed_id: i64, allow: bool) {
        let mut tables = self.tables();
        if let Some(feed) = tables.feeds.iter_mut().find(|feed| feed.id == feed_id) {
            feed.allow_comment = allow;
        }
    }

    pub fn feed(&self, id: i64) -> Option<FeedRecord> {
        self.tables().feeds.iter().find(|feed| feed.id == id).cloned()
    }

    pub fn bound_names(&self, feed_id: i64, kind: MetaType) -> Vec<String> {
        let tables = self.tables();
        let mut names: Vec<String> = tables
            .feed_metas
            .iter()
            .filter(|(fid, _, k)| *fid == feed_id && *k == kind)
            .filter_map(|(_, meta_id, _)| tables.metas.iter().find(|meta| meta.id == *meta_id))
            .map(|meta| meta.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn meta_count(&self) -> usize {
        self.tables().metas.len()
    }

    pub fn info_value(&self, key: &str) -> Option<String> {
        self.tables().info.get(key).cloned()
    }

    pub fn set_info(&self, key: &str, value: &str) {
        self.tables().info.insert(key.to_string(), value.to_string());
    }

    pub fn friend(&self, id: i64) -> Option<FriendRecord> {
        self.tables().friends.iter().find(|f| f.id == id).cloned()
    }
}

#[async_trait]
impl FeedsRepo for MemoryStore {
    async fn count_feeds(&self, filter: FeedListFilter) -> Result<u64, RepoError> {
        Ok(self.tables().listed(filter).len() as u64)
    }

    async fn list_feeds(
        &self,
        filter: FeedListFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<FeedAggregate>, RepoError> {
        self.feed_reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        Ok(tables
            .listed(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|feed| tables.aggregate(feed))
            .collect())
    }

    async fn list_timeline(&self) -> Result<Vec<TimelineEntry>, RepoError> {
        self.feed_reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        let mut feeds: Vec<&FeedRecord> = tables
            .feeds
            .iter()
            .filter(|feed| feed.status == FeedStatus::Publish && feed.property == FeedProperty::Post)
            .collect();
        feeds.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(feeds
            .into_iter()
            .map(|feed| TimelineEntry {
                id: feed.id,
                title: feed.title.clone(),
                alias: feed.alias.clone(),
                created_at: feed.created_at,
            })
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedRecord>, RepoError> {
        Ok(self.feed(id))
    }

    async fn find_aggregate(&self, id_or_alias: &str) -> Result<Option<FeedAggregate>, RepoError> {
        self.feed_reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        let by_id = id_or_alias
            .parse::<i64>()
            .ok()
            .and_then(|id| tables.feeds.iter().find(|feed| feed.id == id));
        let found = by_id.or_else(|| {
            tables
                .feeds
                .iter()
                .find(|feed| feed.alias.as_deref() == Some(id_or_alias))
        });
        Ok(found.map(|feed| tables.aggregate(feed)))
    }

    async fn find_by_title_or_content(
        &self,
        title: &str,
        content: &str,
    ) -> Result<Option<FeedRecord>, RepoError> {
        Ok(self
            .tables()
            .feeds
            .iter()
            .find(|feed| feed.title == title || feed.content == content)
            .cloned())
    }

    async fn search_feeds(&self, keyword: &str) -> Result<Vec<FeedAggregate>, RepoError> {
        self.feed_reads.fetch_add(1, Ordering::SeqCst);
        let needle = keyword.to_lowercase();
        let tables = self.tables();
        let mut hits: Vec<&FeedRecord> = tables
            .feeds
            .iter()
            .filter(|feed| {
                [
                    feed.title.as_str(),
                    feed.content.as_str(),
                    feed.summary.as_str(),
                    feed.alias.as_deref().unwrap_or(""),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect();
        hits.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(hits.into_iter().map(|feed| tables.aggregate(feed)).collect())
    }
}

#[async_trait]
impl FeedsWriteRepo for MemoryStore {
    async fn create_feed(&self, params: CreateFeedParams) -> Result<i64, RepoError> {
        let mut tables = self.tables();
        let id = tables.next_id();
        tables.feeds.push(FeedRecord {
            id,
            alias: params.alias,
            title: params.title,
            summary: params.summary,
            content: params.content,
            property: params.property,
            top: 0,
            uid: params.uid,
            allow_comment: params.allow_comment,
            status: params.status,
            views: 0,
            created_at: params.created_at,
            updated_at: params.updated_at,
        });
        Ok(id)
    }

    async fn update_feed(&self, params: UpdateFeedParams) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let feed = tables
            .feeds
            .iter_mut()
            .find(|feed| feed.id == params.id)
            .ok_or(RepoError::NotFound)?;
        if let Some(title) = params.title {
            feed.title = title;
        }
        if let Some(alias) = params.alias {
            feed.alias = alias;
        }
        if let Some(content) = params.content {
            feed.content = content;
        }
        if let Some(summary) = params.summary {
            feed.summary = summary;
        }
        if let Some(top) = params.top {
            feed.top = top;
        }
        if let Some(status) = params.status {
            feed.status = status;
        }
        if let Some(property) = params.property {
            feed.property = property;
        }
        if let Some(allow_comment) = params.allow_comment {
            feed.allow_comment = allow_comment;
        }
        if let Some(created_at) = params.created_at {
            feed.created_at = created_at;
        }
        if let Some(updated_at) = params.updated_at {
            feed.updated_at = updated_at;
        }
        Ok(())
    }

    async fn update_top(&self, id: i64, top: i32) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let feed = tables
            .feeds
            .iter_mut()
            .find(|feed| feed.id == id)
            .ok_or(RepoError::NotFound)?;
        feed.top = top;
        Ok(())
    }

    async fn update_views(&self, id: i64, views: i64) -> Result<(), RepoError> {
        if self.fail_view_updates.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        let mut tables = self.tables();
        let feed = tables
            .feeds
            .iter_mut()
            .find(|feed| feed.id == id)
            .ok_or(RepoError::NotFound)?;
        feed.views = views;
        Ok(())
    }

    async fn delete_feed(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let before = tables.feeds.len();
        tables.feeds.retain(|feed| feed.id != id);
        if tables.feeds.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.feed_metas.retain(|(feed_id, _, _)| *feed_id != id);
        tables.comments.retain(|comment| comment.feed_id != id);
        Ok(())
    }
}

#[async_trait]
impl MetasRepo for MemoryStore {
    async fn list_with_counts(
        &self,
        kind: Option<MetaType>,
    ) -> Result<Vec<MetaWithCount>, RepoError> {
        self.meta_reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        Ok(tables
            .metas
            .iter()
            .filter(|meta| kind.is_none_or(|kind| meta.kind == kind))
            .map(|meta| MetaWithCount {
                meta: meta.clone(),
                feeds: tables
                    .feed_metas
                    .iter()
                    .filter(|(_, meta_id, _)| *meta_id == meta.id)
                    .count() as i64,
            })
            .collect())
    }

    async fn find_by_alias_or_name(&self, value: &str) -> Result<Option<MetaRecord>, RepoError> {
        Ok(self
            .tables()
            .metas
            .iter()
            .find(|meta| meta.alias.as_deref() == Some(value) || meta.name == value)
            .cloned())
    }

    async fn find_by_name(
        &self,
        name: &str,
        kind: MetaType,
    ) -> Result<Option<MetaRecord>, RepoError> {
        Ok(self
            .tables()
            .metas
            .iter()
            .find(|meta| meta.name == name && meta.kind == kind)
            .cloned())
    }

    async fn create_meta(&self, params: CreateMetaParams) -> Result<MetaRecord, RepoError> {
        let mut tables = self.tables();
        if let Some(existing) = tables
            .metas
            .iter()
            .find(|meta| meta.name == params.name && meta.kind == params.kind)
        {
            return Ok(existing.clone());
        }
        let id = tables.next_id();
        let at = tables.tick();
        let record = MetaRecord {
            id,
            name: params.name,
            alias: params.alias,
            kind: params.kind,
            description: None,
            parent: None,
            created_at: at,
            updated_at: at,
        };
        tables.metas.push(record.clone());
        Ok(record)
    }

    async fn list_feeds_for_meta(
        &self,
        meta_id: i64,
        include_unpublished: bool,
    ) -> Result<Vec<FeedAggregate>, RepoError> {
        let tables = self.tables();
        Ok(tables
            .feed_metas
            .iter()
            .filter(|(_, mid, _)| *mid == meta_id)
            .filter_map(|(feed_id, _, _)| tables.feeds.iter().find(|feed| feed.id == *feed_id))
            .filter(|feed| include_unpublished || feed.status == FeedStatus::Publish)
            .map(|feed| tables.aggregate(feed))
            .collect())
    }
}

#[async_trait]
impl FeedMetasRepo for MemoryStore {
    async fn clear_feed_metas(&self, feed_id: i64, kind: MetaType) -> Result<(), RepoError> {
        if self.fail_meta_binding.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        self.tables()
            .feed_metas
            .retain(|(fid, _, k)| !(*fid == feed_id && *k == kind));
        Ok(())
    }

    async fn insert_feed_meta(
        &self,
        feed_id: i64,
        meta_id: i64,
        kind: MetaType,
    ) -> Result<(), RepoError> {
        let mut tables = self.tables();
        if !tables
            .feed_metas
            .iter()
            .any(|(fid, mid, _)| *fid == feed_id && *mid == meta_id)
        {
            tables.feed_metas.push((feed_id, meta_id, kind));
        }
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn list_for_feed(&self, feed_id: i64) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let tables = self.tables();
        let mut comments: Vec<CommentWithAuthor> = tables
            .comments
            .iter()
            .filter(|comment| comment.feed_id == feed_id)
            .filter_map(|comment| {
                let user = tables.users.iter().find(|user| user.id == comment.user_id)?;
                Some(CommentWithAuthor {
                    comment: comment.clone(),
                    user: user.summary(),
                })
            })
            .collect();
        comments.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at));
        Ok(comments)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<CommentRecord>, RepoError> {
        Ok(self
            .tables()
            .comments
            .iter()
            .find(|comment| comment.id == id)
            .cloned())
    }

    async fn create_comment(&self, params: CreateCommentParams) -> Result<i64, RepoError> {
        let mut tables = self.tables();
        let id = tables.next_id();
        let at = tables.tick();
        tables.comments.push(CommentRecord {
            id,
            feed_id: params.feed_id,
            user_id: params.user_id,
            content: params.content,
            created_at: at,
            updated_at: at,
        });
        Ok(id)
    }

    async fn delete_comment(&self, id: i64) -> Result<(), RepoError> {
        self.tables().comments.retain(|comment| comment.id != id);
        Ok(())
    }
}

#[async_trait]
impl FriendsRepo for MemoryStore {
    async fn list_friends(&self) -> Result<Vec<FriendRecord>, RepoError> {
        Ok(self.tables().friends.clone())
    }

    async fn find_friend(&self, id: i64) -> Result<Option<FriendRecord>, RepoError> {
        Ok(self.friend(id))
    }

    async fn find_by_owner(&self, uid: i64) -> Result<Option<FriendRecord>, RepoError> {
        Ok(self
            .tables()
            .friends
            .iter()
            .find(|friend| friend.uid == uid)
            .cloned())
    }

    async fn create_friend(&self, params: CreateFriendParams) -> Result<i64, RepoError> {
        let mut tables = self.tables();
        let id = tables.next_id();
        let at = tables.tick();
        tables.friends.push(FriendRecord {
            id,
            name: params.name,
            desc: params.desc,
            avatar: params.avatar,
            url: params.url,
            uid: params.uid,
            accepted: params.accepted,
            health: String::new(),
            created_at: at,
            updated_at: at,
        });
        Ok(id)
    }

    async fn update_friend(&self, params: UpdateFriendParams) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let friend = tables
            .friends
            .iter_mut()
            .find(|friend| friend.id == params.id)
            .ok_or(RepoError::NotFound)?;
        if let Some(name) = params.name {
            friend.name = name;
        }
        if let Some(desc) = params.desc {
            friend.desc = desc;
        }
        if let Some(avatar) = params.avatar {
            friend.avatar = avatar;
        }
        if let Some(url) = params.url {
            friend.url = url;
        }
        if let Some(accepted) = params.accepted {
            friend.accepted = accepted;
        }
        Ok(())
    }

    async fn delete_friend(&self, id: i64) -> Result<(), RepoError> {
        self.tables().friends.retain(|friend| friend.id != id);
        Ok(())
    }
}

#[async_trait]
impl InfoRepo for MemoryStore {
    async fn list_info(&self, prefix: &str) -> Result<Vec<InfoRecord>, RepoError> {
        Ok(self
            .tables()
            .info
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| InfoRecord {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn upsert_info(&self, key: &str, value: &str) -> Result<(), RepoError> {
        self.set_info(key, value);
        Ok(())
    }
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.tables().users.iter().find(|user| user.id == id).cloned())
    }

    async fn upsert_user(&self, params: UpsertUserParams) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables();
        let at = tables.tick();
        if let Some(user) = tables
            .users
            .iter_mut()
            .find(|user| user.openid == params.openid)
        {
            user.username = params.username;
            user.avatar = params.avatar;
            user.permission = params.permission;
            user.updated_at = at;
            return Ok(user.clone());
        }
        let id = tables.next_id();
        let user = UserRecord {
            id,
            username: params.username,
            openid: params.openid,
            avatar: params.avatar,
            permission: params.permission,
            created_at: at,
            updated_at: at,
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl UserTokensRepo for MemoryStore {
    async fn create_token(
        &self,
        params: CreateUserTokenParams,
    ) -> Result<UserTokenRecord, RepoError> {
        let mut tables = self.tables();
        let id = tables.next_id();
        let record = UserTokenRecord {
            id,
            user_id: params.user_id,
            prefix: params.prefix,
            hashed_secret: params.hashed_secret,
            created_at: tables.tick(),
            last_used_at: None,
            revoked_at: None,
        };
        tables.tokens.push(record.clone());
        Ok(record)
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<UserTokenRecord>, RepoError> {
        Ok(self
            .tables()
            .tokens
            .iter()
            .find(|token| token.prefix == prefix)
            .cloned())
    }

    async fn touch_token(&self, id: i64, at: OffsetDateTime) -> Result<(), RepoError> {
        if let Some(token) = self.tables().tokens.iter_mut().find(|token| token.id == id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }
}

pub struct FakeProbe {
    pub healthy: bool,
}

#[async_trait]
impl DatabaseProbe for FakeProbe {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        if self.healthy {
            Ok(())
        } else {
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

/// Services wired against one [`MemoryStore`].
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub cache: CacheTrigger,
    pub state: ApiState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_cache(CacheConfig::default())
    }

    pub fn with_cache(config: CacheConfig) -> Self {
        Self::build(config, true)
    }

    pub fn with_unhealthy_database() -> Self {
        Self::build(CacheConfig::default(), false)
    }

    fn build(config: CacheConfig, healthy: bool) -> Self {
        let store = Arc::new(MemoryStore::default());
        let cache = CacheTrigger::new(Arc::new(QueryCache::new(&config)));
        let auth = AuthService::new(store.clone(), store.clone());
        let site_config = SiteConfigService::new(store.clone(), cache.clone());
        let binder = MetaBinder::new(store.clone(), store.clone());

        let state = ApiState {
            feeds: Arc::new(FeedService::new(
                store.clone(),
                store.clone(),
                binder,
                site_config.clone(),
                cache.clone(),
            )),
            metas: Arc::new(MetaService::new(store.clone(), cache.clone())),
            comments: Arc::new(CommentService::new(store.clone(), store.clone())),
            friends: Arc::new(FriendService::new(store.clone(), site_config.clone())),
            site_config: Arc::new(site_config),
            users: Arc::new(UserService::new(store.clone(), auth.clone())),
            auth,
            db: Arc::new(FakeProbe { healthy }),
        };

        Self {
            store,
            cache,
            state,
        }
    }

    pub fn feeds(&self) -> &FeedService {
        &self.state.feeds
    }

    /// Creates a user and returns its viewer along with a bearer token.
    pub async fn sign_in(&self, username: &str, admin: bool) -> (Viewer, String) {
        let granted = self
            .state
            .users
            .grant(GrantUserCommand {
                username: username.to_string(),
                openid: format!("openid-{username}"),
                avatar: None,
                admin,
            })
            .await
            .expect("grant user");
        (Viewer::user(granted.user.id, admin), granted.token)
    }

    pub fn admin(&self) -> Viewer {
        let uid = self.store.seed_user("admin", true);
        Viewer::user(uid, true)
    }
}
