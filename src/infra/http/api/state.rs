use std::sync::Arc;

use crate::application::auth::AuthService;
use crate::application::comments::CommentService;
use crate::application::feeds::FeedService;
use crate::application::friends::FriendService;
use crate::application::metas::MetaService;
use crate::application::site_config::SiteConfigService;
use crate::application::users::UserService;
use crate::infra::http::DatabaseProbe;

#[derive(Clone)]
pub struct ApiState {
    pub auth: AuthService,
    pub feeds: Arc<FeedService>,
    pub metas: Arc<MetaService>,
    pub comments: Arc<CommentService>,
    pub friends: Arc<FriendService>,
    pub site_config: Arc<SiteConfigService>,
    pub users: Arc<UserService>,
    pub db: Arc<dyn DatabaseProbe>,
}
