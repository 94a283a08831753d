use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::auth::{AuthService, Viewer};
use crate::application::repos::{RepoError, UpsertUserParams, UsersRepo};
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct GrantUserCommand {
    pub username: String,
    pub openid: String,
    pub avatar: Option<String>,
    pub admin: bool,
}

#[derive(Debug, Clone)]
pub struct GrantedUser {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
    auth: AuthService,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepo>, auth: AuthService) -> Self {
        Self { users, auth }
    }

    pub async fn profile(&self, viewer: Viewer) -> Result<UserRecord, UserError> {
        let uid = viewer.uid.ok_or(UserError::PermissionDenied)?;
        self.users.find_user(uid).await?.ok_or(UserError::NotFound)
    }

    /// Creates or refreshes a user keyed by `openid` and issues a token.
    pub async fn grant(&self, command: GrantUserCommand) -> Result<GrantedUser, UserError> {
        let username = command.username.trim();
        let openid = command.openid.trim();
        if username.is_empty() {
            return Err(DomainError::Blank { field: "username" }.into());
        }
        if openid.is_empty() {
            return Err(DomainError::Blank { field: "openid" }.into());
        }

        let user = self
            .users
            .upsert_user(UpsertUserParams {
                username: username.to_string(),
                openid: openid.to_string(),
                avatar: command.avatar.filter(|avatar| !avatar.trim().is_empty()),
                permission: command.admin,
            })
            .await?;
        let issued = self.auth.issue(user.id).await?;

        info!(
            target = "inkpad::users",
            user_id = user.id,
            username = %user.username,
            admin = user.permission,
            token_prefix = %issued.record.prefix,
            "Issued user token"
        );

        Ok(GrantedUser {
            user,
            token: issued.token,
        })
    }
}
