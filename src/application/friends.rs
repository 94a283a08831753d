//! Friend links and link applications.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::application::auth::Viewer;
use crate::application::repos::{
    CreateFriendParams, FriendsRepo, RepoError, UpdateFriendParams,
};
use crate::application::site_config::{ConfigScope, FRIEND_APPLY_ENABLED, SiteConfigService};
use crate::domain::entities::FriendRecord;

#[derive(Debug, Error)]
pub enum FriendError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("friend not found")]
    NotFound,
    /// Carries the public message.
    #[error("{0}")]
    Validation(&'static str),
    #[error("friend applications are disabled")]
    ApplyDisabled,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendLists {
    pub friend_list: Vec<FriendRecord>,
    pub apply_list: Vec<FriendRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateFriendCommand {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub avatar: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateFriendCommand {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub avatar: Option<String>,
    pub url: Option<String>,
    pub accepted: Option<bool>,
}

#[derive(Clone)]
pub struct FriendService {
    friends: Arc<dyn FriendsRepo>,
    config: SiteConfigService,
}

impl FriendService {
    pub fn new(friends: Arc<dyn FriendsRepo>, config: SiteConfigService) -> Self {
        Self { friends, config }
    }

    pub async fn list(&self, viewer: Viewer) -> Result<FriendLists, FriendError> {
        let (friend_list, pending): (Vec<_>, Vec<_>) = self
            .friends
            .list_friends()
            .await?
            .into_iter()
            .partition(|friend| friend.accepted);

        let apply_list = pending
            .into_iter()
            .filter(|friend| viewer.admin || viewer.uid == Some(friend.uid))
            .collect();

        Ok(FriendLists {
            friend_list,
            apply_list,
        })
    }

    /// Admin entries are accepted immediately; other users file a single
    /// pending application while applications are enabled.
    pub async fn create(
        &self,
        viewer: Viewer,
        command: CreateFriendCommand,
    ) -> Result<i64, FriendError> {
        let uid = viewer.uid.ok_or(FriendError::PermissionDenied)?;
        let name = required(command.name, "Name is required")?;
        let url = required(command.url, "URL is required")?;

        if !viewer.admin {
            if !self
                .config
                .flag(ConfigScope::Server, FRIEND_APPLY_ENABLED, true)
                .await
            {
                return Err(FriendError::ApplyDisabled);
            }
            if self.friends.find_by_owner(uid).await?.is_some() {
                return Err(FriendError::Validation("Friend already exists"));
            }
        }

        let id = self
            .friends
            .create_friend(CreateFriendParams {
                name,
                desc: command.desc.unwrap_or_default(),
                avatar: command.avatar.unwrap_or_default(),
                url,
                uid,
                accepted: viewer.admin,
            })
            .await?;
        info!(
            target = "inkpad::friends",
            friend_id = id,
            uid,
            accepted = viewer.admin,
            "Created friend"
        );
        Ok(id)
    }

    /// A non-admin edit sends the entry back for review.
    pub async fn update(
        &self,
        viewer: Viewer,
        id: i64,
        command: UpdateFriendCommand,
    ) -> Result<(), FriendError> {
        self.owned_friend(viewer, id).await?;
        let accepted = if viewer.admin {
            command.accepted
        } else {
            Some(false)
        };
        self.friends
            .update_friend(UpdateFriendParams {
                id,
                name: command.name,
                desc: command.desc,
                avatar: command.avatar,
                url: command.url,
                accepted,
            })
            .await?;
        Ok(())
    }

    pub async fn delete(&self, viewer: Viewer, id: i64) -> Result<(), FriendError> {
        self.owned_friend(viewer, id).await?;
        self.friends.delete_friend(id).await?;
        Ok(())
    }

    async fn owned_friend(&self, viewer: Viewer, id: i64) -> Result<FriendRecord, FriendError> {
        if !viewer.is_signed_in() {
            return Err(FriendError::PermissionDenied);
        }
        let friend = self
            .friends
            .find_friend(id)
            .await?
            .ok_or(FriendError::NotFound)?;
        if !viewer.can_manage(friend.uid) {
            return Err(FriendError::PermissionDenied);
        }
        Ok(friend)
    }
}

fn required(value: Option<String>, message: &'static str) -> Result<String, FriendError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(FriendError::Validation(message))
}
