use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{CreateUserTokenParams, RepoError, UserTokensRepo, UsersRepo};
use crate::domain::entities::UserTokenRecord;

const TOKEN_PREFIX: &str = "ink";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    Invalid,
    #[error("revoked token")]
    Revoked,
}

/// The requester as seen by services. Anonymous unless a valid token was
/// presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub uid: Option<i64>,
    pub admin: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(uid: i64, admin: bool) -> Self {
        Self {
            uid: Some(uid),
            admin,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.uid.is_some()
    }

    /// Owners and admins may modify a resource.
    pub fn can_manage(&self, owner_uid: i64) -> bool {
        self.admin || self.uid == Some(owner_uid)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub record: UserTokenRecord,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    tokens: Arc<dyn UserTokensRepo>,
    users: Arc<dyn UsersRepo>,
}

impl AuthService {
    pub fn new(tokens: Arc<dyn UserTokensRepo>, users: Arc<dyn UsersRepo>) -> Self {
        Self { tokens, users }
    }

    pub async fn issue(&self, user_id: i64) -> Result<IssuedToken, RepoError> {
        let prefix = Self::generate_prefix();
        let secret = Self::generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");

        let record = self
            .tokens
            .create_token(CreateUserTokenParams {
                user_id,
                prefix,
                hashed_secret: Self::hash_secret(&secret),
            })
            .await?;

        Ok(IssuedToken { record, token })
    }

    pub async fn authenticate(&self, token: &str) -> Result<Viewer, AuthError> {
        let parsed = Self::parse_token(token).ok_or(AuthError::Invalid)?;
        let record = self
            .tokens
            .find_by_prefix(&parsed.prefix)
            .await
            .map_err(|_| AuthError::Invalid)?
            .ok_or(AuthError::Invalid)?;

        let now = OffsetDateTime::now_utc();
        if let Some(revoked_at) = record.revoked_at
            && revoked_at <= now
        {
            return Err(AuthError::Revoked);
        }

        let hashed_input = Self::hash_secret(&parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AuthError::Invalid);
        }

        let user = self
            .users
            .find_user(record.user_id)
            .await
            .map_err(|_| AuthError::Invalid)?
            .ok_or(AuthError::Invalid)?;

        // best-effort last_used update; do not block auth
        let tokens = self.tokens.clone();
        tokio::spawn(async move {
            if let Err(err) = tokens.touch_token(record.id, now).await {
                debug!(target = "inkpad::auth", error = %err, "failed to record token use");
            }
        });

        Ok(Viewer::user(user.id, user.permission))
    }

    fn hash_secret(secret: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.finalize().to_vec()
    }

    fn generate_prefix() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_string()
    }

    fn generate_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn parse_token(token: &str) -> Option<ParsedToken> {
        let mut parts = token.splitn(3, '_');
        if parts.next()? != TOKEN_PREFIX {
            return None;
        }
        let prefix = parts.next()?;
        let secret = parts.next()?;
        if secret.len() < MIN_SECRET_LEN || prefix.is_empty() {
            return None;
        }
        Some(ParsedToken {
            prefix: prefix.to_string(),
            secret: secret.to_string(),
        })
    }
}

struct ParsedToken {
    prefix: String,
    secret: String,
}
