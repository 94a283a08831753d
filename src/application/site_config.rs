//! Key-value site configuration stored in `info`.
//!
//! Keys are namespaced by scope (`client.` is public, `server.` is admin
//! only) and values are JSON text.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::application::auth::Viewer;
use crate::application::repos::{InfoRepo, RepoError};
use crate::cache::{CacheTrigger, keys};

pub const COUNTER_ENABLED: &str = "counter.enabled";
pub const FRIEND_APPLY_ENABLED: &str = "friend.apply.enabled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Client,
    Server,
}

impl ConfigScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }

    fn key_prefix(self) -> String {
        format!("{}.", self.as_str())
    }
}

impl FromStr for ConfigScope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "server" => Ok(Self::Server),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SiteConfigError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("unknown config scope `{0}`")]
    UnknownScope(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct SiteConfigService {
    info: Arc<dyn InfoRepo>,
    cache: CacheTrigger,
}

impl SiteConfigService {
    pub fn new(info: Arc<dyn InfoRepo>, cache: CacheTrigger) -> Self {
        Self { info, cache }
    }

    /// Returns the stored entries of `scope` with the scope prefix removed.
    pub async fn load(&self, scope: ConfigScope) -> Result<Map<String, Value>, SiteConfigError> {
        let info = self.info.clone();
        self.cache
            .cache()
            .get_or_set(&keys::config_scope(scope.as_str()), || async move {
                let prefix = scope.key_prefix();
                let entries = info.list_info(&prefix).await?;
                let mut map = Map::new();
                for entry in entries {
                    let Some(key) = entry.key.strip_prefix(&prefix) else {
                        continue;
                    };
                    let value = serde_json::from_str(&entry.value)
                        .unwrap_or_else(|_| Value::String(entry.value.clone()));
                    map.insert(key.to_string(), value);
                }
                Ok(map)
            })
            .await
    }

    /// Reads a boolean flag, falling back to `default` when the key is
    /// absent, not a boolean, or unreadable.
    pub async fn flag(&self, scope: ConfigScope, key: &str, default: bool) -> bool {
        match self.load(scope).await {
            Ok(map) => map.get(key).and_then(Value::as_bool).unwrap_or(default),
            Err(err) => {
                warn!(
                    target = "inkpad::site_config",
                    scope = scope.as_str(),
                    key,
                    error = %err,
                    "Falling back to default config flag"
                );
                default
            }
        }
    }

    pub async fn read(
        &self,
        viewer: Viewer,
        scope: &str,
    ) -> Result<Map<String, Value>, SiteConfigError> {
        let scope = parse_scope(scope)?;
        if scope == ConfigScope::Server && !viewer.admin {
            return Err(SiteConfigError::PermissionDenied);
        }
        self.load(scope).await
    }

    pub async fn update(
        &self,
        viewer: Viewer,
        scope: &str,
        entries: Map<String, Value>,
    ) -> Result<(), SiteConfigError> {
        let scope = parse_scope(scope)?;
        if !viewer.admin {
            return Err(SiteConfigError::PermissionDenied);
        }

        let prefix = scope.key_prefix();
        for (key, value) in entries {
            self.info
                .upsert_info(&format!("{prefix}{key}"), &value.to_string())
                .await?;
        }
        self.cache.config_changed(scope.as_str());
        Ok(())
    }
}

fn parse_scope(scope: &str) -> Result<ConfigScope, SiteConfigError> {
    scope
        .parse()
        .map_err(|_| SiteConfigError::UnknownScope(scope.to_string()))
}
