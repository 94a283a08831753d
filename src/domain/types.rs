//! Shared domain enumerations aligned with persisted database enums.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Visibility of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "feed_status", rename_all = "snake_case")]
pub enum FeedStatus {
    #[default]
    Publish,
    Draft,
    Private,
}

impl FeedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Private => "private",
        }
    }

    /// Parses a client supplied status, falling back to `publish` for
    /// anything missing or unknown.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|raw| raw.parse().ok()).unwrap_or_default()
    }
}

impl Display for FeedStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(Self::Publish),
            "draft" => Ok(Self::Draft),
            "private" => Ok(Self::Private),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "feed_property", rename_all = "snake_case")]
pub enum FeedProperty {
    #[default]
    Post,
    Page,
}

impl FeedProperty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
        }
    }

    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|raw| raw.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for FeedProperty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Post),
            "page" => Ok(Self::Page),
            _ => Err(()),
        }
    }
}

/// Discriminates tags from categories in `metas` and `feed_metas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "meta_type", rename_all = "snake_case")]
pub enum MetaType {
    Tag,
    Category,
}

impl MetaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Category => "category",
        }
    }
}

impl Display for MetaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetaType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tag" => Ok(Self::Tag),
            "category" => Ok(Self::Category),
            _ => Err(()),
        }
    }
}
