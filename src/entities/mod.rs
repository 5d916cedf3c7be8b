use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// --- PostgreSQL Enums ---
#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(type_name = "news_category")]
pub enum Category {
    #[sqlx(rename = "Tech")]
    #[serde(rename = "Tech")]
    Tech,
    #[sqlx(rename = "Finance")]
    #[serde(rename = "Finance")]
    Finance,
    #[sqlx(rename = "Global News")]
    #[serde(rename = "Global News")]
    GlobalNews,
    #[sqlx(rename = "Vietnamese News")]
    #[serde(rename = "Vietnamese News")]
    VietnameseNews,
    #[sqlx(rename = "US News")]
    #[serde(rename = "US News")]
    UsNews,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Tech,
        Category::Finance,
        Category::GlobalNews,
        Category::VietnameseNews,
        Category::UsNews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tech => "Tech",
            Category::Finance => "Finance",
            Category::GlobalNews => "Global News",
            Category::VietnameseNews => "Vietnamese News",
            Category::UsNews => "US News",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Accepts the display names as well as the snake_case spellings used by
    /// older catalog revisions (`global_news`, `tech`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "tech" => Ok(Category::Tech),
            "finance" => Ok(Category::Finance),
            "globalnews" => Ok(Category::GlobalNews),
            "vietnamesenews" => Ok(Category::VietnameseNews),
            "usnews" => Ok(Category::UsNews),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "fetch_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Fetching,
    Success,
    Error,
}

/// --- Tables ---

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct FeedSource {
    pub id: i64,
    pub name: String, // unique human key
    pub url: String,
    pub category: Category,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Catalog entry merged into the store at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSeed {
    pub name: &'static str,
    pub url: &'static str,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Article {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>, // sanitized HTML or plain text, filled lazily
    pub link: String,            // natural key for deduplication
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: Category,
    pub source_name: String,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    pub is_processed: bool, // metadata ingestion done, independent of enrichment
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn has_content(&self) -> bool {
        is_present(self.content.as_deref())
    }

    pub fn has_image(&self) -> bool {
        is_present(self.image_url.as_deref())
    }
}

/// A candidate row for the batch upsert. `content` is always deferred.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub link: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: Category,
    pub source_name: String,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct FetchLog {
    pub id: i64,
    pub feed_name: String,
    pub fetched_at: DateTime<Utc>,
    pub status: FetchStatus,
    pub articles_found: i32,
    pub articles_processed: i32,
    pub error_message: Option<String>,
    pub execution_time_ms: Option<i64>,
}

/// Terminal values written over a `fetching` log row.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchLogUpdate {
    pub status: FetchStatus,
    pub articles_found: i32,
    pub articles_processed: i32,
    pub error_message: Option<String>,
    pub execution_time_ms: i64,
}

/// Fields produced by one extraction; applied only where the stored value is blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentUpdate {
    pub content: Option<String>,
    pub image_url: Option<String>,
}

impl EnrichmentUpdate {
    pub fn is_empty(&self) -> bool {
        !is_present(self.content.as_deref()) && !is_present(self.image_url.as_deref())
    }
}

pub fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
