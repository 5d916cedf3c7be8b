use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::entities::{
    Article, EnrichmentUpdate, FeedSeed, FeedSource, FetchLog, FetchLogUpdate, FetchStatus,
    NewArticle,
};
use crate::repositories::{CleanupCounts, NewsRepository};
use crate::slug::generate_unique_slug;

/// Candidate rows per INSERT; keeps bind parameters well under the protocol limit.
const UPSERT_CHUNK: usize = 1000;

/// Rounds of slug regeneration for rows whose slug was taken concurrently.
const SLUG_RETRIES: usize = 2;

const ARTICLE_COLUMNS: &str = "id, slug, title, summary, content, link, author, published_at, \
     category, source_name, source_url, image_url, is_processed, created_at, updated_at";

const FEED_COLUMNS: &str = "id, name, url, category, description, is_active, created_at, updated_at";

const LOG_COLUMNS: &str = "id, feed_name, fetched_at, status, articles_found, articles_processed, \
     error_message, execution_time_ms";

/// Insert rows, skipping any that hit a unique link or slug. Returns the
/// links that were actually stored.
async fn insert_batch(conn: &mut PgConnection, rows: &[NewArticle]) -> Result<HashSet<String>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO articles (slug, title, summary, content, link, author, published_at, \
         category, source_name, source_url, image_url, is_processed, created_at) ",
    );
    query.push_values(rows, |mut row, article| {
        row.push_bind(&article.slug)
            .push_bind(&article.title)
            .push_bind(&article.summary)
            .push("NULL")
            .push_bind(&article.link)
            .push_bind(&article.author)
            .push_bind(article.published_at)
            .push_bind(article.category)
            .push_bind(&article.source_name)
            .push_bind(&article.source_url)
            .push_bind(&article.image_url)
            .push("TRUE")
            .push("now()");
    });
    query.push(" ON CONFLICT DO NOTHING RETURNING link");

    let stored: Vec<String> = query.build_query_scalar().fetch_all(conn).await?;
    Ok(stored.into_iter().collect())
}

#[derive(Clone)]
pub struct PgNewsRepository {
    pool: PgPool,
}

impl PgNewsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_article_where(&self, predicate: &str, key: &str) -> Result<Option<Article>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE {predicate}");
        let article = sqlx::query_as::<_, Article>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }
}

#[async_trait]
impl NewsRepository for PgNewsRepository {
    async fn upsert_articles_ignoring_conflicts(&self, records: &[NewArticle]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in records.chunks(UPSERT_CHUNK) {
            let mut pending = chunk.to_vec();
            for round in 0..=SLUG_RETRIES {
                let stored = insert_batch(&mut *tx, &pending).await?;
                inserted += stored.len() as u64;
                pending.retain(|article| !stored.contains(&article.link));
                if pending.is_empty() {
                    break;
                }

                // Rows skipped for a link that is already stored are expected.
                // Anything else lost on its slug and gets a fresh one.
                let links: Vec<String> = pending.iter().map(|a| a.link.clone()).collect();
                let known: Vec<String> =
                    sqlx::query_scalar("SELECT link FROM articles WHERE link = ANY($1)")
                        .bind(&links)
                        .fetch_all(&mut *tx)
                        .await?;
                pending.retain(|article| !known.contains(&article.link));
                if pending.is_empty() {
                    break;
                }
                if round == SLUG_RETRIES {
                    warn!(dropped = pending.len(), "Giving up on rows with colliding slugs");
                    break;
                }

                let taken: Vec<String> = sqlx::query_scalar("SELECT slug FROM articles")
                    .fetch_all(&mut *tx)
                    .await?;
                let mut taken: HashSet<String> = taken.into_iter().collect();
                warn!(count = pending.len(), "Regenerating colliding slugs");
                for article in &mut pending {
                    article.slug = generate_unique_slug(&article.title, &taken);
                    taken.insert(article.slug.clone());
                }
            }
        }
        tx.commit().await?;

        debug!(candidates = records.len(), inserted, "Upserted articles");
        Ok(inserted)
    }

    async fn find_article_by_link(&self, link: &str) -> Result<Option<Article>> {
        self.find_article_where("link = $1", link).await
    }

    async fn find_article_by_slug_or_id(&self, key: &str) -> Result<Option<Article>> {
        if let Some(article) = self.find_article_where("slug = $1", key).await? {
            return Ok(Some(article));
        }
        let Ok(id) = key.parse::<i64>() else {
            return Ok(None);
        };
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let article = sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn list_existing_slugs(&self) -> Result<HashSet<String>> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM articles")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs.into_iter().collect())
    }

    async fn record_fetch_log(&self, feed_name: &str) -> Result<i64> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO fetch_logs (feed_name, status)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(feed_name)
        .bind(FetchStatus::Fetching)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_fetch_log(&self, id: i64, update: &FetchLogUpdate) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE fetch_logs
            SET status             = $2,
                articles_found     = $3,
                articles_processed = $4,
                error_message      = $5,
                execution_time_ms  = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.status)
        .bind(update.articles_found)
        .bind(update.articles_processed)
        .bind(&update.error_message)
        .bind(update.execution_time_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_fetch_logs(&self, limit: i64) -> Result<Vec<FetchLog>> {
        let sql = format!("SELECT {LOG_COLUMNS} FROM fetch_logs ORDER BY fetched_at DESC, id DESC LIMIT $1");
        let logs = sqlx::query_as::<_, FetchLog>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(logs)
    }

    async fn list_active_feed_sources(&self) -> Result<Vec<FeedSource>> {
        let sql = format!("SELECT {FEED_COLUMNS} FROM feed_sources WHERE is_active ORDER BY id");
        let feeds = sqlx::query_as::<_, FeedSource>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(feeds)
    }

    async fn seed_feed_sources(&self, seeds: &[FeedSeed]) -> Result<u64> {
        if seeds.is_empty() {
            return Ok(0);
        }
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO feed_sources (name, url, category) ");
        query.push_values(seeds, |mut row, seed| {
            row.push_bind(seed.name)
                .push_bind(seed.url)
                .push_bind(seed.category);
        });
        query.push(" ON CONFLICT (name) DO NOTHING");

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn find_feed_source(&self, name: &str) -> Result<Option<FeedSource>> {
        let sql = format!("SELECT {FEED_COLUMNS} FROM feed_sources WHERE name = $1");
        let feed = sqlx::query_as::<_, FeedSource>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(feed)
    }

    async fn toggle_feed_source(&self, name: &str) -> Result<Option<FeedSource>> {
        let sql = format!(
            "UPDATE feed_sources SET is_active = NOT is_active, updated_at = now() \
             WHERE name = $1 RETURNING {FEED_COLUMNS}"
        );
        let feed = sqlx::query_as::<_, FeedSource>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(feed)
    }

    async fn delete_feed_source(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_sources WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_articles_missing_content(&self, limit: i64) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE content IS NULL OR btrim(content) = '' \
             ORDER BY published_at DESC NULLS LAST, created_at DESC \
             LIMIT $1"
        );
        let articles = sqlx::query_as::<_, Article>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    async fn apply_enrichment(
        &self,
        id: i64,
        update: &EnrichmentUpdate,
    ) -> Result<Option<Article>> {
        // One conditional statement: concurrent sweeps can only fill blanks.
        let sql = format!(
            r#"
            UPDATE articles
            SET content = CASE
                    WHEN (content IS NULL OR btrim(content) = '') AND btrim(coalesce($2, '')) <> ''
                    THEN $2 ELSE content END,
                image_url = CASE
                    WHEN (image_url IS NULL OR btrim(image_url) = '') AND btrim(coalesce($3, '')) <> ''
                    THEN $3 ELSE image_url END,
                updated_at = now()
            WHERE id = $1
            RETURNING {ARTICLE_COLUMNS}
            "#
        );
        let article = sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .bind(&update.content)
            .bind(&update.image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn clear_article_content(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE articles SET content = NULL, image_url = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cleanup_feed_data(&self, feed_name: &str) -> Result<CleanupCounts> {
        let mut tx = self.pool.begin().await?;
        let articles = sqlx::query("DELETE FROM articles WHERE source_name = $1")
            .bind(feed_name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let fetch_logs = sqlx::query("DELETE FROM fetch_logs WHERE feed_name = $1")
            .bind(feed_name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        Ok(CleanupCounts {
            articles,
            fetch_logs,
        })
    }

    async fn cleanup_all_data(&self) -> Result<CleanupCounts> {
        let mut tx = self.pool.begin().await?;
        let articles = sqlx::query("DELETE FROM articles")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let fetch_logs = sqlx::query("DELETE FROM fetch_logs")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        Ok(CleanupCounts {
            articles,
            fetch_logs,
        })
    }
}
