use foodgram_core::error::AppError;
use foodgram_core::models::{Page, PageRequest, RecipeSummary, User};
use foodgram_core::traits::SubscriptionStore;
use sqlx::{PgPool, Pool, Postgres};

use crate::db_error;
use crate::rows::{SummaryRow, USER_COLUMNS, UserRow};

/// Follow relationships between users.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: Pool<Postgres>,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SubscriptionStore for SubscriptionRepository {
    async fn subscribe(&self, user_id: i64, author_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn unsubscribe(&self, user_id: i64, author_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn subscribed_authors(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<User>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM subscriptions s
            JOIN users u ON u.id = s.author_id
            WHERE s.user_id = $1
            ORDER BY u.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total,
        })
    }

    async fn author_recipes(
        &self,
        author_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<RecipeSummary>, AppError> {
        // LIMIT NULL means no limit in PostgreSQL.
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id, name, image, cooking_time
            FROM recipes
            WHERE author_id = $1
            ORDER BY pub_date DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(author_id)
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_author_recipes(&self, author_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}
