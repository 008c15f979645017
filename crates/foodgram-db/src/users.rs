use foodgram_core::error::AppError;
use foodgram_core::models::{Credentials, Page, PageRequest, Profile, User, UserRecord};
use foodgram_core::traits::UserStore;
use sqlx::{PgPool, Pool, Postgres};

use crate::db_error;
use crate::rows::{ProfileRow, USER_COLUMNS, UserRow};

/// Accounts and auth tokens in PostgreSQL.
#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl From<CredentialsRow> for Credentials {
    fn from(row: CredentialsRow) -> Self {
        Credentials {
            user: row.user.into(),
            password_hash: row.password_hash,
        }
    }
}

impl UserStore for UserRepository {
    async fn create_user(&self, record: &UserRecord) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, first_name, last_name
            "#,
        )
        .bind(&record.email)
        .bind(&record.username)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.into())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn get_profile(&self, id: i64, viewer: Option<i64>) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            SELECT {USER_COLUMNS},
                   EXISTS(SELECT 1 FROM subscriptions s
                          WHERE s.user_id = $2 AND s.author_id = u.id) AS is_subscribed
            FROM users u
            WHERE u.id = $1
            "#
        ))
        .bind(id)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_profiles(
        &self,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<Page<Profile>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            SELECT {USER_COLUMNS},
                   EXISTS(SELECT 1 FROM subscriptions s
                          WHERE s.user_id = $1 AND s.author_id = u.id) AS is_subscribed
            FROM users u
            ORDER BY u.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(viewer)
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

    async fn credentials_by_email(&self, email: &str) -> Result<Option<Credentials>, AppError> {
        let row = sqlx::query_as::<_, CredentialsRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}, u.password_hash
            FROM users u
            WHERE LOWER(u.email) = LOWER($1) AND u.is_active
            "#
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn credentials_by_id(&self, id: i64) -> Result<Option<Credentials>, AppError> {
        let row = sqlx::query_as::<_, CredentialsRow>(&format!(
            "SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn set_password_hash(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {user_id}")));
        }
        Ok(())
    }

    async fn insert_token(&self, user_id: i64, digest: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO auth_tokens (key_hash, user_id) VALUES ($1, $2)")
            .bind(digest)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn user_by_token(&self, digest: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key_hash = $1 AND u.is_active
            "#
        ))
        .bind(digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn delete_tokens(&self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}
