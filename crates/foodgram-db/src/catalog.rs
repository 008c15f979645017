use foodgram_core::error::AppError;
use foodgram_core::models::{Ingredient, NewIngredient, NewTag, Tag};
use foodgram_core::traits::CatalogStore;
use sqlx::{PgPool, Pool, Postgres};

use crate::db_error;

/// Tags and ingredients.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: Pool<Postgres>,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
    color: String,
    slug: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            color: row.color,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow)]
struct IngredientRow {
    id: i64,
    name: String,
    measurement_unit: String,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Ingredient {
            id: row.id,
            name: row.name,
            measurement_unit: row.measurement_unit,
        }
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl CatalogStore for CatalogRepository {
    async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, color, slug FROM tags ORDER BY slug DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_tag(&self, id: i64) -> Result<Option<Tag>, AppError> {
        let row = sqlx::query_as::<_, TagRow>("SELECT id, name, color, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag, AppError> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (name, color, slug)
            VALUES ($1, $2, $3)
            RETURNING id, name, color, slug
            "#,
        )
        .bind(&tag.name)
        .bind(&tag.color)
        .bind(&tag.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.into())
    }

    async fn search_ingredients(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>, AppError> {
        let pattern = prefix.map(|p| format!("{}%", escape_like(&p.to_lowercase())));
        let rows = sqlx::query_as::<_, IngredientRow>(
            r#"
            SELECT id, name, measurement_unit
            FROM ingredients
            WHERE $1::text IS NULL OR LOWER(name) LIKE $1
            ORDER BY name, id
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>, AppError> {
        let row = sqlx::query_as::<_, IngredientRow>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn upsert_ingredient(&self, ingredient: &NewIngredient) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO ingredients (name, measurement_unit)
            VALUES ($1, $2)
            ON CONFLICT (name, measurement_unit) DO NOTHING
            "#,
        )
        .bind(&ingredient.name)
        .bind(&ingredient.measurement_unit)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn missing_ingredients(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        sqlx::query_scalar(
            r#"
            SELECT req.id
            FROM UNNEST($1::bigint[]) AS req(id)
            WHERE NOT EXISTS (SELECT 1 FROM ingredients i WHERE i.id = req.id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn missing_tags(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        sqlx::query_scalar(
            r#"
            SELECT req.id
            FROM UNNEST($1::bigint[]) AS req(id)
            WHERE NOT EXISTS (SELECT 1 FROM tags t WHERE t.id = req.id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }
}
