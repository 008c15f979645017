use std::collections::HashMap;

use chrono::{DateTime, Utc};
use foodgram_core::error::AppError;
use foodgram_core::models::{
    Membership, Page, PageRequest, Profile, Recipe, RecipeDraft, RecipeFilter, RecipeIngredient,
    RecipeSummary, ShoppingListItem, Tag, User,
};
use foodgram_core::traits::RecipeStore;
use sqlx::{PgPool, Pool, Postgres, QueryBuilder, Transaction};

use crate::db_error;
use crate::rows::SummaryRow;

/// Recipes, their tag and ingredient links, favorites and shopping carts.
#[derive(Clone)]
pub struct RecipeRepository {
    pool: Pool<Postgres>,
}

impl RecipeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace the tag and ingredient links of a recipe inside `tx`.
    async fn write_links(
        tx: &mut Transaction<'_, Postgres>,
        recipe_id: i64,
        draft: &RecipeDraft,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;

        sqlx::query(
            "INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, UNNEST($2::bigint[])",
        )
        .bind(recipe_id)
        .bind(&draft.tags)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;

        let (ids, amounts): (Vec<i64>, Vec<i32>) =
            draft.ingredients.iter().map(|i| (i.id, i.amount)).unzip();
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
            SELECT $1, item.id, item.amount
            FROM UNNEST($2::bigint[], $3::int[]) AS item(id, amount)
            "#,
        )
        .bind(recipe_id)
        .bind(&ids)
        .bind(&amounts)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    /// Attach tags and ingredients to a page of recipe rows, keeping row order.
    async fn hydrate(&self, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let tag_rows = sqlx::query_as::<_, TagLinkRow>(
            r#"
            SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY t.slug DESC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let ingredient_rows = sqlx::query_as::<_, IngredientLinkRow>(
            r#"
            SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ANY($1)
            ORDER BY i.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.recipe_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
                color: row.color,
                slug: row.slug,
            });
        }
        let mut ingredients: HashMap<i64, Vec<RecipeIngredient>> = HashMap::new();
        for row in ingredient_rows {
            ingredients
                .entry(row.recipe_id)
                .or_default()
                .push(RecipeIngredient {
                    id: row.id,
                    name: row.name,
                    measurement_unit: row.measurement_unit,
                    amount: row.amount,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = tags.remove(&row.id).unwrap_or_default();
                let ingredients = ingredients.remove(&row.id).unwrap_or_default();
                row.into_recipe(tags, ingredients)
            })
            .collect())
    }
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: i64,
    name: String,
    image: Option<String>,
    text: String,
    cooking_time: i32,
    pub_date: DateTime<Utc>,
    author_id: i64,
    author_email: String,
    author_username: String,
    author_first_name: String,
    author_last_name: String,
    author_is_subscribed: bool,
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

impl RecipeRow {
    fn into_recipe(self, tags: Vec<Tag>, ingredients: Vec<RecipeIngredient>) -> Recipe {
        Recipe {
            id: self.id,
            author: Profile {
                user: User {
                    id: self.author_id,
                    email: self.author_email,
                    username: self.author_username,
                    first_name: self.author_first_name,
                    last_name: self.author_last_name,
                },
                is_subscribed: self.author_is_subscribed,
            },
            tags,
            ingredients,
            name: self.name,
            image: self.image,
            text: self.text,
            cooking_time: self.cooking_time,
            pub_date: self.pub_date,
            is_favorited: self.is_favorited,
            is_in_shopping_cart: self.is_in_shopping_cart,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagLinkRow {
    recipe_id: i64,
    id: i64,
    name: String,
    color: String,
    slug: String,
}

#[derive(sqlx::FromRow)]
struct IngredientLinkRow {
    recipe_id: i64,
    id: i64,
    name: String,
    measurement_unit: String,
    amount: i32,
}

#[derive(sqlx::FromRow)]
struct ShoppingListRow {
    name: String,
    measurement_unit: String,
    total_amount: i64,
}

// -- Query construction --

/// Recipe columns joined with the author, with viewer-relative flags.
/// Ends in an open `WHERE TRUE` clause.
fn select_recipes(viewer: Option<i64>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        r#"
        SELECT r.id, r.name, r.image, r.text, r.cooking_time, r.pub_date,
               u.id AS author_id, u.email AS author_email, u.username AS author_username,
               u.first_name AS author_first_name, u.last_name AS author_last_name,
               EXISTS(SELECT 1 FROM subscriptions s
                      WHERE s.author_id = u.id AND s.user_id = "#,
    );
    qb.push_bind(viewer);
    qb.push(
        r#") AS author_is_subscribed,
               EXISTS(SELECT 1 FROM favorites f
                      WHERE f.recipe_id = r.id AND f.user_id = "#,
    );
    qb.push_bind(viewer);
    qb.push(
        r#") AS is_favorited,
               EXISTS(SELECT 1 FROM shopping_cart c
                      WHERE c.recipe_id = r.id AND c.user_id = "#,
    );
    qb.push_bind(viewer);
    qb.push(
        r#") AS is_in_shopping_cart
        FROM recipes r
        JOIN users u ON u.id = r.author_id
        WHERE TRUE"#,
    );
    qb
}

fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, filter: &RecipeFilter) {
    if let Some(author) = filter.author {
        qb.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
             WHERE rt.recipe_id = r.id AND t.slug = ANY(",
        )
        .push_bind(filter.tags.clone())
        .push("))");
    }
    if let Some(user_id) = filter.favorited_by {
        qb.push(" AND EXISTS (SELECT 1 FROM favorites f2 WHERE f2.recipe_id = r.id AND f2.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(user_id) = filter.in_cart_of {
        qb.push(
            " AND EXISTS (SELECT 1 FROM shopping_cart c2 WHERE c2.recipe_id = r.id AND c2.user_id = ",
        )
        .push_bind(user_id)
        .push(")");
    }
}

fn membership_table(kind: Membership) -> &'static str {
    match kind {
        Membership::Favorite => "favorites",
        Membership::ShoppingCart => "shopping_cart",
    }
}

impl RecipeStore for RecipeRepository {
    async fn insert_recipe(&self, author_id: i64, draft: &RecipeDraft) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (author_id, name, image, text, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(&draft.name)
        .bind(&draft.image)
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        Self::write_links(&mut tx, id, draft).await?;
        tx.commit().await.map_err(db_error)?;

        tracing::debug!(recipe_id = id, author_id, "Inserted recipe");
        Ok(id)
    }

    async fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            r#"
            UPDATE recipes
            SET name = $2, text = $3, cooking_time = $4, image = COALESCE($5, image)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .bind(&draft.image)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Recipe {id}")));
        }

        Self::write_links(&mut tx, id, draft).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn delete_recipe(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn recipe_author(&self, id: i64) -> Result<Option<i64>, AppError> {
        sqlx::query_scalar("SELECT author_id FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn get_recipe(&self, id: i64, viewer: Option<i64>) -> Result<Option<Recipe>, AppError> {
        let mut qb = select_recipes(viewer);
        qb.push(" AND r.id = ").push_bind(id);

        let row = qb
            .build_query_as::<RecipeRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<Page<Recipe>, AppError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM recipes r WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let mut qb = select_recipes(viewer);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb
            .build_query_as::<RecipeRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(Page {
            items: self.hydrate(rows).await?,
            total,
        })
    }

    async fn recipe_summary(&self, id: i64) -> Result<Option<RecipeSummary>, AppError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn add_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool, AppError> {
        let table = membership_table(kind);
        let result = sqlx::query(&format!(
            "INSERT INTO {table} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool, AppError> {
        let table = membership_table(kind);
        let result = sqlx::query(&format!(
            "DELETE FROM {table} WHERE user_id = $1 AND recipe_id = $2"
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn shopping_list(&self, user_id: i64) -> Result<Vec<ShoppingListItem>, AppError> {
        let rows = sqlx::query_as::<_, ShoppingListRow>(
            r#"
            SELECT i.name, i.measurement_unit, SUM(ri.amount)::BIGINT AS total_amount
            FROM shopping_cart c
            JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE c.user_id = $1
            GROUP BY i.id, i.name, i.measurement_unit
            ORDER BY i.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| ShoppingListItem {
                name: row.name,
                measurement_unit: row.measurement_unit,
                total_amount: row.total_amount,
            })
            .collect())
    }
}
