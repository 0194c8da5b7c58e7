//! `MenuRepository` (spec §4.11 "writes never go through this path" — this
//! is the read side the import pipeline's writes eventually become visible
//! through) backed by Postgres. `MenuCache` is the only caller; nothing else
//! in the conversation core touches menu rows directly.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::Row;

use drivethru_core::order::{IngredientRef, Inventory};
use drivethru_core::{Ingredient, MenuItem};
use drivethru_menu::repository::MenuRepository;
use drivethru_menu::Result;

use crate::error::StoreError;

pub struct SqlxMenuRepository {
    pool: PgPool,
}

impl SqlxMenuRepository {
    pub async fn connect(database_url: &str) -> crate::error::Result<Self> {
        let pool = PgPool::connect(database_url).await.map_err(StoreError::Archive)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRepository for SqlxMenuRepository {
    async fn fetch_menu(&self, restaurant_id: &str) -> Result<Vec<MenuItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, category_id, name, price, is_available, available_sizes
            FROM menu_items
            WHERE restaurant_id = $1
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Archive)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(StoreError::Archive)?;
            let ingredients = self.fetch_item_ingredients(restaurant_id, &id).await?;
            items.push(MenuItem {
                id,
                restaurant_id: restaurant_id.to_string(),
                category_id: row.try_get("category_id").map_err(StoreError::Archive)?,
                name: row.try_get("name").map_err(StoreError::Archive)?,
                price: row.try_get("price").map_err(StoreError::Archive)?,
                is_available: row.try_get("is_available").map_err(StoreError::Archive)?,
                ingredients,
                available_sizes: row.try_get::<Vec<String>, _>("available_sizes").unwrap_or_default(),
            });
        }
        Ok(items)
    }

    async fn fetch_ingredients(&self, restaurant_id: &str, _menu_item_id: &str) -> Result<Vec<Ingredient>> {
        let rows = sqlx::query("SELECT id, name, unit_cost FROM ingredients WHERE restaurant_id = $1")
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Archive)?;

        rows.into_iter()
            .map(|row| {
                Ok(Ingredient {
                    id: row.try_get("id").map_err(StoreError::Archive)?,
                    restaurant_id: restaurant_id.to_string(),
                    name: row.try_get("name").map_err(StoreError::Archive)?,
                    unit_cost: row.try_get("unit_cost").map_err(StoreError::Archive)?,
                })
            })
            .collect::<std::result::Result<Vec<_>, StoreError>>()
            .map_err(Into::into)
    }

    async fn fetch_inventory(&self, restaurant_id: &str, ingredient_id: &str) -> Result<Option<Inventory>> {
        let row = sqlx::query(
            r#"
            SELECT current_stock, min_stock_level
            FROM inventory
            WHERE restaurant_id = $1 AND ingredient_id = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(ingredient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Archive)?;

        row.map(|row| {
            Ok::<_, StoreError>(Inventory {
                ingredient_id: ingredient_id.to_string(),
                current_stock: row.try_get("current_stock").map_err(StoreError::Archive)?,
                min_stock_level: row.try_get("min_stock_level").map_err(StoreError::Archive)?,
            })
        })
        .transpose()
        .map_err(Into::into)
    }
}

impl SqlxMenuRepository {
    /// The per-item ingredient links (required/optional, add-on cost) that
    /// `MenuItem::ingredients` carries, distinct from `fetch_ingredients`'s
    /// restaurant-wide stocked-ingredient list used for inventory checks.
    async fn fetch_item_ingredients(&self, restaurant_id: &str, menu_item_id: &str) -> Result<Vec<IngredientRef>> {
        let rows = sqlx::query(
            r#"
            SELECT ingredient_id, name, required, additional_cost
            FROM menu_item_ingredients
            WHERE restaurant_id = $1 AND menu_item_id = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(menu_item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Archive)?;

        rows.into_iter()
            .map(|row| {
                Ok(IngredientRef {
                    ingredient_id: row.try_get("ingredient_id").map_err(StoreError::Archive)?,
                    name: row.try_get("name").map_err(StoreError::Archive)?,
                    required: row.try_get("required").map_err(StoreError::Archive)?,
                    additional_cost: row.try_get("additional_cost").map_err(StoreError::Archive)?,
                })
            })
            .collect::<std::result::Result<Vec<_>, StoreError>>()
            .map_err(Into::into)
    }
}
