//! Write-once relational archive for completed orders (spec §4.10
//! "Archive"). Only a `COMPLETED` session is ever archived — no live
//! session state reaches this store, and reads for an in-progress
//! conversation never touch it (spec §4.10 "Consistency").

use async_trait::async_trait;
use sqlx::PgPool;

use drivethru_core::error::Result;
use drivethru_core::session::{Session, SessionStatus};
use drivethru_core::traits::OrderArchive;

use crate::error::StoreError;

fn status_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Active => "ACTIVE",
        SessionStatus::Completed => "COMPLETED",
        SessionStatus::Cancelled => "CANCELLED",
    }
}

pub struct SqlxOrderArchive {
    pool: PgPool,
}

impl SqlxOrderArchive {
    pub async fn connect(database_url: &str) -> crate::error::Result<Self> {
        let pool = PgPool::connect(database_url).await.map_err(StoreError::Archive)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderArchive for SqlxOrderArchive {
    async fn archive_completed_order(&self, session: &Session) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Archive)?;

        // `session_id` is indexed but never the primary key (spec §9, Open
        // Question 2) — the archive assigns its own serial id here.
        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO archived_orders (session_id, restaurant_id, status, total, created_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING id
            "#,
        )
        .bind(&session.session_id)
        .bind(&session.restaurant_id)
        .bind(status_str(session.status))
        .bind(session.order.total())
        .bind(session.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::Archive)?;

        for item in &session.order.line_items {
            sqlx::query(
                r#"
                INSERT INTO archived_order_line_items
                    (order_id, menu_item_id, name, quantity, size, unit_price, total_price, special_instructions)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(order_id)
            .bind(&item.menu_item_id)
            .bind(&item.name)
            .bind(item.quantity as i32)
            .bind(&item.size)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(&item.special_instructions)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::Archive)?;
        }

        tx.commit().await.map_err(StoreError::Archive)?;
        Ok(order_id)
    }
}
