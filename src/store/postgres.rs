use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::info;

use super::{GameStore, PutCondition, ScanFilter, ScanPage, StoreError, StoreItem};

/// Durable store backend. One `game_items` table keyed by (pk, sk) with a
/// jsonb attribute column.
pub struct PostgresGameStore {
    pool: PgPool,
}

impl PostgresGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        info!("Game store migrations applied");

        Ok(Self::new(pool))
    }

    fn item_from_row(row: &sqlx::postgres::PgRow) -> Result<StoreItem, StoreError> {
        Ok(StoreItem::new(
            row.try_get("pk")?,
            row.try_get("sk")?,
            row.try_get("item")?,
        ))
    }
}

#[async_trait]
impl GameStore for PostgresGameStore {
    async fn get_item(&self, pk: &str, sk: &str) -> Result<Option<StoreItem>, StoreError> {
        let row = sqlx::query("SELECT pk, sk, item FROM game_items WHERE pk = $1 AND sk = $2")
            .bind(pk)
            .bind(sk)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::item_from_row).transpose()
    }

    async fn put_item(&self, item: StoreItem, condition: PutCondition) -> Result<(), StoreError> {
        match condition {
            PutCondition::IfNotExists => {
                let result = sqlx::query(
                    "INSERT INTO game_items (pk, sk, item) VALUES ($1, $2, $3) \
                     ON CONFLICT (pk, sk) DO NOTHING",
                )
                .bind(&item.pk)
                .bind(&item.sk)
                .bind(&item.attributes)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::ConditionFailed);
                }
            }
            PutCondition::None => {
                sqlx::query(
                    "INSERT INTO game_items (pk, sk, item) VALUES ($1, $2, $3) \
                     ON CONFLICT (pk, sk) DO UPDATE SET item = EXCLUDED.item",
                )
                .bind(&item.pk)
                .bind(&item.sk)
                .bind(&item.attributes)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<StoreItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT pk, sk, item FROM game_items \
             WHERE pk = $1 AND sk LIKE $2 || '%' ORDER BY sk",
        )
        .bind(pk)
        .bind(sk_prefix)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::item_from_row).collect()
    }

    async fn scan(
        &self,
        filter: &ScanFilter,
        page_size: u32,
        cursor: Option<String>,
    ) -> Result<ScanPage, StoreError> {
        let rows = sqlx::query(
            "SELECT pk, sk, item FROM game_items \
             WHERE pk LIKE $1 || '%' AND sk = $2 AND ($3::text IS NULL OR pk > $3) \
             ORDER BY pk LIMIT $4",
        )
        .bind(&filter.pk_prefix)
        .bind(&filter.sk)
        .bind(cursor.as_deref())
        .bind(i64::from(page_size))
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(Self::item_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let next_cursor = if items.len() as u32 == page_size {
            items.last().map(|item| item.pk.clone())
        } else {
            None
        };

        Ok(ScanPage { items, next_cursor })
    }
}
