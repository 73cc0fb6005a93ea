use async_trait::async_trait;
use chrono::Utc;
use pulse_core::model::ReviewCollection;
use tracing::{debug, info};

use super::{
    SqliteRepository,
    mapping::{conn, map_slot_row},
};
use crate::record;
use crate::repository::{ReviewSlotRepository, StorageError};

#[async_trait]
impl ReviewSlotRepository for SqliteRepository {
    fn slot(&self) -> &str {
        &self.slot
    }

    async fn load(&self) -> Result<Option<ReviewCollection>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT payload, updated_at
                FROM review_slots
                WHERE key = ?1
            ",
        )
        .bind(self.slot.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            debug!(slot = %self.slot, "sqlite slot empty");
            return Ok(None);
        };

        let slot = map_slot_row(&row)?;
        debug!(
            slot = %self.slot,
            items = slot.collection.len(),
            updated_at = %slot.updated_at,
            "loaded sqlite slot"
        );
        Ok(Some(slot.collection))
    }

    async fn save(&self, collection: &ReviewCollection) -> Result<(), StorageError> {
        let payload = record::encode(collection)?;

        sqlx::query(
            r"
                INSERT INTO review_slots (key, payload, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(self.slot.as_str())
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        debug!(slot = %self.slot, items = collection.len(), "saved sqlite slot");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM review_slots WHERE key = ?1")
            .bind(self.slot.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        info!(slot = %self.slot, removed = res.rows_affected(), "cleared sqlite slot");
        Ok(())
    }
}
