use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::time::interval;

use crate::core::error::Result;
use crate::features::submissions::models::FormAttachment;
use crate::modules::storage::BlobStorage;

/// Delay between sweep passes
const SWEEP_INTERVAL_SECS: u64 = 3600;

/// Rows reclaimed per pass
const SWEEP_BATCH_SIZE: i64 = 100;

/// Background worker that reclaims stale `pending` attachments
///
/// A row stays `pending` only when the process died between writing the row
/// and finishing the blob write. After the retention window such rows are
/// deleted; any blob that did make it to storage is removed best-effort.
pub struct AttachmentSweeper {
    pool: PgPool,
    storage: Arc<dyn BlobStorage>,
    retention_hours: u64,
}

impl AttachmentSweeper {
    pub fn new(pool: PgPool, storage: Arc<dyn BlobStorage>, retention_hours: u64) -> Self {
        Self {
            pool,
            storage,
            retention_hours,
        }
    }

    /// Run the sweeper in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting attachment sweeper worker (retention: {}h, interval: {}s)",
            self.retention_hours,
            SWEEP_INTERVAL_SECS
        );

        let mut interval = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));

        loop {
            interval.tick().await;

            match self.sweep().await {
                Ok(0) => {}
                Ok(swept) => tracing::info!("Swept {} stale pending attachment(s)", swept),
                Err(e) => tracing::error!("Error sweeping stale attachments: {:?}", e),
            }
        }
    }

    /// One pass: delete pending rows older than the retention window
    pub async fn sweep(&self) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::hours(self.retention_hours as i64);

        let stale = sqlx::query_as::<_, FormAttachment>(
            r#"
            SELECT * FROM form_attachments
            WHERE status = 'pending' AND created_at < $1
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(cutoff)
        .bind(SWEEP_BATCH_SIZE)
        .fetch_all(&self.pool)
        .await?;

        let mut swept = 0;
        for attachment in stale {
            // The blob may or may not exist; either way the row goes
            if let Err(e) = self.storage.delete(&attachment.storage_path).await {
                tracing::warn!(
                    "Could not delete blob {} for stale attachment {}: {}",
                    attachment.storage_path,
                    attachment.id,
                    e
                );
            }

            sqlx::query("DELETE FROM form_attachments WHERE id = $1")
                .bind(attachment.id)
                .execute(&self.pool)
                .await?;
            swept += 1;
        }

        Ok(swept)
    }
}
