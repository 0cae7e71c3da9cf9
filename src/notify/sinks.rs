use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::errors::AppError;
use super::{DomainEvent, NotificationSink};

/// Writes events to the `notifications` outbox table for an external mailer.
#[derive(Debug, Clone)]
pub struct PgOutbox {
    pool: PgPool,
}

impl PgOutbox {
    pub fn new(pool: PgPool) -> Self {
        PgOutbox { pool }
    }
}

#[async_trait]
impl NotificationSink for PgOutbox {
    async fn deliver(&self, event: &DomainEvent) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notifications (event_type, proposal_id, recipients, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&event.event_type)
        .bind(&event.proposal_id)
        .bind(&event.recipients)
        .bind(Json(&event.payload))
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Logs events instead of delivering them. Used with the in-memory backend.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, event: &DomainEvent) -> Result<(), AppError> {
        log::info!(
            target: "notify",
            "{} for {} -> {}",
            event.event_type,
            event.proposal_id,
            event.recipients.join(",")
        );
        Ok(())
    }
}
