use crate::db::queries;
use crate::error::{AppError, AppResult};
use sqlx::PgPool;

/// Rejects actors that are unknown or deactivated
pub async fn ensure_actor(pool: &PgPool, actor_id: i64) -> AppResult<()> {
    if queries::actor_is_active(pool, actor_id).await? {
        Ok(())
    } else {
        tracing::warn!("Actor {} rejected: unknown or inactive", actor_id);
        Err(AppError::Forbidden(actor_id))
    }
}
