use crate::config::AppConfig;
use crate::db::queries;
use crate::error::{AppError, AppResult};
use crate::models::{DisputeState, TierUpdate, UrgencyTier};
use crate::service::access::ensure_actor;
use crate::service::classifier;
use crate::service::today;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of a recomputation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeSummary {
    pub updated: usize,
    pub tiers: BTreeMap<UrgencyTier, usize>,
}

impl RecomputeSummary {
    pub fn from_updates(updates: &[TierUpdate]) -> Self {
        let mut tiers = BTreeMap::new();
        for u in updates {
            *tiers.entry(u.tier).or_insert(0) += 1;
        }
        Self {
            updated: updates.len(),
            tiers,
        }
    }
}

/// Semaphore maintenance for stored glosas
pub struct SemaphoreService {
    pool: PgPool,
    write_timeout: Duration,
}

impl SemaphoreService {
    pub fn new(pool: PgPool, config: &AppConfig) -> Self {
        Self {
            pool,
            write_timeout: Duration::from_secs(config.database.write_timeout_secs),
        }
    }

    /// Re-classifies every pending / in-process glosa and overwrites its tier
    pub async fn recompute_all(&self, actor_id: i64) -> AppResult<RecomputeSummary> {
        ensure_actor(&self.pool, actor_id).await?;

        let active = queries::list_active_disputes(&self.pool).await?;
        if active.is_empty() {
            tracing::info!("No active glosas, nothing to recompute");
            return Ok(RecomputeSummary::default());
        }

        let today = today();
        let horizon = active
            .iter()
            .map(|d| d.due_date)
            .max()
            .unwrap_or(today)
            .max(today);
        let holidays = queries::list_holidays(&self.pool, today, horizon).await?;

        let updates =
            tokio::task::spawn_blocking(move || classifier::recompute_tiers(&active, &holidays, today))
                .await?;
        queries::update_tiers(&self.pool, &updates, self.write_timeout).await?;

        let summary = RecomputeSummary::from_updates(&updates);
        tracing::info!(
            "Semaphores recomputed by actor {}: {} glosas {:?}",
            actor_id,
            summary.updated,
            summary.tiers
        );
        Ok(summary)
    }

    /// Moves a glosa to `state`. Active targets get their tier refreshed.
    pub async fn change_state(
        &self,
        actor_id: i64,
        dispute_id: i64,
        state: DisputeState,
    ) -> AppResult<Option<TierUpdate>> {
        ensure_actor(&self.pool, actor_id).await?;

        let Some(current) = queries::get_dispute_state(&self.pool, dispute_id).await? else {
            return Err(AppError::DisputeNotFound(dispute_id));
        };

        let refreshed = if state.is_terminal() {
            None
        } else {
            let today = today();
            let holidays =
                queries::list_holidays(&self.pool, today, current.due_date.max(today)).await?;
            let assessment = classifier::assess(current.due_date, &holidays, today);
            Some(TierUpdate {
                dispute_id,
                tier: assessment.tier,
                business_days_remaining: assessment.days_for_storage(),
            })
        };

        queries::update_dispute_state(&self.pool, dispute_id, state, refreshed.as_ref()).await?;
        tracing::info!(
            "Glosa {}: state {} -> {} by actor {}",
            dispute_id,
            current.state,
            state,
            actor_id
        );
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_per_tier() {
        let updates = vec![
            TierUpdate { dispute_id: 1, tier: UrgencyTier::Red, business_days_remaining: 3 },
            TierUpdate { dispute_id: 2, tier: UrgencyTier::Red, business_days_remaining: 1 },
            TierUpdate { dispute_id: 3, tier: UrgencyTier::Black, business_days_remaining: 0 },
        ];
        let summary = RecomputeSummary::from_updates(&updates);

        assert_eq!(summary.updated, 3);
        assert_eq!(summary.tiers.get(&UrgencyTier::Red), Some(&2));
        assert_eq!(summary.tiers.get(&UrgencyTier::Black), Some(&1));
        assert_eq!(summary.tiers.get(&UrgencyTier::Green), None);
    }
}
