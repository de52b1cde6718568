use crate::error::AppError;
use crate::models::{
    ActiveDispute, DisputeState, FieldOverrides, HolidaySet, InvoiceIndex, NewDispute, TierUpdate,
};
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use std::time::{Duration, Instant};

const INSERT_CHUNK: usize = 1000;

/// Stored glosa as needed for a state change
#[derive(Debug, Clone, FromRow)]
pub struct DisputeStateRow {
    pub id: i64,
    pub due_date: NaiveDate,
    pub state: String,
}

/// Existing invoices of one insurer
pub async fn load_invoice_index(pool: &PgPool, insurer_id: i64) -> Result<InvoiceIndex, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        r#"
        SELECT id, invoice_number
        FROM invoices
        WHERE insurer_id = $1
        "#,
    )
    .bind(insurer_id)
    .fetch_all(pool)
    .await?;

    Ok(InvoiceIndex::for_insurer(insurer_id, rows))
}

/// Holidays within `[from, to]`
pub async fn list_holidays(pool: &PgPool, from: NaiveDate, to: NaiveDate) -> Result<HolidaySet, sqlx::Error> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT holiday_date
        FROM holidays
        WHERE holiday_date BETWEEN $1 AND $2
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(dates.into_iter().collect())
}

/// Column synonym overrides configured for one insurer
pub async fn load_column_overrides(pool: &PgPool, insurer_id: i64) -> Result<FieldOverrides, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, Vec<String>)>(
        r#"
        SELECT field, synonyms
        FROM insurer_column_mappings
        WHERE insurer_id = $1
        "#,
    )
    .bind(insurer_id)
    .fetch_all(pool)
    .await?;

    let mut overrides = FieldOverrides::new();
    for (field, synonyms) in rows {
        match field.parse() {
            Ok(field) => {
                overrides.insert(field, synonyms);
            }
            Err(e) => tracing::warn!("Insurer {}: ignoring column mapping row: {}", insurer_id, e),
        }
    }
    Ok(overrides)
}

/// Replaces the insurer's overrides as a whole
pub async fn save_column_overrides(
    pool: &PgPool,
    insurer_id: i64,
    overrides: &FieldOverrides,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM insurer_column_mappings WHERE insurer_id = $1")
        .bind(insurer_id)
        .execute(&mut *tx)
        .await?;

    for (field, synonyms) in overrides {
        sqlx::query(
            r#"
            INSERT INTO insurer_column_mappings (insurer_id, field, synonyms)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(insurer_id)
        .bind(field.as_str())
        .bind(synonyms)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// Identity check run before any mutation
pub async fn actor_is_active(pool: &PgPool, actor_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND active)")
        .bind(actor_id)
        .fetch_one(pool)
        .await
}

/// Inserts all glosas in one transaction: either every row lands or none does
pub async fn insert_disputes(
    pool: &PgPool,
    disputes: &[NewDispute],
    timeout: Duration,
) -> Result<u64, AppError> {
    if disputes.is_empty() {
        return Ok(0);
    }

    tracing::debug!("Building batched insert for {} glosas", disputes.len());
    let start_time = Instant::now();

    let write = async {
        let mut tx = pool.begin().await?;
        let mut affected = 0u64;

        for chunk in disputes.chunks(INSERT_CHUNK) {
            let mut query_builder = sqlx::QueryBuilder::new(
                "INSERT INTO glosas (
                    insurer_id, invoice_id, invoice_number, glosa_code, description,
                    glossed_amount, glosa_date, due_date, batch_label,
                    business_days_remaining, tier, state, created_by
                ) ",
            );

            query_builder.push_values(chunk, |mut b, d| {
                b.push_bind(d.insurer_id)
                    .push_bind(d.invoice_id)
                    .push_bind(&d.invoice_number)
                    .push_bind(&d.glosa_code)
                    .push_bind(&d.description)
                    .push_bind(d.glossed_amount.clone())
                    .push_bind(d.glosa_date)
                    .push_bind(d.due_date)
                    .push_bind(&d.batch_label)
                    .push_bind(d.business_days_remaining)
                    .push_bind(d.tier.as_str())
                    .push_bind(d.state.as_str())
                    .push_bind(d.created_by);
            });

            affected += query_builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok::<u64, sqlx::Error>(affected)
    };

    match tokio::time::timeout(timeout, write).await {
        Ok(Ok(affected)) => {
            tracing::info!("✓ INSERT committed, {} rows, elapsed: {:?}", affected, start_time.elapsed());
            Ok(affected)
        }
        Ok(Err(e)) => {
            tracing::error!("✗ INSERT failed after {:?}, rolled back: {:?}", start_time.elapsed(), e);
            Err(e.into())
        }
        Err(_) => {
            tracing::error!("✗ INSERT timed out (>{:?}), rolled back", timeout);
            Err(AppError::Timeout(timeout))
        }
    }
}

/// Glosas whose semaphore is still live
pub async fn list_active_disputes(pool: &PgPool) -> Result<Vec<ActiveDispute>, sqlx::Error> {
    let states: Vec<&str> = DisputeState::ACTIVE.iter().map(|s| s.as_str()).collect();

    sqlx::query_as::<_, ActiveDispute>(
        r#"
        SELECT id, due_date
        FROM glosas
        WHERE state = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(states)
    .fetch_all(pool)
    .await
}

/// Writes recomputed tiers, one statement per glosa, inside one transaction
pub async fn update_tiers(pool: &PgPool, updates: &[TierUpdate], timeout: Duration) -> Result<u64, AppError> {
    if updates.is_empty() {
        return Ok(0);
    }

    let start_time = Instant::now();
    let write = async {
        let mut tx = pool.begin().await?;
        let mut affected = 0u64;

        for u in updates {
            affected += sqlx::query(
                r#"
                UPDATE glosas
                SET tier = $1, business_days_remaining = $2
                WHERE id = $3
                "#,
            )
            .bind(u.tier.as_str())
            .bind(u.business_days_remaining)
            .bind(u.dispute_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok::<u64, sqlx::Error>(affected)
    };

    match tokio::time::timeout(timeout, write).await {
        Ok(Ok(affected)) => {
            tracing::info!("✓ Tier update committed, {} rows, elapsed: {:?}", affected, start_time.elapsed());
            Ok(affected)
        }
        Ok(Err(e)) => {
            tracing::error!("✗ Tier update failed, rolled back: {:?}", e);
            Err(e.into())
        }
        Err(_) => {
            tracing::error!("✗ Tier update timed out (>{:?}), rolled back", timeout);
            Err(AppError::Timeout(timeout))
        }
    }
}

pub async fn get_dispute_state(pool: &PgPool, dispute_id: i64) -> Result<Option<DisputeStateRow>, sqlx::Error> {
    sqlx::query_as::<_, DisputeStateRow>(
        r#"
        SELECT id, due_date, state
        FROM glosas
        WHERE id = $1
        "#,
    )
    .bind(dispute_id)
    .fetch_optional(pool)
    .await
}

/// Sets the workflow state; a refreshed tier is written alongside when given
pub async fn update_dispute_state(
    pool: &PgPool,
    dispute_id: i64,
    state: DisputeState,
    refreshed: Option<&TierUpdate>,
) -> Result<u64, sqlx::Error> {
    let result = match refreshed {
        Some(u) => {
            sqlx::query(
                r#"
                UPDATE glosas
                SET state = $1, tier = $2, business_days_remaining = $3, updated_at = now()
                WHERE id = $4
                "#,
            )
            .bind(state.as_str())
            .bind(u.tier.as_str())
            .bind(u.business_days_remaining)
            .bind(dispute_id)
            .execute(pool)
            .await?
        }
        None => {
            sqlx::query("UPDATE glosas SET state = $1, updated_at = now() WHERE id = $2")
                .bind(state.as_str())
                .bind(dispute_id)
                .execute(pool)
                .await?
        }
    };

    Ok(result.rows_affected())
}
