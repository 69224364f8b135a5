use crate::db::models::DonationRow;
use crate::domain::Donation;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Result};

pub async fn insert_donation(pool: &PgPool, donation: &Donation) -> Result<DonationRow> {
    sqlx::query_as::<_, DonationRow>(
        r#"
        INSERT INTO donations (
            id, donor_name, donor_email, donor_phone, amount, currency,
            donation_type, message, is_anonymous, payment_method,
            payment_reference, payment_status, transaction_id, metadata,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING *
        "#,
    )
    .bind(donation.id)
    .bind(&donation.donor_name)
    .bind(&donation.donor_email)
    .bind(&donation.donor_phone)
    .bind(&donation.amount)
    .bind(&donation.currency)
    .bind(donation.donation_type.as_str())
    .bind(&donation.message)
    .bind(donation.is_anonymous)
    .bind(donation.payment_method.as_str())
    .bind(&donation.payment_reference)
    .bind(donation.payment_status.as_str())
    .bind(&donation.transaction_id)
    .bind(&donation.metadata)
    .bind(donation.created_at)
    .bind(donation.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_by_reference(pool: &PgPool, reference: &str) -> Result<Option<DonationRow>> {
    sqlx::query_as::<_, DonationRow>("SELECT * FROM donations WHERE payment_reference = $1")
        .bind(reference)
        .fetch_optional(pool)
        .await
}

/// Marks a donation successful. The transaction id is required so that a
/// `success` row without one cannot be written.
pub async fn mark_success(
    pool: &PgPool,
    reference: &str,
    transaction_id: &str,
    metadata: &serde_json::Value,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE donations
         SET payment_status = 'success', transaction_id = $2, metadata = $3, updated_at = NOW()
         WHERE payment_reference = $1",
    )
    .bind(reference)
    .bind(transaction_id)
    .bind(metadata)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn mark_failed(
    pool: &PgPool,
    reference: &str,
    metadata: &serde_json::Value,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE donations
         SET payment_status = 'failed', metadata = $2, updated_at = NOW()
         WHERE payment_reference = $1",
    )
    .bind(reference)
    .bind(metadata)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_donations(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<DonationRow>> {
    sqlx::query_as::<_, DonationRow>(
        "SELECT * FROM donations ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn list_pending_older_than(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<DonationRow>> {
    sqlx::query_as::<_, DonationRow>(
        "SELECT * FROM donations
         WHERE payment_status = 'pending' AND created_at < $1
         ORDER BY created_at ASC",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await
}
