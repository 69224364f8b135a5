//! Row model for the donations table. Status columns are stored as text and
//! parsed into the closed domain enums on the way out.

use crate::domain::{Donation, DonationType, PaymentMethod, PaymentStatus};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct DonationRow {
    pub id: Uuid,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub donation_type: String,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub payment_method: String,
    pub payment_reference: String,
    pub payment_status: String,
    pub transaction_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = String;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        Ok(Donation {
            id: row.id,
            donor_name: row.donor_name,
            donor_email: row.donor_email,
            donor_phone: row.donor_phone,
            amount: row.amount,
            currency: row.currency,
            donation_type: row.donation_type.parse::<DonationType>()?,
            message: row.message,
            is_anonymous: row.is_anonymous,
            payment_method: row.payment_method.parse::<PaymentMethod>()?,
            payment_reference: row.payment_reference,
            payment_status: row.payment_status.parse::<PaymentStatus>()?,
            transaction_id: row.transaction_id,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
