//! Donation domain entity.
//! Framework-agnostic representation of one donation attempt and its lifecycle.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Currency used when the donor does not pick one.
pub const DEFAULT_CURRENCY: &str = "KES";

/// Lifecycle status of a donation attempt.
///
/// Only two transitions exist: `Pending -> Success` and `Pending -> Failed`,
/// both applied by the verification step. A terminal record is never moved
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

/// Payment provider a donation was initiated through. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Paystack,
    Epaymently,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paystack => "paystack",
            Self::Epaymently => "epaymently",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paystack" => Ok(Self::Paystack),
            "epaymently" => Ok(Self::Epaymently),
            other => Err(format!("unknown payment provider '{}'", other)),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the donation is earmarked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationType {
    SanitaryPads,
    FinancialSupport,
    SchoolSponsorship,
    #[default]
    General,
}

impl DonationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SanitaryPads => "sanitary_pads",
            Self::FinancialSupport => "financial_support",
            Self::SchoolSponsorship => "school_sponsorship",
            Self::General => "general",
        }
    }
}

impl FromStr for DonationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sanitary_pads" => Ok(Self::SanitaryPads),
            "financial_support" => Ok(Self::FinancialSupport),
            "school_sponsorship" => Ok(Self::SchoolSponsorship),
            "general" => Ok(Self::General),
            other => Err(format!("unknown donation type '{}'", other)),
        }
    }
}

/// Donor-submitted input for one donation attempt, before a reference or
/// provider is attached. Amounts are in major currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDonation {
    pub donor_name: String,
    pub donor_email: String,
    #[serde(default)]
    pub donor_phone: Option<String>,
    pub amount: BigDecimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub donation_type: Option<DonationType>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_anonymous: Option<bool>,
}

impl NewDonation {
    /// Validates donor input before any record is written or any provider
    /// is contacted.
    pub fn validate(&self) -> Result<(), String> {
        if self.donor_name.trim().is_empty() {
            return Err("Donor name is required".to_string());
        }
        if self.donor_name.len() > 200 {
            return Err("Donor name must be less than 200 characters".to_string());
        }
        if !is_valid_email(&self.donor_email) {
            return Err("Please enter a valid email address".to_string());
        }
        if self.amount <= BigDecimal::from(0) {
            return Err("Donation amount must be greater than zero".to_string());
        }
        if let Some(message) = &self.message {
            if message.len() > 2000 {
                return Err("Message must be less than 2000 characters".to_string());
            }
        }
        Ok(())
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn donation_type(&self) -> DonationType {
        self.donation_type.unwrap_or_default()
    }
}

/// Persisted representation of one donation attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Donation {
    pub id: Uuid,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub donation_type: DonationType,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub payment_method: PaymentMethod,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donation {
    /// Builds a pending record from donor input. `payment_reference` is the
    /// sole correlation key with the external provider and never changes.
    pub fn from_input(input: &NewDonation, method: PaymentMethod, reference: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            donor_name: input.donor_name.clone(),
            donor_email: input.donor_email.clone(),
            donor_phone: input.donor_phone.clone(),
            amount: input.amount.clone(),
            currency: input.currency().to_string(),
            donation_type: input.donation_type(),
            message: input.message.clone(),
            is_anonymous: input.is_anonymous.unwrap_or(false),
            payment_method: method,
            payment_reference: reference,
            payment_status: PaymentStatus::Pending,
            transaction_id: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Generates a payment reference: prefix, millisecond timestamp, random
/// suffix. Uniqueness is probabilistic but collision odds are negligible at
/// donation volumes, and no coordination is needed.
pub fn generate_reference(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, millis, &random[..12])
}

/// Basic email shape check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
