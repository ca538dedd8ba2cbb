use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::WalletError;

pub type AccountId = i64;

/// Verification tier gating withdrawal ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Basic = 1,
    Verified = 2,
    Premium = 3,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Basic => write!(f, "basic"),
            Tier::Verified => write!(f, "verified"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" | "1" => Ok(Tier::Basic),
            "verified" | "2" => Ok(Tier::Verified),
            "premium" | "3" => Ok(Tier::Premium),
            _ => Err(format!("Invalid tier: {}", s)),
        }
    }
}

impl From<i16> for Tier {
    fn from(val: i16) -> Self {
        match val {
            2 => Tier::Verified,
            3 => Tier::Premium,
            _ => Tier::Basic, // Default fallback
        }
    }
}

impl From<Tier> for i16 {
    fn from(val: Tier) -> i16 {
        val as i16
    }
}

/// Payment destination kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Bank = 1,
    Crypto = 2,
    Paypal = 3,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKind::Bank => write!(f, "bank"),
            MethodKind::Crypto => write!(f, "crypto"),
            MethodKind::Paypal => write!(f, "paypal"),
        }
    }
}

impl FromStr for MethodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bank" | "1" => Ok(MethodKind::Bank),
            "crypto" | "2" => Ok(MethodKind::Crypto),
            "paypal" | "3" => Ok(MethodKind::Paypal),
            _ => Err(format!("Invalid payment method kind: {}", s)),
        }
    }
}

impl From<i16> for MethodKind {
    fn from(val: i16) -> Self {
        match val {
            2 => MethodKind::Crypto,
            3 => MethodKind::Paypal,
            _ => MethodKind::Bank, // Default fallback
        }
    }
}

impl From<MethodKind> for i16 {
    fn from(val: MethodKind) -> i16 {
        val as i16
    }
}

/// Type-tagged payment destination details.
///
/// Deserialized straight off the request body; `validate` enforces the
/// per-kind required-field contract before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MethodDetails {
    Bank {
        account_number: String,
        bank_name: String,
        account_holder: String,
    },
    Crypto {
        wallet_address: String,
        network: String,
    },
    Paypal {
        email: String,
    },
}

impl MethodDetails {
    pub fn kind(&self) -> MethodKind {
        match self {
            MethodDetails::Bank { .. } => MethodKind::Bank,
            MethodDetails::Crypto { .. } => MethodKind::Crypto,
            MethodDetails::Paypal { .. } => MethodKind::Paypal,
        }
    }

    /// Enforce the per-kind required-field set.
    pub fn validate(&self) -> Result<(), WalletError> {
        let required = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(WalletError::validation(format!(
                    "{} method requires a non-empty {}",
                    self.kind(),
                    field
                )))
            } else {
                Ok(())
            }
        };

        match self {
            MethodDetails::Bank {
                account_number,
                bank_name,
                account_holder,
            } => {
                required("account_number", account_number)?;
                required("bank_name", bank_name)?;
                required("account_holder", account_holder)
            }
            MethodDetails::Crypto {
                wallet_address,
                network,
            } => {
                required("wallet_address", wallet_address)?;
                required("network", network)
            }
            MethodDetails::Paypal { email } => required("email", email),
        }
    }

    /// Redacted label for listing: never exposes the raw destination.
    pub fn masked_label(&self) -> String {
        fn tail(s: &str) -> &str {
            let start = s.len().saturating_sub(4);
            // Avoid splitting a multi-byte char at the mask boundary
            let mut idx = start;
            while idx < s.len() && !s.is_char_boundary(idx) {
                idx += 1;
            }
            &s[idx..]
        }

        match self {
            MethodDetails::Bank {
                account_number,
                bank_name,
                ..
            } => format!("{} ****{}", bank_name, tail(account_number)),
            MethodDetails::Crypto {
                wallet_address,
                network,
            } => format!("{} ****{}", network, tail(wallet_address)),
            MethodDetails::Paypal { email } => {
                let visible: String = email.chars().take(2).collect();
                format!("paypal {}***", visible)
            }
        }
    }
}

/// A stored payment method (full row, internal to the core)
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethod {
    pub method_id: Uuid,
    pub account_id: AccountId,
    pub kind: MethodKind,
    pub details: MethodDetails,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    /// What the list operation returns: kind + masked label, no raw details.
    pub fn redacted(&self) -> MethodSummary {
        MethodSummary {
            method_id: self.method_id,
            kind: self.kind,
            label: self.details.masked_label(),
            created_at: self.created_at,
        }
    }
}

/// Redacted view of a payment method
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MethodSummary {
    pub method_id: Uuid,
    pub kind: MethodKind,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

/// Withdrawal request status
///
/// `Pending` is the only non-terminal state; the other three accept no
/// further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending = 1,
    Approved = 2,
    Rejected = 3,
    Cancelled = 4,
}

impl WithdrawalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WithdrawalStatus::Pending)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithdrawalStatus::Pending => write!(f, "pending"),
            WithdrawalStatus::Approved => write!(f, "approved"),
            WithdrawalStatus::Rejected => write!(f, "rejected"),
            WithdrawalStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            "cancelled" => Ok(WithdrawalStatus::Cancelled),
            _ => Err(format!("Invalid withdrawal status: {}", s)),
        }
    }
}

impl From<i16> for WithdrawalStatus {
    fn from(val: i16) -> Self {
        match val {
            2 => WithdrawalStatus::Approved,
            3 => WithdrawalStatus::Rejected,
            4 => WithdrawalStatus::Cancelled,
            _ => WithdrawalStatus::Pending,
        }
    }
}

impl From<WithdrawalStatus> for i16 {
    fn from(val: WithdrawalStatus) -> i16 {
        val as i16
    }
}

/// A withdrawal request row
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Withdrawal {
    pub request_id: Uuid,
    pub account_id: AccountId,
    pub method_id: Uuid,
    pub amount: Decimal,
    pub fee: Decimal,
    pub status: WithdrawalStatus,
    /// Destination snapshot taken at request time
    pub account_details: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account record: tier plus ledger snapshot fields
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub account_id: AccountId,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
}

/// Pagination window: `page >= 1`, `limit` clamped to 1..=100.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    page: u32,
    limit: u32,
}

impl Page {
    pub const MAX_LIMIT: u32 = 100;
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_round_trip() {
        assert_eq!(Tier::from(i16::from(Tier::Verified)), Tier::Verified);
        assert_eq!("premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert_eq!(Tier::from(99), Tier::Basic); // default to Basic
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn test_status_terminality() {
        assert!(!WithdrawalStatus::Pending.is_terminal());
        assert!(WithdrawalStatus::Approved.is_terminal());
        assert!(WithdrawalStatus::Rejected.is_terminal());
        assert!(WithdrawalStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_details_tagged_deserialization() {
        let json = r#"{"type":"bank","account_number":"12345678","bank_name":"First Bank","account_holder":"Ada"}"#;
        let details: MethodDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.kind(), MethodKind::Bank);
        assert!(details.validate().is_ok());
    }

    #[test]
    fn test_details_unknown_tag_fails() {
        let json = r#"{"type":"cheque","number":"1"}"#;
        let result: Result<MethodDetails, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_names_missing_field() {
        let details = MethodDetails::Bank {
            account_number: "".to_string(),
            bank_name: "First Bank".to_string(),
            account_holder: "Ada".to_string(),
        };
        let err = details.validate().unwrap_err();
        assert!(err.to_string().contains("account_number"));

        let details = MethodDetails::Paypal {
            email: "  ".to_string(),
        };
        let err = details.validate().unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_masked_label_hides_raw_details() {
        let details = MethodDetails::Bank {
            account_number: "12345678".to_string(),
            bank_name: "First Bank".to_string(),
            account_holder: "Ada".to_string(),
        };
        let label = details.masked_label();
        assert_eq!(label, "First Bank ****5678");
        assert!(!label.contains("12345678"));

        let details = MethodDetails::Paypal {
            email: "ada@example.com".to_string(),
        };
        assert_eq!(details.masked_label(), "paypal ad***");
    }

    #[test]
    fn test_page_clamping() {
        let page = Page::new(0, 0);
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), 1);

        let page = Page::new(3, 500);
        assert_eq!(page.limit(), 100);
        assert_eq!(page.offset(), 200);

        assert_eq!(Page::default().limit(), 50);
    }
}
