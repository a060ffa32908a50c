use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AttributionError;
use crate::substate::Substate;
use crate::timestamp::parse_timestamp;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreditBalances {
    pub capital: Decimal,
    pub interest: Decimal,
    pub penalty: Decimal,
    pub insurance: Decimal,
    pub collection_expense: Decimal,
    pub legal_expense: Decimal,
}

impl CreditBalances {
    pub fn total(&self) -> Decimal {
        self.capital
            + self.interest
            + self.penalty
            + self.insurance
            + self.collection_expense
            + self.legal_expense
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credit {
    pub id: i64,
    pub days_past_due: i64,
    pub balances: CreditBalances,
    pub collection_state: String,
}

/// Dated delinquency image of a credit for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub id: i64,
    pub credit_id: i64,
    pub campaign_id: i64,
    pub captured_on: NaiveDate,
    pub days_past_due: i64,
    pub outstanding: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub credit_id: i64,
    pub campaign_id: i64,
    pub captured_on: NaiveDate,
    pub days_past_due: i64,
    pub outstanding: Decimal,
}

/// Management row as stored, with its creation date still unparsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementRecord {
    pub id: i64,
    pub credit_id: i64,
    pub campaign_id: Option<i64>,
    pub created_at: String,
    pub substate: Substate,
    pub days_past_due: Option<i64>,
    pub agent_id: Option<i64>,
    pub call_ids: Vec<i64>,
}

impl ManagementRecord {
    pub fn parse(self) -> Result<ManagementAction, AttributionError> {
        let created_at = parse_timestamp(&format!("management {}", self.id), &self.created_at)?;

        Ok(ManagementAction {
            id: self.id,
            credit_id: self.credit_id,
            campaign_id: self.campaign_id,
            created_at,
            substate: self.substate,
            days_past_due: self.days_past_due,
            agent_id: self.agent_id,
            call_ids: self.call_ids,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagementAction {
    pub id: i64,
    pub credit_id: i64,
    pub campaign_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub substate: Substate,
    pub days_past_due: Option<i64>,
    pub agent_id: Option<i64>,
    pub call_ids: Vec<i64>,
}

/// Payment row as stored, with its payment date still unparsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub credit_id: i64,
    pub campaign_id: Option<i64>,
    pub amount: Decimal,
    pub paid_at: String,
}

impl PaymentRecord {
    pub fn parse(&self) -> Result<Payment, AttributionError> {
        let paid_at = parse_timestamp(&format!("payment {}", self.id), &self.paid_at)?;

        Ok(Payment {
            id: self.id,
            credit_id: self.credit_id,
            campaign_id: self.campaign_id,
            amount: self.amount,
            paid_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub id: i64,
    pub credit_id: i64,
    pub campaign_id: Option<i64>,
    pub amount: Decimal,
    pub paid_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "YES" => Some(Self::Yes),
            "NO" => Some(Self::No),
            _ => None,
        }
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchedAction {
    pub action_id: i64,
    pub projected_days_past_due: Option<i64>,
}

/// Attribution fields written back onto a payment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Attribution {
    pub has_management: YesNo,
    pub primary: Option<MatchedAction>,
    pub secondary: Option<MatchedAction>,
    pub post_payment_management: YesNo,
}

/// A payment with its stored attribution and the agent behind the primary action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributedPayment {
    pub payment_id: i64,
    pub amount: Decimal,
    pub attribution: Attribution,
    pub primary_agent_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_total_every_category() {
        let balances = CreditBalances {
            capital: Decimal::new(100000, 2),
            interest: Decimal::new(5000, 2),
            penalty: Decimal::new(1250, 2),
            insurance: Decimal::new(300, 2),
            collection_expense: Decimal::new(200, 2),
            legal_expense: Decimal::ZERO,
        };

        assert_eq!(balances.total(), Decimal::new(106750, 2));
    }

    #[test]
    fn malformed_management_date_is_reported() {
        let record = ManagementRecord {
            id: 7,
            credit_id: 1,
            campaign_id: None,
            created_at: "not a date".to_string(),
            substate: Substate::PromiseToPay,
            days_past_due: Some(12),
            agent_id: None,
            call_ids: Vec::new(),
        };

        let err = record.parse().unwrap_err();
        assert!(err.to_string().contains("management 7"));
    }

    #[test]
    fn yes_no_round_trips_through_storage_codes() {
        assert_eq!(YesNo::parse(YesNo::Yes.as_str()), Some(YesNo::Yes));
        assert_eq!(YesNo::parse("no"), Some(YesNo::No));
        assert_eq!(YesNo::parse("maybe"), None);
        assert_eq!(YesNo::from(true), YesNo::Yes);
    }
}
