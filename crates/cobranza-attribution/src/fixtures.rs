use chrono::{NaiveDate, NaiveDateTime};
use cobranza_core::{
    Credit, CreditBalances, ManagementAction, ManagementRecord, NewSnapshot, PaymentRecord,
    Substate,
};
use cobranza_store::InMemoryCollectionStore;
use rust_decimal::Decimal;

pub const CAMPAIGN: i64 = 10;
pub const OTHER_CAMPAIGN: i64 = 11;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn record(
    id: i64,
    created_at: &str,
    substate: Substate,
    days_past_due: Option<i64>,
    campaign_id: Option<i64>,
) -> ManagementRecord {
    ManagementRecord {
        id,
        credit_id: 1,
        campaign_id,
        created_at: created_at.to_string(),
        substate,
        days_past_due,
        agent_id: Some(100 + id),
        call_ids: Vec::new(),
    }
}

pub fn action(
    id: i64,
    created_at: &str,
    substate: Substate,
    days_past_due: Option<i64>,
    campaign_id: Option<i64>,
) -> ManagementAction {
    record(id, created_at, substate, days_past_due, campaign_id)
        .parse()
        .unwrap()
}

pub fn snapshot(
    credit_id: i64,
    campaign_id: i64,
    captured_on: NaiveDate,
    days_past_due: i64,
) -> NewSnapshot {
    NewSnapshot {
        credit_id,
        campaign_id,
        captured_on,
        days_past_due,
        outstanding: Decimal::ZERO,
    }
}

pub fn payment(id: i64, credit_id: i64, paid_at: &str) -> PaymentRecord {
    PaymentRecord {
        id,
        credit_id,
        campaign_id: Some(CAMPAIGN),
        amount: Decimal::new(25000, 2),
        paid_at: paid_at.to_string(),
    }
}

pub fn credit(id: i64, days_past_due: i64) -> Credit {
    Credit {
        id,
        days_past_due,
        balances: CreditBalances {
            capital: Decimal::new(150000, 2),
            interest: Decimal::new(12000, 2),
            ..CreditBalances::default()
        },
        collection_state: "ACTIVE".to_string(),
    }
}

/// Store holding credit 1 with no snapshots, managements or payments.
pub async fn seeded_store() -> InMemoryCollectionStore {
    let store = InMemoryCollectionStore::new();
    store.insert_credit(credit(1, 45)).await;
    store
}
