use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use cobranza_core::{
    Attribution, AttributedPayment, AttributionError, Credit, CreditBalances, CreditStore,
    ManagementRecord, ManagementStore, MatchedAction, NewSnapshot, PaymentLedger, PaymentRecord,
    Snapshot, SnapshotStore, Substate, YesNo,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::info;

use crate::config::ServiceConfig;

const CREDIT_COLUMNS: &str = r#"
    c.id,
    c.days_past_due::BIGINT AS days_past_due,
    c.capital,
    c.interest,
    c.penalty,
    c.insurance,
    c.collection_expense,
    c.legal_expense,
    c.collection_state
"#;

const SNAPSHOT_COLUMNS: &str = r#"
    id,
    credit_id,
    campaign_id,
    captured_on,
    days_past_due::BIGINT AS days_past_due,
    outstanding
"#;

/// Collection data in the relational store.
#[derive(Clone)]
pub struct PgCollectionStore {
    pool: PgPool,
}

impl PgCollectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &ServiceConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        info!(
            max_connections = config.max_connections,
            "connected to collection database"
        );
        Ok(Self::new(pool))
    }
}

fn credit_from_row(row: &PgRow) -> Result<Credit, sqlx::Error> {
    Ok(Credit {
        id: row.try_get("id")?,
        days_past_due: row.try_get("days_past_due")?,
        balances: CreditBalances {
            capital: row.try_get("capital")?,
            interest: row.try_get("interest")?,
            penalty: row.try_get("penalty")?,
            insurance: row.try_get("insurance")?,
            collection_expense: row.try_get("collection_expense")?,
            legal_expense: row.try_get("legal_expense")?,
        },
        collection_state: row.try_get("collection_state")?,
    })
}

fn snapshot_from_row(row: &PgRow) -> Result<Snapshot, sqlx::Error> {
    Ok(Snapshot {
        id: row.try_get("id")?,
        credit_id: row.try_get("credit_id")?,
        campaign_id: row.try_get("campaign_id")?,
        captured_on: row.try_get("captured_on")?,
        days_past_due: row.try_get("days_past_due")?,
        outstanding: row.try_get("outstanding")?,
    })
}

fn matched_action(
    row: &PgRow,
    id_column: &str,
    age_column: &str,
) -> Result<Option<MatchedAction>, sqlx::Error> {
    let action_id: Option<i64> = row.try_get(id_column)?;
    let projected_days_past_due: Option<i64> = row.try_get(age_column)?;
    Ok(action_id.map(|action_id| MatchedAction {
        action_id,
        projected_days_past_due,
    }))
}

fn attribution_from_row(row: &PgRow) -> Result<Option<Attribution>, sqlx::Error> {
    let has_management: Option<String> = row.try_get("has_management")?;
    let Some(has_management) = has_management.as_deref().and_then(YesNo::parse) else {
        return Ok(None);
    };

    let post_payment: Option<String> = row.try_get("post_payment_management")?;

    Ok(Some(Attribution {
        has_management,
        primary: matched_action(row, "management_id", "management_days_past_due")?,
        secondary: matched_action(
            row,
            "secondary_management_id",
            "secondary_management_days_past_due",
        )?,
        post_payment_management: post_payment
            .as_deref()
            .and_then(YesNo::parse)
            .unwrap_or_default(),
    }))
}

#[async_trait]
impl CreditStore for PgCollectionStore {
    async fn credit(&self, credit_id: i64) -> Result<Option<Credit>, AttributionError> {
        let row = sqlx::query(&format!("SELECT {CREDIT_COLUMNS} FROM credits c WHERE c.id = $1"))
            .bind(credit_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AttributionError::store)?;

        row.as_ref()
            .map(credit_from_row)
            .transpose()
            .map_err(AttributionError::store)
    }

    async fn campaign_roster(&self, campaign_id: i64) -> Result<Vec<Credit>, AttributionError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CREDIT_COLUMNS}
            FROM campaign_credits cc
            JOIN credits c ON c.id = cc.credit_id
            WHERE cc.campaign_id = $1
              AND cc.active = TRUE
            ORDER BY c.id
            "#
        ))
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AttributionError::store)?;

        rows.iter()
            .map(credit_from_row)
            .collect::<Result<_, _>>()
            .map_err(AttributionError::store)
    }
}

#[async_trait]
impl SnapshotStore for PgCollectionStore {
    async fn snapshot_on(
        &self,
        credit_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Snapshot>, AttributionError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {SNAPSHOT_COLUMNS}
            FROM collection_credits
            WHERE credit_id = $1
              AND captured_on = $2
            ORDER BY id DESC
            LIMIT 1
            "#
        ))
        .bind(credit_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(AttributionError::store)?;

        row.as_ref()
            .map(snapshot_from_row)
            .transpose()
            .map_err(AttributionError::store)
    }

    async fn latest_snapshot_before(
        &self,
        credit_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Snapshot>, AttributionError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {SNAPSHOT_COLUMNS}
            FROM collection_credits
            WHERE credit_id = $1
              AND captured_on < $2
            ORDER BY captured_on DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(credit_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(AttributionError::store)?;

        row.as_ref()
            .map(snapshot_from_row)
            .transpose()
            .map_err(AttributionError::store)
    }

    async fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<bool, AttributionError> {
        let result = sqlx::query(
            r#"
            INSERT INTO collection_credits (
                credit_id, campaign_id, captured_on, days_past_due, outstanding
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (credit_id, campaign_id, captured_on) DO NOTHING
            "#,
        )
        .bind(snapshot.credit_id)
        .bind(snapshot.campaign_id)
        .bind(snapshot.captured_on)
        .bind(snapshot.days_past_due)
        .bind(snapshot.outstanding)
        .execute(&self.pool)
        .await
        .map_err(AttributionError::store)?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl ManagementStore for PgCollectionStore {
    async fn managements_for_credit(
        &self,
        credit_id: i64,
    ) -> Result<Vec<ManagementRecord>, AttributionError> {
        let rows = sqlx::query(
            r#"
            SELECT
                m.id,
                m.credit_id,
                m.campaign_id,
                to_char(m.created_at, 'YYYY-MM-DD HH24:MI:SS') AS created_at,
                m.substate,
                m.days_past_due::BIGINT AS days_past_due,
                m.agent_id,
                ARRAY(
                    SELECT mc.call_id
                    FROM management_calls mc
                    WHERE mc.management_id = m.id
                    ORDER BY mc.call_id
                ) AS call_ids
            FROM managements m
            WHERE m.credit_id = $1
            "#,
        )
        .bind(credit_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AttributionError::store)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let substate: String = row.try_get("substate").map_err(AttributionError::store)?;
            let created_at: Option<String> =
                row.try_get("created_at").map_err(AttributionError::store)?;

            records.push(ManagementRecord {
                id: row.try_get("id").map_err(AttributionError::store)?,
                credit_id: row.try_get("credit_id").map_err(AttributionError::store)?,
                campaign_id: row.try_get("campaign_id").map_err(AttributionError::store)?,
                created_at: created_at.unwrap_or_default(),
                substate: Substate::from_code(&substate),
                days_past_due: row.try_get("days_past_due").map_err(AttributionError::store)?,
                agent_id: row.try_get("agent_id").map_err(AttributionError::store)?,
                call_ids: row.try_get("call_ids").map_err(AttributionError::store)?,
            });
        }

        Ok(records)
    }
}

#[async_trait]
impl PaymentLedger for PgCollectionStore {
    async fn payments_on(&self, date: NaiveDate) -> Result<Vec<PaymentRecord>, AttributionError> {
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                credit_id,
                campaign_id,
                amount,
                to_char(paid_at, 'YYYY-MM-DD HH24:MI:SS') AS paid_at
            FROM payments
            WHERE paid_at >= $1::DATE
              AND paid_at < $1::DATE + 1
            ORDER BY id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(AttributionError::store)?;

        let mut payments = Vec::with_capacity(rows.len());
        for row in rows {
            payments.push(PaymentRecord {
                id: row.try_get("id").map_err(AttributionError::store)?,
                credit_id: row.try_get("credit_id").map_err(AttributionError::store)?,
                campaign_id: row.try_get("campaign_id").map_err(AttributionError::store)?,
                amount: row.try_get("amount").map_err(AttributionError::store)?,
                paid_at: row.try_get("paid_at").map_err(AttributionError::store)?,
            });
        }

        Ok(payments)
    }

    async fn write_attribution(
        &self,
        payment_id: i64,
        attribution: &Attribution,
    ) -> Result<(), AttributionError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET
                has_management = $2,
                management_id = $3,
                management_days_past_due = $4,
                secondary_management_id = $5,
                secondary_management_days_past_due = $6,
                post_payment_management = $7
            WHERE id = $1
            "#,
        )
        .bind(payment_id)
        .bind(attribution.has_management.as_str())
        .bind(attribution.primary.map(|m| m.action_id))
        .bind(attribution.primary.and_then(|m| m.projected_days_past_due))
        .bind(attribution.secondary.map(|m| m.action_id))
        .bind(attribution.secondary.and_then(|m| m.projected_days_past_due))
        .bind(attribution.post_payment_management.as_str())
        .execute(&self.pool)
        .await
        .map_err(AttributionError::store)?;

        if result.rows_affected() == 0 {
            return Err(AttributionError::store(format!(
                "payment {payment_id} not found"
            )));
        }

        Ok(())
    }

    async fn attributed_payments_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttributedPayment>, AttributionError> {
        let rows = sqlx::query(
            r#"
            SELECT
                p.id,
                p.amount,
                p.has_management,
                p.management_id,
                p.management_days_past_due::BIGINT AS management_days_past_due,
                p.secondary_management_id,
                p.secondary_management_days_past_due::BIGINT AS secondary_management_days_past_due,
                p.post_payment_management,
                m.agent_id
            FROM payments p
            LEFT JOIN managements m ON m.id = p.management_id
            WHERE p.paid_at >= $1::DATE
              AND p.paid_at < $1::DATE + 1
              AND p.has_management IS NOT NULL
            ORDER BY p.id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(AttributionError::store)?;

        let mut payments = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(attribution) = attribution_from_row(&row).map_err(AttributionError::store)?
            else {
                continue;
            };

            payments.push(AttributedPayment {
                payment_id: row.try_get("id").map_err(AttributionError::store)?,
                amount: row.try_get("amount").map_err(AttributionError::store)?,
                attribution,
                primary_agent_id: row.try_get("agent_id").map_err(AttributionError::store)?,
            });
        }

        Ok(payments)
    }
}
