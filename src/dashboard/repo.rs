use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Read-only document row surfaced on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub url: String,
    pub doc_type: String,
    pub uploaded_at: OffsetDateTime,
}

/// Billing row maintained by the payment-provider webhooks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BillingRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_id: String,
    pub amount: Decimal,
    pub paid: bool,
    pub payment_link: Option<String>,
    #[serde(with = "iso_date::option")]
    pub due_date: Option<Date>,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

pub async fn documents_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Document>> {
    let rows = sqlx::query_as::<_, Document>(
        r#"
        SELECT id, user_id, name, url, doc_type, uploaded_at
        FROM documents
        WHERE user_id = $1
        ORDER BY uploaded_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn billing_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<BillingRecord>> {
    let rows = sqlx::query_as::<_, BillingRecord>(
        r#"
        SELECT id, user_id, payment_id, amount, paid, payment_link,
               due_date, description, created_at
        FROM billing_records
        WHERE user_id = $1
        ORDER BY due_date DESC NULLS LAST, created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
