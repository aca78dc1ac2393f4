use rust_decimal::Decimal;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

/// Resolve an account by the payment provider's customer identifier.
pub async fn find_user_id_by_customer(
    db: &PgPool,
    customer: &str,
) -> anyhow::Result<Option<Uuid>> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE customer_id = $1")
        .bind(customer)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|r| r.0))
}

pub async fn insert_pending(
    db: &PgPool,
    user_id: Uuid,
    payment_id: &str,
    amount: Decimal,
    payment_link: Option<&str>,
    due_date: Option<Date>,
    description: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO billing_records
            (user_id, payment_id, amount, paid, payment_link, due_date, description)
        VALUES ($1, $2, $3, FALSE, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(payment_id)
    .bind(amount)
    .bind(payment_link)
    .bind(due_date)
    .bind(description)
    .execute(db)
    .await?;
    Ok(())
}

/// Mark paid every row whose stored payment id (trimmed) matches one of the
/// given identifiers. Returns the number of rows updated.
pub async fn mark_paid(db: &PgPool, ids: &[String]) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE billing_records
        SET paid = TRUE
        WHERE btrim(payment_id) = ANY($1)
        "#,
    )
    .bind(ids)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}
