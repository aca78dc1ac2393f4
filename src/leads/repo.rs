use sqlx::PgPool;

pub async fn insert_lead(
    db: &PgPool,
    name: &str,
    email: &str,
    message: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO leads (name, email, message)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(message)
    .execute(db)
    .await?;
    Ok(())
}
