use axum::{extract::State, routing::post, Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use time::{macros::format_description, Date};
use tracing::{debug, error, info, instrument, warn};

use crate::{billing::repo, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/payments", post(payment_webhook))
}

/// Provider event envelope.
#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    pub event: String,
    #[serde(default)]
    pub payment: Option<PaymentPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Events that mean the payment has settled, whatever the exact channel.
fn is_settled_event(event: &str) -> bool {
    matches!(event, "PAYMENT_RECEIVED" | "PAYMENT_CONFIRMED")
}

fn parse_due_date(raw: Option<&str>) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    raw.and_then(|d| Date::parse(d, &format).ok())
}

/// The provider retries on anything but success, so this endpoint always
/// acknowledges. Processing failures are logged and dropped.
#[instrument(skip(state, raw))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(raw): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    match serde_json::from_value::<PaymentEvent>(raw) {
        Ok(event) => {
            if let Err(e) = apply_event(&state, &event).await {
                error!(error = %e, event = %event.event, "payment webhook processing failed");
            }
        }
        Err(e) => {
            warn!(error = %e, "unparseable payment webhook payload");
        }
    }
    Json(json!({ "received": true }))
}

async fn apply_event(state: &AppState, event: &PaymentEvent) -> anyhow::Result<()> {
    let Some(payment) = &event.payment else {
        debug!(event = %event.event, "payment event without payment body, ignored");
        return Ok(());
    };

    if event.event == "PAYMENT_CREATED" && payment.subscription.is_some() {
        let Some(customer) = payment.customer.as_deref() else {
            warn!(payment_id = %payment.id, "subscription payment without customer id");
            return Ok(());
        };
        let Some(user_id) = repo::find_user_id_by_customer(&state.db, customer).await? else {
            warn!(customer = %customer, "payment for unknown customer, skipped");
            return Ok(());
        };
        repo::insert_pending(
            &state.db,
            user_id,
            &payment.id,
            payment.value.unwrap_or_default(),
            payment.invoice_url.as_deref(),
            parse_due_date(payment.due_date.as_deref()),
            payment.description.as_deref(),
        )
        .await?;
        info!(user_id = %user_id, payment_id = %payment.id, "pending billing row created");
    } else if is_settled_event(&event.event) {
        let ids: Vec<String> = [Some(payment.id.as_str()), payment.subscription.as_deref()]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .collect();
        let rows = repo::mark_paid(&state.db, &ids).await?;
        info!(payment_id = %payment.id, rows, "billing rows marked paid");
    } else {
        debug!(event = %event.event, "payment event ignored");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_event_classification() {
        assert!(is_settled_event("PAYMENT_RECEIVED"));
        assert!(is_settled_event("PAYMENT_CONFIRMED"));
        assert!(!is_settled_event("PAYMENT_CREATED"));
        assert!(!is_settled_event("PAYMENT_OVERDUE"));
        assert!(!is_settled_event(""));
    }

    #[test]
    fn event_payload_deserialization() {
        let event: PaymentEvent = serde_json::from_str(
            r#"{
                "event": "PAYMENT_CREATED",
                "payment": {
                    "id": "pay_123 ",
                    "customer": "cus_9",
                    "subscription": "sub_7",
                    "value": 149.9,
                    "invoiceUrl": "https://pay.example/abc",
                    "dueDate": "2026-09-01",
                    "description": "Monthly plan"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(event.event, "PAYMENT_CREATED");
        let payment = event.payment.unwrap();
        assert_eq!(payment.id, "pay_123 ");
        assert_eq!(payment.subscription.as_deref(), Some("sub_7"));
        assert_eq!(payment.invoice_url.as_deref(), Some("https://pay.example/abc"));
        assert_eq!(parse_due_date(payment.due_date.as_deref()).unwrap().to_string(), "2026-09-01");
    }

    #[test]
    fn event_without_payment_body_still_parses() {
        let event: PaymentEvent =
            serde_json::from_str(r#"{ "event": "PING" }"#).unwrap();
        assert!(event.payment.is_none());
    }

    #[test]
    fn due_date_parsing_tolerates_garbage() {
        assert!(parse_due_date(Some("not-a-date")).is_none());
        assert!(parse_due_date(None).is_none());
    }
}
