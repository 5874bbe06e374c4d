//! A single outbound delivery attempt (§4.6): sign, POST, classify the
//! result. Retry/backoff/health state live on `WebhookSubscription` itself
//! (`shared-models`); this module only does the one HTTP round trip.

use chrono::Utc;
use reqwest::Client;
use shared_models::{WebhookEvent, WebhookSubscription};
use shared_utils::signing::sign_payload;

const USER_AGENT: &str = "reservation-engine-webhooks/1.0";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Envelope shape is `{eventType, timestamp, data}` (§4.6); `timestamp` is
/// RFC3339 UTC, matching the store-wide convention for wire timestamps.
pub async fn deliver_once(
    http: &Client,
    subscription: &WebhookSubscription,
    event: WebhookEvent,
    payload: &serde_json::Value,
) -> Result<(), String> {
    let now = Utc::now();
    let envelope = serde_json::json!({
        "eventType": event.as_str(),
        "timestamp": now.to_rfc3339(),
        "data": payload,
    });
    let body = serde_json::to_vec(&envelope).map_err(|e| e.to_string())?;
    let signature = sign_payload(&subscription.secret, &body);

    let response = http
        .post(&subscription.url)
        .header("Content-Type", "application/json")
        .header("X-Signature", signature)
        .header("X-Timestamp", now.timestamp().to_string())
        .header("User-Agent", USER_AGENT)
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .body(body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("subscriber responded {}", response.status()))
    }
}
