use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{header, Client};
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::config::WebhookConfig;
use crate::core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the HMAC-SHA256 hex signature of the request body
const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Best-effort webhook sender for submission events.
///
/// Payloads go to the globally configured URLs plus the template's own URL
/// when it has one, in parallel, each bounded by the configured timeout.
/// Nothing here ever propagates an error to the submit path.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create webhook client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Queue delivery of an event and return immediately. Delivery happens on
    /// a background task; failures are logged and swallowed there.
    pub fn notify(
        &self,
        event_type: &str,
        template_id: Uuid,
        template_url: Option<String>,
        form_data: Value,
    ) {
        let notifier = self.clone();
        let event_type = event_type.to_string();
        tokio::spawn(async move {
            notifier
                .deliver(&event_type, template_id, template_url.as_deref(), form_data)
                .await;
        });
    }

    /// Deliver an event to every configured URL, returning how many endpoints
    /// accepted it.
    pub async fn deliver(
        &self,
        event_type: &str,
        template_id: Uuid,
        template_url: Option<&str>,
        form_data: Value,
    ) -> usize {
        if !self.config.enabled {
            debug!("Webhooks disabled, skipping notification");
            return 0;
        }

        let mut urls: Vec<String> = self.config.urls.clone();
        if let Some(url) = template_url {
            if !url.trim().is_empty() {
                urls.push(url.to_string());
            }
        }
        if urls.is_empty() {
            debug!("No webhook URLs configured, skipping notification");
            return 0;
        }

        let payload = json!({
            "event_type": event_type,
            "timestamp": Utc::now().to_rfc3339(),
            "template_id": template_id,
            "form_data": form_data,
        });
        let body = payload.to_string();

        let signature = match self.config.secret.as_deref() {
            Some(secret) => match sign_payload(secret, &body) {
                Ok(sig) => Some(sig),
                Err(e) => {
                    warn!("Skipping webhook signature: {}", e);
                    None
                }
            },
            None => None,
        };

        let deliveries = urls
            .iter()
            .map(|url| self.send_one(url, &body, signature.as_deref()));
        let results = futures::future::join_all(deliveries).await;
        results.into_iter().filter(|delivered| *delivered).count()
    }

    async fn send_one(&self, url: &str, body: &str, signature: Option<&str>) -> bool {
        let mut request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Webhook delivered to {} ({})", url, response.status());
                true
            }
            Ok(response) => {
                warn!("Webhook to {} returned status {}", url, response.status());
                false
            }
            Err(e) => {
                warn!("Error sending webhook to {}: {}", url, e);
                false
            }
        }
    }
}

/// HMAC-SHA256 hex signature over the exact request body.
fn sign_payload(secret: &str, payload: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool, urls: Vec<&str>) -> WebhookConfig {
        WebhookConfig {
            enabled,
            urls: urls.into_iter().map(String::from).collect(),
            secret: None,
            timeout_secs: 1,
        }
    }

    #[test]
    fn signature_matches_the_rfc_4231_vector() {
        // RFC 4231 test case 2: key "Jefe".
        let signature = sign_payload("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[tokio::test]
    async fn disabled_notifier_skips_delivery() {
        let notifier =
            WebhookNotifier::new(config(false, vec!["http://127.0.0.1:1/hook"])).unwrap();
        let delivered = notifier
            .deliver("submission_created", Uuid::now_v7(), None, json!({}))
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn no_configured_urls_means_nothing_to_deliver() {
        let notifier = WebhookNotifier::new(config(true, vec![])).unwrap();
        let delivered = notifier
            .deliver("submission_created", Uuid::now_v7(), None, json!({}))
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn unreachable_endpoints_are_swallowed() {
        // Nothing listens on port 1; the failure must be absorbed, not raised.
        let notifier = WebhookNotifier::new(config(true, vec!["http://127.0.0.1:1/hook"])).unwrap();
        let delivered = notifier
            .deliver(
                "submission_created",
                Uuid::now_v7(),
                Some("http://127.0.0.1:1/other"),
                json!({"name": "Ada"}),
            )
            .await;
        assert_eq!(delivered, 0);
    }
}
