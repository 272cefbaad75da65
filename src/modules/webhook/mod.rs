//! Webhook delivery for submission events
//!
//! Best-effort notifier. Deliveries run on background tasks, are signed with
//! HMAC-SHA256 when a secret is configured, and failures are logged rather
//! than surfaced to the request that triggered them.

mod notifier;

pub use notifier::WebhookNotifier;
