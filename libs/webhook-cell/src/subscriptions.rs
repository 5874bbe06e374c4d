//! Webhook subscription CRUD (§4.6, §6). Delivery itself lives in
//! `dispatcher`/`worker`; this service only owns the subscription records,
//! mirroring `catalog-cell`'s thin CRUD-over-`AppStore` service shape.

use std::sync::Arc;

use chrono::Utc;
use shared_models::{SubscriptionHealth, WebhookSubscription};
use shared_store::AppStore;
use uuid::Uuid;

use crate::error::WebhookError;

/// Generates a signing secret server-side (§3, §6): subscribers never choose
/// their own secret, since a client-supplied one would let them predict or
/// replay a valid `X-Signature`.
pub fn generate_secret() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let body: String = (0..40).map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char).collect();
    format!("whsec_{}", body)
}

pub struct SubscriptionService {
    store: Arc<AppStore>,
}

impl SubscriptionService {
    pub fn new(store: Arc<AppStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, subscription: WebhookSubscription) -> WebhookSubscription {
        self.store.put_subscription(subscription.clone()).await;
        subscription
    }

    pub async fn get(&self, id: Uuid) -> Result<WebhookSubscription, WebhookError> {
        self.store.get_subscription(id).await.ok_or(WebhookError::NotFound)
    }

    pub async fn list(&self) -> Vec<WebhookSubscription> {
        self.store.all_subscriptions().await
    }

    pub async fn update(&self, subscription: WebhookSubscription) -> Result<WebhookSubscription, WebhookError> {
        self.get(subscription.id).await?;
        self.store.put_subscription(subscription.clone()).await;
        Ok(subscription)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), WebhookError> {
        self.store.remove_subscription(id).await.ok_or(WebhookError::NotFound)?;
        Ok(())
    }

    /// `GetSubscriptionHealth` (§4.6).
    pub async fn health(&self, id: Uuid) -> Result<SubscriptionHealth, WebhookError> {
        let subscription = self.get(id).await?;
        Ok(subscription.health(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample() -> WebhookSubscription {
        WebhookSubscription {
            id: Uuid::new_v4(),
            url: "https://example.com/hook".into(),
            events: HashSet::new(),
            secret: "whsec_test".into(),
            is_active: true,
            retry_count: 0,
            max_retries: 5,
            last_success_at: None,
            last_failure_at: None,
            last_failure_reason: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let app = Arc::new(AppStore::new());
        let svc = SubscriptionService::new(app);
        let sub = sample();
        let id = sub.id;
        svc.create(sub).await;
        assert_eq!(svc.get(id).await.unwrap().id, id);
    }

    #[tokio::test]
    async fn delete_then_get_not_found() {
        let app = Arc::new(AppStore::new());
        let svc = SubscriptionService::new(app);
        let sub = sample();
        let id = sub.id;
        svc.create(sub).await;
        svc.delete(id).await.unwrap();
        assert!(matches!(svc.get(id).await, Err(WebhookError::NotFound)));
    }

    #[tokio::test]
    async fn freshly_created_subscription_is_inactive_until_first_success() {
        let app = Arc::new(AppStore::new());
        let svc = SubscriptionService::new(app);
        let sub = sample();
        let id = sub.id;
        svc.create(sub).await;
        assert_eq!(svc.health(id).await.unwrap(), SubscriptionHealth::Inactive);
    }

    #[test]
    fn generated_secrets_are_prefixed_and_unique() {
        let a = generate_secret();
        let b = generate_secret();
        assert!(a.starts_with("whsec_"));
        assert_ne!(a, b);
    }
}
