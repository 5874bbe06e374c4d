//! Test harness helpers, generalized from the ancestor's
//! `TestConfig`/`TestUser`/JWT-signing builders to this workspace's
//! `RequestContext`/`Role` shape.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use shared_config::AppConfig;
use shared_models::Role;
use uuid::Uuid;

pub struct TestConfig {
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    pub webhook_default_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_access_secret: "test-access-secret-long-enough-for-hmac".to_string(),
            jwt_refresh_secret: "test-refresh-secret-long-enough-for-hmac".to_string(),
            webhook_default_secret: "test-webhook-secret".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            port: 0,
            database_url: String::new(),
            jwt_access_secret: self.jwt_access_secret.clone(),
            jwt_refresh_secret: self.jwt_refresh_secret.clone(),
            webhook_default_secret: self.webhook_default_secret.clone(),
            log_level: "debug".to_string(),
        }
    }
}

/// Signs a `{sub,role,store_id,exp}` token the same way
/// `identity::validate_token` expects to consume one.
pub fn sign_test_token(
    id: Uuid,
    role: Role,
    store_id: Option<Uuid>,
    secret: &str,
    expires_in_secs: i64,
) -> String {
    let now = Utc::now();
    let exp = (now.timestamp() + expires_in_secs).max(0) as u64;

    let header = json!({"alg": "HS256", "typ": "JWT"});
    let payload = json!({
        "sub": id,
        "role": role,
        "store_id": store_id,
        "exp": exp,
    });

    let header_encoded = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
    let payload_encoded = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    let signing_input = format!("{}.{}", header_encoded, payload_encoded);

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("valid hmac key");
    mac.update(signing_input.as_bytes());
    let signature_encoded = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{}.{}.{}", header_encoded, payload_encoded, signature_encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trips_into_app_config() {
        let config = TestConfig::default().to_app_config();
        assert!(!config.jwt_access_secret.is_empty());
        assert_eq!(config.port, 0);
    }
}
