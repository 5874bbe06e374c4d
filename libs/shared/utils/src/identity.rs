//! Bearer-token consumption (§6, §9). The signature/expiry format is the
//! ancestor's own compact HMAC-signed three-part token; this spec treats
//! validation as opaque infrastructure, so the only thing this module
//! produces is the trusted `{id, role, storeId}` triple the engine consumes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared_models::{RequestContext, Role};
use tracing::debug;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: Uuid,
    role: Role,
    store_id: Option<Uuid>,
    exp: Option<u64>,
}

pub fn validate_token(token: &str, signing_secret: &str) -> Result<RequestContext, String> {
    if signing_secret.is_empty() {
        return Err("signing secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("invalid token format".to_string());
    }
    let (header_b64, claims_b64, signature_b64) = (parts[0], parts[1], parts[2]);

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| "invalid signature encoding".to_string())?;

    let signing_input = format!("{}.{}", header_b64, claims_b64);
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| "failed to construct hmac".to_string())?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&signature).map_err(|_| {
        debug!("token signature verification failed");
        "invalid token signature".to_string()
    })?;

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| "invalid claims encoding".to_string())?;
    let claims: TokenClaims =
        serde_json::from_str(&claims_json).map_err(|e| format!("invalid claims format: {e}"))?;

    if let Some(exp) = claims.exp {
        let now = chrono::Utc::now().timestamp() as u64;
        if exp < now {
            return Err("token expired".to_string());
        }
    }

    Ok(RequestContext::new(claims.sub, claims.role, claims.store_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sign_test_token;

    #[test]
    fn round_trips_a_valid_token() {
        let secret = "test-secret-key";
        let id = Uuid::new_v4();
        let store_id = Some(Uuid::new_v4());
        let token = sign_test_token(id, Role::StoreAdmin, store_id, secret, 3600);
        let ctx = validate_token(&token, secret).unwrap();
        assert_eq!(ctx.id, id);
        assert_eq!(ctx.role, Role::StoreAdmin);
        assert_eq!(ctx.store_id, store_id);
    }

    #[test]
    fn rejects_expired_token() {
        let secret = "test-secret-key";
        let token = sign_test_token(Uuid::new_v4(), Role::Customer, None, secret, -10);
        assert!(validate_token(&token, secret).is_err());
    }

    #[test]
    fn rejects_bad_signature() {
        let secret = "test-secret-key";
        let token = sign_test_token(Uuid::new_v4(), Role::Customer, None, secret, 3600);
        assert!(validate_token(&token, "wrong-secret").is_err());
    }
}
