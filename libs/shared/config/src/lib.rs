use std::env;
use tracing::warn;

/// The CLI/env surface named in §6: listen port, backing-store connection
/// string, token signing secrets, the webhook default secret, and a log
/// level. `DATABASE_URL` is read for interface parity even though the
/// in-memory store (§12.1 of the full spec) does not dial out with it —
/// swapping in a real store behind `shared-store`'s repository would start
/// consuming it without touching any other crate.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    pub webhook_default_secret: String,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("PORT not set, defaulting to 8080");
                    8080
                }),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| {
                warn!("DATABASE_URL not set, using empty value");
                String::new()
            }),
            jwt_access_secret: env::var("JWT_ACCESS_SECRET").unwrap_or_else(|_| {
                warn!("JWT_ACCESS_SECRET not set, using empty value");
                String::new()
            }),
            jwt_refresh_secret: env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| {
                warn!("JWT_REFRESH_SECRET not set, using empty value");
                String::new()
            }),
            webhook_default_secret: env::var("WEBHOOK_DEFAULT_SECRET").unwrap_or_else(|_| {
                warn!("WEBHOOK_DEFAULT_SECRET not set, using empty value");
                String::new()
            }),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_access_secret.is_empty() && !self.jwt_refresh_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        for key in ["PORT", "JWT_ACCESS_SECRET", "JWT_REFRESH_SECRET"] {
            std::env::remove_var(key);
        }
        let config = AppConfig::from_env();
        assert_eq!(config.port, 8080);
        assert!(!config.is_configured());
    }
}
