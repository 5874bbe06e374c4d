use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use shared_config::AppConfig;
use shared_models::ApiError;
use std::sync::Arc;

use crate::identity::validate_token;

/// Authenticates the bearer credential and inserts the resulting
/// `RequestContext` into request extensions (§6, §9). Everything downstream
/// of this middleware treats the credential as already-verified.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Authentication("missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| ApiError::Authentication("invalid authorization header".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Authentication("expected a bearer credential".to_string()))?;

    let ctx = validate_token(token, &config.jwt_access_secret).map_err(ApiError::Authentication)?;

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
