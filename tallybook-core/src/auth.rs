use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Authenticated caller, attached to request extensions by [`jwt_middleware`].
///
/// The user id fills `createdBy`/`updatedBy` audit fields and the business id
/// scopes every read and write to one tenant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub business_id: Uuid,
}

/// Claims expected inside the JWT for authenticated users.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the user's UUID as a string.
    pub sub: String,
    /// Business (tenant) the token is scoped to.
    pub business: String,
    pub exp: usize,
}

/// Decodes a bearer token into a request context.
pub fn decode_context(token: &str, secret: &str) -> Result<RequestContext, AppError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let claims = decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
        .map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            AppError::Unauthorized
        })?
        .claims;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    let business_id = Uuid::parse_str(&claims.business).map_err(|_| AppError::Unauthorized)?;

    Ok(RequestContext {
        user_id,
        business_id,
    })
}

/// Middleware to validate a Bearer JWT in the `Authorization` header.
///
/// On success the request is forwarded with a [`RequestContext`] extension;
/// on failure a `401` is returned.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let context = decode_context(token, &state.config.jwt_secret)?;
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
