use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::models::{Actor, Role};
use crate::routes::ApiError;

/// Shared secret used to verify session tokens
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
}

impl AuthConfig {
    pub fn new(jwt_secret: Option<String>) -> Self {
        Self { jwt_secret }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    exp: usize,
}

/// Sign a token for `actor` valid for `ttl`
///
/// Used by the session layer and by tests; the engine itself only verifies.
pub fn issue_token(secret: &str, actor: &Actor, ttl: Duration) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: actor.id,
        role: actor.role,
        exp: (Utc::now() + ttl).timestamp().max(0) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

impl FromRequest for Actor {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authorize_bearer(req))
    }
}

fn authorize_bearer(req: &HttpRequest) -> Result<Actor, ApiError> {
    let config = req
        .app_data::<web::Data<AuthConfig>>()
        .ok_or_else(|| ApiError::Unauthenticated("authentication is not configured".into()))?;

    let secret = config
        .jwt_secret
        .as_deref()
        .ok_or_else(|| ApiError::Unauthenticated("missing JWT secret".into()))?;

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthenticated("expected Bearer token".into()))?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|err| ApiError::Unauthenticated(format!("invalid token: {err}")))?;

    Ok(Actor {
        id: data.claims.sub,
        role: data.claims.role,
    })
}
