use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::jwt::{verify_token, Claims, TokenType};
use crate::config::Config;
use crate::error::AppError;
use crate::AppState;

/// The authenticated caller, resolved once per request and handed to
/// handlers explicitly through request extensions.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
        }
    }
}

/// Validate an access token and build the session it represents.
pub fn session_from_token(token: &str, config: &Config) -> Result<Session, AppError> {
    let token_data = verify_token(token, config)?;

    if token_data.claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized);
    }

    Ok(Session::from_claims(token_data.claims))
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let session = session_from_token(token, &state.config)?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
