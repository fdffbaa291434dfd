use axum::extract::FromRequestParts;
use axum::http::{StatusCode, header, request::Parts};
use tracing::{Span, warn};

use crate::application::state::AppState;
use crate::domain::users::User;
use crate::infrastructure::auth::hash_token;

/// The user behind a valid, unrevoked bearer token. Extracting this from a
/// request is what makes a handler authenticated.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let auth_str = auth_header.to_str().map_err(|err| {
            warn!(error = %err, "authorization header contains invalid characters");
            StatusCode::UNAUTHORIZED
        })?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // Only the hash is stored; look the token up by it.
        let token_hash = hash_token(token);

        let token_record = state
            .token_repo
            .get_by_token_hash(&token_hash)
            .await
            .map_err(|err| {
                warn!(error = %err, "bearer token lookup failed");
                StatusCode::UNAUTHORIZED
            })?;

        if token_record.is_revoked() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let user = state
            .user_repo
            .get(token_record.user_id)
            .await
            .map_err(|err| {
                warn!(error = %err, user_id = %token_record.user_id, "user lookup failed for valid token");
                StatusCode::UNAUTHORIZED
            })?;

        Span::current().record("user.id", tracing::field::display(&user.id));
        Ok(Self(user))
    }
}
