use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::{debug, warn};

use super::repo_types::User;
use crate::{error::AppError, state::AppState};

/// Resolves `Authorization: Bearer <token>` to the stored user.
///
/// Every failure before the lookup, and a lookup miss, is the same
/// [`AppError::Unauthorized`]. Only a storage outage differs.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| {
                debug!("missing or malformed Authorization header");
                AppError::Unauthorized
            })?;

        let identity = state
            .keys
            .validate(token)
            .map_err(|_| AppError::Unauthorized)?;

        let user = state
            .store
            .find_user_by_id(identity.user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = identity.user_id, "token for unknown user");
                AppError::Unauthorized
            })?;

        Ok(CurrentUser(user))
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
