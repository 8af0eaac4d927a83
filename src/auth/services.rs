use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{claims::Identity, dto::RegisterRequest, repo_types::User};
use crate::{
    db::StoreError,
    error::{AppError, EMAIL_TAKEN_MESSAGE},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Creates the account. The pre-check only saves a hash; the unique
/// constraint decides.
pub async fn register_user(state: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    let email = normalize_email(&req.email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation(
            "email: value is not a valid email address".into(),
        ));
    }

    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict(EMAIL_TAKEN_MESSAGE.into()));
    }

    let hash = state.credentials.hash_blocking(req.password).await?;

    let user = match state.store.create_user(&email, &hash).await {
        Ok(u) => u,
        Err(StoreError::Conflict) => {
            warn!(email = %email, "email registered concurrently");
            return Err(AppError::Conflict(EMAIL_TAKEN_MESSAGE.into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Returns a signed access token. Unknown email and wrong password are the
/// same error.
pub async fn authenticate(
    state: &AppState,
    raw_email: &str,
    password: String,
) -> Result<String, AppError> {
    let email = normalize_email(raw_email);
    let user = state.store.find_user_by_email(&email).await?;

    let stored_hash = user.as_ref().map(|u| u.hashed_password.clone());
    let ok = state.credentials.verify_blocking(password, stored_hash).await?;

    let user = match user {
        Some(u) if ok => u,
        Some(u) => {
            warn!(email = %email, user_id = u.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = state.keys.issue(&Identity {
        user_id: user.id,
        email: user.email.clone(),
    })?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(token)
}
