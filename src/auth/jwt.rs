use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Identity};
use crate::config::JwtConfig;

/// Any reason a token was not accepted. Callers must not tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("token rejected")]
pub struct TokenRejected;

/// Signing and verification keys, built once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: TimeDuration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            ttl: TimeDuration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        self.issue_at(identity, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        identity: &Identity,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now
            .checked_add(self.ttl)
            .context("token expiry out of range")?;
        let claims = Claims {
            sub: identity.email.clone(),
            user_id: identity.user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id = identity.user_id, "jwt signed");
        Ok(token)
    }

    /// Checks signature, algorithm and expiry. Pure; no storage lookup.
    pub fn validate(&self, token: &str) -> Result<Identity, TokenRejected> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenRejected
        })?;

        if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            debug!(user_id = data.claims.user_id, "jwt expired");
            return Err(TokenRejected);
        }

        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims.into())
    }
}

#[cfg(test)]
pub(crate) fn test_keys() -> JwtKeys {
    JwtKeys::from_config(&JwtConfig {
        secret: "test-secret".into(),
        algorithm: Algorithm::HS256,
        ttl_minutes: 30,
    })
}
