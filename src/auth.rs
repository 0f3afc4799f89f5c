//! Session verification (identity collaborator).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no session token provided")]
    MissingToken,
    #[error("invalid session token")]
    InvalidToken,
}

/// Turns a session token into an [`Actor`].
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Actor, AuthError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    #[serde(default, rename = "isSuperAdmin")]
    is_super_admin: bool,
    exp: i64,
    iat: i64,
}

/// HS256 tokens signed with a shared secret.
pub struct JwtSessionVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl JwtSessionVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a token for `actor`. Token issuance belongs to the identity
    /// provider; this exists for local runs and tests.
    pub fn issue(&self, actor: &Actor, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor.user_id.clone(),
            email: actor.email.clone(),
            is_super_admin: actor.is_admin,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::InvalidToken)
    }
}

impl SessionVerifier for JwtSessionVerifier {
    fn verify(&self, token: &str) -> Result<Actor, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!("rejected session token: {e}");
                AuthError::InvalidToken
            })?;
        Ok(Actor {
            user_id: data.claims.sub,
            email: data.claims.email,
            is_admin: data.claims.is_super_admin,
        })
    }
}

/// Pull the session token from `Authorization: Bearer …` or the `auth_token` cookie.
pub fn extract_token<'a>(authorization: Option<&'a str>, cookie: Option<&'a str>) -> Option<&'a str> {
    if let Some(token) = authorization.and_then(|h| h.strip_prefix("Bearer ")) {
        return Some(token.trim());
    }
    cookie?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "auth_token")
        .map(|(_, value)| value)
}
