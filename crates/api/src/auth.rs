use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use users_domain::User;

use crate::error::ApiError;
use crate::routes::AppState;

pub const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,
    #[error("Invalid authentication token")]
    InvalidToken,
    #[error("Authentication token has expired")]
    ExpiredToken,
}

/// Identity resolved from a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
    pub roles: Vec<String>,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(ApiError::Authentication(AuthError::MissingToken))
    }
}

/// Parses lifetimes such as `45s`, `30m`, `1h` or `7d` into seconds.
/// Anything else yields one hour.
pub fn parse_expires_in(value: &str) -> i64 {
    let value = value.trim();
    let Some(unit) = value.chars().last() else {
        return DEFAULT_EXPIRES_IN_SECONDS;
    };
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86_400,
        _ => return DEFAULT_EXPIRES_IN_SECONDS,
    };

    match value[..value.len() - 1].parse::<i64>() {
        Ok(amount) if amount > 0 => amount.saturating_mul(multiplier),
        _ => DEFAULT_EXPIRES_IN_SECONDS,
    }
}

/// An access token and its expiry as unix seconds.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: i64,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in_seconds: i64,
}

impl JwtService {
    pub fn new(secret: &str, expires_in: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            expires_in_seconds: parse_expires_in(expires_in),
        }
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.expires_in_seconds
    }

    pub fn generate_token(&self, user: &User) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expires_in_seconds);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            roles: vec![DEFAULT_ROLE.to_string()],
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken {
            access_token,
            expires_at: claims.exp,
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }

    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.validate_token(token)?;
        let user_id = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
            roles: claims.roles,
        })
    }
}

/// Guard for JWT-protected routes. Stores [`AuthenticatedUser`] in the
/// request extensions.
pub async fn require_jwt(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AuthError::MissingToken)?;

    let user = state.jwt.authenticate(token.token()).inspect_err(|err| {
        warn!(reason = %err, "JWT authentication failed");
    })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 42,
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_parse_expires_in() {
        assert_eq!(parse_expires_in("45s"), 45);
        assert_eq!(parse_expires_in("30m"), 1800);
        assert_eq!(parse_expires_in("1h"), 3600);
        assert_eq!(parse_expires_in("7d"), 604_800);
        assert_eq!(parse_expires_in("12"), DEFAULT_EXPIRES_IN_SECONDS);
        assert_eq!(parse_expires_in("h"), DEFAULT_EXPIRES_IN_SECONDS);
        assert_eq!(parse_expires_in("-5m"), DEFAULT_EXPIRES_IN_SECONDS);
        assert_eq!(parse_expires_in(""), DEFAULT_EXPIRES_IN_SECONDS);
        assert_eq!(parse_expires_in("1w"), DEFAULT_EXPIRES_IN_SECONDS);
    }

    #[test]
    fn test_jwt_round_trip() {
        let jwt = JwtService::new("test-secret", "2h");
        let issued = jwt.generate_token(&user()).unwrap();
        assert!(issued.expires_at > Utc::now().timestamp() + 7000);

        let authenticated = jwt.authenticate(&issued.access_token).unwrap();
        assert_eq!(authenticated.user_id, 42);
        assert_eq!(authenticated.email, "test@example.com");
        assert_eq!(authenticated.roles, vec!["user".to_string()]);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issued = JwtService::new("secret-a", "1h")
            .generate_token(&user())
            .unwrap();
        let result = JwtService::new("secret-b", "1h").validate_token(&issued.access_token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = JwtService::new("test-secret", "1h");
        let claims = Claims {
            sub: "1".to_string(),
            email: "old@example.com".to_string(),
            roles: vec![DEFAULT_ROLE.to_string()],
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            jwt.validate_token(&token),
            Err(AuthError::ExpiredToken)
        ));
    }
}
