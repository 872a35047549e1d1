use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::config::{required, ConfigError};
use crate::models::auth::TokenClaims;
use crate::services::errors::auth_service_errors::AuthServiceError;

pub const TOKEN_TTL_HOURS: i64 = 24;

/// Verifies bearer tokens minted by the identity provider. The subject claim
/// is trusted as the caller's user id.
pub trait AuthServiceTrait: Send + Sync {
    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError>;
    fn extract_user_id_from_token(&self, token: &str) -> Result<String, AuthServiceError>;
    fn generate_token(&self, user_id: &str) -> Result<String, AuthServiceError>;
}

pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = required(&|key: &str| std::env::var(key).ok(), "JWT_SECRET")?;
        Ok(AuthService { jwt_secret })
    }

    pub fn with_jwt_secret(jwt_secret: String) -> Self {
        AuthService { jwt_secret }
    }
}

impl AuthServiceTrait for AuthService {
    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let validation = Validation::default();

        match decode::<TokenClaims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                let now = Utc::now().timestamp() as usize;
                if token_data.claims.exp < now {
                    Err(AuthServiceError::ExpiredToken)
                } else if token_data.claims.sub.trim().is_empty() {
                    Err(AuthServiceError::InvalidToken)
                } else {
                    Ok(token_data.claims)
                }
            }
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(AuthServiceError::ExpiredToken)
                }
                _ => Err(AuthServiceError::InvalidToken),
            },
        }
    }

    fn extract_user_id_from_token(&self, token: &str) -> Result<String, AuthServiceError> {
        let claims = self.verify_token(token)?;
        Ok(claims.sub)
    }

    /// Mints a token the way the identity provider does; used by local tooling and tests.
    fn generate_token(&self, user_id: &str) -> Result<String, AuthServiceError> {
        if user_id.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "User ID cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| AuthServiceError::JwtError(format!("{:#?}", e)))
    }
}
