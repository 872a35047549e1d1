use serde::{Deserialize, Serialize};

/// Claims carried by bearer tokens from the identity provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenClaims {
    pub sub: String, // subject (user ID)
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
}
