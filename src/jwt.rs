//! Signing and validation of access and refresh credentials (HS256).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::UserRole;

/// The `typ` claim. Decoding checks it so one kind of token is never
/// accepted in place of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims of an access credential. Enough to build a principal without a
/// database lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user UUID)
    pub sub: String,
    pub username: String,
    pub role: UserRole,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Claims of a refresh credential. Only accepted while `jti` is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// JWT ID, the key of the refresh token's row in the database
    pub jti: String,
    /// Subject (user UUID)
    pub sub: String,
    pub username: String,
    pub role: UserRole,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    pub iat: u64,
    pub exp: u64,
}

/// Default access token duration: 5 minutes
pub const DEFAULT_ACCESS_TOKEN_SECS: u64 = 5 * 60;

/// Default refresh token duration: 2 weeks
pub const DEFAULT_REFRESH_TOKEN_SECS: u64 = 14 * 24 * 60 * 60;

/// Claims carrying a `typ` discriminator.
trait TypedClaims: DeserializeOwned {
    const TYPE: TokenType;
    fn token_type(&self) -> TokenType;
}

impl TypedClaims for AccessClaims {
    const TYPE: TokenType = TokenType::Access;
    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

impl TypedClaims for RefreshClaims {
    const TYPE: TokenType = TokenType::Refresh;
    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

/// Signing key and token lifetimes.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_secs: u64,
    refresh_secs: u64,
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedAccess {
    pub token: String,
    pub expires_at: u64,
}

/// A freshly signed refresh token. Only live once `jti` is recorded.
#[derive(Debug, Clone)]
pub struct IssuedRefresh {
    pub token: String,
    pub jti: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

impl JwtConfig {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_durations(secret, DEFAULT_ACCESS_TOKEN_SECS, DEFAULT_REFRESH_TOKEN_SECS)
    }

    pub fn with_durations(secret: &[u8], access_secs: u64, refresh_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_secs,
            refresh_secs,
        }
    }

    /// Access token lifetime; also the reissued access cookie's Max-Age.
    pub fn access_duration(&self) -> u64 {
        self.access_secs
    }

    pub fn refresh_duration(&self) -> u64 {
        self.refresh_secs
    }

    pub fn generate_access_token(
        &self,
        user_uuid: &str,
        username: &str,
        role: UserRole,
    ) -> Result<IssuedAccess, JwtError> {
        let iat = unix_now()?;
        let exp = iat + self.access_secs;

        let token = self.sign(&AccessClaims {
            sub: user_uuid.to_string(),
            username: username.to_string(),
            role,
            token_type: TokenType::Access,
            iat,
            exp,
        })?;

        Ok(IssuedAccess {
            token,
            expires_at: exp,
        })
    }

    pub fn generate_refresh_token(
        &self,
        user_uuid: &str,
        username: &str,
        role: UserRole,
    ) -> Result<IssuedRefresh, JwtError> {
        let iat = unix_now()?;
        let exp = iat + self.refresh_secs;
        let jti = uuid::Uuid::new_v4().to_string();

        let token = self.sign(&RefreshClaims {
            jti: jti.clone(),
            sub: user_uuid.to_string(),
            username: username.to_string(),
            role,
            token_type: TokenType::Refresh,
            iat,
            exp,
        })?;

        Ok(IssuedRefresh {
            token,
            jti,
            issued_at: iat,
            expires_at: exp,
        })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.decode(token)
    }

    /// Checks signature, expiry and type only. Revocation is the token
    /// store's concern.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        self.decode(token)
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, JwtError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(JwtError::Encoding)
    }

    fn decode<C: TypedClaims>(&self, token: &str) -> Result<C, JwtError> {
        let claims = jsonwebtoken::decode::<C>(token, &self.decoding_key, &self.validation)
            .map_err(JwtError::from)?
            .claims;

        if claims.token_type() != C::TYPE {
            return Err(JwtError::WrongTokenType);
        }
        Ok(claims)
    }
}

fn unix_now() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("Token has expired")]
    Expired,
    #[error("Token signature does not match")]
    InvalidSignature,
    #[error("Failed to decode token: {0}")]
    Decoding(jsonwebtoken::errors::Error),
    #[error("System clock is before the Unix epoch")]
    TimeError,
    /// A refresh token presented as an access token, or the reverse.
    #[error("Wrong token type")]
    WrongTokenType,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Decoding(e),
        }
    }
}
