use crate::config::SecurityConfig;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's identifier.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
}

/// Issues and validates HS256-signed access tokens.
///
/// Tokens are stateless: validity depends only on the signature and the current time.
/// There is no revocation list, a token stays valid until its expiry passes.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, default_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            default_ttl,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.secret_key.clone(), config.token_ttl)
    }

    /// The lifetime applied by [`TokenService::issue_token`].
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issues a token for `subject` that expires after the default TTL.
    pub fn issue_token(&self, subject: &str) -> Result<String, AppError> {
        self.issue_token_with_ttl(subject, self.default_ttl)
    }

    /// Issues a token for `subject` that expires `ttl` from now.
    ///
    /// # Returns
    /// The encoded bearer string, or `AppError::Configuration` if the signing secret is empty.
    pub fn issue_token_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String, AppError> {
        let secret = self.secret()?;
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            exp: now + ttl.num_seconds(),
            iat: now,
        };

        debug!("Issuing access token for subject {} (exp {})", claims.sub, claims.exp);

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token and returns the subject it was issued for.
    ///
    /// The expiry check is done here rather than by `jsonwebtoken` so that no leeway applies:
    /// a token is valid only while its `exp` lies strictly in the future.
    ///
    /// # Errors
    /// - `InvalidSignature` if the signature does not verify under the server secret.
    /// - `ExpiredToken` if the expiry timestamp has been reached.
    /// - `MalformedToken` if the token cannot be parsed or misses `sub`/`exp`. A tampered
    ///   header usually lands here, since it no longer decodes to a JWT header.
    pub fn validate_token(&self, token: &str) -> Result<String, AppError> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    /// Like [`TokenService::validate_token`] but returns the full claim set.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let secret = self.secret()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?
        .claims;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AppError::ExpiredToken);
        }
        if claims.sub.is_empty() {
            return Err(AppError::MalformedToken("empty subject".into()));
        }

        Ok(claims)
    }

    fn secret(&self) -> Result<&str, AppError> {
        if self.secret.is_empty() {
            return Err(AppError::Configuration("SECRET_KEY not set".into()));
        }
        Ok(&self.secret)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
