//! Signed player identities.
//!
//! A token correlates a reconnect attempt with the seat its holder was
//! originally given. The hub only ever compares the verified id against
//! stored seat identities; it never interprets it.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Opaque verified player identifier.
pub type PlayerId = String;

/// Why a token could not be minted or verified.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum IdentityError {
    /// Not a structurally valid token.
    #[display("malformed token")]
    Malformed,
    /// Signed with a different key, or tampered with.
    #[display("bad token signature")]
    BadSignature,
    /// Past its expiry.
    #[display("token expired")]
    Expired,
    /// A required claim is absent.
    #[display("token claim missing")]
    ClaimMissing,
    /// Minting failed.
    #[display("failed to sign token: {}", _0)]
    Signing(#[error(not(source))] String),
}

/// Mints and verifies signed identity tokens.
pub trait IdentityService: Send + Sync {
    /// Issues a token asserting `player_id`.
    fn mint(&self, player_id: &str) -> Result<String, IdentityError>;

    /// Checks a token and returns the player id it asserts.
    fn verify(&self, token: &str) -> Result<PlayerId, IdentityError>;
}

/// Claims carried by a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The player this token identifies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<PlayerId>,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch.
    ///
    /// Zero when absent; the required-claim check then rejects the token.
    #[serde(default)]
    pub exp: u64,
}

/// HS256 JSON Web Token identity service.
pub struct JwtIdentity {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtIdentity {
    /// Default token lifetime.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

    /// Creates a service signing with `secret`; tokens live for `ttl`.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Generates a fresh random player id.
    pub fn new_player_id() -> PlayerId {
        uuid::Uuid::new_v4().to_string()
    }

    fn encode(&self, claims: &Claims) -> Result<String, IdentityError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| IdentityError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for JwtIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentity").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl IdentityService for JwtIdentity {
    #[instrument(skip(self))]
    fn mint(&self, player_id: &str) -> Result<String, IdentityError> {
        let now = jsonwebtoken::get_current_timestamp();
        self.encode(&Claims {
            user_id: Some(player_id.to_string()),
            iat: now,
            exp: now + self.ttl.as_secs(),
        })
    }

    #[instrument(skip(self, token))]
    fn verify(&self, token: &str) -> Result<PlayerId, IdentityError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                match e.kind() {
                    ErrorKind::InvalidSignature => IdentityError::BadSignature,
                    ErrorKind::ExpiredSignature => IdentityError::Expired,
                    ErrorKind::MissingRequiredClaim(_) => IdentityError::ClaimMissing,
                    _ => IdentityError::Malformed,
                }
            })?;

        data.claims.user_id.ok_or(IdentityError::ClaimMissing)
    }
}
