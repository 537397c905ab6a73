//! Session token service.
//!
//! A session is a pair of HS256-signed tokens: a short-lived access token
//! and a longer-lived refresh token, each signed with its own secret.

use borohub_common::{AppError, AppResult, AuthConfig, IdGenerator};
use borohub_db::entities::member::{self, MemberRole};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Which half of the session a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by both session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Member ID.
    pub sub: String,
    pub role: MemberRole,
    pub iat: i64,
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
    pub token_type: TokenKind,
}

/// Freshly issued session tokens.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: i64,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    id_gen: IdGenerator,
}

impl TokenService {
    /// Create a token service from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
            id_gen: IdGenerator::new(),
        }
    }

    /// Access token lifetime in seconds.
    #[must_use]
    pub const fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    /// Refresh token lifetime in seconds.
    #[must_use]
    pub const fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    /// Issue a new access/refresh pair for a member.
    pub fn issue(&self, member: &member::Model) -> AppResult<SessionTokens> {
        let access_token = self.sign(member, TokenKind::Access)?;
        let refresh_token = self.sign(member, TokenKind::Refresh)?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
            access_ttl_secs: self.access_ttl_secs,
            refresh_ttl_secs: self.refresh_ttl_secs,
        })
    }

    /// Issue only a new access token, used when refreshing a session.
    pub fn issue_access(&self, member: &member::Model) -> AppResult<String> {
        self.sign(member, TokenKind::Access)
    }

    /// Verify an access token.
    pub fn verify_access(&self, token: &str) -> AppResult<SessionClaims> {
        self.verify(token, TokenKind::Access)
    }

    /// Verify a refresh token.
    pub fn verify_refresh(&self, token: &str) -> AppResult<SessionClaims> {
        self.verify(token, TokenKind::Refresh)
    }

    fn sign(&self, member: &member::Model, kind: TokenKind) -> AppResult<String> {
        let now = Utc::now();
        let (ttl, key) = match kind {
            TokenKind::Access => (self.access_ttl_secs, &self.access_encoding),
            TokenKind::Refresh => (self.refresh_ttl_secs, &self.refresh_encoding),
        };

        let claims = SessionClaims {
            sub: member.id.clone(),
            role: member.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl)).timestamp(),
            jti: self.id_gen.token_id(),
            token_type: kind,
        };

        encode(&Header::new(ALGORITHM), &claims, key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {e}")))
    }

    fn verify(&self, token: &str, kind: TokenKind) -> AppResult<SessionClaims> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, key, &validation)?;

        if data.claims.token_type != kind {
            return Err(AppError::Unauthorized("Wrong session token type".to_string()));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            access_secret: format!("{secret}-access"),
            refresh_secret: format!("{secret}-refresh"),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 604_800,
            secure_cookies: false,
            admin_emails: vec![],
        }
    }

    fn member(role: MemberRole) -> member::Model {
        member::Model {
            id: "m1".to_string(),
            full_name: "Ada Lovelace".to_string(),
            handle: "ada".to_string(),
            handle_lower: "ada".to_string(),
            email_address: "ada@example.com".to_string(),
            password_hash: "x".to_string(),
            role,
            about_me: None,
            location: None,
            hobby: None,
            avatar: String::new(),
            cover_image: String::new(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let tokens = TokenService::new(&config("s"));
        let issued = tokens.issue(&member(MemberRole::Admin)).unwrap();

        let access = tokens.verify_access(&issued.access_token).unwrap();
        assert_eq!(access.sub, "m1");
        assert_eq!(access.role, MemberRole::Admin);
        assert_eq!(access.token_type, TokenKind::Access);

        let refresh = tokens.verify_refresh(&issued.refresh_token).unwrap();
        assert_eq!(refresh.sub, "m1");
        assert_eq!(refresh.exp - refresh.iat, 604_800);
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let tokens = TokenService::new(&config("s"));
        let issued = tokens.issue(&member(MemberRole::Member)).unwrap();

        assert!(matches!(
            tokens.verify_refresh(&issued.access_token),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            tokens.verify_access(&issued.refresh_token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let ours = TokenService::new(&config("ours"));
        let theirs = TokenService::new(&config("theirs"));
        let issued = theirs.issue(&member(MemberRole::Member)).unwrap();

        assert!(ours.verify_access(&issued.access_token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut cfg = config("s");
        cfg.access_ttl_secs = -120;
        let tokens = TokenService::new(&cfg);
        let issued = tokens.issue(&member(MemberRole::Member)).unwrap();

        assert!(tokens.verify_access(&issued.access_token).is_err());
    }
}
