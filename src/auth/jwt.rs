use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, TokenKind};
use crate::config::JwtConfig;

/// Why a token was refused. Only ever logged; callers see a single unauthorized outcome.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenRejected {
    #[error("signature does not match")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("subject claim missing")]
    MissingSubject,
    #[error("expected a {expected:?} token, got {actual:?}")]
    WrongKind { expected: TokenKind, actual: TokenKind },
}

impl From<jsonwebtoken::errors::Error> for TokenRejected {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenRejected::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenRejected::Expired,
            ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => TokenRejected::MissingSubject,
            _ => TokenRejected::Malformed,
        }
    }
}

/// Signing and verification keys, built once from configuration.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    pub access_ttl: Duration,
    pub reset_ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            access_ttl: Duration::minutes(cfg.ttl_minutes),
            reset_ttl: Duration::minutes(cfg.reset_ttl_minutes),
        }
    }

    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + ttl;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            kind,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(kind = ?kind, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn issue_access(&self, subject: &str) -> anyhow::Result<String> {
        self.issue(subject, TokenKind::Access, self.access_ttl)
    }

    pub fn issue_reset(&self, subject: &str) -> anyhow::Result<String> {
        self.issue(subject, TokenKind::PasswordReset, self.reset_ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenRejected> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if data.claims.sub.trim().is_empty() {
            return Err(TokenRejected::MissingSubject);
        }
        debug!(kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenRejected> {
        let claims = self.verify(token)?;
        if claims.kind != expected {
            return Err(TokenRejected::WrongKind {
                expected,
                actual: claims.kind,
            });
        }
        Ok(claims)
    }
}

#[cfg(test)]
pub(crate) fn test_keys(secret: &str) -> JwtKeys {
    JwtKeys::new(&JwtConfig {
        secret: secret.into(),
        algorithm: Algorithm::HS256,
        ttl_minutes: 60 * 24,
        reset_ttl_minutes: 15,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn issue_and_verify_access_token() {
        let keys = test_keys("dev-secret");
        let token = keys.issue_access("ana@x.com").expect("sign access");
        assert_eq!(token.split('.').count(), 3);
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, "ana@x.com");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp >= claims.iat + 24 * 60 * 60);
    }

    #[test]
    fn default_ttls() {
        let keys = test_keys("dev-secret");
        assert_eq!(keys.access_ttl, Duration::minutes(1440));
        assert_eq!(keys.reset_ttl, Duration::minutes(15));
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let good = test_keys("secret-a");
        let other = test_keys("secret-b");
        let token = other.issue_access("ana@x.com").unwrap();
        assert_eq!(good.verify(&token).unwrap_err(), TokenRejected::InvalidSignature);
    }

    #[test]
    fn rejects_expired_token() {
        let keys = test_keys("dev-secret");
        let token = keys
            .issue("ana@x.com", TokenKind::Access, Duration::seconds(-30))
            .unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenRejected::Expired);
    }

    #[test]
    fn rejects_garbage() {
        let keys = test_keys("dev-secret");
        assert_eq!(keys.verify("token_invalido").unwrap_err(), TokenRejected::Malformed);
        assert!(keys.verify("a.b.c").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn rejects_token_without_subject() {
        #[derive(Serialize)]
        struct NoSubject {
            exp: usize,
        }
        let keys = test_keys("dev-secret");
        let exp = (OffsetDateTime::now_utc() + Duration::minutes(5)).unix_timestamp() as usize;
        let token = encode(
            &Header::default(),
            &NoSubject { exp },
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenRejected::MissingSubject);
    }

    #[test]
    fn accepts_minimal_sub_exp_payload_as_access() {
        #[derive(Serialize)]
        struct Minimal<'a> {
            sub: &'a str,
            exp: usize,
        }
        let keys = test_keys("dev-secret");
        let exp = (OffsetDateTime::now_utc() + Duration::minutes(5)).unix_timestamp() as usize;
        let token = encode(
            &Header::default(),
            &Minimal { sub: "ana@x.com", exp },
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        let claims = keys.verify_kind(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "ana@x.com");
    }

    #[test]
    fn reset_token_is_not_an_access_token() {
        let keys = test_keys("dev-secret");
        let token = keys.issue_reset("ana@x.com").unwrap();
        assert!(keys.verify_kind(&token, TokenKind::PasswordReset).is_ok());
        assert!(matches!(
            keys.verify_kind(&token, TokenKind::Access),
            Err(TokenRejected::WrongKind { .. })
        ));
    }
}
