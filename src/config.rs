use std::{str::FromStr, time::Duration};

use anyhow::Context;
use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub starttls: bool,
    pub ssl_tls: bool,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub environment: String,
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let algorithm = parse_algorithm(&optional("JWT_ALGORITHM").unwrap_or_else(|| "HS256".into()))?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            algorithm,
            ttl_minutes: positive_minutes("ACCESS_TOKEN_EXPIRE_MINUTES", 60 * 24)?,
            reset_ttl_minutes: positive_minutes("RESET_TOKEN_EXPIRE_MINUTES", 15)?,
        };
        Ok(Self {
            database_url,
            jwt,
            environment: optional("ENVIRONMENT").unwrap_or_else(|| "development".into()),
            frontend_url: optional("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".into()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl MailConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server: required("MAIL_SERVER")?,
            port: parsed_or("MAIL_PORT", 587)?,
            username: required("MAIL_USERNAME")?,
            password: required("MAIL_PASSWORD")?,
            from: required("MAIL_FROM")?,
            starttls: parsed_or("MAIL_STARTTLS", true)?,
            ssl_tls: parsed_or("MAIL_SSL_TLS", false)?,
            timeout: Duration::from_secs(parsed_or("MAIL_TIMEOUT_SECONDS", 120)?),
        })
    }
}

/// Only the HMAC family is accepted: tokens are signed and verified with one shared secret.
pub fn parse_algorithm(name: &str) -> anyhow::Result<Algorithm> {
    let algorithm = Algorithm::from_str(name.trim())
        .with_context(|| format!("unknown JWT_ALGORITHM {name:?}"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => anyhow::bail!("JWT_ALGORITHM {other:?} is not a shared-secret algorithm"),
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).with_context(|| format!("missing required environment variable {key}"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Token lifetimes; zero or negative would mint tokens that are already expired.
fn positive_minutes(key: &str, default: i64) -> anyhow::Result<i64> {
    let minutes = parsed_or(key, default)?;
    anyhow::ensure!(minutes > 0, "{key} must be a positive number of minutes, got {minutes}");
    Ok(minutes)
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        None => Ok(default),
    }
}
