use serde::{Deserialize, Serialize};

/// Purpose of a token. Tokens minted without a kind are access tokens.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    #[default]
    Access,
    PasswordReset,
}

/// JWT payload: the subject is the user's email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: String,     // user email
    pub exp: usize,      // expires at (unix timestamp)
    #[serde(default)]
    pub iat: usize,      // issued at (unix timestamp)
    #[serde(default)]
    pub kind: TokenKind, // access or password reset
}
