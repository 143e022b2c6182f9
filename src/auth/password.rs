use std::borrow::Cow;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{debug, error};

/// Longest password prefix, in UTF-8 bytes, that reaches the hasher.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Cuts `plain` to at most 72 bytes, dropping a character split by the cut.
pub fn truncate_password(plain: &str) -> Cow<'_, str> {
    if plain.len() <= MAX_PASSWORD_BYTES {
        return Cow::Borrowed(plain);
    }
    let mut end = MAX_PASSWORD_BYTES;
    while !plain.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Borrowed(&plain[..end])
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(truncate_password(plain).as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// False for a wrong password and for any hash string that is not a parseable Argon2 PHC string.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "stored hash is not a PHC string");
            return false;
        }
    };
    Argon2::default()
        .verify_password(truncate_password(plain).as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correct-horse-battery-staple").unwrap();
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn verify_is_false_on_malformed_hash() {
        assert!(!verify_password("anything", "not-a-valid-hash"));
        assert!(!verify_password("anything", "$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
    }

    #[test]
    fn only_first_72_bytes_matter() {
        let prefix = "p".repeat(MAX_PASSWORD_BYTES);
        let first = format!("{prefix}tail-one");
        let second = format!("{prefix}a-completely-different-tail");
        let hash = hash_password(&first).unwrap();
        assert!(verify_password(&first, &hash));
        assert!(verify_password(&second, &hash));
        assert!(verify_password(&prefix, &hash));
    }

    #[test]
    fn truncation_drops_split_multibyte_char() {
        // 71 ASCII bytes followed by a 2-byte char straddling the limit.
        let plain = format!("{}é", "a".repeat(71));
        assert_eq!(plain.len(), 73);
        assert_eq!(truncate_password(&plain), "a".repeat(71));

        let short = "ção";
        assert!(matches!(truncate_password(short), Cow::Borrowed("ção")));
    }
}
