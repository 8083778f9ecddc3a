use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::{debug, instrument};

/// Hash a secret (admin password or patient access code) for storage.
#[instrument(skip(secret))]
pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2.hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a secret against a stored hash. A malformed hash never matches.
#[instrument(skip(secret, hash))]
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Stored hash could not be parsed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_original_secret() {
        let hash = hash_secret("4821").unwrap();

        assert!(verify_secret("4821", &hash));
        assert!(!verify_secret("4822", &hash));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_secret("4821", "plaintext-4821"));
    }
}
