//! Password hashing for stored accounts.
//!
//! Hashes use the `pbkdf2_sha256$<iterations>$<salt>$<base64 digest>` layout
//! so they stay readable by web stacks that understand that format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Algorithm tag stored as the first hash segment.
pub const ALGORITHM: &str = "pbkdf2_sha256";

const SALT_LENGTH: usize = 22;
const DIGEST_LENGTH: usize = 32;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect();
    hash_with_salt(password, &salt, iterations)
}

fn hash_with_salt(password: &str, salt: &str, iterations: u32) -> String {
    let digest = derive(password, salt, iterations);
    format!(
        "{}${}${}${}",
        ALGORITHM,
        iterations,
        salt,
        STANDARD.encode(digest)
    )
}

fn derive(password: &str, salt: &str, iterations: u32) -> [u8; DIGEST_LENGTH] {
    let mut digest = [0u8; DIGEST_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut digest);
    digest
}

/// Check a password against an encoded hash.
///
/// Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    let actual = STANDARD.encode(derive(password, salt, iterations));
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_format() {
        let hash = hash_password("Tr1cky-Lantern", 1000);
        let parts: Vec<&str> = hash.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "pbkdf2_sha256");
        assert_eq!(parts[1], "1000");
        assert_eq!(parts[2].len(), SALT_LENGTH);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(hash.len() <= 128, "hash must fit the password column");
    }

    #[test]
    fn test_verify() {
        let hash = hash_password("Tr1cky-Lantern", 1000);
        assert!(verify_password("Tr1cky-Lantern", &hash));
        assert!(!verify_password("tr1cky-lantern", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same", 10);
        let b = hash_password("same", 10);
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_vector() {
        // PBKDF2-HMAC-SHA256("password", "salt", 1) = 120fb6cf...b70be17b
        let hash = hash_with_salt("password", "salt", 1);
        assert_eq!(
            hash,
            "pbkdf2_sha256$1$salt$Eg+2z/z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs="
        );
    }

    #[test]
    fn test_malformed_hashes_do_not_verify() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$1$salt$abc"));
        assert!(!verify_password("x", "pbkdf2_sha256$many$salt$abc"));
        assert!(!verify_password("x", "pbkdf2_sha256$0$salt$abc"));
        assert!(!verify_password("x", "pbkdf2_sha256$1$salt"));
    }
}
