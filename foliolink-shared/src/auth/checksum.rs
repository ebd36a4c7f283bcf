/// HMAC link checksums
///
/// Generated links that must not be tampered with (invitation accept URLs)
/// carry an HMAC-SHA256 checksum of the URL, keyed with the deployment's
/// verification secret. Verification recomputes and compares in constant
/// time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Generates the hex checksum for a URL
pub fn generate_checksum(secret: &str, url: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(url.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a checksum against a URL
pub fn verify_checksum(secret: &str, url: &str, checksum: &str) -> bool {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(url.as_bytes());

    match hex::decode(checksum) {
        Ok(presented) => mac.verify_slice(&presented).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "verification-secret";

    #[test]
    fn test_checksum_round_trip() {
        let url = "https://app.foliolink.io/invite?team=t1&email=a@x.com";
        let checksum = generate_checksum(SECRET, url);

        assert_eq!(checksum.len(), 64);
        assert!(verify_checksum(SECRET, url, &checksum));
    }

    #[test]
    fn test_checksum_rejects_tampered_url() {
        let checksum = generate_checksum(SECRET, "https://x.io/a");
        assert!(!verify_checksum(SECRET, "https://x.io/b", &checksum));
    }

    #[test]
    fn test_checksum_rejects_wrong_secret() {
        let checksum = generate_checksum(SECRET, "https://x.io/a");
        assert!(!verify_checksum("other-secret", "https://x.io/a", &checksum));
    }

    #[test]
    fn test_checksum_rejects_non_hex() {
        assert!(!verify_checksum(SECRET, "https://x.io/a", "zzzz"));
    }
}
