//! Content-derived identity tokens.
//!
//! The token is a display and dedup hint only: ten hex characters of a SHA-256
//! digest. It depends on nothing but the stored bytes.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::utils::constants::IDENTITY_TOKEN_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityToken(String);

impl IdentityToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentityToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the identity token for a byte sequence
#[must_use]
pub fn identify(bytes: &[u8]) -> IdentityToken {
    let digest = Sha256::digest(bytes);
    let mut token = hex::encode(digest);
    token.truncate(IDENTITY_TOKEN_LEN);
    IdentityToken(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_alphabet() {
        let token = identify(b"console.log('hi')");
        assert_eq!(token.as_str().len(), IDENTITY_TOKEN_LEN);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(identify(b"body{}"), identify(b"body{}"));
    }

    #[test]
    fn test_one_byte_change() {
        assert_ne!(identify(b"body{color:red}"), identify(b"body{color:rex}"));
    }

    #[test]
    fn test_known_prefix() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(identify(b"").as_str(), "e3b0c44298");
    }
}
