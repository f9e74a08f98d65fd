use base64::prelude::*;
use rand::RngCore;

/// Minimum entropy per ceremony challenge.
pub const CHALLENGE_LEN: usize = 32;

/// A single-use ceremony challenge: 32 bytes from the OS CSPRNG, carried as
/// unpadded base64url text. A failure to obtain OS randomness aborts the
/// process; it is not a recoverable condition for any caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Challenge(String);

impl Challenge {
    pub fn generate() -> Self {
        let mut bytes = [0u8; CHALLENGE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(BASE64_URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode a base64url challenge back to its raw bytes.
    pub fn decode(encoded: &str) -> Option<Vec<u8>> {
        BASE64_URL_SAFE_NO_PAD.decode(encoded).ok()
    }
}

impl std::fmt::Display for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_has_no_padding_or_standard_alphabet() {
        for _ in 0..32 {
            let c = Challenge::generate();
            assert!(!c.as_str().contains('='), "must be unpadded");
            assert!(!c.as_str().contains('+'), "must use the url alphabet");
            assert!(!c.as_str().contains('/'), "must use the url alphabet");
        }
    }

    #[test]
    fn test_challenge_round_trips_to_32_bytes() {
        let c = Challenge::generate();
        let bytes = Challenge::decode(c.as_str()).expect("must decode");
        assert_eq!(bytes.len(), CHALLENGE_LEN);
        assert_eq!(BASE64_URL_SAFE_NO_PAD.encode(&bytes), c.as_str());
    }

    #[test]
    fn test_challenges_are_unique() {
        let a = Challenge::generate();
        let b = Challenge::generate();
        assert_ne!(a, b);
    }
}
