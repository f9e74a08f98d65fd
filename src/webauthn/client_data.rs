use base64::prelude::*;
use serde::Deserialize;

use super::VerifyError;
use crate::config::RpConfig;

pub(crate) const TYPE_CREATE: &str = "webauthn.create";
pub(crate) const TYPE_GET: &str = "webauthn.get";

/// Collected client data: the JSON the browser assembles and the authenticator
/// signs over (hashed). The three fields below are the ones every ceremony
/// must validate; anything else in the JSON is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectedClientData {
    #[serde(rename = "type")]
    pub ceremony_type: String,
    pub challenge: String,
    pub origin: String,
}

impl CollectedClientData {
    pub fn parse(json: &[u8]) -> Result<Self, VerifyError> {
        serde_json::from_slice(json).map_err(|_| VerifyError::Malformed("client data json"))
    }

    /// Check type, challenge, and origin, in that order. The challenge is
    /// compared as decoded bytes so padding variants cannot slip past a
    /// string comparison.
    pub fn verify(
        &self,
        expected_type: &str,
        expected_challenge: &str,
        config: &RpConfig,
    ) -> Result<(), VerifyError> {
        if self.ceremony_type != expected_type {
            return Err(VerifyError::CeremonyTypeMismatch);
        }

        let expected = BASE64_URL_SAFE_NO_PAD
            .decode(expected_challenge)
            .map_err(|_| VerifyError::ChallengeMismatch)?;
        let embedded = BASE64_URL_SAFE_NO_PAD
            .decode(&self.challenge)
            .map_err(|_| VerifyError::ChallengeMismatch)?;
        if embedded != expected {
            return Err(VerifyError::ChallengeMismatch);
        }

        if self.origin != config.expected_origin {
            return Err(VerifyError::OriginMismatch);
        }
        Ok(())
    }
}
