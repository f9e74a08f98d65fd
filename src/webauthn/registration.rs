use base64::prelude::*;
use sha2::{Digest, Sha256};

use super::attestation::AttestationObject;
use super::client_data::{CollectedClientData, TYPE_CREATE};
use super::types::{b64url_decode, RegistrationResponse};
use super::VerifyError;
use crate::config::RpConfig;

/// Credential extracted from a verified registration ceremony. Persisting it
/// is the orchestrator's job; this verifier has no side effects.
#[derive(Debug, Clone)]
pub struct RegistrationInfo {
    /// Unpadded base64url of the credential id; the login lookup key.
    pub external_id: String,
    pub credential_id: Vec<u8>,
    /// COSE_Key bytes exactly as attested; stored verbatim.
    pub public_key: Vec<u8>,
    pub sign_count: u32,
    pub user_verified: bool,
}

pub fn verify_registration(
    response: &RegistrationResponse,
    expected_challenge: &str,
    config: &RpConfig,
) -> Result<RegistrationInfo, VerifyError> {
    // 1. Client data: ceremony type, challenge, origin
    let client_data_bytes =
        b64url_decode("client data json", &response.response.client_data_json)?;
    let client_data = CollectedClientData::parse(&client_data_bytes)?;
    client_data.verify(TYPE_CREATE, expected_challenge, config)?;

    // 2. Attestation object
    let attestation_bytes =
        b64url_decode("attestation object", &response.response.attestation_object)?;
    let attestation = AttestationObject::parse(&attestation_bytes)?;
    let auth_data = &attestation.auth_data;

    // 3. RP id binding
    let expected_hash: [u8; 32] = Sha256::digest(config.expected_rp_id.as_bytes()).into();
    if auth_data.rp_id_hash != expected_hash {
        return Err(VerifyError::RpIdMismatch);
    }

    // 4. Presence / verification flags
    if !auth_data.user_present() {
        return Err(VerifyError::UserPresenceRequired);
    }
    if config.require_user_verification && !auth_data.user_verified() {
        return Err(VerifyError::UserVerificationRequired);
    }

    // 5. Attested credential section must be present at registration
    let attested = auth_data
        .attested_credential
        .as_ref()
        .ok_or(VerifyError::Malformed("attested credential data"))?;

    // 6. Attestation statement against the declared format
    let client_data_hash: [u8; 32] = Sha256::digest(&client_data_bytes).into();
    attestation.verify_statement(&client_data_hash, &attested.public_key)?;

    // 7. Hand the extracted record back for persistence
    Ok(RegistrationInfo {
        external_id: BASE64_URL_SAFE_NO_PAD.encode(&attested.credential_id),
        credential_id: attested.credential_id.clone(),
        public_key: attested.public_key.clone(),
        sign_count: auth_data.sign_count,
        user_verified: auth_data.user_verified(),
    })
}
