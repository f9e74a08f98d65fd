use sha2::{Digest, Sha256};

use super::authenticator_data::AuthenticatorData;
use super::client_data::{CollectedClientData, TYPE_GET};
use super::cose;
use super::types::{b64url_decode, AuthenticationResponse};
use super::VerifyError;
use crate::config::RpConfig;
use crate::store::CredentialRecord;

/// Outcome of a verified authentication ceremony. The caller persists
/// `new_counter`; this verifier has no side effects.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticationInfo {
    pub new_counter: u32,
    pub user_verified: bool,
}

pub fn verify_authentication(
    response: &AuthenticationResponse,
    expected_challenge: &str,
    config: &RpConfig,
    credential: &CredentialRecord,
) -> Result<AuthenticationInfo, VerifyError> {
    // 1. Client data: ceremony type, challenge, origin
    let client_data_bytes =
        b64url_decode("client data json", &response.response.client_data_json)?;
    let client_data = CollectedClientData::parse(&client_data_bytes)?;
    client_data.verify(TYPE_GET, expected_challenge, config)?;

    // 2. Authenticator data
    let auth_data_raw =
        b64url_decode("authenticator data", &response.response.authenticator_data)?;
    let auth_data = AuthenticatorData::parse(&auth_data_raw)?;

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

    // 5. Assertion signature over authenticatorData ‖ SHA-256(clientDataJSON)
    let signature = b64url_decode("signature", &response.response.signature)?;
    let client_data_hash: [u8; 32] = Sha256::digest(&client_data_bytes).into();
    let mut message = Vec::with_capacity(auth_data_raw.len() + client_data_hash.len());
    message.extend_from_slice(&auth_data_raw);
    message.extend_from_slice(&client_data_hash);
    cose::verify_signature(&credential.public_key, &message, &signature)?;

    // 6. Counter monotonicity. A stored count of 0 means the authenticator
    //    never reported one; once a nonzero value has been observed the check
    //    is permanent.
    if auth_data.sign_count <= credential.sign_count && credential.sign_count != 0 {
        return Err(VerifyError::CounterRegression {
            stored: credential.sign_count,
            got: auth_data.sign_count,
        });
    }

    Ok(AuthenticationInfo {
        new_counter: auth_data.sign_count,
        user_verified: auth_data.user_verified(),
    })
}
