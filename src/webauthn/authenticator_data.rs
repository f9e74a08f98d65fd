use ciborium::value::Value;

use super::VerifyError;

pub(crate) const FLAG_UP: u8 = 0x01;
pub(crate) const FLAG_UV: u8 = 0x04;
pub(crate) const FLAG_AT: u8 = 0x40;

/// Attested credential section of registration-time authenticator data.
#[derive(Debug, Clone)]
pub struct AttestedCredential {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    /// COSE_Key bytes exactly as the authenticator produced them.
    pub public_key: Vec<u8>,
}

/// Parsed authenticator data: `rpIdHash(32) ‖ flags(1) ‖ signCount(4, BE)`,
/// followed by the attested-credential section when the AT flag is set
/// (`aaguid(16) ‖ credIdLen(2, BE) ‖ credId ‖ cosePublicKey`).
#[derive(Debug, Clone)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: u8,
    pub sign_count: u32,
    pub attested_credential: Option<AttestedCredential>,
}

impl AuthenticatorData {
    pub fn parse(data: &[u8]) -> Result<Self, VerifyError> {
        if data.len() < 37 {
            return Err(VerifyError::Malformed("authenticator data"));
        }
        let rp_id_hash: [u8; 32] = data[0..32].try_into().unwrap();
        let flags = data[32];
        let sign_count = u32::from_be_bytes([data[33], data[34], data[35], data[36]]);

        let attested_credential = if flags & FLAG_AT != 0 {
            Some(parse_attested_credential(&data[37..])?)
        } else {
            None
        };

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential,
        })
    }

    pub fn user_present(&self) -> bool {
        self.flags & FLAG_UP != 0
    }

    pub fn user_verified(&self) -> bool {
        self.flags & FLAG_UV != 0
    }
}

fn parse_attested_credential(data: &[u8]) -> Result<AttestedCredential, VerifyError> {
    if data.len() < 18 {
        return Err(VerifyError::Malformed("attested credential data"));
    }
    let aaguid: [u8; 16] = data[0..16].try_into().unwrap();
    let cred_id_len = u16::from_be_bytes([data[16], data[17]]) as usize;
    if data.len() < 18 + cred_id_len {
        return Err(VerifyError::Malformed("attested credential data"));
    }
    let credential_id = data[18..18 + cred_id_len].to_vec();

    // The COSE key is one CBOR item; decode it through an advancing slice so
    // its exact byte length is known even when extension data follows.
    let key_start = 18 + cred_id_len;
    let mut rest = &data[key_start..];
    let key: Value = ciborium::from_reader(&mut rest)
        .map_err(|_| VerifyError::Malformed("cose public key"))?;
    if !matches!(key, Value::Map(_)) {
        return Err(VerifyError::Malformed("cose public key"));
    }
    let key_len = data.len() - key_start - rest.len();
    let public_key = data[key_start..key_start + key_len].to_vec();

    Ok(AttestedCredential {
        aaguid,
        credential_id,
        public_key,
    })
}
