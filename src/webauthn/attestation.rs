use ciborium::value::Value;

use super::authenticator_data::AuthenticatorData;
use super::cose;
use super::types::{cbor_bytes, cbor_get_str, cbor_int, cbor_map, cbor_text, parse_cbor_map};
use super::VerifyError;

/// Parsed attestation object: `{fmt: text, attStmt: map, authData: bytes}`.
/// The raw authenticator data bytes are kept because the attestation
/// signature covers them verbatim.
#[derive(Debug)]
pub(crate) struct AttestationObject {
    pub fmt: String,
    pub auth_data_raw: Vec<u8>,
    pub auth_data: AuthenticatorData,
    pub att_stmt: Vec<(Value, Value)>,
}

impl AttestationObject {
    pub fn parse(data: &[u8]) -> Result<Self, VerifyError> {
        let map = parse_cbor_map(data, "attestation object")?;

        let fmt = cbor_get_str(&map, "fmt")
            .and_then(cbor_text)
            .ok_or(VerifyError::Malformed("attestation object"))?
            .to_string();
        let auth_data_raw = cbor_get_str(&map, "authData")
            .and_then(cbor_bytes)
            .ok_or(VerifyError::Malformed("attestation object"))?
            .to_vec();
        let att_stmt = cbor_get_str(&map, "attStmt")
            .and_then(cbor_map)
            .ok_or(VerifyError::Malformed("attestation object"))?
            .to_vec();

        let auth_data = AuthenticatorData::parse(&auth_data_raw)?;

        Ok(Self {
            fmt,
            auth_data_raw,
            auth_data,
            att_stmt,
        })
    }

    /// Apply the attestation-format policy: `none` passes with an empty
    /// statement, `packed` self-attestation is verified with the attested
    /// credential's own key, and every other format is recognized and then
    /// rejected rather than silently accepted.
    pub fn verify_statement(
        &self,
        client_data_hash: &[u8; 32],
        public_key: &[u8],
    ) -> Result<(), VerifyError> {
        match self.fmt.as_str() {
            "none" => {
                if !self.att_stmt.is_empty() {
                    return Err(VerifyError::Malformed("attestation statement"));
                }
                Ok(())
            }
            "packed" => {
                // A certificate chain means full attestation, which needs the
                // trust-path machinery this core deliberately does not carry.
                if cbor_get_str(&self.att_stmt, "x5c").is_some()
                    || cbor_get_str(&self.att_stmt, "ecdaaKeyId").is_some()
                {
                    return Err(VerifyError::UnsupportedAttestationFormat(
                        "packed (certificate chain)".into(),
                    ));
                }
                let alg = cbor_get_str(&self.att_stmt, "alg")
                    .and_then(cbor_int)
                    .ok_or(VerifyError::Malformed("attestation statement"))?;
                let sig = cbor_get_str(&self.att_stmt, "sig")
                    .and_then(cbor_bytes)
                    .ok_or(VerifyError::Malformed("attestation statement"))?;

                // Self-attestation signs with the credential key itself, so
                // the declared alg must be the key's own.
                if alg != cose::key_algorithm(public_key)? {
                    return Err(VerifyError::SignatureInvalid);
                }

                let mut message =
                    Vec::with_capacity(self.auth_data_raw.len() + client_data_hash.len());
                message.extend_from_slice(&self.auth_data_raw);
                message.extend_from_slice(client_data_hash);
                cose::verify_signature(public_key, &message, sig)
            }
            other => Err(VerifyError::UnsupportedAttestationFormat(other.to_string())),
        }
    }
}
