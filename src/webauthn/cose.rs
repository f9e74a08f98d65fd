use aws_lc_rs::signature::{
    RsaPublicKeyComponents, UnparsedPublicKey, ECDSA_P256_SHA256_ASN1, ED25519,
    RSA_PKCS1_2048_8192_SHA256,
};

use super::types::{cbor_bytes, cbor_get, cbor_int, parse_cbor_map};
use super::VerifyError;

pub(crate) const ALG_ES256: i64 = -7;
pub(crate) const ALG_EDDSA: i64 = -8;
pub(crate) const ALG_RS256: i64 = -257;

const KTY_OKP: i64 = 1;
const KTY_EC2: i64 = 2;
const KTY_RSA: i64 = 3;

/// Read the algorithm identifier (label 3) out of a COSE_Key.
pub(crate) fn key_algorithm(cose_key: &[u8]) -> Result<i64, VerifyError> {
    let map = parse_cbor_map(cose_key, "cose key")?;
    cbor_get(&map, 3)
        .and_then(cbor_int)
        .ok_or(VerifyError::Malformed("cose key"))
}

/// Verify `signature` over `message` with a COSE-encoded public key.
///
/// Supported algorithms: ES256 (-7, ASN.1 signature over P-256), EdDSA (-8,
/// Ed25519), RS256 (-257, PKCS#1 v1.5). Anything else is rejected as
/// unsupported, never skipped.
pub(crate) fn verify_signature(
    cose_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), VerifyError> {
    let map = parse_cbor_map(cose_key, "cose key")?;
    let kty = cbor_get(&map, 1)
        .and_then(cbor_int)
        .ok_or(VerifyError::Malformed("cose key"))?;
    let alg = cbor_get(&map, 3)
        .and_then(cbor_int)
        .ok_or(VerifyError::Malformed("cose key"))?;

    match alg {
        ALG_ES256 => {
            if kty != KTY_EC2 {
                return Err(VerifyError::Malformed("cose key"));
            }
            let x = cbor_get(&map, -2)
                .and_then(cbor_bytes)
                .ok_or(VerifyError::Malformed("cose key"))?;
            let y = cbor_get(&map, -3)
                .and_then(cbor_bytes)
                .ok_or(VerifyError::Malformed("cose key"))?;

            // Uncompressed SEC1 point: 0x04 ‖ x ‖ y.
            let mut point = Vec::with_capacity(1 + x.len() + y.len());
            point.push(0x04);
            point.extend_from_slice(x);
            point.extend_from_slice(y);

            UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &point)
                .verify(message, signature)
                .map_err(|_| VerifyError::SignatureInvalid)
        }
        ALG_EDDSA => {
            if kty != KTY_OKP {
                return Err(VerifyError::Malformed("cose key"));
            }
            let x = cbor_get(&map, -2)
                .and_then(cbor_bytes)
                .ok_or(VerifyError::Malformed("cose key"))?;
            if x.len() != 32 {
                return Err(VerifyError::Malformed("cose key"));
            }
            UnparsedPublicKey::new(&ED25519, x)
                .verify(message, signature)
                .map_err(|_| VerifyError::SignatureInvalid)
        }
        ALG_RS256 => {
            if kty != KTY_RSA {
                return Err(VerifyError::Malformed("cose key"));
            }
            let n = cbor_get(&map, -1)
                .and_then(cbor_bytes)
                .ok_or(VerifyError::Malformed("cose key"))?;
            let e = cbor_get(&map, -2)
                .and_then(cbor_bytes)
                .ok_or(VerifyError::Malformed("cose key"))?;
            RsaPublicKeyComponents { n, e }
                .verify(&RSA_PKCS1_2048_8192_SHA256, message, signature)
                .map_err(|_| VerifyError::SignatureInvalid)
        }
        other => Err(VerifyError::UnsupportedAlgorithm(other)),
    }
}
