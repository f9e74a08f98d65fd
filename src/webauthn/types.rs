use base64::prelude::*;
use ciborium::value::Value;
use serde::Deserialize;

use super::VerifyError;

/// Registration-ceremony payload in the wire shape the browser produces
/// (`navigator.credentials.create()` serialized to JSON). All binary fields
/// arrive as unpadded base64url text.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationResponse {
    pub id: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub response: AttestationPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttestationPayload {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "attestationObject")]
    pub attestation_object: String,
}

/// Authentication-ceremony payload (`navigator.credentials.get()`).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationResponse {
    pub id: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub response: AssertionPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssertionPayload {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,
    pub signature: String,
    #[serde(rename = "userHandle", default)]
    pub user_handle: Option<String>,
}

pub(crate) fn b64url_decode(what: &'static str, value: &str) -> Result<Vec<u8>, VerifyError> {
    BASE64_URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|_| VerifyError::Malformed(what))
}

// CBOR accessor helpers shared by the attestation and COSE parsers.

pub(crate) fn parse_cbor_map(
    data: &[u8],
    what: &'static str,
) -> Result<Vec<(Value, Value)>, VerifyError> {
    let value: Value = ciborium::from_reader(data).map_err(|_| VerifyError::Malformed(what))?;
    match value {
        Value::Map(map) => Ok(map),
        _ => Err(VerifyError::Malformed(what)),
    }
}

pub(crate) fn cbor_get<'a>(map: &'a [(Value, Value)], key: i64) -> Option<&'a Value> {
    let target = Value::Integer(key.into());
    map.iter().find(|(k, _)| k == &target).map(|(_, v)| v)
}

pub(crate) fn cbor_get_str<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Text(s) if s == key))
        .map(|(_, v)| v)
}

pub(crate) fn cbor_bytes(v: &Value) -> Option<&[u8]> {
    match v {
        Value::Bytes(b) => Some(b),
        _ => None,
    }
}

pub(crate) fn cbor_text(v: &Value) -> Option<&str> {
    match v {
        Value::Text(s) => Some(s),
        _ => None,
    }
}

pub(crate) fn cbor_map(v: &Value) -> Option<&[(Value, Value)]> {
    match v {
        Value::Map(m) => Some(m),
        _ => None,
    }
}

pub(crate) fn cbor_int(v: &Value) -> Option<i64> {
    match v {
        Value::Integer(i) => i128::from(*i).try_into().ok(),
        _ => None,
    }
}
