use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use base64::prelude::*;
use ciborium::value::Value;
use rand::RngCore;
use sha2::{Digest, Sha256};

use passrite::webauthn::types::{AssertionPayload, AttestationPayload};
use passrite::webauthn::{AuthenticationResponse, RegistrationResponse};

const FLAGS_UP_UV_AT: u8 = 0x45;
const FLAGS_UP_UV: u8 = 0x05;

pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A software authenticator holding one P-256 credential. Produces genuinely
/// signed ceremonies so the verifiers run against real signatures.
pub struct SoftAuthenticator {
    key: EcdsaKeyPair,
    rng: SystemRandom,
    pub credential_id: Vec<u8>,
    pub rp_id: String,
    pub origin: String,
}

impl SoftAuthenticator {
    pub fn new(rp_id: &str, origin: &str) -> Self {
        init_tracing();
        let key = EcdsaKeyPair::generate(&ECDSA_P256_SHA256_ASN1_SIGNING).unwrap();
        let mut credential_id = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut credential_id);
        Self {
            key,
            rng: SystemRandom::new(),
            credential_id,
            rp_id: rp_id.to_string(),
            origin: origin.to_string(),
        }
    }

    pub fn external_id(&self) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(&self.credential_id)
    }

    pub fn cose_key(&self) -> Vec<u8> {
        let point = self.key.public_key().as_ref();
        let map = Value::Map(vec![
            (Value::Integer(1i64.into()), Value::Integer(2i64.into())),
            (Value::Integer(3i64.into()), Value::Integer((-7i64).into())),
            (Value::Integer((-1i64).into()), Value::Integer(1i64.into())),
            (Value::Integer((-2i64).into()), Value::Bytes(point[1..33].to_vec())),
            (Value::Integer((-3i64).into()), Value::Bytes(point[33..65].to_vec())),
        ]);
        encode_cbor(&map)
    }

    fn client_data(&self, ceremony_type: &str, challenge: &str) -> Vec<u8> {
        serde_json::json!({
            "type": ceremony_type,
            "challenge": challenge,
            "origin": self.origin,
            "crossOrigin": false,
        })
        .to_string()
        .into_bytes()
    }

    fn registration_auth_data(&self, flags: u8) -> Vec<u8> {
        let rp_id_hash: [u8; 32] = Sha256::digest(self.rp_id.as_bytes()).into();
        let mut data = Vec::new();
        data.extend_from_slice(&rp_id_hash);
        data.push(flags);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&[0u8; 16]); // aaguid
        data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(&self.credential_id);
        data.extend_from_slice(&self.cose_key());
        data
    }

    /// Packed self-attestation with UP, UV, and AT set.
    pub fn attestation(&self, challenge: &str) -> RegistrationResponse {
        self.attestation_with("packed", challenge, FLAGS_UP_UV_AT)
    }

    pub fn attestation_with(&self, fmt: &str, challenge: &str, flags: u8) -> RegistrationResponse {
        let client_data = self.client_data("webauthn.create", challenge);
        let auth_data = self.registration_auth_data(flags);

        let att_stmt = if fmt == "packed" {
            let client_data_hash: [u8; 32] = Sha256::digest(&client_data).into();
            let mut message = auth_data.clone();
            message.extend_from_slice(&client_data_hash);
            let sig = self.key.sign(&self.rng, &message).unwrap();
            vec![
                (Value::Text("alg".into()), Value::Integer((-7i64).into())),
                (Value::Text("sig".into()), Value::Bytes(sig.as_ref().to_vec())),
            ]
        } else {
            vec![]
        };

        let attestation_object = encode_cbor(&Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text(fmt.into())),
            (Value::Text("attStmt".into()), Value::Map(att_stmt)),
            (Value::Text("authData".into()), Value::Bytes(auth_data)),
        ]));

        RegistrationResponse {
            id: self.external_id(),
            raw_id: self.external_id(),
            ty: "public-key".into(),
            response: AttestationPayload {
                client_data_json: BASE64_URL_SAFE_NO_PAD.encode(&client_data),
                attestation_object: BASE64_URL_SAFE_NO_PAD.encode(&attestation_object),
            },
        }
    }

    /// Signed assertion with UP and UV set, reporting `sign_count`.
    pub fn assertion(&self, challenge: &str, sign_count: u32) -> AuthenticationResponse {
        self.assertion_with(challenge, FLAGS_UP_UV, sign_count)
    }

    pub fn assertion_with(
        &self,
        challenge: &str,
        flags: u8,
        sign_count: u32,
    ) -> AuthenticationResponse {
        let client_data = self.client_data("webauthn.get", challenge);

        let rp_id_hash: [u8; 32] = Sha256::digest(self.rp_id.as_bytes()).into();
        let mut auth_data = Vec::new();
        auth_data.extend_from_slice(&rp_id_hash);
        auth_data.push(flags);
        auth_data.extend_from_slice(&sign_count.to_be_bytes());

        let client_data_hash: [u8; 32] = Sha256::digest(&client_data).into();
        let mut message = auth_data.clone();
        message.extend_from_slice(&client_data_hash);
        let sig = self.key.sign(&self.rng, &message).unwrap();

        AuthenticationResponse {
            id: self.external_id(),
            raw_id: self.external_id(),
            ty: "public-key".into(),
            response: AssertionPayload {
                client_data_json: BASE64_URL_SAFE_NO_PAD.encode(&client_data),
                authenticator_data: BASE64_URL_SAFE_NO_PAD.encode(&auth_data),
                signature: BASE64_URL_SAFE_NO_PAD.encode(sig.as_ref()),
                user_handle: None,
            },
        }
    }
}

fn encode_cbor(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).unwrap();
    buf
}
