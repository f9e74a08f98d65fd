use serde::{Deserialize, Serialize};

/// One enrolled authenticator. `public_key` holds the raw COSE bytes produced
/// at registration; it is immutable after creation. `sign_count` only ever
/// grows once a nonzero value has been observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: i64,
    pub user_id: i64,
    /// Unpadded base64url of the credential id; globally unique, the login
    /// lookup key.
    pub external_id: String,
    pub public_key: Vec<u8>,
    pub sign_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
}

/// Input for the atomic user+credential creation at the end of registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct NewCredential {
    pub external_id: String,
    pub public_key: Vec<u8>,
    pub sign_count: u32,
}
