mod attestation;
mod authenticator_data;
mod client_data;
mod cose;

pub mod authentication;
pub mod registration;
pub mod types;

pub use authentication::{verify_authentication, AuthenticationInfo};
pub use authenticator_data::{AttestedCredential, AuthenticatorData};
pub use registration::{verify_registration, RegistrationInfo};
pub use types::{AuthenticationResponse, RegistrationResponse};

/// Internal failure taxonomy for ceremony verification. These kinds are logged
/// by the orchestrator and never shown to callers; see `crate::error::Error`.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("ceremony type mismatch")]
    CeremonyTypeMismatch,
    #[error("challenge mismatch")]
    ChallengeMismatch,
    #[error("origin mismatch")]
    OriginMismatch,
    #[error("rp id hash mismatch")]
    RpIdMismatch,
    #[error("user presence flag not set")]
    UserPresenceRequired,
    #[error("user verification flag not set")]
    UserVerificationRequired,
    #[error("unsupported attestation format: {0}")]
    UnsupportedAttestationFormat(String),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(i64),
    #[error("signature invalid")]
    SignatureInvalid,
    #[error("counter regression: stored {stored}, got {got}")]
    CounterRegression { stored: u32, got: u32 },
    #[error("malformed {0}")]
    Malformed(&'static str),
}
