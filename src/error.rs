/// Caller-facing ceremony outcomes. Verifier-level failure kinds are logged
/// internally and collapse to `RegistrationFailed` / `LoginFailed` so a caller
/// cannot probe which check rejected a ceremony. Store infrastructure failures
/// stay distinct; those are retryable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid credential")]
    InvalidCredential,
    #[error("unknown user")]
    UnknownUser,
    #[error("registration verification failed")]
    RegistrationFailed,
    #[error("login verification failed")]
    LoginFailed,
    #[error("store: {0}")]
    Store(#[from] crate::store::StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
