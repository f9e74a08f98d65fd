pub mod memory;
pub mod record;

pub use memory::MemoryStore;
pub use record::{CredentialRecord, NewCredential, NewUser, User};

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate external id")]
    DuplicateExternalId,
    #[error("not found")]
    NotFound,
    #[error("stale sign count")]
    StaleCounter,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read/write contract the ceremony orchestrator holds against the
/// persistence engine. Every call carries a caller-supplied timeout; an
/// implementation backed by real I/O applies it to that I/O and reports an
/// overrun as `Unavailable`.
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by its external id, together with the owning user.
    fn find_by_external_id(
        &self,
        external_id: &str,
        timeout: Duration,
    ) -> Result<Option<(CredentialRecord, User)>, StoreError>;

    /// Create a user and their first credential as one atomic unit. Neither a
    /// user without its credential nor a credential without its owner is ever
    /// observable.
    fn create_user_with_credential(
        &self,
        user: NewUser,
        credential: NewCredential,
        timeout: Duration,
    ) -> Result<User, StoreError>;

    /// Persist a new signature counter. The write re-checks monotonicity
    /// under the store's own serialization: of two racing logins that both
    /// verified against the same stored value, the loser gets `StaleCounter`
    /// and the record is left unchanged.
    fn update_sign_count(
        &self,
        credential_id: i64,
        new_count: u32,
        timeout: Duration,
    ) -> Result<(), StoreError>;
}
