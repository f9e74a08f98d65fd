use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::challenge::Challenge;
use crate::config::RpConfig;
use crate::error::{Error, Result};
use crate::store::{CredentialStore, NewCredential, NewUser, StoreError, User};
use crate::webauthn::{
    verify_authentication, verify_registration, AuthenticationResponse, RegistrationResponse,
};

pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

struct PendingChallenge {
    kind: CeremonyKind,
    issued_at: Instant,
}

/// Ceremony orchestrator: issues single-use challenges, runs the verifiers,
/// and drives the credential store. One instance serves concurrent ceremonies;
/// the only state shared between them is the pending-challenge table and the
/// store behind the trait.
pub struct RelyingParty<S> {
    config: RpConfig,
    store: S,
    pending: Mutex<HashMap<String, PendingChallenge>>,
    challenge_ttl: Option<Duration>,
    store_timeout: Duration,
}

/// Registration outcome handed to the transport layer.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub verified: bool,
    pub user: User,
    pub external_id: String,
}

/// Login outcome handed to the transport layer, which binds it into its own
/// session storage.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub verified: bool,
    pub user_id: i64,
}

impl<S: CredentialStore> RelyingParty<S> {
    pub fn new(config: RpConfig, store: S) -> Self {
        Self {
            config,
            store,
            pending: Mutex::new(HashMap::new()),
            challenge_ttl: Some(DEFAULT_CHALLENGE_TTL),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// `None` disables expiry for callers that bound ceremony lifetime through
    /// their own session handling.
    #[must_use]
    pub fn with_challenge_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn config(&self) -> &RpConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn issue_registration_challenge(&self) -> Challenge {
        self.issue(CeremonyKind::Registration)
    }

    pub fn issue_authentication_challenge(&self) -> Challenge {
        self.issue(CeremonyKind::Authentication)
    }

    fn issue(&self, kind: CeremonyKind) -> Challenge {
        let challenge = Challenge::generate();
        let mut pending = self.pending.lock().expect("challenge table poisoned");
        if let Some(ttl) = self.challenge_ttl {
            pending.retain(|_, entry| entry.issued_at.elapsed() <= ttl);
        }
        pending.insert(
            challenge.as_str().to_string(),
            PendingChallenge {
                kind,
                issued_at: Instant::now(),
            },
        );
        challenge
    }

    /// A challenge is consumed by its first verification attempt, pass or
    /// fail; a second presentation of the same value never reaches a verifier.
    fn consume_challenge(
        &self,
        challenge: &str,
        kind: CeremonyKind,
    ) -> std::result::Result<(), &'static str> {
        let mut pending = self.pending.lock().expect("challenge table poisoned");
        let Some(entry) = pending.remove(challenge) else {
            return Err("unknown or already consumed");
        };
        if entry.kind != kind {
            return Err("issued for the other ceremony");
        }
        if let Some(ttl) = self.challenge_ttl {
            if entry.issued_at.elapsed() > ttl {
                return Err("expired");
            }
        }
        Ok(())
    }

    /// Registration flow: consume the challenge, verify the attestation, then
    /// create user and credential as one atomic store operation. Nothing is
    /// persisted on any verification failure.
    pub fn register(
        &self,
        email: &str,
        username: &str,
        credential: Option<&RegistrationResponse>,
        challenge: &str,
    ) -> Result<RegisteredUser> {
        let response = credential.ok_or(Error::InvalidCredential)?;

        self.consume_challenge(challenge, CeremonyKind::Registration)
            .map_err(|reason| {
                tracing::warn!(reason, "Registration challenge rejected");
                Error::RegistrationFailed
            })?;

        let info = verify_registration(response, challenge, &self.config).map_err(|e| {
            tracing::warn!(error = %e, "Registration verification failed");
            Error::RegistrationFailed
        })?;

        let user = self
            .store
            .create_user_with_credential(
                NewUser {
                    email: email.to_string(),
                    username: username.to_string(),
                },
                NewCredential {
                    external_id: info.external_id.clone(),
                    public_key: info.public_key,
                    sign_count: info.sign_count,
                },
                self.store_timeout,
            )
            .map_err(|e| match e {
                StoreError::DuplicateExternalId => {
                    tracing::warn!(external_id = %info.external_id, "Credential already registered");
                    Error::RegistrationFailed
                }
                other => Error::Store(other),
            })?;

        tracing::info!(user_id = user.id, "Registered new user");
        Ok(RegisteredUser {
            verified: true,
            user,
            external_id: info.external_id,
        })
    }

    /// Login flow: consume the challenge, look up the credential, verify the
    /// assertion, persist the counter, and only then compare the email — a
    /// genuine device's counter update is never lost to a wrong email.
    pub fn login(
        &self,
        email: &str,
        credential: Option<&AuthenticationResponse>,
        challenge: &str,
    ) -> Result<LoginSuccess> {
        let response = credential.ok_or(Error::InvalidCredential)?;
        if response.id.is_empty() {
            return Err(Error::InvalidCredential);
        }

        self.consume_challenge(challenge, CeremonyKind::Authentication)
            .map_err(|reason| {
                tracing::warn!(reason, "Login challenge rejected");
                Error::LoginFailed
            })?;

        let Some((record, user)) = self
            .store
            .find_by_external_id(&response.id, self.store_timeout)?
        else {
            tracing::warn!(external_id = %response.id, "Login with unknown credential");
            return Err(Error::UnknownUser);
        };

        let info = verify_authentication(response, challenge, &self.config, &record).map_err(
            |e| {
                tracing::warn!(error = %e, external_id = %response.id, "Login verification failed");
                Error::LoginFailed
            },
        )?;

        match self
            .store
            .update_sign_count(record.id, info.new_counter, self.store_timeout)
        {
            Ok(()) => {}
            Err(StoreError::StaleCounter) => {
                tracing::warn!(
                    external_id = %response.id,
                    stored = record.sign_count,
                    got = info.new_counter,
                    "Counter write lost to a concurrent login"
                );
                return Err(Error::LoginFailed);
            }
            Err(other) => return Err(Error::Store(other)),
        }

        if user.email != email {
            tracing::warn!(user_id = user.id, "Login email does not match credential owner");
            return Err(Error::LoginFailed);
        }

        tracing::info!(user_id = user.id, "Logged in");
        Ok(LoginSuccess {
            verified: true,
            user_id: user.id,
        })
    }
}
