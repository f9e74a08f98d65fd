//! WebAuthn relying-party verification core.
//!
//! Verifies registration (attestation) and authentication (assertion)
//! ceremonies against a relying-party identity, manages single-use
//! challenges, and drives a pluggable credential store. Transport, session
//! state, and the persistence engine live outside this crate and exchange
//! plain values at its boundary.

pub mod challenge;
pub mod config;
pub mod error;
pub mod rp;
pub mod store;
pub mod webauthn;

pub use challenge::Challenge;
pub use config::RpConfig;
pub use error::{Error, Result};
pub use rp::{LoginSuccess, RegisteredUser, RelyingParty};
