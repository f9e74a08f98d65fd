pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_RP_ID: &str = "localhost";

/// Relying-party identity. Loaded once at startup and passed by reference
/// into every verifier call; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RpConfig {
    /// Origin the client must report in collected client data, compared exactly.
    pub expected_origin: String,
    /// Relying-party id; its SHA-256 must match the authenticator data hash.
    pub expected_rp_id: String,
    /// Reject ceremonies whose authenticator data lacks the UV flag.
    pub require_user_verification: bool,
}

impl RpConfig {
    pub fn new(expected_origin: impl Into<String>, expected_rp_id: impl Into<String>) -> Self {
        Self {
            expected_origin: expected_origin.into(),
            expected_rp_id: expected_rp_id.into(),
            require_user_verification: true,
        }
    }

    /// Read `RP_ORIGIN` and `RP_ID` from the environment, falling back to the
    /// localhost development values. `RP_REQUIRE_USER_VERIFICATION=false`
    /// downgrades the UV requirement.
    pub fn from_env() -> Self {
        let expected_origin =
            std::env::var("RP_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
        let expected_rp_id = std::env::var("RP_ID").unwrap_or_else(|_| DEFAULT_RP_ID.to_string());
        let require_user_verification = std::env::var("RP_REQUIRE_USER_VERIFICATION")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        Self {
            expected_origin,
            expected_rp_id,
            require_user_verification,
        }
    }

    #[must_use]
    pub fn with_user_verification(mut self, required: bool) -> Self {
        self.require_user_verification = required;
        self
    }
}
