//! Engine configuration: cooldowns, validity windows, and work factors.
//!
//! Everything time- or cost-based is carried in one explicit struct handed to
//! each engine's constructor, never read from process globals, so tests can
//! inject their own constants.

const DEFAULT_OTP_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_OTP_COOLDOWN_SECONDS: u32 = 60;
const DEFAULT_MAX_VERIFY_ATTEMPTS: u32 = 5;
const DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_HASH_TIME_COST: u32 = 2;
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;
const DEFAULT_SWEEP_GRACE_SECONDS: u64 = 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    production: bool,
    otp_ttl_seconds: i64,
    otp_cooldown_seconds: u32,
    max_verify_attempts: u32,
    verification_token_ttl_seconds: i64,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    hash_time_cost: u32,
    sweep_interval_seconds: u64,
    sweep_grace_seconds: u64,
    echo_plaintext_otp: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(production: bool) -> Self {
        Self {
            production,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            otp_cooldown_seconds: DEFAULT_OTP_COOLDOWN_SECONDS,
            max_verify_attempts: DEFAULT_MAX_VERIFY_ATTEMPTS,
            verification_token_ttl_seconds: DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            hash_time_cost: DEFAULT_HASH_TIME_COST,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
            sweep_grace_seconds: DEFAULT_SWEEP_GRACE_SECONDS,
            echo_plaintext_otp: false,
        }
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: i64) -> Self {
        self.otp_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_otp_cooldown_seconds(mut self, seconds: u32) -> Self {
        self.otp_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_verify_attempts(mut self, attempts: u32) -> Self {
        self.max_verify_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_verification_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verification_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_hash_time_cost(mut self, cost: u32) -> Self {
        self.hash_time_cost = cost;
        self
    }

    #[must_use]
    pub fn with_sweep_interval_seconds(mut self, seconds: u64) -> Self {
        self.sweep_interval_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_sweep_grace_seconds(mut self, seconds: u64) -> Self {
        self.sweep_grace_seconds = seconds;
        self
    }

    /// Echo the plaintext code in issuance responses. Only valid outside
    /// production with no SMS provider configured.
    #[must_use]
    pub fn with_echo_plaintext_otp(mut self, echo: bool) -> Self {
        self.echo_plaintext_otp = echo && !self.production;
        self
    }

    #[must_use]
    pub fn production(&self) -> bool {
        self.production
    }

    #[must_use]
    pub fn otp_ttl_seconds(&self) -> i64 {
        self.otp_ttl_seconds
    }

    #[must_use]
    pub fn otp_cooldown_seconds(&self) -> u32 {
        self.otp_cooldown_seconds
    }

    #[must_use]
    pub fn max_verify_attempts(&self) -> u32 {
        self.max_verify_attempts
    }

    #[must_use]
    pub fn verification_token_ttl_seconds(&self) -> i64 {
        self.verification_token_ttl_seconds
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    #[must_use]
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    #[must_use]
    pub fn hash_time_cost(&self) -> u32 {
        self.hash_time_cost
    }

    #[must_use]
    pub fn sweep_interval_seconds(&self) -> u64 {
        self.sweep_interval_seconds
    }

    #[must_use]
    pub fn sweep_grace_seconds(&self) -> u64 {
        self.sweep_grace_seconds
    }

    #[must_use]
    pub fn echo_plaintext_otp(&self) -> bool {
        self.echo_plaintext_otp
    }
}
