pub mod login;
pub mod otp;
pub mod rate_limit;
pub mod register;
pub mod types;
mod utils;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::account::repo::MemoryAccountStore;
    use crate::account::CredentialService;
    use crate::api::handlers::auth::rate_limit::{NoopRateLimiter, RateLimiter};
    use crate::config::AuthConfig;
    use crate::crypto::SecretHasher;
    use crate::otp::repo::MemoryOtpStore;
    use crate::otp::OtpService;
    use crate::sms::LogSmsSender;
    use crate::token::TokenCodec;

    pub(crate) fn config() -> AuthConfig {
        AuthConfig::new(false).with_echo_plaintext_otp(true)
    }

    pub(crate) fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", &config())
    }

    pub(crate) fn otp_service() -> Arc<OtpService> {
        Arc::new(OtpService::new(
            Arc::new(MemoryOtpStore::new()),
            SecretHasher::new(1).expect("hasher"),
            codec(),
            Arc::new(LogSmsSender),
            config(),
        ))
    }

    pub(crate) fn credential_service() -> Arc<CredentialService> {
        Arc::new(CredentialService::new(
            Arc::new(MemoryAccountStore::new()),
            SecretHasher::new(1).expect("hasher"),
            codec(),
        ))
    }

    pub(crate) fn limiter() -> Arc<dyn RateLimiter> {
        Arc::new(NoopRateLimiter)
    }
}
