//! OTP engine: issuance and verification.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::crypto::SecretHasher;
use crate::error::AuthError;
use crate::otp::models::{OtpPurpose, OtpRecord, OtpStatus};
use crate::otp::repo::OtpStore;
use crate::sms::SmsSender;
use crate::token::TokenCodec;

/// Outcome of a successful issuance. `plaintext_otp` is populated only when
/// the config enables the local-dev echo.
#[derive(Debug)]
pub struct IssuedOtp {
    pub otp_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub retry_after_seconds: u32,
    pub plaintext_otp: Option<String>,
}

/// Outcome of a successful verification.
#[derive(Debug)]
pub struct VerifiedOtp {
    pub verification_token: String,
    pub token_expires_at: DateTime<Utc>,
}

/// Uniformly random 6-digit code; leading zeros allowed.
fn generate_code() -> String {
    let code: u32 = rand::rngs::OsRng.gen_range(0..1_000_000);
    format!("{code:06}")
}

pub struct OtpService {
    store: Arc<dyn OtpStore>,
    hasher: SecretHasher,
    tokens: TokenCodec,
    sms: Arc<dyn SmsSender>,
    config: AuthConfig,
}

impl OtpService {
    #[must_use]
    pub fn new(
        store: Arc<dyn OtpStore>,
        hasher: SecretHasher,
        tokens: TokenCodec,
        sms: Arc<dyn SmsSender>,
        config: AuthConfig,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            sms,
            config,
        }
    }

    /// Issue a new OTP for `(phone, purpose)`.
    ///
    /// # Errors
    /// `BadRequest` for an empty phone, `RateLimited` while the per-phone
    /// cooldown from the previous issuance has not elapsed.
    pub async fn issue(&self, phone: &str, purpose: OtpPurpose) -> Result<IssuedOtp, AuthError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(AuthError::BadRequest("Phone number is required".to_string()));
        }

        let now = Utc::now();
        if let Some(last) = self.store.latest_for_phone(phone, purpose).await? {
            let elapsed = now.signed_duration_since(last.created_at).num_seconds();
            let cooldown = i64::from(self.config.otp_cooldown_seconds());
            if elapsed < cooldown {
                return Err(AuthError::RateLimited {
                    retry_after_seconds: (cooldown - elapsed).unsigned_abs(),
                });
            }
        }

        let code = generate_code();
        let record = OtpRecord {
            id: Uuid::new_v4(),
            phone: phone.to_string(),
            purpose,
            secret_hash: self.hasher.hash(&code)?,
            status: OtpStatus::Pending,
            attempts: 0,
            created_at: now,
            expires_at: now + Duration::seconds(self.config.otp_ttl_seconds()),
        };
        self.store.insert(&record).await?;

        // Best-effort dispatch: a failed send is logged, never surfaced.
        let message = format!(
            "Your verification code is {code}. It expires in {} minutes.",
            self.config.otp_ttl_seconds() / 60
        );
        if let Err(err) = self.sms.send(phone, &message).await {
            error!("Failed to dispatch OTP to {phone}: {err:#}");
        }

        Ok(IssuedOtp {
            otp_id: record.id,
            expires_at: record.expires_at,
            retry_after_seconds: self.config.otp_cooldown_seconds(),
            plaintext_otp: self.config.echo_plaintext_otp().then_some(code),
        })
    }

    /// Verify a code against a pending OTP record and mint a verification
    /// token on success.
    ///
    /// Each call performs at most one state mutation: the expiry transition,
    /// the attempts increment, or the verified transition. Rejections for an
    /// unknown id, a consumed record, or an exhausted attempt budget mutate
    /// nothing.
    ///
    /// # Errors
    /// `NotFound`, `Gone`, `Expired`, `TooManyAttempts`, or `InvalidCode`
    /// per the record's state; internal faults surface opaquely.
    pub async fn verify(
        &self,
        phone: &str,
        code: &str,
        otp_id: Uuid,
    ) -> Result<VerifiedOtp, AuthError> {
        let mut record = self
            .store
            .find_by_id(otp_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        if record.phone != phone {
            return Err(AuthError::NotFound);
        }

        if record.status != OtpStatus::Pending {
            return Err(AuthError::Gone);
        }

        if record.is_expired(Utc::now()) {
            record.status = OtpStatus::Expired;
            self.store.update(&record).await?;
            return Err(AuthError::Expired);
        }

        if record.attempts >= i32::try_from(self.config.max_verify_attempts()).unwrap_or(i32::MAX)
        {
            return Err(AuthError::TooManyAttempts);
        }

        if !self.hasher.compare(code, &record.secret_hash) {
            record.attempts += 1;
            self.store.update(&record).await?;
            return Err(AuthError::InvalidCode);
        }

        record.status = OtpStatus::Verified;
        self.store.update(&record).await?;

        let (verification_token, token_expires_at) =
            self.tokens.mint_verification(phone, otp_id)?;
        Ok(VerifiedOtp {
            verification_token,
            token_expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::repo::MemoryOtpStore;
    use crate::sms::LogSmsSender;

    fn fixture(config: AuthConfig) -> (OtpService, Arc<MemoryOtpStore>, TokenCodec) {
        let store = Arc::new(MemoryOtpStore::new());
        let codec = TokenCodec::new("test-secret", &config);
        let hasher = SecretHasher::new(1).expect("hasher");
        let service = OtpService::new(
            store.clone(),
            hasher,
            codec.clone(),
            Arc::new(LogSmsSender),
            config,
        );
        (service, store, codec)
    }

    fn dev_config() -> AuthConfig {
        AuthConfig::new(false).with_echo_plaintext_otp(true)
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..64 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn issue_persists_pending_record_with_ttl() {
        let (service, store, _) = fixture(dev_config());
        let issued = service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("issue");

        assert_eq!(issued.retry_after_seconds, 60);
        assert!(issued.plaintext_otp.is_some());

        let record = store
            .find_by_id(issued.otp_id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(record.status, OtpStatus::Pending);
        assert_eq!(record.attempts, 0);
        let validity = record
            .expires_at
            .signed_duration_since(record.created_at)
            .num_seconds();
        assert_eq!(validity, 300);
    }

    #[tokio::test]
    async fn issue_rejects_empty_phone() {
        let (service, _, _) = fixture(dev_config());
        let err = service
            .issue("  ", OtpPurpose::Signup)
            .await
            .expect_err("empty phone");
        assert!(matches!(err, AuthError::BadRequest(_)));
    }

    #[tokio::test]
    async fn second_issue_within_cooldown_is_rate_limited() {
        let (service, _, _) = fixture(dev_config());
        service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("first issue");

        let err = service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect_err("cooldown");
        match err {
            AuthError::RateLimited {
                retry_after_seconds,
            } => {
                assert!(retry_after_seconds > 0);
                assert!(retry_after_seconds <= 60);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cooldown_is_scoped_to_phone_and_purpose() {
        let (service, _, _) = fixture(dev_config());
        service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("first issue");

        // Different purpose and different phone both bypass the cooldown.
        service
            .issue("+911234567890", OtpPurpose::Login)
            .await
            .expect("other purpose");
        service
            .issue("+919999999999", OtpPurpose::Signup)
            .await
            .expect("other phone");
    }

    #[tokio::test]
    async fn zero_cooldown_permits_back_to_back_issues() {
        let (service, _, _) = fixture(dev_config().with_otp_cooldown_seconds(0));
        service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("first");
        service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("second");
    }

    #[tokio::test]
    async fn plaintext_is_withheld_without_dev_echo() {
        let (service, _, _) = fixture(AuthConfig::new(false));
        let issued = service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("issue");
        assert!(issued.plaintext_otp.is_none());
    }

    #[tokio::test]
    async fn correct_code_verifies_once_then_gone() {
        let (service, store, codec) = fixture(dev_config());
        let issued = service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("issue");
        let code = issued.plaintext_otp.expect("dev echo");

        let verified = service
            .verify("+911234567890", &code, issued.otp_id)
            .await
            .expect("verify");

        let claims = codec
            .verify_verification(&verified.verification_token)
            .expect("claims");
        assert_eq!(claims.phone, "+911234567890");
        assert_eq!(claims.otp_id, issued.otp_id);

        let record = store
            .find_by_id(issued.otp_id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(record.status, OtpStatus::Verified);

        // Single use: any further verify is rejected without mutation.
        let err = service
            .verify("+911234567890", &code, issued.otp_id)
            .await
            .expect_err("consumed");
        assert!(matches!(err, AuthError::Gone));
    }

    #[tokio::test]
    async fn unknown_id_and_phone_mismatch_are_not_found() {
        let (service, _, _) = fixture(dev_config());
        let issued = service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("issue");

        let err = service
            .verify("+911234567890", "000000", Uuid::new_v4())
            .await
            .expect_err("unknown id");
        assert!(matches!(err, AuthError::NotFound));

        let err = service
            .verify("+919999999999", "000000", issued.otp_id)
            .await
            .expect_err("phone mismatch");
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn wrong_codes_count_attempts_then_lock_out() {
        let (service, store, _) = fixture(dev_config());
        let issued = service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("issue");
        let code = issued.plaintext_otp.expect("dev echo");
        let wrong = if code == "000000" { "000001" } else { "000000" };

        for attempt in 1..=5 {
            let err = service
                .verify("+911234567890", wrong, issued.otp_id)
                .await
                .expect_err("wrong code");
            assert!(matches!(err, AuthError::InvalidCode));
            let record = store
                .find_by_id(issued.otp_id)
                .await
                .expect("find")
                .expect("present");
            assert_eq!(record.attempts, attempt);
        }

        // Budget exhausted: even the correct code is rejected, unmutated.
        let err = service
            .verify("+911234567890", &code, issued.otp_id)
            .await
            .expect_err("locked out");
        assert!(matches!(err, AuthError::TooManyAttempts));
        let record = store
            .find_by_id(issued.otp_id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(record.attempts, 5);
        assert_eq!(record.status, OtpStatus::Pending);
    }

    #[tokio::test]
    async fn expired_record_flips_status_idempotently() {
        let (service, store, _) = fixture(dev_config().with_otp_ttl_seconds(-1));
        let issued = service
            .issue("+911234567890", OtpPurpose::Signup)
            .await
            .expect("issue");
        let code = issued.plaintext_otp.expect("dev echo");

        let err = service
            .verify("+911234567890", &code, issued.otp_id)
            .await
            .expect_err("expired");
        assert!(matches!(err, AuthError::Expired));
        let record = store
            .find_by_id(issued.otp_id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(record.status, OtpStatus::Expired);

        // Terminal: repeat verifies keep failing without further mutation.
        let err = service
            .verify("+911234567890", &code, issued.otp_id)
            .await
            .expect_err("already expired");
        assert!(matches!(err, AuthError::Gone));
        let record = store
            .find_by_id(issued.otp_id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(record.status, OtpStatus::Expired);
        assert_eq!(record.attempts, 0);
    }
}
