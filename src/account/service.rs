//! Credential engine: registration and login.

use std::sync::Arc;

use crate::account::models::{EmergencyContact, NewAccount, PublicAccount};
use crate::account::repo::{AccountStore, CreateOutcome};
use crate::crypto::SecretHasher;
use crate::error::AuthError;
use crate::token::{SessionTokenPair, TokenCodec};

/// Registration input, already shape-validated by the transport layer.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub verification_token: String,
    pub emergency_contacts: Vec<EmergencyContact>,
}

pub struct CredentialService {
    store: Arc<dyn AccountStore>,
    hasher: SecretHasher,
    tokens: TokenCodec,
}

impl CredentialService {
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, hasher: SecretHasher, tokens: TokenCodec) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Register an account for an OTP-verified phone number.
    ///
    /// The verification token must be valid and bound to the exact phone
    /// being registered; a mismatch would let a verified token vouch for a
    /// different number.
    ///
    /// # Errors
    /// `Unauthorized` on a bad or expired token, `BadRequest` on a
    /// phone/claim mismatch, `Conflict` when an account already holds the
    /// email (case-insensitive) or phone.
    pub async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<(PublicAccount, SessionTokenPair), AuthError> {
        let claims = self
            .tokens
            .verify_verification(&registration.verification_token)?;
        if claims.phone != registration.phone {
            return Err(AuthError::BadRequest(
                "Phone number does not match the verified phone number".to_string(),
            ));
        }

        let email = registration.email.trim().to_lowercase();
        if self
            .store
            .find_by_email_or_phone(&email, &registration.phone)
            .await?
            .is_some()
        {
            return Err(AuthError::Conflict);
        }

        let password_hash = self.hasher.hash(&registration.password)?;
        let outcome = self
            .store
            .create(NewAccount {
                name: registration.name.trim().to_string(),
                email,
                phone: registration.phone,
                phone_verified: true,
                password_hash,
                emergency_contacts: registration.emergency_contacts,
            })
            .await?;

        // The pre-check races concurrent registrations; the store's unique
        // indexes are the authority.
        let account = match outcome {
            CreateOutcome::Created(account) => account,
            CreateOutcome::Conflict => return Err(AuthError::Conflict),
        };

        let tokens = self.tokens.mint_session_pair(account.id)?;
        Ok((account.sanitized(), tokens))
    }

    /// Email/password login.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown email and for a wrong password,
    /// with no distinguishing signal between the two.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(PublicAccount, SessionTokenPair), AuthError> {
        let email = email.trim().to_lowercase();
        let account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.compare(password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.tokens.mint_session_pair(account.id)?;
        Ok((account.sanitized(), tokens))
    }
}
