//! Request and response shapes for the auth endpoints.
//!
//! The wire format is camelCase, matching the mobile clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::account::models::{EmergencyContact, PublicAccount};
use crate::otp::models::OtpPurpose;
use crate::token::SessionTokenPair;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub phone: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub otp_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub retry_after_seconds: u32,
    /// Echoed only outside production with no SMS provider configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaintext_otp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub otp: String,
    pub otp_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub verified: bool,
    pub verification_token: String,
    pub token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub verification_token: String,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub account: PublicAccount,
    pub tokens: SessionTokenPair,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_parse_camel_case() {
        let request: SendOtpRequest = serde_json::from_str(
            r#"{"phone": "+911234567890", "purpose": "signup"}"#,
        )
        .expect("parse");
        assert_eq!(request.phone, "+911234567890");
        assert_eq!(request.purpose, OtpPurpose::Signup);

        let request: VerifyOtpRequest = serde_json::from_str(
            r#"{"phone": "+911234567890", "otp": "123456",
                "otpId": "00000000-0000-0000-0000-000000000000"}"#,
        )
        .expect("parse");
        assert_eq!(request.otp, "123456");
    }

    #[test]
    fn register_contacts_default_to_empty() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"name": "Asha", "email": "asha@example.com",
                "phone": "+911234567890", "password": "longenough",
                "verificationToken": "token"}"#,
        )
        .expect("parse");
        assert!(request.emergency_contacts.is_empty());
    }

    #[test]
    fn plaintext_otp_is_omitted_when_absent() {
        let response = SendOtpResponse {
            otp_id: Uuid::new_v4(),
            expires_at: Utc::now(),
            retry_after_seconds: 60,
            plaintext_otp: None,
        };
        let json = serde_json::to_string(&response).expect("serialize");
        assert!(!json.contains("plaintextOtp"));
        assert!(json.contains("retryAfterSeconds"));
    }
}
