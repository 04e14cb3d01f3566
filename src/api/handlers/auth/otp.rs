//! OTP issuance and verification endpoints.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::rate_limit::{RateLimitAction, RateLimitDecision, RateLimiter};
use super::types::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
use super::utils::{extract_client_ip, valid_otp_code, valid_phone};
use crate::otp::OtpService;

#[utoipa::path(
    post,
    path = "/v1/auth/send-otp",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "OTP issued", body = SendOtpResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 429, description = "Cooldown or rate limit hit", body = crate::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn send_otp(
    headers: HeaderMap,
    otp: Extension<Arc<OtpService>>,
    limiter: Extension<Arc<dyn RateLimiter>>,
    payload: Option<Json<SendOtpRequest>>,
) -> impl IntoResponse {
    let request: SendOtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let phone = request.phone.trim().to_string();
    if !valid_phone(&phone) {
        return (
            StatusCode::BAD_REQUEST,
            "Invalid phone number format. Use E.164 format (e.g., +911234567890)".to_string(),
        )
            .into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if limiter.check_ip(client_ip.as_deref(), RateLimitAction::SendOtp)
        == RateLimitDecision::Limited
    {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many OTP requests from this IP, please try again later".to_string(),
        )
            .into_response();
    }

    match otp.issue(&phone, request.purpose).await {
        Ok(issued) => (
            StatusCode::OK,
            Json(SendOtpResponse {
                otp_id: issued.otp_id,
                expires_at: issued.expires_at,
                retry_after_seconds: issued.retry_after_seconds,
                plaintext_otp: issued.plaintext_otp,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "OTP verified", body = VerifyOtpResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Incorrect or expired OTP", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown OTP id or phone mismatch", body = crate::error::ErrorBody),
        (status = 410, description = "OTP already consumed", body = crate::error::ErrorBody),
        (status = 429, description = "Attempt budget or rate limit hit", body = crate::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    headers: HeaderMap,
    otp: Extension<Arc<OtpService>>,
    limiter: Extension<Arc<dyn RateLimiter>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> impl IntoResponse {
    let request: VerifyOtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let phone = request.phone.trim().to_string();
    if !valid_phone(&phone) {
        return (
            StatusCode::BAD_REQUEST,
            "Invalid phone number format".to_string(),
        )
            .into_response();
    }
    if !valid_otp_code(&request.otp) {
        return (StatusCode::BAD_REQUEST, "OTP must be 6 digits".to_string()).into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if limiter.check_ip(client_ip.as_deref(), RateLimitAction::VerifyOtp)
        == RateLimitDecision::Limited
    {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many verification attempts from this IP, please try again later".to_string(),
        )
            .into_response();
    }

    match otp.verify(&phone, &request.otp, request.otp_id).await {
        Ok(verified) => (
            StatusCode::OK,
            Json(VerifyOtpResponse {
                verified: true,
                verification_token: verified.verification_token,
                token_expires_at: verified.token_expires_at,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use axum::http::HeaderMap;
    use uuid::Uuid;

    #[tokio::test]
    async fn send_otp_missing_payload() {
        let response = send_otp(
            HeaderMap::new(),
            Extension(test_support::otp_service()),
            Extension(test_support::limiter()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn send_otp_rejects_malformed_phone() {
        let response = send_otp(
            HeaderMap::new(),
            Extension(test_support::otp_service()),
            Extension(test_support::limiter()),
            Some(Json(SendOtpRequest {
                phone: "12345".to_string(),
                purpose: crate::otp::models::OtpPurpose::Signup,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn send_otp_issues_for_valid_phone() {
        let response = send_otp(
            HeaderMap::new(),
            Extension(test_support::otp_service()),
            Extension(test_support::limiter()),
            Some(Json(SendOtpRequest {
                phone: "+911234567890".to_string(),
                purpose: crate::otp::models::OtpPurpose::Signup,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn verify_otp_rejects_short_code() {
        let response = verify_otp(
            HeaderMap::new(),
            Extension(test_support::otp_service()),
            Extension(test_support::limiter()),
            Some(Json(VerifyOtpRequest {
                phone: "+911234567890".to_string(),
                otp: "123".to_string(),
                otp_id: Uuid::new_v4(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_otp_unknown_id_is_not_found() {
        let response = verify_otp(
            HeaderMap::new(),
            Extension(test_support::otp_service()),
            Extension(test_support::limiter()),
            Some(Json(VerifyOtpRequest {
                phone: "+911234567890".to_string(),
                otp: "123456".to_string(),
                otp_id: Uuid::new_v4(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
