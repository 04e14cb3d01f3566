//! Registration endpoint: consumes a verification token from the OTP flow.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::rate_limit::{RateLimitAction, RateLimitDecision, RateLimiter};
use super::types::{AuthResponse, RegisterRequest};
use super::utils::{extract_client_ip, normalize_email, valid_email, valid_phone};
use crate::account::service::NewRegistration;
use crate::account::CredentialService;

const MIN_PASSWORD_LENGTH: usize = 8;

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error or phone/token mismatch", body = String),
        (status = 401, description = "Invalid or expired verification token", body = crate::error::ErrorBody),
        (status = 409, description = "Email or phone already registered", body = crate::error::ErrorBody),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    headers: HeaderMap,
    credentials: Extension<Arc<CredentialService>>,
    limiter: Extension<Arc<dyn RateLimiter>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if request.name.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Name is required".to_string()).into_response();
    }
    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    let phone = request.phone.trim().to_string();
    if !valid_phone(&phone) {
        return (
            StatusCode::BAD_REQUEST,
            "Invalid phone number format".to_string(),
        )
            .into_response();
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return (
            StatusCode::BAD_REQUEST,
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        )
            .into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if limiter.check_ip(client_ip.as_deref(), RateLimitAction::Register)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let registration = NewRegistration {
        name: request.name,
        email,
        phone,
        password: request.password,
        verification_token: request.verification_token,
        emergency_contacts: request.emergency_contacts,
    };

    match credentials.register(registration).await {
        Ok((account, tokens)) => (
            StatusCode::CREATED,
            Json(AuthResponse { account, tokens }),
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

    fn request(token: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "+911234567890".to_string(),
            password: "longenough".to_string(),
            verification_token: token.to_string(),
            emergency_contacts: Vec::new(),
        }
    }

    #[tokio::test]
    async fn register_missing_payload() {
        let response = register(
            HeaderMap::new(),
            Extension(test_support::credential_service()),
            Extension(test_support::limiter()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let mut payload = request("token");
        payload.password = "short".to_string();
        let response = register(
            HeaderMap::new(),
            Extension(test_support::credential_service()),
            Extension(test_support::limiter()),
            Some(Json(payload)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_bad_verification_token() {
        let response = register(
            HeaderMap::new(),
            Extension(test_support::credential_service()),
            Extension(test_support::limiter()),
            Some(Json(request("not-a-token"))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_succeeds_with_valid_token() {
        let codec = test_support::codec();
        let (token, _) = codec
            .mint_verification("+911234567890", Uuid::new_v4())
            .expect("mint");

        let response = register(
            HeaderMap::new(),
            Extension(test_support::credential_service()),
            Extension(test_support::limiter()),
            Some(Json(request(&token))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
