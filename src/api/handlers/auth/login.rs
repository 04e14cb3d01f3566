//! Email/password login endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::rate_limit::{RateLimitAction, RateLimitDecision, RateLimiter};
use super::types::{AuthResponse, LoginRequest};
use super::utils::{extract_client_ip, normalize_email, valid_email};
use crate::account::CredentialService;

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorBody),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    credentials: Extension<Arc<CredentialService>>,
    limiter: Extension<Arc<dyn RateLimiter>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if limiter.check_ip(client_ip.as_deref(), RateLimitAction::Login)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }
    if limiter.check_identity(&email, RateLimitAction::Login) == RateLimitDecision::Limited {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    match credentials.login(&email, &request.password).await {
        Ok((account, tokens)) => {
            (StatusCode::OK, Json(AuthResponse { account, tokens })).into_response()
        }
        Err(err) => err.into_response(),
    }
}
