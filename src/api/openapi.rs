//! `OpenAPI` document for the auth API.
//!
//! Title, version, and description come from Cargo metadata via the derive.

use utoipa::OpenApi;

use crate::account::models::{EmergencyContact, PublicAccount};
use crate::api::handlers;
use crate::api::handlers::auth::types::{
    AuthResponse, LoginRequest, RegisterRequest, SendOtpRequest, SendOtpResponse,
    VerifyOtpRequest, VerifyOtpResponse,
};
use crate::error::ErrorBody;
use crate::otp::models::OtpPurpose;
use crate::token::SessionTokenPair;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::otp::send_otp,
        handlers::auth::otp::verify_otp,
        handlers::auth::register::register,
        handlers::auth::login::login,
    ),
    components(schemas(
        SendOtpRequest,
        SendOtpResponse,
        VerifyOtpRequest,
        VerifyOtpResponse,
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        PublicAccount,
        SessionTokenPair,
        EmergencyContact,
        OtpPurpose,
        ErrorBody,
    )),
    tags(
        (name = "auth", description = "Phone OTP login and registration"),
        (name = "health", description = "Service health and build info")
    )
)]
pub struct ApiDoc;
