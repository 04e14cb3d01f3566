//! # Suraksha
//!
//! Phone-first authentication service: proves control of a phone number with
//! a one-time passcode, then chains that proof into account registration and
//! login, issuing signed session tokens.
//!
//! ## Flow
//!
//! 1. `POST /v1/auth/send-otp`: a rate-limited, hashed 6-digit code is
//!    persisted with a 5-minute validity window and dispatched to the SMS
//!    sink. The caller keeps the returned `otpId`.
//! 2. `POST /v1/auth/verify-otp`: the code is checked against the stored
//!    hash under an attempt cap. Success mints a short-lived verification
//!    token bound to `{phone, otpId}`.
//! 3. `POST /v1/auth/register`: the verification token authorizes account
//!    creation for that exact phone number; a session token pair is issued.
//! 4. `POST /v1/auth/login`: email/password login issuing the same pair.
//!
//! ## Storage
//!
//! Engines talk to the [`otp::repo::OtpStore`] and
//! [`account::repo::AccountStore`] traits. Production runs on `PostgreSQL`;
//! in-memory implementations back the test suite and provider-less local
//! development. OTP rows are reclaimed by a background sweeper once their
//! validity window (plus grace) has passed; the engines treat `expires_at`
//! as authoritative on every read, so correctness never depends on sweep
//! timing.

pub mod account;
pub mod api;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod otp;
pub mod sms;
pub mod token;
