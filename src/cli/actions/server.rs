//! Server action: wire the stores, engines, and HTTP surface together.

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::warn;

use crate::account::repo::{AccountStore, PgAccountStore};
use crate::account::CredentialService;
use crate::api::handlers::auth::rate_limit::{RateLimiter, SlidingWindowRateLimiter};
use crate::api::{self, AppContext};
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::config::AuthConfig;
use crate::crypto::SecretHasher;
use crate::otp::repo::{spawn_ttl_sweeper, OtpStore, PgOtpStore};
use crate::otp::OtpService;
use crate::sms::{LogSmsSender, Msg91Sender, SmsSender};
use crate::token::TokenCodec;

/// Handle the server action
///
/// # Errors
/// Returns an error if the database is unreachable, migrations fail, or the
/// listener cannot start.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, dsn } => {
            let pool = PgPoolOptions::new()
                .min_connections(1)
                .max_connections(5)
                .max_lifetime(Duration::from_secs(60 * 2))
                .test_before_acquire(true)
                .connect(&dsn)
                .await
                .context("Failed to connect to database")?;

            sqlx::migrate!()
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;

            let sms_configured =
                globals.sms_api_key.is_some() && globals.sms_template_id.is_some();

            // Plaintext echo mirrors the dev workflow: only without a real
            // provider, and AuthConfig refuses it in production regardless.
            let config = AuthConfig::new(globals.production)
                .with_echo_plaintext_otp(!sms_configured);

            let hasher = SecretHasher::new(config.hash_time_cost())?;
            let codec = TokenCodec::new(globals.token_secret.expose_secret(), &config);

            let sms: Arc<dyn SmsSender> = match (&globals.sms_api_key, &globals.sms_template_id)
            {
                (Some(api_key), Some(template_id)) => {
                    Arc::new(Msg91Sender::new(api_key.clone(), template_id.clone()))
                }
                _ => {
                    if globals.production {
                        warn!("No SMS provider configured, OTP delivery is log-only");
                    }
                    Arc::new(LogSmsSender)
                }
            };

            let otp_store: Arc<dyn OtpStore> = Arc::new(PgOtpStore::new(pool.clone()));
            let account_store: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool));

            let _sweeper = spawn_ttl_sweeper(
                otp_store.clone(),
                Duration::from_secs(config.sweep_interval_seconds()),
                config.sweep_grace_seconds(),
            );

            let otp = Arc::new(OtpService::new(
                otp_store,
                hasher.clone(),
                codec.clone(),
                sms,
                config,
            ));
            let credentials = Arc::new(CredentialService::new(account_store, hasher, codec));
            let rate_limiter: Arc<dyn RateLimiter> = Arc::new(SlidingWindowRateLimiter::new());

            api::serve(
                port,
                AppContext {
                    otp,
                    credentials,
                    rate_limiter,
                },
            )
            .await?;
        }
    }

    Ok(())
}
