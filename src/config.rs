use std::env;
use std::fmt;

use tracing::warn;

pub const FIREBASE_SERVICE_ACCOUNT: &str = "FIREBASE_SERVICE_ACCOUNT";
pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const TELEGRAM_TOKEN_CHECK: &str = "TELEGRAM_TOKEN_CHECK";
pub const FIRESTORE_BASE_URL: &str = "FIRESTORE_BASE_URL";

/// When the bot token gets checked against the Bot API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenCheck {
    /// Construct only; a bad token surfaces on first use.
    #[default]
    Lazy,
    /// Call `getMe` once at start-up and log the outcome.
    Eager,
}

impl TokenCheck {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "eager" => TokenCheck::Eager,
            "lazy" | "" => TokenCheck::Lazy,
            other => {
                warn!("Unknown {TELEGRAM_TOKEN_CHECK} value {other:?}, using lazy");
                TokenCheck::Lazy
            }
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub firebase_service_account: Option<String>,
    pub telegram_bot_token: String,
    pub token_check: TokenCheck,
    pub firestore_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_bot_token = lookup(TELEGRAM_BOT_TOKEN).unwrap_or_default();
        if telegram_bot_token.is_empty() {
            warn!("{TELEGRAM_BOT_TOKEN} is empty; bot calls will fail");
        }

        Self {
            firebase_service_account: lookup(FIREBASE_SERVICE_ACCOUNT)
                .filter(|s| !s.trim().is_empty()),
            telegram_bot_token,
            token_check: lookup(TELEGRAM_TOKEN_CHECK)
                .map(|v| TokenCheck::parse(&v))
                .unwrap_or_default(),
            firestore_base_url: lookup(FIRESTORE_BASE_URL)
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "firebase_service_account",
                &self.firebase_service_account.as_ref().map(|_| "<redacted>"),
            )
            .field("telegram_bot_token", &"<redacted>")
            .field("token_check", &self.token_check)
            .field("firestore_base_url", &self.firestore_base_url)
            .finish()
    }
}
