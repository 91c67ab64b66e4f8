use reqwest::Url;
use teloxide::RequestError;
use teloxide::prelude::*;
use tracing::{info, warn};

/// What is known about the bot token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// Constructed but never checked against the Bot API.
    Unverified,
    /// `getMe` succeeded.
    Verified { username: String },
    /// The Bot API refused the token.
    Rejected { reason: String },
    /// The Bot API could not be reached; the token is still unknown.
    Unreachable { reason: String },
}

/// Bot session bound to a secret token.
#[derive(Clone)]
pub struct BotClient {
    bot: Bot,
    status: TokenStatus,
}

impl BotClient {
    /// Never touches the network and never validates the token.
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
            status: TokenStatus::Unverified,
        }
    }

    /// Point the client at another Bot API server (local server, test double).
    pub fn with_api_url(self, url: Url) -> Self {
        Self {
            bot: self.bot.set_api_url(url),
            status: TokenStatus::Unverified,
        }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    pub fn status(&self) -> &TokenStatus {
        &self.status
    }

    /// Check the token with one `getMe` call and remember the outcome.
    pub async fn verify(&mut self) -> &TokenStatus {
        self.status = match self.bot.get_me().await {
            Ok(me) => {
                let username = me.user.username.clone().unwrap_or_default();
                info!("Bot token verified: @{username}");
                TokenStatus::Verified { username }
            }
            Err(RequestError::Api(e)) => {
                warn!("Bot token rejected: {e}");
                TokenStatus::Rejected {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                warn!("Bot API unreachable: {e}");
                TokenStatus::Unreachable {
                    reason: e.to_string(),
                }
            }
        };
        &self.status
    }

    pub fn into_bot(self) -> Bot {
        self.bot
    }
}
