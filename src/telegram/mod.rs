mod client;

pub use client::{BotClient, TokenStatus};
