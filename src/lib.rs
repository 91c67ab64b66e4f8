pub mod bootstrap;
pub mod config;
pub mod error;
pub mod firebase;
pub mod telegram;

pub use bootstrap::{Services, bootstrap};
pub use config::{Config, TokenCheck};
pub use error::ServiceError;
