//! Start-up wiring: initialize the database context, construct the bot client,
//! and keep both where handlers can reach them.

use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::ServiceError;
use crate::firebase::{AppOptions, AppRegistry, DatabaseInit, FirebaseApp, default_registry};
use crate::telegram::BotClient;

/// Handles produced by one bootstrap run.
pub struct Services {
    database: Result<Arc<FirebaseApp>, ServiceError>,
    bot: BotClient,
}

impl Services {
    /// The database context, or `DatabaseUnavailable` in degraded mode.
    pub fn database(&self) -> Result<&Arc<FirebaseApp>, ServiceError> {
        self.database
            .as_ref()
            .map_err(|_| ServiceError::DatabaseUnavailable)
    }

    /// Why the database is unavailable, if it is.
    pub fn database_error(&self) -> Option<&ServiceError> {
        self.database.as_ref().err()
    }

    pub fn bot(&self) -> &BotClient {
        &self.bot
    }

    pub fn bot_mut(&mut self) -> &mut BotClient {
        &mut self.bot
    }
}

impl From<&Config> for AppOptions {
    fn from(config: &Config) -> Self {
        Self {
            firestore_base_url: config.firestore_base_url.clone(),
            ..Self::default()
        }
    }
}

/// Initialize the database context in `registry` once.
///
/// Failures are logged and returned; the caller decides whether to carry on
/// without a database.
pub fn initialize_database(
    registry: &AppRegistry,
    config: &Config,
) -> Result<DatabaseInit, ServiceError> {
    registry
        .initialize(
            config.firebase_service_account.as_deref(),
            &AppOptions::from(config),
        )
        .inspect_err(|e| error!("Firebase Admin Initialization Error: {e}"))
}

/// Build a bot client from the configured token. Always succeeds.
pub fn construct_bot(config: &Config) -> BotClient {
    BotClient::new(&config.telegram_bot_token)
}

/// Run both start-up actions against `registry`: database first, then bot.
pub fn bootstrap_with(registry: &AppRegistry, config: &Config) -> Services {
    let database = initialize_database(registry, config).map(DatabaseInit::into_app);
    if database.is_err() {
        warn!("Continuing without database");
    }

    Services {
        database,
        bot: construct_bot(config),
    }
}

/// Bootstrap against the process-wide registry.
pub fn bootstrap(config: &Config) -> Services {
    bootstrap_with(default_registry(), config)
}

static SERVICES: OnceLock<Services> = OnceLock::new();

/// Publish `services` process-wide. The first installed value wins.
pub fn install(services: Services) -> &'static Services {
    let mut stored = false;
    let installed = SERVICES.get_or_init(|| {
        stored = true;
        services
    });
    if stored {
        info!("Services installed");
    } else {
        warn!("Services already installed, keeping the first");
    }
    installed
}

/// The installed services, if `install` has run.
pub fn services() -> Option<&'static Services> {
    SERVICES.get()
}
