use reqwest::Client;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

use super::auth::TokenSource;
use super::credential::ServiceAccountKey;
use super::firestore::{DEFAULT_FIRESTORE_BASE_URL, Firestore};
use crate::config::FIREBASE_SERVICE_ACCOUNT;
use crate::error::ServiceError;

pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Firestore REST root; the Google endpoint when unset.
    pub firestore_base_url: Option<String>,
    /// Per-request timeout for token exchange and Firestore calls.
    pub request_timeout: Option<Duration>,
}

/// An authenticated connection context to one Firebase project.
pub struct FirebaseApp {
    name: String,
    credential: ServiceAccountKey,
    tokens: TokenSource,
    http: Client,
    firestore_base_url: String,
}

impl FirebaseApp {
    pub fn new(credential: ServiceAccountKey, options: &AppOptions) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(options.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
            .build()?;
        let tokens = TokenSource::new(&credential, http.clone())?;

        Ok(Self {
            name: DEFAULT_APP_NAME.to_string(),
            credential,
            tokens,
            http,
            firestore_base_url: options
                .firestore_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_id(&self) -> &str {
        &self.credential.project_id
    }

    pub fn client_email(&self) -> &str {
        &self.credential.client_email
    }

    pub fn firestore(self: &Arc<Self>) -> Firestore {
        Firestore::new(Arc::clone(self))
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn firestore_base_url(&self) -> &str {
        &self.firestore_base_url
    }

    pub(crate) async fn access_token(&self) -> Result<String, ServiceError> {
        self.tokens.access_token().await
    }
}

/// Outcome of a successful initialization call.
#[derive(Clone)]
pub enum DatabaseInit {
    /// This call registered the context.
    Initialized(Arc<FirebaseApp>),
    /// A context already existed; the call did nothing.
    AlreadyInitialized(Arc<FirebaseApp>),
}

impl DatabaseInit {
    pub fn app(&self) -> &Arc<FirebaseApp> {
        match self {
            DatabaseInit::Initialized(app) | DatabaseInit::AlreadyInitialized(app) => app,
        }
    }

    pub fn into_app(self) -> Arc<FirebaseApp> {
        match self {
            DatabaseInit::Initialized(app) | DatabaseInit::AlreadyInitialized(app) => app,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, DatabaseInit::Initialized(_))
    }
}

/// Holds at most one database-application context.
pub struct AppRegistry {
    app: OnceLock<Arc<FirebaseApp>>,
}

impl AppRegistry {
    pub const fn new() -> Self {
        Self {
            app: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Option<Arc<FirebaseApp>> {
        self.app.get().cloned()
    }

    /// Number of registered contexts: 0 or 1.
    pub fn len(&self) -> usize {
        usize::from(self.app.get().is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a context from a raw service-account JSON string.
    ///
    /// A no-op once a context exists. On error nothing is registered, so a
    /// later call may try again.
    pub fn initialize(
        &self,
        raw_credential: Option<&str>,
        options: &AppOptions,
    ) -> Result<DatabaseInit, ServiceError> {
        if let Some(app) = self.app.get() {
            debug!("Firebase app already initialized, skipping");
            return Ok(DatabaseInit::AlreadyInitialized(Arc::clone(app)));
        }

        let raw = raw_credential.ok_or(ServiceError::MissingCredential(FIREBASE_SERVICE_ACCOUNT))?;
        let credential = ServiceAccountKey::parse(raw)?;
        let app = Arc::new(FirebaseApp::new(credential, options)?);

        match self.app.set(Arc::clone(&app)) {
            Ok(()) => {
                info!(
                    "Firebase app {} initialized for project {}",
                    app.name(),
                    app.project_id()
                );
                Ok(DatabaseInit::Initialized(app))
            }
            // Lost a race with a concurrent initializer; hand out the winner
            Err(_) => Ok(DatabaseInit::AlreadyInitialized(self.get().unwrap_or(app))),
        }
    }
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_REGISTRY: AppRegistry = AppRegistry::new();

/// The process-wide registry used by `bootstrap::bootstrap`.
pub fn default_registry() -> &'static AppRegistry {
    &DEFAULT_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIXTURE: &str = include_str!("../../tests/fixtures/service_account.json");

    #[test]
    fn second_initialize_is_a_noop() {
        let registry = AppRegistry::new();
        let options = AppOptions::default();

        let first = registry.initialize(Some(FIXTURE), &options).unwrap();
        let second = registry.initialize(Some(FIXTURE), &options).unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert!(Arc::ptr_eq(first.app(), second.app()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn different_credential_does_not_replace_context() {
        let registry = AppRegistry::new();
        let options = AppOptions::default();
        registry.initialize(Some(FIXTURE), &options).unwrap();

        let mut other: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
        other["project_id"] = json!("another-project");
        let second = registry
            .initialize(Some(&other.to_string()), &options)
            .unwrap();

        assert!(!second.is_new());
        assert_eq!(second.app().project_id(), "demo-project");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn malformed_credential_leaves_registry_empty() {
        let registry = AppRegistry::new();
        let err = registry
            .initialize(Some("not-json"), &AppOptions::default())
            .err()
            .unwrap();

        assert!(matches!(err, ServiceError::CredentialParse(_)));
        assert!(registry.is_empty());
        assert!(registry.get().is_none());
    }

    #[test]
    fn failed_attempt_can_be_retried() {
        let registry = AppRegistry::new();
        let options = AppOptions::default();

        assert!(registry.initialize(None, &options).is_err());
        let retry = registry.initialize(Some(FIXTURE), &options).unwrap();

        assert!(retry.is_new());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_credential_names_the_variable() {
        let registry = AppRegistry::new();
        let err = registry
            .initialize(None, &AppOptions::default())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "FIREBASE_SERVICE_ACCOUNT is not set");
    }

    #[test]
    fn app_exposes_credential_identity() {
        let registry = AppRegistry::new();
        let app = registry
            .initialize(Some(FIXTURE), &AppOptions::default())
            .unwrap()
            .into_app();

        assert_eq!(app.name(), DEFAULT_APP_NAME);
        assert_eq!(
            app.client_email(),
            "bootstrap@demo-project.iam.gserviceaccount.com"
        );
        assert_eq!(app.firestore_base_url(), DEFAULT_FIRESTORE_BASE_URL);
    }
}
