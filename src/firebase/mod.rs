mod app;
mod auth;
mod credential;
mod firestore;

pub use app::{
    AppOptions, AppRegistry, DEFAULT_APP_NAME, DEFAULT_REQUEST_TIMEOUT, DatabaseInit, FirebaseApp,
    default_registry,
};
pub use auth::TokenSource;
pub use credential::{DEFAULT_TOKEN_URI, ServiceAccountKey};
pub use firestore::{DEFAULT_FIRESTORE_BASE_URL, Firestore};
