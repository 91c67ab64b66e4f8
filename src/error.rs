#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),
    #[error("Failed to parse service account JSON: {0}")]
    CredentialParse(#[from] serde_json::Error),
    #[error("Invalid service account: {0}")]
    InvalidCredential(String),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Database is not initialized")]
    DatabaseUnavailable,
    #[error("URL parse error: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Firestore returned HTTP {status}: {body}")]
    Firestore { status: u16, body: String },
}
