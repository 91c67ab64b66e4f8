use serde::Deserialize;
use std::fmt;

use crate::error::ServiceError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service-account key as downloaded from the Firebase console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse and shape-check a service-account JSON string.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let mut key: Self = serde_json::from_str(raw.trim())?;

        // Keys pasted into a single-line env var often keep "\n" as two characters
        if !key.private_key.contains('\n') && key.private_key.contains("\\n") {
            key.private_key = key.private_key.replace("\\n", "\n");
        }

        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> Result<(), ServiceError> {
        if let Some(kind) = &self.account_type {
            if kind != "service_account" {
                return Err(ServiceError::InvalidCredential(format!(
                    "expected type \"service_account\", got {kind:?}"
                )));
            }
        }

        for (field, value) in [
            ("project_id", &self.project_id),
            ("private_key", &self.private_key),
            ("client_email", &self.client_email),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::InvalidCredential(format!(
                    "must contain a non-empty \"{field}\" property"
                )));
            }
        }

        if !self.private_key.trim_start().starts_with("-----BEGIN") {
            return Err(ServiceError::InvalidCredential(
                "private_key is not a PEM block".into(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
