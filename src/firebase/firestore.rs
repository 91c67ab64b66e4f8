use reqwest::StatusCode;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::debug;
use url::{ParseError, Url};

use super::app::FirebaseApp;
use crate::error::ServiceError;

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Firestore REST handle bound to one app's default database.
#[derive(Clone)]
pub struct Firestore {
    app: Arc<FirebaseApp>,
}

impl Firestore {
    pub fn new(app: Arc<FirebaseApp>) -> Self {
        Self { app }
    }

    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.app.firestore_base_url(),
            self.app.project_id()
        )
    }

    /// `collection` and `id` are percent-encoded as single path segments.
    fn document_url(&self, collection: &str, id: &str) -> Result<Url, ServiceError> {
        let mut endpoint = Url::parse(&self.documents_url())?;
        endpoint
            .path_segments_mut()
            .map_err(|_| ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(collection)
            .push(id);
        Ok(endpoint)
    }

    /// Fetch a document. `Ok(None)` when it does not exist.
    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, ServiceError> {
        let token = self.app.access_token().await?;
        let url = self.document_url(collection, id)?;
        debug!("Firestore GET {url}");

        let resp = self.app.http().get(url).bearer_auth(token).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp).await?;
        Ok(Some(resp.json().await?))
    }

    /// Create or overwrite a document from Firestore typed field values,
    /// e.g. `{"name": {"stringValue": "x"}}`. Returns the stored document.
    pub async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        let token = self.app.access_token().await?;
        let url = self.document_url(collection, id)?;
        debug!("Firestore PATCH {url}");

        let resp = self
            .app
            .http()
            .patch(url)
            .bearer_auth(token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let text = resp.text().await.unwrap_or_default();
        return Err(ServiceError::Authentication(format!("HTTP {status}: {text}")));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ServiceError::Firestore {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}
