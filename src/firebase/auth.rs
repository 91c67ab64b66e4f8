use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::credential::ServiceAccountKey;
use crate::error::ServiceError;

const SCOPES: &str =
    "https://www.googleapis.com/auth/datastore https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECS: i64 = 3600;
/// Refresh this long before Google's stated expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECS
}

/// Google issues tokens for at most an hour; anything else is a bad response.
fn token_lifetime(expires_in: i64) -> Result<Duration, ServiceError> {
    if !(1..=ASSERTION_TTL_SECS).contains(&expires_in) {
        return Err(ServiceError::Authentication(format!(
            "token expires_in {expires_in}s outside 1..={ASSERTION_TTL_SECS}"
        )));
    }
    Duration::try_seconds(expires_in).ok_or_else(|| {
        ServiceError::Authentication(format!("token expires_in {expires_in}s out of range"))
    })
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

/// Mints and caches OAuth2 access tokens for a service account.
pub struct TokenSource {
    client_email: String,
    private_key_id: Option<String>,
    token_uri: String,
    key: EncodingKey,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    /// Fails if the private key does not load as an RSA signing key.
    pub fn new(credential: &ServiceAccountKey, http: Client) -> Result<Self, ServiceError> {
        let key = EncodingKey::from_rsa_pem(credential.private_key.as_bytes()).map_err(|e| {
            ServiceError::InvalidCredential(format!("private_key is not a valid RSA key: {e}"))
        })?;

        Ok(Self {
            client_email: credential.client_email.clone(),
            private_key_id: credential.private_key_id.clone(),
            token_uri: credential.token_uri.clone(),
            key,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Return a cached token, or exchange a fresh assertion for one.
    pub async fn access_token(&self) -> Result<String, ServiceError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, ServiceError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SCOPES,
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_TTL_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.key)
            .map_err(|e| ServiceError::InvalidCredential(format!("failed to sign assertion: {e}")))
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<CachedToken, ServiceError> {
        let assertion = self.assertion(now)?;
        debug!("Requesting access token for {}", self.client_email);

        let resp = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Authentication(format!("HTTP {status}: {text}")));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Authentication(format!("bad token response: {e}")))?;

        let lifetime = token_lifetime(body.expires_in)?;
        info!("Access token issued, expires in {}s", body.expires_in);
        Ok(CachedToken {
            value: body.access_token,
            expires_at: now + lifetime,
        })
    }
}
