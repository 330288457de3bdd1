//! Confluent Schema Registry REST client

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{RegistryError, RegistryGateway};
use crate::schema::SchemaType;

/// Media type spoken by the registry
pub const REGISTRY_MEDIA_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Credentials for a secured registry
#[derive(Clone, PartialEq, Eq)]
pub enum RegistryAuth {
    /// HTTP basic auth with an API key/secret pair
    Basic { api_key: String, api_secret: String },
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryAuth::Basic { api_key, .. } => f
                .debug_struct("Basic")
                .field("api_key", api_key)
                .field("api_secret", &"***")
                .finish(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemaRequest<'a> {
    schema: &'a str,
    schema_type: SchemaType,
}

#[derive(Deserialize)]
struct SchemaResponse {
    schema: String,
}

#[derive(Deserialize)]
struct CompatibilityResponse {
    is_compatible: bool,
}

#[derive(Deserialize)]
struct RegisterResponse {
    id: i64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error_code: Option<i64>,
    message: Option<String>,
}

/// Blocking HTTP client for a Confluent-compatible schema registry
pub struct SchemaRegistryClient {
    http: Client,
    base_url: Url,
    auth: Option<RegistryAuth>,
}

impl SchemaRegistryClient {
    /// Create a client for the registry at `url`
    ///
    /// `timeout` bounds every request; there are no retries.
    pub fn new(
        url: &str,
        auth: Option<RegistryAuth>,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let base_url = parse_base_url(url)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    /// Registry base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self.http.request(method, url).header(ACCEPT, REGISTRY_MEDIA_TYPE);
        match &self.auth {
            Some(RegistryAuth::Basic {
                api_key,
                api_secret,
            }) => {
                req = req.basic_auth(api_key, Some(api_secret));
            }
            None => {}
        }
        req
    }

    fn post_schema<T: DeserializeOwned>(
        &self,
        url: Url,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<T, RegistryError> {
        let body = SchemaRequest {
            schema,
            schema_type,
        };
        let resp = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, REGISTRY_MEDIA_TYPE)
            .json(&body)
            .send()?;
        handle_response(resp)
    }
}

impl RegistryGateway for SchemaRegistryClient {
    fn list_subjects(&self) -> Result<Vec<String>, RegistryError> {
        let url = self.endpoint(&["subjects"])?;
        tracing::debug!(%url, "listing subjects");
        let resp = self.request(Method::GET, url).send()?;
        handle_response(resp)
    }

    fn latest_schema(&self, subject: &str) -> Result<String, RegistryError> {
        let url = self.endpoint(&["subjects", subject, "versions", "latest"])?;
        tracing::debug!(%url, subject, "fetching latest schema");
        let resp = self.request(Method::GET, url).send()?;
        let latest: SchemaResponse = handle_response(resp)?;
        Ok(latest.schema)
    }

    fn test_compatibility(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<bool, RegistryError> {
        let url = self.endpoint(&["compatibility", "subjects", subject, "versions", "latest"])?;
        tracing::debug!(%url, subject, %schema_type, "testing compatibility");
        let verdict: CompatibilityResponse = self.post_schema(url, schema, schema_type)?;
        Ok(verdict.is_compatible)
    }

    fn register_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<i64, RegistryError> {
        let url = self.endpoint(&["subjects", subject, "versions"])?;
        tracing::debug!(%url, subject, %schema_type, "registering schema");
        let registered: RegisterResponse = self.post_schema(url, schema, schema_type)?;
        Ok(registered.id)
    }
}

fn parse_base_url(url: &str) -> Result<Url, RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_string()));
    }
    Ok(parsed)
}

fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<T, RegistryError> {
    let status = resp.status();
    let body = resp.text()?;

    if !status.is_success() {
        let (error_code, message) = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => (err.error_code, err.message.unwrap_or_else(|| body.clone())),
            Err(_) => (None, body),
        };
        return Err(RegistryError::Api {
            status: status.as_u16(),
            error_code,
            message,
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| RegistryError::UnexpectedResponse(format!("{}: {}", e, body)))
}
