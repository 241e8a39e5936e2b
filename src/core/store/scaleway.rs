//! Scaleway Secret Manager client.
//!
//! Blocking HTTP implementation of `SecretApi` against the `v1beta1` REST
//! API. Payloads travel base64-encoded; transport-level timeouts are set on
//! the underlying client and failed calls are never retried here.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use super::{
    CreateSecretRequest, CreateVersionRequest, ListSecretsRequest, SecretApi, SecretPage,
    SecretRecord, SecretType, SecretVersion, VersionStatus,
};
use crate::core::constants;
use crate::error::{Result, StoreError};

/// HTTP client for the Secret Manager API.
pub struct ScalewayClient {
    http: Client,
    base_url: String,
    secret_key: Zeroizing<String>,
}

impl std::fmt::Debug for ScalewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalewayClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    secrets: Vec<SecretRecord>,
    #[serde(default)]
    total_count: usize,
}

#[derive(Deserialize)]
struct AccessResponse {
    secret_id: String,
    revision: u32,
    data: String,
    #[serde(rename = "type", default)]
    secret_type: Option<SecretType>,
}

#[derive(Deserialize)]
struct VersionResponse {
    secret_id: String,
    revision: u32,
    #[serde(default)]
    status: Option<VersionStatus>,
}

#[derive(Serialize)]
struct CreateSecretBody<'a> {
    project_id: &'a str,
    name: &'a str,
    path: &'a str,
    #[serde(rename = "type")]
    secret_type: SecretType,
}

#[derive(Serialize)]
struct CreateVersionBody<'a> {
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    disable_previous: bool,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

impl ScalewayClient {
    /// Create a client.
    ///
    /// # Arguments
    ///
    /// * `api_url` - API root, e.g. `https://api.scaleway.com`
    /// * `secret_key` - API secret key sent as `X-Auth-Token`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Http` if the HTTP client cannot be built.
    pub fn new(api_url: &str, secret_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(constants::HTTP_TIMEOUT_SECS))
            .user_agent(concat!("dev-vault/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| StoreError::Http {
                operation: "client setup",
                source,
            })?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/secret-manager/v1beta1",
                api_url.trim_end_matches('/')
            ),
            secret_key: Zeroizing::new(secret_key.into()),
        })
    }

    fn url(&self, region: &str, rest: &str) -> String {
        format!("{}/regions/{}/{}", self.base_url, region, rest)
    }

    fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request
            .header("X-Auth-Token", self.secret_key.as_str())
            .send()
            .map_err(|source| StoreError::Http { operation, source })?;

        let response = check_status(operation, response)?;
        response
            .json::<T>()
            .map_err(|e| StoreError::Decode {
                operation,
                reason: e.to_string(),
            })
            .map_err(Into::into)
    }
}

fn check_status(operation: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiErrorBody>()
        .map(|b| b.message)
        .unwrap_or_default();
    Err(StoreError::Api {
        operation,
        status: status.as_u16(),
        message: if message.is_empty() {
            status.canonical_reason().unwrap_or("error").to_string()
        } else {
            message
        },
    }
    .into())
}

impl SecretApi for ScalewayClient {
    fn list_secrets(&self, req: &ListSecretsRequest<'_>) -> Result<SecretPage> {
        debug!(
            region = req.region,
            secret_type = %req.secret_type,
            page = req.page,
            "listing secrets"
        );

        let mut query: Vec<(&str, String)> = vec![
            ("project_id", req.project_id.to_string()),
            ("type", req.secret_type.as_str().to_string()),
            ("page", req.page.to_string()),
            ("page_size", req.page_size.to_string()),
        ];
        if let Some(name) = req.name {
            query.push(("name", name.to_string()));
        }
        if let Some(path) = req.path {
            query.push(("path", path.to_string()));
        }

        let request = self.http.get(self.url(req.region, "secrets")).query(&query);
        let body: ListResponse = self.send("list secrets", request)?;
        Ok(SecretPage {
            secrets: body.secrets,
            total_count: body.total_count,
        })
    }

    fn access_secret_version(
        &self,
        region: &str,
        secret_id: &str,
        revision: &str,
    ) -> Result<SecretVersion> {
        debug!(region, secret_id, revision, "accessing secret version");

        let url = self.url(
            region,
            &format!("secrets/{}/versions/{}/access", secret_id, revision),
        );
        let body: AccessResponse = self.send("access secret version", self.http.get(url))?;
        let encoded = Zeroizing::new(body.data);
        let data = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|_| StoreError::Decode {
                operation: "access secret version",
                reason: "payload is not valid base64".to_string(),
            })?;

        Ok(SecretVersion {
            secret_id: body.secret_id,
            revision: body.revision,
            data: Zeroizing::new(data),
            secret_type: body.secret_type,
            status: VersionStatus::Enabled,
        })
    }

    fn create_secret(&self, req: &CreateSecretRequest<'_>) -> Result<SecretRecord> {
        debug!(
            region = req.region,
            name = req.name,
            path = req.path,
            secret_type = %req.secret_type,
            "creating secret"
        );

        let body = CreateSecretBody {
            project_id: req.project_id,
            name: req.name,
            path: req.path,
            secret_type: req.secret_type,
        };
        let request = self.http.post(self.url(req.region, "secrets")).json(&body);
        self.send("create secret", request)
    }

    fn create_secret_version(&self, req: &CreateVersionRequest<'_>) -> Result<SecretVersion> {
        debug!(
            region = req.region,
            secret_id = req.secret_id,
            disable_previous = req.disable_previous,
            "creating secret version"
        );

        let body = CreateVersionBody {
            data: STANDARD.encode(req.data),
            description: req.description,
            disable_previous: req.disable_previous,
        };
        let request = self
            .http
            .post(self.url(req.region, &format!("secrets/{}/versions", req.secret_id)))
            .json(&body);
        let created: VersionResponse = self.send("create secret version", request)?;

        Ok(SecretVersion {
            secret_id: created.secret_id,
            revision: created.revision,
            data: Zeroizing::new(Vec::new()),
            secret_type: None,
            status: created.status.unwrap_or(VersionStatus::Enabled),
        })
    }
}
