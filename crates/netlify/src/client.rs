//! Authenticated Netlify API client.

use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::NetlifyError;
use crate::types::{DeployCreated, DeploymentHandle, DeployStatus};

const DEFAULT_BASE_URL: &str = "https://api.netlify.com";

/// Filename advertised in the upload's Content-Disposition header.
const ARCHIVE_FILENAME: &str = "site.zip";

/// Netlify API client bound to one site.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    site_id: String,
}

impl Client {
    /// Creates a client for `site_id` authenticated with `token`.
    pub fn new(site_id: &str, token: &str) -> Result<Self, NetlifyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| NetlifyError::InvalidToken)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            site_id: site_id.to_string(),
        })
    }

    /// Points the client at a different API host (local mock servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Uploads a zipped site and creates a deployment.
    ///
    /// Returns `Ok(None)` when the response carries no `url` field or is
    /// not parsable JSON: the provider has not started the deploy yet and
    /// the caller must treat the publish as a no-op rather than poll.
    /// Network failures and non-success statuses are errors; they are
    /// never retried at this layer.
    pub async fn create_deploy(
        &self,
        archive: Vec<u8>,
    ) -> Result<Option<DeploymentHandle>, NetlifyError> {
        let url = format!(
            "{}/api/v1/sites/{}/deploys",
            self.base_url, self.site_id
        );
        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/zip")
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename={ARCHIVE_FILENAME}"),
            )
            .body(archive)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NetlifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        match serde_json::from_slice::<DeployCreated>(&body) {
            Ok(DeployCreated {
                url: Some(url),
                id: Some(id),
            }) => {
                debug!(deploy_id = %id, %url, "deploy created");
                Ok(Some(DeploymentHandle { id, url }))
            }
            Ok(_) => {
                warn!("deploy response carried no url/id; deploy not started yet");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "deploy response not parsable; deploy not started yet");
                Ok(None)
            }
        }
    }

    /// Fetches the current state of a deployment.
    ///
    /// Returns `Ok(None)` when the body is not parsable JSON or carries no
    /// `state` field; the poll loop treats that the same as "pending".
    pub async fn deploy_state(&self, deploy_id: &str) -> Result<Option<String>, NetlifyError> {
        let url = format!("{}/api/v1/deploys/{deploy_id}", self.base_url);
        let resp = self.http.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NetlifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        match serde_json::from_slice::<DeployStatus>(&body) {
            Ok(DeployStatus { state }) => Ok(state),
            Err(e) => {
                debug!(error = %e, "status response not parsable");
                Ok(None)
            }
        }
    }
}
