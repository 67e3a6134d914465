use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info, warn};

use super::session::{parse_login_response, Session};
use crate::config::{LaunchConfig, DESCRIPTOR_PATH, LOGIN_PATH};
use crate::error::{LaunchError, Result};

/// HTTP client for the BMC's embedded web management API.
pub struct BmcClient {
    client: Client,
    base_url: String,
    timeout: std::time::Duration,
}

impl BmcClient {
    pub fn new(config: &LaunchConfig) -> Result<Self> {
        let base_url = config.base_url();
        let client = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|source| LaunchError::Transport {
                what: "Building HTTP client",
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url,
            timeout: config.request_timeout,
        })
    }

    /// Underlying client, shared with the artifact download.
    pub fn http(&self) -> &Client {
        &self.client
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Apply the fixed per-request timeout.
    fn bounded(&self, req: RequestBuilder) -> RequestBuilder {
        req.timeout(self.timeout)
    }

    /// Log in and return the session token from the response body.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        info!("Getting session cookie...");
        let url = self.url_for(LOGIN_PATH);
        let transport = |source| LaunchError::Transport {
            what: "Login request",
            url: url.clone(),
            source,
        };

        let resp = self
            .bounded(self.client.post(&url))
            .form(&[("WEBVAR_USERNAME", username), ("WEBVAR_PASSWORD", password)])
            .send()
            .await
            .map_err(transport)?;
        debug!("login status={}", resp.status().as_u16());

        let body = resp.text().await.map_err(transport)?;
        let session = parse_login_response(&body)?;

        info!("Got session cookie");
        debug!("session cookie={:?}", session.token());
        Ok(session)
    }

    /// Fetch the raw JNLP document using `session` as the cookie credential.
    pub async fn fetch_descriptor(&self, session: &Session) -> Result<String> {
        info!("Getting JNLP file...");
        let url = self.url_for(DESCRIPTOR_PATH);
        let transport = |source| LaunchError::Transport {
            what: "JNLP request",
            url: url.clone(),
            source,
        };

        let resp = self
            .bounded(self.client.get(&url))
            .header(reqwest::header::COOKIE, session.cookie_header())
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            warn!("Unable to get JNLP status={} body={}", status.as_u16(), body);
            return Err(LaunchError::HttpStatus {
                what: "JNLP request",
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(transport)?;
        info!("Got JNLP file");
        Ok(body)
    }
}
