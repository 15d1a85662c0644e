//! Typed Rust client for the DigitalOcean v2 API.
//!
//! Covers the subset needed for workshop environments:
//! droplets (create, get, list, delete), action polling,
//! account SSH keys (list, delete) and domain records (list, create, delete).

mod types;

pub use types::*;

use std::time::Duration;

use tracing::{debug, warn};

const BASE_URL: &str = "https://api.digitalocean.com/v2";
const PER_PAGE: u32 = 50;

/// Interval between action status polls.
const ACTION_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Consecutive poll request failures tolerated before giving up on an action.
const ACTION_POLL_MAX_FAILURES: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("digitalocean api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("digitalocean api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("digitalocean action {id} errored")]
    ActionErrored { id: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the DigitalOcean REST API, bound to a single access token.
#[derive(Clone)]
pub struct DoClient {
    token: String,
    base_url: String,
    http: reqwest::Client,
}

impl DoClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, BASE_URL)
    }

    /// Point the client at an alternative API root (used against local mocks).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn page_query(page: u32) -> [(&'static str, String); 2] {
        [("page", page.to_string()), ("per_page", PER_PAGE.to_string())]
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    // ── Droplets ────────────────────────────────────────────────────

    /// Create a droplet. The returned links carry the `create` action to wait on.
    pub async fn create_droplet(&self, req: &CreateDropletRequest) -> Result<DropletEnvelope> {
        let resp = self
            .http
            .post(self.url("/droplets"))
            .header("Authorization", self.auth())
            .json(req)
            .send()
            .await?;

        Self::check(resp, "create droplet")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn get_droplet(&self, id: u64) -> Result<Droplet> {
        let resp = self
            .http
            .get(self.url(&format!("/droplets/{id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        let env: DropletEnvelope = Self::check(resp, "get droplet").await?.json().await?;
        Ok(env.droplet)
    }

    pub async fn list_droplets(&self, page: u32) -> Result<DropletList> {
        let resp = self
            .http
            .get(self.url("/droplets"))
            .header("Authorization", self.auth())
            .query(&Self::page_query(page))
            .send()
            .await?;

        Self::check(resp, "list droplets")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn delete_droplet(&self, id: u64) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/droplets/{id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        Self::check(resp, "delete droplet").await?;
        Ok(())
    }

    // ── Actions ─────────────────────────────────────────────────────

    pub async fn get_action(&self, href: &str) -> Result<Action> {
        let resp = self
            .http
            .get(href)
            .header("Authorization", self.auth())
            .send()
            .await?;

        let env: ActionEnvelope = Self::check(resp, "get action").await?.json().await?;
        Ok(env.action)
    }

    /// Poll an action until it completes.
    ///
    /// Polling has no deadline of its own; it ends when the action completes,
    /// errors, or the status request fails several times in a row.
    pub async fn wait_for_action(&self, href: &str) -> Result<()> {
        let mut failures = 0;
        loop {
            match self.get_action(href).await {
                Ok(action) => {
                    failures = 0;
                    debug!(
                        action_id = action.id,
                        kind = %action.kind,
                        status = %action.status,
                        "digitalocean: action status"
                    );
                    match action.status.as_str() {
                        "completed" => return Ok(()),
                        "errored" => return Err(Error::ActionErrored { id: action.id }),
                        _ => {}
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!(href, failures, error = %e, "digitalocean: action poll failed");
                    if failures >= ACTION_POLL_MAX_FAILURES {
                        return Err(e);
                    }
                }
            }
            tokio::time::sleep(ACTION_POLL_INTERVAL).await;
        }
    }

    // ── SSH keys ────────────────────────────────────────────────────

    pub async fn list_keys(&self, page: u32) -> Result<KeyList> {
        let resp = self
            .http
            .get(self.url("/account/keys"))
            .header("Authorization", self.auth())
            .query(&Self::page_query(page))
            .send()
            .await?;

        Self::check(resp, "list keys")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn delete_key(&self, id: u64) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/account/keys/{id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        Self::check(resp, "delete key").await?;
        Ok(())
    }

    // ── Domain records ──────────────────────────────────────────────

    pub async fn list_records(&self, domain: &str, page: u32) -> Result<DomainRecordList> {
        let resp = self
            .http
            .get(self.url(&format!("/domains/{domain}/records")))
            .header("Authorization", self.auth())
            .query(&Self::page_query(page))
            .send()
            .await?;

        Self::check(resp, "list domain records")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn create_record(
        &self,
        domain: &str,
        req: &DomainRecordEditRequest,
    ) -> Result<DomainRecord> {
        let resp = self
            .http
            .post(self.url(&format!("/domains/{domain}/records")))
            .header("Authorization", self.auth())
            .json(req)
            .send()
            .await?;

        let env: DomainRecordEnvelope = Self::check(resp, "create domain record")
            .await?
            .json()
            .await?;
        Ok(env.domain_record)
    }

    pub async fn delete_record(&self, domain: &str, id: u64) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/domains/{domain}/records/{id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        Self::check(resp, "delete domain record").await?;
        Ok(())
    }
}
