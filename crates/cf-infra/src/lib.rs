pub mod booter;
pub mod cloud_init;
pub mod digitalocean;
pub mod keys;
pub mod reclaim;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod types;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use types::{CreatedHost, DomainRecord, Host, HostId, HostSpec, NewDomainRecord, Page, SshKey};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("digitalocean error: {0}")]
    DigitalOcean(#[from] do_api::Error),

    #[error("unable to wait for host to be created because there is no create action")]
    NoCreateAction,

    #[error("host {0} has no public ipv4 address")]
    NoPublicAddress(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] ssh_key::Error),

    #[error("boot payload could not be rendered: {0}")]
    Render(#[from] serde_yaml::Error),

    #[error("boot payload file is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("registry error: {0}")]
    Store(#[from] cf_store::Error),

    /// Failure reported by a provider without an HTTP client behind it.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("no regions configured")]
    NoRegion,

    #[error("no cloud provider tokens configured")]
    EmptyPool,
}

pub type Result<T> = std::result::Result<T, Error>;

/// The slice of a cloud provider the workshop controller relies on.
///
/// Listing calls are page-based: page numbers start at 1 and the returned
/// [`Page`] says whether more pages follow.
#[async_trait]
pub trait CloudProvider: Send + Sync + 'static {
    /// Request a new host. Returns immediately; the host boots asynchronously.
    async fn create_host(&self, spec: &HostSpec) -> Result<CreatedHost>;

    /// Block until the referenced action has completed.
    async fn wait_until_active(&self, action: &types::ActionRef) -> Result<()>;

    async fn get_host(&self, id: HostId) -> Result<Host>;

    async fn list_hosts(&self, page: u32) -> Result<Page<Host>>;

    async fn delete_host(&self, id: HostId) -> Result<()>;

    async fn list_keys(&self, page: u32) -> Result<Page<SshKey>>;

    async fn delete_key(&self, id: u64) -> Result<()>;

    async fn list_domain_records(&self, zone: &str, page: u32) -> Result<Page<DomainRecord>>;

    async fn create_domain_record(&self, zone: &str, record: &NewDomainRecord) -> Result<()>;

    async fn delete_domain_record(&self, zone: &str, id: u64) -> Result<()>;
}

/// Drain a paged listing: fetch page 1, then `current + 1`, until the
/// provider marks a page as the last one.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let current = fetch(page).await?;
        items.extend(current.items);
        if current.last {
            return Ok(items);
        }
        page += 1;
    }
}

/// A provider client bound to one API token.
///
/// The token itself is kept because it is also handed to the booted host.
#[derive(Clone)]
pub struct Account {
    pub token: String,
    pub provider: Arc<dyn CloudProvider>,
}

/// The configured provider accounts.
///
/// New hosts are spread over the pool at random; the master account owns the
/// shared DNS zone and is used for every record change.
#[derive(Clone)]
pub struct AccountPool {
    accounts: Vec<Account>,
    master: Account,
}

impl AccountPool {
    pub fn new(accounts: Vec<Account>, master: Account) -> Result<Self> {
        if accounts.is_empty() {
            return Err(Error::EmptyPool);
        }
        Ok(Self { accounts, master })
    }

    /// Build DigitalOcean accounts for every token. Without an explicit master
    /// token, the first pool token doubles as the DNS account.
    pub fn digitalocean(tokens: &[String], master_token: Option<&str>) -> Result<Self> {
        let accounts: Vec<Account> = tokens
            .iter()
            .map(|token| digitalocean::DigitalOceanProvider::account(token))
            .collect();

        let master = match master_token {
            Some(token) => digitalocean::DigitalOceanProvider::account(token),
            None => accounts.first().cloned().ok_or(Error::EmptyPool)?,
        };

        tracing::info!(accounts = accounts.len(), "registered DigitalOcean accounts");
        Self::new(accounts, master)
    }

    /// Pick an account for a new host.
    pub fn pick(&self) -> &Account {
        use rand::seq::IndexedRandom;
        self.accounts
            .choose(&mut rand::rng())
            .unwrap_or(&self.master)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn master(&self) -> &Account {
        &self.master
    }
}
