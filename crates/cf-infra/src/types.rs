use serde::{Deserialize, Serialize};

/// Provider-side host identifier (a DigitalOcean droplet id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostId(pub u64);

/// Specification for creating a host.
#[derive(Debug, Clone)]
pub struct HostSpec {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    pub user_data: String,
}

/// Host status and metadata returned from the provider.
#[derive(Debug, Clone)]
pub struct Host {
    pub id: HostId,
    pub name: String,
    pub status: String,
    pub public_ipv4: Option<String>,
}

/// Reference to an asynchronous provider action, e.g. the droplet `create` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    pub id: u64,
    pub rel: String,
    pub href: String,
}

/// Result of a create request: the host as first reported plus its action links.
#[derive(Debug, Clone)]
pub struct CreatedHost {
    pub host: Host,
    pub actions: Vec<ActionRef>,
}

impl CreatedHost {
    pub fn action(&self, rel: &str) -> Option<&ActionRef> {
        self.actions.iter().find(|a| a.rel == rel)
    }
}

#[derive(Debug, Clone)]
pub struct SshKey {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct DomainRecord {
    pub id: u64,
    pub kind: String,
    pub name: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDomainRecord {
    pub kind: String,
    pub name: String,
    pub data: String,
}

/// One page of a listing. `last` is set once the provider has no further pages.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub last: bool,
}

/// Static description of a workshop deployment, shared by every component.
#[derive(Debug, Clone)]
pub struct WorkshopConfig {
    /// Shared DNS zone all project hosts live under.
    pub domain: String,
    /// Regions a new shell may land in; one is picked per boot.
    pub regions: Vec<String>,
    pub droplet_size: String,
    pub droplet_image: String,
    /// Script fetched and piped to bash on first boot.
    pub installer_url: String,
    /// Script that registers ingestion templates once the search service is up.
    pub templates_url: String,
    /// Administrative key authorized on every host in addition to the project key.
    pub break_glass_key: Option<String>,
    /// Provider SSH keys are named `<key_prefix>-<project id>`.
    pub key_prefix: String,
    pub ssh_user: String,
    pub ssh_port: u16,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            domain: "x.pifft.com".into(),
            regions: vec!["nyc1".into(), "nyc3".into(), "sfo1".into()],
            droplet_size: "4gb".into(),
            droplet_image: "ubuntu-14-04-x64".into(),
            installer_url: "https://s3.pifft.com/oscon2016/install.sh".into(),
            templates_url: "https://s3.pifft.com/oscon2016/create-beats.sh".into(),
            break_glass_key: None,
            key_prefix: "oscon".into(),
            ssh_user: "workshop".into(),
            ssh_port: 22,
        }
    }
}

impl WorkshopConfig {
    /// Record name of a host inside the shared zone, e.g. `shell.abc1234`.
    pub fn record_name(&self, alias: &str, project_id: &str) -> String {
        format!("{alias}.{project_id}")
    }

    /// Fully qualified name of a host, e.g. `shell.abc1234.x.pifft.com`.
    pub fn host_name(&self, alias: &str, project_id: &str) -> String {
        format!("{alias}.{project_id}.{}", self.domain)
    }

    /// Name of the provider SSH key belonging to a project.
    pub fn key_name(&self, project_id: &str) -> String {
        format!("{}-{project_id}", self.key_prefix)
    }

    /// Pick a region at random, or `None` if none are configured.
    pub fn pick_region(&self) -> Option<&str> {
        use rand::seq::IndexedRandom;
        self.regions.choose(&mut rand::rng()).map(String::as_str)
    }
}
