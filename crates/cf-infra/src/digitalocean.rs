use std::sync::Arc;

use async_trait::async_trait;
use do_api::{CreateDropletRequest, DoClient, DomainRecordEditRequest, Links};
use tracing::info;

use crate::types::{
    ActionRef, CreatedHost, DomainRecord, Host, HostId, HostSpec, NewDomainRecord, Page, SshKey,
};
use crate::{Account, CloudProvider, Result};

/// DigitalOcean provider; delegates every HTTP call to `do_api::DoClient`.
pub struct DigitalOceanProvider {
    client: DoClient,
}

impl DigitalOceanProvider {
    pub fn new(client: DoClient) -> Self {
        Self { client }
    }

    /// Wrap a token into an [`Account`] backed by this provider.
    pub fn account(token: &str) -> Account {
        Account {
            token: token.to_string(),
            provider: Arc::new(Self::new(DoClient::new(token))),
        }
    }

    fn host(droplet: do_api::Droplet) -> Host {
        Host {
            public_ipv4: droplet.public_ipv4().map(str::to_string),
            id: HostId(droplet.id),
            name: droplet.name,
            status: droplet.status,
        }
    }

    fn page<T>(items: Vec<T>, links: &Links) -> Page<T> {
        Page {
            items,
            last: links.is_last_page(),
        }
    }
}

#[async_trait]
impl CloudProvider for DigitalOceanProvider {
    async fn create_host(&self, spec: &HostSpec) -> Result<CreatedHost> {
        let created = self
            .client
            .create_droplet(&CreateDropletRequest {
                name: spec.name.clone(),
                region: spec.region.clone(),
                size: spec.size.clone(),
                image: spec.image.clone(),
                ssh_keys: Vec::new(),
                user_data: Some(spec.user_data.clone()),
            })
            .await?;

        info!(droplet_id = created.droplet.id, name = %spec.name, "digitalocean: droplet created");

        let actions = created
            .links
            .actions
            .into_iter()
            .map(|a| ActionRef {
                id: a.id,
                rel: a.rel,
                href: a.href,
            })
            .collect();

        Ok(CreatedHost {
            host: Self::host(created.droplet),
            actions,
        })
    }

    async fn wait_until_active(&self, action: &ActionRef) -> Result<()> {
        self.client.wait_for_action(&action.href).await?;
        Ok(())
    }

    async fn get_host(&self, id: HostId) -> Result<Host> {
        let droplet = self.client.get_droplet(id.0).await?;
        Ok(Self::host(droplet))
    }

    async fn list_hosts(&self, page: u32) -> Result<Page<Host>> {
        let list = self.client.list_droplets(page).await?;
        let hosts = list.droplets.into_iter().map(Self::host).collect();
        Ok(Self::page(hosts, &list.links))
    }

    async fn delete_host(&self, id: HostId) -> Result<()> {
        self.client.delete_droplet(id.0).await?;
        info!(droplet_id = id.0, "digitalocean: droplet deleted");
        Ok(())
    }

    async fn list_keys(&self, page: u32) -> Result<Page<SshKey>> {
        let list = self.client.list_keys(page).await?;
        let keys = list
            .ssh_keys
            .into_iter()
            .map(|k| SshKey { id: k.id, name: k.name })
            .collect();
        Ok(Self::page(keys, &list.links))
    }

    async fn delete_key(&self, id: u64) -> Result<()> {
        self.client.delete_key(id).await?;
        info!(key_id = id, "digitalocean: key deleted");
        Ok(())
    }

    async fn list_domain_records(&self, zone: &str, page: u32) -> Result<Page<DomainRecord>> {
        let list = self.client.list_records(zone, page).await?;
        let records = list
            .domain_records
            .into_iter()
            .map(|r| DomainRecord {
                id: r.id,
                kind: r.kind,
                name: r.name,
                data: r.data,
            })
            .collect();
        Ok(Self::page(records, &list.links))
    }

    async fn create_domain_record(&self, zone: &str, record: &NewDomainRecord) -> Result<()> {
        let created = self
            .client
            .create_record(
                zone,
                &DomainRecordEditRequest {
                    kind: record.kind.clone(),
                    name: record.name.clone(),
                    data: record.data.clone(),
                },
            )
            .await?;
        info!(record_id = created.id, name = %created.name, zone, "digitalocean: record created");
        Ok(())
    }

    async fn delete_domain_record(&self, zone: &str, id: u64) -> Result<()> {
        self.client.delete_record(zone, id).await?;
        info!(record_id = id, zone, "digitalocean: record deleted");
        Ok(())
    }
}
