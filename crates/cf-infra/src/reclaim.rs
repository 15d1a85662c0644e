use std::sync::Arc;

use cf_store::ProjectRegistry;
use tracing::info;

use crate::types::WorkshopConfig;
use crate::{AccountPool, Result, collect_pages};

/// Deletes every cloud resource named after a project, then forgets the
/// project in the registry.
///
/// Resources are found by name alone: DNS records and hosts whose name ends
/// with the project id, and the provider key named `<prefix>-<project id>`.
/// The steps are independent calls so that callers can report progress
/// between them. A failing step leaves whatever was deleted before it gone.
pub struct Reclaimer {
    pool: AccountPool,
    registry: Arc<ProjectRegistry>,
    config: Arc<WorkshopConfig>,
}

impl Reclaimer {
    pub fn new(
        pool: AccountPool,
        registry: Arc<ProjectRegistry>,
        config: Arc<WorkshopConfig>,
    ) -> Self {
        Self {
            pool,
            registry,
            config,
        }
    }

    /// Delete the project's records from the shared zone. Returns how many were removed.
    pub async fn delete_records(&self, project_id: &str) -> Result<usize> {
        let provider = self.pool.master().provider.clone();
        let zone = self.config.domain.clone();

        let records = collect_pages(|page| {
            let provider = provider.clone();
            let zone = zone.clone();
            async move { provider.list_domain_records(&zone, page).await }
        })
        .await?;

        let mut deleted = 0;
        for record in records.iter().filter(|r| r.name.ends_with(project_id)) {
            provider.delete_domain_record(&zone, record.id).await?;
            info!(project_id, record = %record.name, "reclaim: record deleted");
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Delete the project's provider key from every account in the pool.
    pub async fn delete_keys(&self, project_id: &str) -> Result<usize> {
        let key_name = self.config.key_name(project_id);
        let mut deleted = 0;

        for account in self.pool.accounts() {
            let provider = account.provider.clone();
            let keys = collect_pages(|page| {
                let provider = provider.clone();
                async move { provider.list_keys(page).await }
            })
            .await?;

            for key in keys.iter().filter(|k| k.name == key_name) {
                provider.delete_key(key.id).await?;
                info!(project_id, key = %key.name, "reclaim: key deleted");
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Delete the project's hosts from every account in the pool.
    pub async fn delete_hosts(&self, project_id: &str) -> Result<usize> {
        let mut deleted = 0;

        for account in self.pool.accounts() {
            let provider = account.provider.clone();
            let hosts = collect_pages(|page| {
                let provider = provider.clone();
                async move { provider.list_hosts(page).await }
            })
            .await?;

            for host in hosts.iter().filter(|h| h.name.ends_with(project_id)) {
                provider.delete_host(host.id).await?;
                info!(project_id, host = %host.name, host_id = host.id.0, "reclaim: host deleted");
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    pub async fn clear_registry(&self, user_id: &str) -> Result<()> {
        self.registry.reset(user_id).await?;
        Ok(())
    }

    /// Run every step in order, stopping at the first failure.
    pub async fn reclaim(&self, project_id: &str, user_id: &str) -> Result<()> {
        self.delete_records(project_id).await?;
        self.delete_keys(project_id).await?;
        self.delete_hosts(project_id).await?;
        self.clear_registry(user_id).await?;
        info!(project_id, user_id, "reclaim: project removed");
        Ok(())
    }
}
