use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::cloud_init::{self, BootPayload};
use crate::keys::KeyPair;
use crate::types::{HostSpec, NewDomainRecord, WorkshopConfig};
use crate::{Account, Error, Result};

/// Alias of the single host booted per project.
pub const SHELL_ALIAS: &str = "shell";

const PROJECT_ID_LEN: usize = 7;

/// Generate a fresh project identifier: the first 7 hex characters of the
/// SHA-256 digest of a random UUID.
pub fn generate_project_id() -> String {
    let digest = Sha256::digest(uuid::Uuid::new_v4().to_string().as_bytes());
    let mut id: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    id.truncate(PROJECT_ID_LEN);
    id
}

/// What a successful boot hands back to the caller.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub key_pair: KeyPair,
    pub project_id: String,
    /// Fully qualified name of the shell host.
    pub hostname: String,
    pub address: String,
}

/// Creates the `shell` host of a project and publishes its DNS record.
pub struct ShellBooter {
    config: Arc<WorkshopConfig>,
}

impl ShellBooter {
    pub fn new(config: Arc<WorkshopConfig>) -> Self {
        Self { config }
    }

    /// Boot a shell host for `project_id` on `account` in `region`; the DNS
    /// record is written through `dns`, which owns the shared zone.
    ///
    /// Every step must succeed; the first failure aborts the boot and is
    /// returned as-is. Nothing created before the failure is cleaned up.
    pub async fn boot(
        &self,
        project_id: &str,
        account: &Account,
        dns: &Account,
        region: &str,
    ) -> Result<ShellConfig> {
        let key_pair = KeyPair::generate()?;

        let user_data = cloud_init::render(&BootPayload {
            public_key: key_pair.public_key(),
            break_glass_key: self.config.break_glass_key.as_deref(),
            project_id,
            region,
            token: &account.token,
            installer_url: &self.config.installer_url,
        })?;

        let name = self.config.record_name(SHELL_ALIAS, project_id);
        let created = account
            .provider
            .create_host(&HostSpec {
                name: name.clone(),
                region: region.to_string(),
                size: self.config.droplet_size.clone(),
                image: self.config.droplet_image.clone(),
                user_data,
            })
            .await?;

        let action = created.action("create").ok_or(Error::NoCreateAction)?;
        info!(project_id, host = %name, action_id = action.id, "booter: waiting for host");
        account.provider.wait_until_active(action).await?;

        let host = account.provider.get_host(created.host.id).await?;
        let address = host
            .public_ipv4
            .ok_or_else(|| Error::NoPublicAddress(name.clone()))?;

        dns.provider
            .create_domain_record(
                &self.config.domain,
                &NewDomainRecord {
                    kind: "A".into(),
                    name: name.clone(),
                    data: address.clone(),
                },
            )
            .await?;

        let hostname = self.config.host_name(SHELL_ALIAS, project_id);
        info!(project_id, %hostname, %address, "booter: shell is up");

        Ok(ShellConfig {
            key_pair,
            project_id: project_id.to_string(),
            hostname,
            address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;

    fn setup() -> (Arc<FakeProvider>, Account, Arc<FakeProvider>, Account) {
        let (pool, account) = FakeProvider::account("pool-token");
        let (master, dns) = FakeProvider::account("master-token");
        (pool, account, master, dns)
    }

    #[test]
    fn project_ids_are_seven_hex_chars() {
        let id = generate_project_id();
        assert_eq!(id.len(), 7);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_project_id());
    }

    #[tokio::test]
    async fn boot_creates_host_and_record() {
        let (pool, account, master, dns) = setup();
        let booter = ShellBooter::new(Arc::new(WorkshopConfig::default()));

        let shell = booter.boot("abc1234", &account, &dns, "nyc3").await.unwrap();

        assert_eq!(shell.hostname, "shell.abc1234.x.pifft.com");
        assert_eq!(shell.project_id, "abc1234");

        let hosts = pool.created_hosts();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "shell.abc1234");
        assert_eq!(hosts[0].region, "nyc3");
        assert_eq!(hosts[0].size, "4gb");

        // DNS goes through the master account only.
        assert!(pool.created_records().is_empty());
        let records = master.created_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "x.pifft.com");
        assert_eq!(
            records[0].1,
            NewDomainRecord {
                kind: "A".into(),
                name: "shell.abc1234".into(),
                data: shell.address.clone(),
            }
        );
    }

    #[tokio::test]
    async fn boot_payload_carries_project_values() {
        let (pool, account, _master, dns) = setup();
        let booter = ShellBooter::new(Arc::new(WorkshopConfig::default()));

        let shell = booter.boot("abc1234", &account, &dns, "sfo1").await.unwrap();

        let user_data = pool.created_hosts()[0].user_data.clone();
        let config = cloud_init::parse(&user_data).unwrap();
        let file =
            |path: &str| String::from_utf8(config.file(path).unwrap().decode().unwrap()).unwrap();

        assert_eq!(file(cloud_init::PROJECT_ID_PATH), "abc1234");
        assert_eq!(file(cloud_init::REGION_PATH), "sfo1");
        assert_eq!(file(cloud_init::TOKEN_PATH), "pool-token");
        assert_eq!(config.users[0].ssh_authorized_keys[0], shell.key_pair.public_key());
    }

    #[tokio::test]
    async fn missing_create_action_aborts_before_dns() {
        let (pool, account, master, dns) = setup();
        pool.omit_create_action();
        let booter = ShellBooter::new(Arc::new(WorkshopConfig::default()));

        let err = booter.boot("abc1234", &account, &dns, "nyc1").await.unwrap_err();

        assert!(matches!(err, Error::NoCreateAction));
        assert_eq!(pool.wait_calls(), 0);
        assert!(master.created_records().is_empty());
    }
}
