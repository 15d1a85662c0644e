//! In-process cloud provider for tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::{
    ActionRef, CreatedHost, DomainRecord, Host, HostId, HostSpec, NewDomainRecord, Page, SshKey,
};
use crate::{Account, CloudProvider, Error, Result};

const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Default)]
struct State {
    next_id: u64,
    hosts: Vec<Host>,
    keys: Vec<SshKey>,
    records: Vec<(String, DomainRecord)>,

    created_hosts: Vec<HostSpec>,
    created_records: Vec<(String, NewDomainRecord)>,
    deleted_hosts: Vec<HostId>,
    deleted_keys: Vec<u64>,
    deleted_records: Vec<u64>,
    list_calls: Vec<(&'static str, u32)>,
    wait_calls: usize,

    omit_create_action: bool,
    fail_host_deletes: bool,
}

impl State {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Fake provider keeping hosts, keys and DNS records in memory.
///
/// Listings are split into pages of `page_size` items. Hosts get addresses
/// from the `203.0.113.0/24` documentation range.
pub struct FakeProvider {
    page_size: usize,
    state: Mutex<State>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            state: Mutex::new(State::default()),
        }
    }

    /// A fresh fake wrapped in an [`Account`]; the `Arc` stays usable for assertions.
    pub fn account(token: &str) -> (Arc<Self>, Account) {
        Self::into_account(Arc::new(Self::new()), token)
    }

    pub fn into_account(fake: Arc<Self>, token: &str) -> (Arc<Self>, Account) {
        let account = Account {
            token: token.to_string(),
            provider: fake.clone(),
        };
        (fake, account)
    }

    // ── Seeding ──

    pub fn add_host(&self, name: &str) -> HostId {
        let mut state = self.state.lock();
        let id = state.id();
        state.hosts.push(Host {
            id: HostId(id),
            name: name.to_string(),
            status: "active".into(),
            public_ipv4: Some(format!("203.0.113.{}", id % 255)),
        });
        HostId(id)
    }

    pub fn add_key(&self, name: &str) -> u64 {
        let mut state = self.state.lock();
        let id = state.id();
        state.keys.push(SshKey {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_record(&self, zone: &str, kind: &str, name: &str, data: &str) -> u64 {
        let mut state = self.state.lock();
        let id = state.id();
        state.records.push((
            zone.to_string(),
            DomainRecord {
                id,
                kind: kind.into(),
                name: name.into(),
                data: data.into(),
            },
        ));
        id
    }

    // ── Failure switches ──

    /// Leave the `create` action out of creation responses.
    pub fn omit_create_action(&self) {
        self.state.lock().omit_create_action = true;
    }

    pub fn fail_host_deletes(&self) {
        self.state.lock().fail_host_deletes = true;
    }

    // ── Inspection ──

    pub fn created_hosts(&self) -> Vec<HostSpec> {
        self.state.lock().created_hosts.clone()
    }

    pub fn created_records(&self) -> Vec<(String, NewDomainRecord)> {
        self.state.lock().created_records.clone()
    }

    pub fn hosts(&self) -> Vec<Host> {
        self.state.lock().hosts.clone()
    }

    pub fn keys(&self) -> Vec<SshKey> {
        self.state.lock().keys.clone()
    }

    pub fn records(&self) -> Vec<DomainRecord> {
        self.state.lock().records.iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn deleted_hosts(&self) -> Vec<HostId> {
        self.state.lock().deleted_hosts.clone()
    }

    pub fn deleted_keys(&self) -> Vec<u64> {
        self.state.lock().deleted_keys.clone()
    }

    pub fn deleted_records(&self) -> Vec<u64> {
        self.state.lock().deleted_records.clone()
    }

    /// Page numbers requested from the given listing (`"hosts"`, `"keys"` or `"records"`).
    pub fn pages_requested(&self, listing: &str) -> Vec<u32> {
        self.state
            .lock()
            .list_calls
            .iter()
            .filter(|(name, _)| *name == listing)
            .map(|(_, page)| *page)
            .collect()
    }

    pub fn wait_calls(&self) -> usize {
        self.state.lock().wait_calls
    }

    fn paginate<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        let start = (page.saturating_sub(1) as usize) * self.page_size;
        let end = (start + self.page_size).min(items.len());
        Page {
            items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
            last: end >= items.len(),
        }
    }

    fn not_found(what: &str, id: u64) -> Error {
        Error::Provider(format!("{what}/{id} not found"))
    }
}

#[async_trait]
impl CloudProvider for FakeProvider {
    async fn create_host(&self, spec: &HostSpec) -> Result<CreatedHost> {
        let mut state = self.state.lock();
        state.created_hosts.push(spec.clone());

        let id = state.id();
        let host = Host {
            id: HostId(id),
            name: spec.name.clone(),
            status: "new".into(),
            public_ipv4: None,
        };
        state.hosts.push(Host {
            status: "active".into(),
            public_ipv4: Some(format!("203.0.113.{}", id % 255)),
            ..host.clone()
        });

        let actions = if state.omit_create_action {
            Vec::new()
        } else {
            let action_id = state.id();
            vec![ActionRef {
                id: action_id,
                rel: "create".into(),
                href: format!("fake://actions/{action_id}"),
            }]
        };

        Ok(CreatedHost { host, actions })
    }

    async fn wait_until_active(&self, _action: &ActionRef) -> Result<()> {
        self.state.lock().wait_calls += 1;
        Ok(())
    }

    async fn get_host(&self, id: HostId) -> Result<Host> {
        self.state
            .lock()
            .hosts
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found("droplets", id.0))
    }

    async fn list_hosts(&self, page: u32) -> Result<Page<Host>> {
        let hosts = {
            let mut state = self.state.lock();
            state.list_calls.push(("hosts", page));
            state.hosts.clone()
        };
        Ok(self.paginate(&hosts, page))
    }

    async fn delete_host(&self, id: HostId) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_host_deletes {
            return Err(Error::Provider(format!("droplets/{} delete failed", id.0)));
        }
        state.hosts.retain(|h| h.id != id);
        state.deleted_hosts.push(id);
        Ok(())
    }

    async fn list_keys(&self, page: u32) -> Result<Page<SshKey>> {
        let keys = {
            let mut state = self.state.lock();
            state.list_calls.push(("keys", page));
            state.keys.clone()
        };
        Ok(self.paginate(&keys, page))
    }

    async fn delete_key(&self, id: u64) -> Result<()> {
        let mut state = self.state.lock();
        state.keys.retain(|k| k.id != id);
        state.deleted_keys.push(id);
        Ok(())
    }

    async fn list_domain_records(&self, zone: &str, page: u32) -> Result<Page<DomainRecord>> {
        let records: Vec<DomainRecord> = {
            let mut state = self.state.lock();
            state.list_calls.push(("records", page));
            state
                .records
                .iter()
                .filter(|(z, _)| z == zone)
                .map(|(_, r)| r.clone())
                .collect()
        };
        Ok(self.paginate(&records, page))
    }

    async fn create_domain_record(&self, zone: &str, record: &NewDomainRecord) -> Result<()> {
        let mut state = self.state.lock();
        state.created_records.push((zone.to_string(), record.clone()));
        let id = state.id();
        state.records.push((
            zone.to_string(),
            DomainRecord {
                id,
                kind: record.kind.clone(),
                name: record.name.clone(),
                data: record.data.clone(),
            },
        ));
        Ok(())
    }

    async fn delete_domain_record(&self, _zone: &str, id: u64) -> Result<()> {
        let mut state = self.state.lock();
        state.records.retain(|(_, r)| r.id != id);
        state.deleted_records.push(id);
        Ok(())
    }
}
