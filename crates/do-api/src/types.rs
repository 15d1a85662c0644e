use serde::{Deserialize, Serialize};

// ── Droplet types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CreateDropletRequest {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Droplet {
    pub id: u64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub networks: Networks,
}

impl Droplet {
    /// First public IPv4 address, if the droplet has been assigned one.
    pub fn public_ipv4(&self) -> Option<&str> {
        self.networks
            .v4
            .iter()
            .find(|n| n.kind == "public")
            .map(|n| n.ip_address.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Networks {
    #[serde(default)]
    pub v4: Vec<NetworkV4>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkV4 {
    pub ip_address: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DropletEnvelope {
    pub droplet: Droplet,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DropletList {
    #[serde(default)]
    pub droplets: Vec<Droplet>,
    #[serde(default)]
    pub links: Links,
}

// ── Actions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LinkAction {
    pub id: u64,
    pub rel: String,
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Action {
    pub id: u64,
    pub status: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionEnvelope {
    pub action: Action,
}

// ── SSH keys ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Key {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyList {
    #[serde(default)]
    pub ssh_keys: Vec<Key>,
    #[serde(default)]
    pub links: Links,
}

// ── Domain records ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DomainRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainRecordEditRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainRecordList {
    #[serde(default)]
    pub domain_records: Vec<DomainRecord>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainRecordEnvelope {
    pub domain_record: DomainRecord,
}

// ── Links / pagination ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub pages: Option<Pages>,
    #[serde(default)]
    pub actions: Vec<LinkAction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pages {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
}

impl Links {
    /// A listing is exhausted once the API stops handing out a `next` link.
    pub fn is_last_page(&self) -> bool {
        self.pages
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .is_none_or(str::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_without_next_link() {
        let links: Links = serde_json::from_value(serde_json::json!({
            "pages": { "first": "https://api.digitalocean.com/v2/droplets?page=1", "prev": "https://api.digitalocean.com/v2/droplets?page=2" }
        }))
        .unwrap();
        assert!(links.is_last_page());

        let links: Links = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(links.is_last_page());
    }

    #[test]
    fn next_link_means_more_pages() {
        let links: Links = serde_json::from_value(serde_json::json!({
            "pages": { "next": "https://api.digitalocean.com/v2/droplets?page=2", "last": "https://api.digitalocean.com/v2/droplets?page=3" }
        }))
        .unwrap();
        assert!(!links.is_last_page());
    }

    #[test]
    fn droplet_public_ipv4_skips_private_networks() {
        let droplet: Droplet = serde_json::from_value(serde_json::json!({
            "id": 3164494,
            "name": "shell.abc1234",
            "status": "active",
            "networks": { "v4": [
                { "ip_address": "10.128.0.2", "type": "private" },
                { "ip_address": "104.236.32.182", "type": "public" }
            ]}
        }))
        .unwrap();
        assert_eq!(droplet.public_ipv4(), Some("104.236.32.182"));
    }

    #[test]
    fn create_response_carries_action_links() {
        let env: DropletEnvelope = serde_json::from_value(serde_json::json!({
            "droplet": { "id": 1, "name": "shell.abc1234", "status": "new" },
            "links": { "actions": [
                { "id": 36805096, "rel": "create", "href": "https://api.digitalocean.com/v2/actions/36805096" }
            ]}
        }))
        .unwrap();
        assert_eq!(env.links.actions.len(), 1);
        assert_eq!(env.links.actions[0].rel, "create");
        assert_eq!(env.links.actions[0].id, 36805096);
    }
}
