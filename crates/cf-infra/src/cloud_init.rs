//! First-boot payload for workshop hosts.
//!
//! The payload is a `#cloud-config` document. Every value the host's
//! bootstrap scripts read back (`/etc/project-id`, `/etc/project-region`,
//! `/etc/digitalocean-token`, the installer) is shipped as a base64 encoded
//! `write_files` entry; the scripts on the image depend on exactly these paths.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::Result;

const HEADER: &str = "#cloud-config\n";
const WORKSHOP_USER: &str = "workshop";
const INSTALLER_PATH: &str = "/usr/local/bin/install-shell.sh";

pub const PROJECT_ID_PATH: &str = "/etc/project-id";
pub const REGION_PATH: &str = "/etc/project-region";
pub const TOKEN_PATH: &str = "/etc/digitalocean-token";
pub const AUTHORIZED_KEYS_PATH: &str = "/etc/workshop-authorized-keys";

/// Values rendered into a host's boot payload.
pub struct BootPayload<'a> {
    pub public_key: &'a str,
    pub break_glass_key: Option<&'a str>,
    pub project_id: &'a str,
    pub region: &'a str,
    pub token: &'a str,
    pub installer_url: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    pub users: Vec<CloudUser>,
    pub write_files: Vec<WriteFile>,
    pub package_update: bool,
    pub apt_sources: Vec<AptSource>,
    pub packages: Vec<String>,
    pub runcmd: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudUser {
    pub name: String,
    pub shell: String,
    pub sudo: Vec<String>,
    #[serde(rename = "ssh-authorized-keys")]
    pub ssh_authorized_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFile {
    pub encoding: String,
    pub content: String,
    pub owner: String,
    pub path: String,
    pub permissions: String,
}

impl WriteFile {
    fn b64(path: &str, content: &[u8], permissions: &str) -> Self {
        Self {
            encoding: "b64".into(),
            content: STANDARD.encode(content),
            owner: "root:root".into(),
            path: path.into(),
            permissions: permissions.into(),
        }
    }

    /// Decoded file contents.
    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(STANDARD.decode(&self.content)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AptSource {
    pub source: String,
}

impl CloudConfig {
    pub fn file(&self, path: &str) -> Option<&WriteFile> {
        self.write_files.iter().find(|f| f.path == path)
    }
}

fn installer_script(installer_url: &str) -> String {
    format!("#!/usr/bin/env bash\n\ncurl -s {installer_url} | bash\n")
}

/// Build the cloud-config document for a workshop host.
pub fn build(payload: &BootPayload<'_>) -> CloudConfig {
    let mut authorized = vec![payload.public_key.trim().to_string()];
    if let Some(key) = payload.break_glass_key {
        authorized.push(key.trim().to_string());
    }
    let authorized_file = authorized.join("\n") + "\n";

    CloudConfig {
        users: vec![CloudUser {
            name: WORKSHOP_USER.into(),
            shell: "/bin/bash".into(),
            sudo: vec!["ALL=(ALL) NOPASSWD:ALL".into()],
            ssh_authorized_keys: authorized,
        }],
        write_files: vec![
            WriteFile::b64(PROJECT_ID_PATH, payload.project_id.as_bytes(), "0644"),
            WriteFile::b64(REGION_PATH, payload.region.as_bytes(), "0644"),
            WriteFile::b64(TOKEN_PATH, payload.token.as_bytes(), "0644"),
            WriteFile::b64(AUTHORIZED_KEYS_PATH, authorized_file.as_bytes(), "0644"),
            WriteFile::b64(
                INSTALLER_PATH,
                installer_script(payload.installer_url).as_bytes(),
                "0755",
            ),
        ],
        package_update: true,
        apt_sources: vec![
            AptSource {
                source: "ppa:gluster/glusterfs-3.5".into(),
            },
            AptSource {
                source: "ppa:ansible/ansible".into(),
            },
        ],
        packages: vec![
            "glusterfs-client".into(),
            "glusterfs-server".into(),
            "ansible".into(),
        ],
        runcmd: vec![vec![INSTALLER_PATH.into()]],
    }
}

/// Render the payload as `#cloud-config` user data.
pub fn render(payload: &BootPayload<'_>) -> Result<String> {
    let body = serde_yaml::to_string(&build(payload))?;
    Ok(format!("{HEADER}{body}"))
}

/// Parse user data produced by [`render`].
pub fn parse(user_data: &str) -> Result<CloudConfig> {
    Ok(serde_yaml::from_str(user_data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;

    fn payload<'a>(public_key: &'a str, break_glass_key: Option<&'a str>) -> BootPayload<'a> {
        BootPayload {
            public_key,
            break_glass_key,
            project_id: "abc1234",
            region: "nyc3",
            token: "do-token",
            installer_url: "https://example.com/install.sh",
        }
    }

    #[test]
    fn public_key_survives_render_and_decode() {
        let keys = KeyPair::generate().unwrap();
        let rendered = render(&payload(keys.public_key(), None)).unwrap();
        assert!(rendered.starts_with("#cloud-config\n"));

        let config = parse(&rendered).unwrap();
        assert_eq!(
            config.users[0].ssh_authorized_keys[0].as_bytes(),
            keys.public_key().as_bytes()
        );

        let authorized = config.file(AUTHORIZED_KEYS_PATH).unwrap().decode().unwrap();
        let first_line = authorized.split(|b| *b == b'\n').next().unwrap();
        assert_eq!(first_line, keys.public_key().as_bytes());
    }

    #[test]
    fn break_glass_key_is_authorized_too() {
        let config = build(&payload("ssh-rsa AAAAproject", Some("ssh-rsa AAAAadmin\n")));

        assert_eq!(
            config.users[0].ssh_authorized_keys,
            vec!["ssh-rsa AAAAproject".to_string(), "ssh-rsa AAAAadmin".to_string()]
        );
        let authorized = config.file(AUTHORIZED_KEYS_PATH).unwrap().decode().unwrap();
        assert_eq!(authorized, b"ssh-rsa AAAAproject\nssh-rsa AAAAadmin\n");
    }

    #[test]
    fn every_file_is_base64() {
        let config = build(&payload("ssh-rsa AAAAproject", None));

        for file in &config.write_files {
            assert_eq!(file.encoding, "b64");
            file.decode().unwrap();
        }
        let installer = config.file(INSTALLER_PATH).unwrap();
        assert_eq!(installer.permissions, "0755");
        let script = String::from_utf8(installer.decode().unwrap()).unwrap();
        assert!(script.contains("curl -s https://example.com/install.sh | bash"));
        assert_eq!(config.runcmd, vec![vec![INSTALLER_PATH.to_string()]]);
    }
}
