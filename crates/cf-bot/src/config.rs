use std::env;
use std::net::SocketAddr;

use cf_infra::types::WorkshopConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub slack_bot_token: String,
    pub slack_app_token: String,
    pub digitalocean_tokens: Vec<String>,
    pub digitalocean_master_token: Option<String>,
    pub redis_url: String,
    pub http_addr: SocketAddr,
    pub workshop: WorkshopConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
    }

    fn from_lookup(get: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let digitalocean_tokens = list(&required("CONFBOT_DIGITALOCEAN_TOKENS")?);
        if digitalocean_tokens.is_empty() {
            return Err(ConfigError::Missing("CONFBOT_DIGITALOCEAN_TOKENS"));
        }

        let http_addr = get("CONFBOT_HTTP_ADDR").unwrap_or_else(|| "127.0.0.1:8080".into());
        let http_addr = http_addr.parse().map_err(|_| ConfigError::Invalid {
            name: "CONFBOT_HTTP_ADDR",
            value: http_addr.clone(),
        })?;

        let defaults = WorkshopConfig::default();
        let regions = match get("CONFBOT_REGIONS") {
            Some(raw) => {
                let regions = list(&raw);
                if regions.is_empty() {
                    return Err(ConfigError::Invalid {
                        name: "CONFBOT_REGIONS",
                        value: raw,
                    });
                }
                regions
            }
            None => defaults.regions,
        };

        let workshop = WorkshopConfig {
            domain: get("CONFBOT_DOMAIN").unwrap_or(defaults.domain),
            regions,
            droplet_size: get("CONFBOT_DROPLET_SIZE").unwrap_or(defaults.droplet_size),
            droplet_image: get("CONFBOT_DROPLET_IMAGE").unwrap_or(defaults.droplet_image),
            installer_url: get("CONFBOT_INSTALLER_URL").unwrap_or(defaults.installer_url),
            templates_url: get("CONFBOT_TEMPLATES_URL").unwrap_or(defaults.templates_url),
            break_glass_key: get("CONFBOT_BREAK_GLASS_KEY"),
            key_prefix: get("CONFBOT_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            ..defaults
        };

        Ok(Self {
            env: get("CONFBOT_ENV").unwrap_or_else(|| "development".into()),
            slack_bot_token: required("CONFBOT_SLACK_BOT_TOKEN")?,
            slack_app_token: required("CONFBOT_SLACK_APP_TOKEN")?,
            digitalocean_tokens,
            digitalocean_master_token: get("CONFBOT_DIGITALOCEAN_MASTER_TOKEN"),
            redis_url: required("REDIS_URL")?,
            http_addr,
            workshop,
        })
    }
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("CONFBOT_SLACK_BOT_TOKEN", "xoxb-1"),
        ("CONFBOT_SLACK_APP_TOKEN", "xapp-1"),
        ("CONFBOT_DIGITALOCEAN_TOKENS", "a, b,,c"),
        ("REDIS_URL", "redis://127.0.0.1:6379"),
    ];

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.env, "development");
        assert_eq!(config.digitalocean_tokens, vec!["a", "b", "c"]);
        assert_eq!(config.digitalocean_master_token, None);
        assert_eq!(config.http_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.workshop.domain, "x.pifft.com");
        assert_eq!(config.workshop.regions, vec!["nyc1", "nyc3", "sfo1"]);
        assert_eq!(config.workshop.ssh_user, "workshop");
    }

    #[test]
    fn overrides_apply() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("CONFBOT_ENV", "production"),
            ("CONFBOT_DOMAIN", "example.net"),
            ("CONFBOT_REGIONS", "ams3"),
            ("CONFBOT_KEY_PREFIX", "ws"),
            ("CONFBOT_DIGITALOCEAN_MASTER_TOKEN", "m"),
        ]);
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.env, "production");
        assert_eq!(config.workshop.domain, "example.net");
        assert_eq!(config.workshop.regions, vec!["ams3"]);
        assert_eq!(config.workshop.key_name("abc1234"), "ws-abc1234");
        assert_eq!(config.digitalocean_master_token.as_deref(), Some("m"));
    }

    #[test]
    fn missing_and_invalid_values_are_reported() {
        let err = AppConfig::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CONFBOT_SLACK_BOT_TOKEN")));

        let mut vars = REQUIRED.to_vec();
        vars.push(("CONFBOT_HTTP_ADDR", "not an address"));
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CONFBOT_HTTP_ADDR", .. }));
    }
}
