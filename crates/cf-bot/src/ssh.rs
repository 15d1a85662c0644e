use std::sync::Arc;

use async_trait::async_trait;
use cf_infra::types::WorkshopConfig;
use cf_store::{ErrorKind, ProjectRegistry};
use russh::keys::{PrivateKeyWithHashAlg, decode_secret_key};
use russh::{ChannelMsg, Disconnect, client};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum SshError {
    #[error("no private key stored for project {0}")]
    KeyUnavailable(String),

    #[error("registry error: {0}")]
    Store(#[from] cf_store::Error),

    #[error("stored private key is not valid utf-8: {0}")]
    KeyEncoding(#[from] std::str::Utf8Error),

    #[error("private key could not be parsed: {0}")]
    Key(#[from] russh::keys::Error),

    #[error("ssh transport error: {0}")]
    Transport(#[from] russh::Error),

    #[error("public key authentication rejected for {user}@{host}")]
    AuthRejected { user: String, host: String },

    #[error("`{command}` exited with status {status}")]
    ExitStatus { command: String, status: u32 },

    #[error("`{command}` was killed by signal {signal}")]
    Signal { command: String, signal: String },

    #[error("`{command}` ended without reporting an exit status")]
    NoExitStatus { command: String },
}

/// Runs one command on a project host and returns its stdout.
#[async_trait]
pub trait RemoteExecutor: Send + Sync + 'static {
    async fn execute(
        &self,
        project_id: &str,
        alias: &str,
        command: &str,
    ) -> Result<String, SshError>;
}

/// Host keys of freshly booted hosts cannot be known in advance, so any key is accepted.
struct AcceptAnyHostKey;

impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// SSH client authenticating with the project's stored private key.
///
/// Every call dials `<alias>.<project>.<domain>`, opens a single session
/// channel, and disconnects before returning. There is no retry and no
/// timeout beyond the transport's own.
pub struct SshClient {
    registry: Arc<ProjectRegistry>,
    config: Arc<WorkshopConfig>,
}

impl SshClient {
    pub fn new(registry: Arc<ProjectRegistry>, config: Arc<WorkshopConfig>) -> Self {
        Self { registry, config }
    }

    async fn private_key(&self, project_id: &str) -> Result<Vec<u8>, SshError> {
        self.registry
            .key_for_project(project_id)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SshError::KeyUnavailable(project_id.to_string()),
                _ => SshError::Store(e),
            })
    }

    async fn run(
        &self,
        session: &mut client::Handle<AcceptAnyHostKey>,
        hostname: &str,
        pem: &[u8],
        command: &str,
    ) -> Result<String, SshError> {
        let key = decode_secret_key(std::str::from_utf8(pem)?, None)?;
        let hash_alg = session.best_supported_rsa_hash().await?.flatten();
        let auth = session
            .authenticate_publickey(
                self.config.ssh_user.as_str(),
                PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
            )
            .await?;
        if !auth.success() {
            return Err(SshError::AuthRejected {
                user: self.config.ssh_user.clone(),
                host: hostname.to_string(),
            });
        }

        let mut channel = session.channel_open_session().await?;
        info!(%hostname, command, "ssh: running command");
        channel.exec(true, command).await?;

        let mut stdout = Vec::new();
        let mut exit_status = None;
        let mut exit_signal = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status: status } => exit_status = Some(status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    exit_signal = Some(format!("{signal_name:?}"))
                }
                _ => {}
            }
        }

        // A signal wins over any status; no status at all means the session
        // went away before the command finished.
        let command = command.to_string();
        match (exit_signal, exit_status) {
            (Some(signal), _) => Err(SshError::Signal { command, signal }),
            (None, Some(0)) => Ok(String::from_utf8_lossy(&stdout).into_owned()),
            (None, Some(status)) => Err(SshError::ExitStatus { command, status }),
            (None, None) => Err(SshError::NoExitStatus { command }),
        }
    }
}

#[async_trait]
impl RemoteExecutor for SshClient {
    async fn execute(
        &self,
        project_id: &str,
        alias: &str,
        command: &str,
    ) -> Result<String, SshError> {
        let pem = self.private_key(project_id).await?;
        let hostname = self.config.host_name(alias, project_id);

        info!(project_id, %hostname, "ssh: dialing");
        let mut session = client::connect(
            Arc::new(client::Config::default()),
            (hostname.as_str(), self.config.ssh_port),
            AcceptAnyHostKey,
        )
        .await?;

        let result = self.run(&mut session, &hostname, &pem, command).await;

        if let Err(e) = session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            debug!(error = %e, %hostname, "ssh: disconnect failed");
        }

        result
    }
}
