//! In-process collaborators for handler tests.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cf_infra::AccountPool;
use cf_infra::testing::FakeProvider;
use cf_infra::types::WorkshopConfig;
use cf_store::{MemoryStore, ProjectRegistry};
use parking_lot::Mutex;
use slack_api::Attachment;

use crate::chat::{ChatResult, ChatTransport, IncomingMessage, MessageRef};
use crate::readiness::{ReadinessPolicy, ServiceProbe};
use crate::ssh::{RemoteExecutor, SshError};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct Posted {
    pub channel: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub channel: String,
    pub filename: String,
    pub content: Vec<u8>,
}

/// Chat transport that records everything. Direct channels are named `D<user>`.
#[derive(Default)]
pub struct FakeChat {
    posted: Mutex<Vec<Posted>>,
    uploads: Mutex<Vec<Upload>>,
    reactions: Mutex<Vec<(String, MessageRef, String)>>,
}

impl FakeChat {
    pub fn texts(&self) -> Vec<String> {
        self.posted.lock().iter().map(|p| p.text.clone()).collect()
    }

    pub fn posted(&self) -> Vec<Posted> {
        self.posted.lock().clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().clone()
    }

    /// `(op, message, name)` with op `add` or `remove`.
    pub fn reactions(&self) -> Vec<(String, MessageRef, String)> {
        self.reactions.lock().clone()
    }
}

#[async_trait]
impl ChatTransport for FakeChat {
    async fn open_direct_channel(&self, user_id: &str) -> ChatResult<String> {
        Ok(format!("D{user_id}"))
    }

    async fn post_to_channel(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> ChatResult<MessageRef> {
        let mut posted = self.posted.lock();
        posted.push(Posted {
            channel: channel.to_string(),
            text: text.to_string(),
            attachments: attachments.to_vec(),
        });
        Ok(MessageRef {
            channel: channel.to_string(),
            ts: format!("1000.{}", posted.len()),
        })
    }

    async fn upload_file(&self, channel: &str, filename: &str, content: &[u8]) -> ChatResult<()> {
        self.uploads.lock().push(Upload {
            channel: channel.to_string(),
            filename: filename.to_string(),
            content: content.to_vec(),
        });
        Ok(())
    }

    async fn add_reaction(&self, message: &MessageRef, name: &str) -> ChatResult<()> {
        self.reactions
            .lock()
            .push(("add".into(), message.clone(), name.to_string()));
        Ok(())
    }

    async fn remove_reaction(&self, message: &MessageRef, name: &str) -> ChatResult<()> {
        self.reactions
            .lock()
            .push(("remove".into(), message.clone(), name.to_string()));
        Ok(())
    }

    async fn user_name(&self, user_id: &str) -> ChatResult<String> {
        Ok(format!("name-{user_id}"))
    }
}

/// Executor answering `output of <command>`. Commands containing the `fail_on`
/// needle exit with status 1; those containing the `kill_on` needle die by signal.
#[derive(Default)]
pub struct FakeExecutor {
    fail_on: Mutex<Option<String>>,
    kill_on: Mutex<Option<String>>,
    commands: Mutex<Vec<(String, String, String)>>,
}

impl FakeExecutor {
    pub fn fail_on(&self, needle: &str) {
        *self.fail_on.lock() = Some(needle.to_string());
    }

    pub fn kill_on(&self, needle: &str) {
        *self.kill_on.lock() = Some(needle.to_string());
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().iter().map(|(_, _, c)| c.clone()).collect()
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl RemoteExecutor for FakeExecutor {
    async fn execute(
        &self,
        project_id: &str,
        alias: &str,
        command: &str,
    ) -> Result<String, SshError> {
        self.commands
            .lock()
            .push((project_id.to_string(), alias.to_string(), command.to_string()));

        let matches = |needle: &Mutex<Option<String>>| {
            needle.lock().as_deref().is_some_and(|n| command.contains(n))
        };
        if matches(&self.kill_on) {
            return Err(SshError::Signal {
                command: command.to_string(),
                signal: "KILL".to_string(),
            });
        }
        if matches(&self.fail_on) {
            return Err(SshError::ExitStatus {
                command: command.to_string(),
                status: 1,
            });
        }
        Ok(format!("output of {command}"))
    }
}

/// Probe that answers once a given number of attempts have been made.
pub struct FakeProbe {
    up_after: Option<u32>,
    attempts: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn up() -> Self {
        Self::up_after(Some(1))
    }

    pub fn never_up() -> Self {
        Self::up_after(None)
    }

    pub fn up_after(attempt: Option<u32>) -> Self {
        Self {
            up_after: attempt,
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn probed(&self) -> Vec<String> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl ServiceProbe for FakeProbe {
    async fn probe(&self, addr: &str, _timeout: Duration) -> io::Result<()> {
        let mut attempts = self.attempts.lock();
        attempts.push(addr.to_string());
        match self.up_after {
            Some(n) if attempts.len() as u32 >= n => Ok(()),
            _ => Err(io::Error::from(io::ErrorKind::ConnectionRefused)),
        }
    }
}

pub struct Harness {
    pub state: AppState,
    pub chat: Arc<FakeChat>,
    pub pool: Arc<FakeProvider>,
    pub master: Arc<FakeProvider>,
    pub executor: Arc<FakeExecutor>,
    pub probe: Arc<FakeProbe>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_probe(FakeProbe::up())
    }

    pub fn with_probe(probe: FakeProbe) -> Self {
        let chat = Arc::new(FakeChat::default());
        let (pool, account) = FakeProvider::account("pool-token");
        let (master, dns) = FakeProvider::account("master-token");
        let executor = Arc::new(FakeExecutor::default());
        let probe = Arc::new(probe);
        let registry = Arc::new(ProjectRegistry::new(Arc::new(MemoryStore::new()), "test"));

        let mut state = AppState::new(
            chat.clone(),
            registry,
            AccountPool::new(vec![account], dns).expect("pool"),
            Arc::new(WorkshopConfig::default()),
            executor.clone(),
            probe.clone(),
        );
        state.readiness = ReadinessPolicy {
            attempts: 5,
            dial_timeout: Duration::from_millis(10),
        };

        Self {
            state,
            chat,
            pool,
            master,
            executor,
            probe,
        }
    }

    pub fn message(user: &str, text: &str) -> IncomingMessage {
        IncomingMessage {
            user: user.to_string(),
            channel: format!("C-{user}"),
            text: text.to_string(),
        }
    }
}
