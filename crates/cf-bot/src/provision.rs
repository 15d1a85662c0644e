//! Remote provisioning of a booted project.
//!
//! A run walks a fixed sequence of states. Each state posts its progress to
//! the channel the command came from, runs its remote step on the project's
//! `shell` host, and uploads captured output as a log file. The first error
//! moves the run to [`State::Failed`], which announces the failure and ends
//! the run; a new `./provision` starts over from [`State::Init`].

use tracing::{error, info};

use crate::error::BotError;
use crate::readiness;
use crate::state::AppState;

const SHELL: &str = "shell";
const ELASTICSEARCH_PORT: u16 = 9200;

const INFRA_SETUP: &str = "cd /home/workshop/infra && ./setup.sh";
const ENABLE_CA_CERTS: &str = r"sudo perl -pi -e 's/^\!//' /etc/ca-certificates.conf";
const UPDATE_CA_CERTS: &str = "sudo update-ca-certificates";
const ANSIBLE_SETUP: &str = "cd /home/workshop/ansible && ./setup.sh";

const FAILED_MESSAGE: &str = "*Provisioning process Failed* All was not well with the provisioning \
     process. This is expected as the cloud is a chaotic environment. To restart the provision \
     process issue the `./provision` command.";

const COMPLETE_MESSAGE: &str = "Your environment is ready to go. Before you can use it, you will \
     need to configure your ssh client. I can assist you with directions for Linux, Mac, or \
     Windows. To start this process, issue the `./configure ssh <type>` command substituting \
     <type> with *linux*, *mac*, or *windows*.";

#[derive(Debug)]
pub enum State {
    Init,
    Infra,
    Certs,
    Ansible,
    ElasticsearchWait,
    TelemetryUpload,
    Complete,
    Failed(BotError),
    Done,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Init => "init",
            State::Infra => "infra",
            State::Certs => "certs",
            State::Ansible => "ansible",
            State::ElasticsearchWait => "elasticsearch-wait",
            State::TelemetryUpload => "telemetry-upload",
            State::Complete => "complete",
            State::Failed(_) => "failed",
            State::Done => "done",
        }
    }

    /// Perform this state's work and return the next state.
    async fn transition(self, run: &Provision) -> State {
        info!(project_id = %run.project_id, state = self.name(), "provision: entering state");
        let next = match self {
            State::Init => run.init().await,
            State::Infra => run.infra().await,
            State::Certs => run.certs().await,
            State::Ansible => run.ansible().await,
            State::ElasticsearchWait => run.elasticsearch_wait().await,
            State::TelemetryUpload => run.telemetry_upload().await,
            State::Complete => run.complete().await,
            State::Failed(err) => {
                run.fail(&err).await;
                return State::Done;
            }
            State::Done => return State::Done,
        };
        next.unwrap_or_else(State::Failed)
    }
}

/// What a finished run went through.
#[derive(Debug)]
pub struct Outcome {
    /// Names of the states entered, in order, excluding the terminal `done`.
    pub visited: Vec<&'static str>,
    pub error: Option<String>,
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// One provisioning run for a project, reporting to one channel.
pub struct Provision {
    state: AppState,
    user_id: String,
    project_id: String,
    channel: String,
}

impl Provision {
    pub fn new(state: AppState, user_id: &str, project_id: &str, channel: &str) -> Self {
        Self {
            state,
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            channel: channel.to_string(),
        }
    }

    pub async fn run(&self) -> Outcome {
        info!(user_id = %self.user_id, project_id = %self.project_id, "provision: starting run");
        let mut visited = Vec::new();
        let mut error = None;
        let mut current = State::Init;

        loop {
            if let State::Done = current {
                break;
            }
            if let State::Failed(err) = &current {
                error = Some(err.to_string());
            }
            visited.push(current.name());
            current = current.transition(self).await;
        }

        Outcome { visited, error }
    }

    async fn say(&self, text: &str) -> Result<(), BotError> {
        self.state.chat.post_to_channel(&self.channel, text, &[]).await?;
        Ok(())
    }

    async fn exec(&self, command: &str) -> Result<String, BotError> {
        Ok(self
            .state
            .executor
            .execute(&self.project_id, SHELL, command)
            .await?)
    }

    async fn upload(&self, filename: &str, output: &str) -> Result<(), BotError> {
        self.state
            .chat
            .upload_file(&self.channel, filename, output.as_bytes())
            .await
            .inspect_err(|e| error!(error = %e, filename, "provision: upload failed"))?;
        Ok(())
    }

    async fn init(&self) -> Result<State, BotError> {
        self.say("*Provisioning process started*").await?;
        Ok(State::Infra)
    }

    async fn infra(&self) -> Result<State, BotError> {
        self.say("*... Creating hosts and certificates*").await?;
        let out = self.exec(INFRA_SETUP).await?;
        self.upload("infra-provision.txt", &out).await?;
        self.say("*... Hosts and certificates are up to date*").await?;
        Ok(State::Certs)
    }

    async fn certs(&self) -> Result<State, BotError> {
        self.say("*...Making sure root certificates are up to date*").await?;
        self.exec(ENABLE_CA_CERTS).await?;
        let out = self.exec(UPDATE_CA_CERTS).await?;
        self.upload("update-cert.txt", &out).await?;
        Ok(State::Ansible)
    }

    async fn ansible(&self) -> Result<State, BotError> {
        self.say("*... Provisioning services with Ansible. This may take some time*")
            .await?;
        let out = self.exec(ANSIBLE_SETUP).await?;
        self.upload("ansible.txt", &out).await?;
        self.say("*... Ansible provisioning is complete*").await?;
        Ok(State::ElasticsearchWait)
    }

    async fn elasticsearch_wait(&self) -> Result<State, BotError> {
        self.say("*... Waiting for ElasticSearch to become available*")
            .await?;
        let addr = format!(
            "{}:{ELASTICSEARCH_PORT}",
            self.state.workshop.host_name("app", &self.project_id)
        );
        readiness::wait_for_service(self.state.probe.as_ref(), &addr, self.state.readiness)
            .await?;
        self.say("*... ElasticSearch is up and listening*").await?;
        Ok(State::TelemetryUpload)
    }

    async fn telemetry_upload(&self) -> Result<State, BotError> {
        self.say("*... Uploading ElasticSearch templates*").await?;
        let command = format!("curl {} | bash", self.state.workshop.templates_url);
        let out = self.exec(&command).await?;
        self.upload("es.txt", &out).await?;
        self.say("*... ElasticSearch templates have been uploaded*")
            .await?;
        Ok(State::Complete)
    }

    async fn complete(&self) -> Result<State, BotError> {
        info!(project_id = %self.project_id, "provision: complete");
        if let Err(e) = self.say(COMPLETE_MESSAGE).await {
            error!(error = %e, "provision: completion notice failed");
        }
        Ok(State::Done)
    }

    async fn fail(&self, err: &BotError) {
        error!(project_id = %self.project_id, error = %err, "provision: failed");
        if let Err(e) = self.say(FAILED_MESSAGE).await {
            error!(error = %e, "provision: failure notice failed");
        }
    }
}
