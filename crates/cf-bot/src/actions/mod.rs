//! Chat command handlers, one module per command.

pub mod boot_shell;
pub mod configure_ssh;
pub mod delete;
pub mod hello;
pub mod help;
pub mod provision;
pub mod reset;
pub mod settings;

use cf_store::ErrorKind;

use crate::dispatch::Dispatcher;
use crate::error::BotError;
use crate::state::AppState;

const NO_PROJECT: &str = "It doesn't look like you have a project defined. To start a new \
     project, tell me to `./boot shell`";

/// Register every command with its trigger.
pub fn register_all(dispatcher: &mut Dispatcher) -> Result<(), BotError> {
    dispatcher.add("boot-shell", r"\./boot shell", boot_shell::run)?;
    dispatcher.add("provision", r"\./provision", provision::run)?;
    dispatcher.add("delete", r"\./delete", delete::run)?;
    dispatcher.add("reset", r"\./reset", reset::run)?;
    dispatcher.add("configure-ssh", r"\./configure ssh (\w+)", configure_ssh::run)?;
    dispatcher.add("settings", r"\./settings", settings::run)?;
    dispatcher.add("hello", r"\./hello\b", hello::run)?;
    dispatcher.add("help", r"\./help\b", help::run)?;
    Ok(())
}

/// The caller's project id, or `None` after telling them they have none.
async fn project_or_notice(state: &AppState, user_id: &str) -> Result<Option<String>, BotError> {
    let project = existing_project(state, user_id).await?;
    if project.is_none() {
        state.chat.im(user_id, NO_PROJECT).await?;
    }
    Ok(project)
}

/// The caller's project id if one is registered.
async fn existing_project(state: &AppState, user_id: &str) -> Result<Option<String>, BotError> {
    match state.registry.project_id_for_user(user_id).await {
        Ok(id) => Ok(Some(id)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
