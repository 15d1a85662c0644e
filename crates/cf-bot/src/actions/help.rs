use super::existing_project;
use crate::dispatch::Command;
use crate::error::BotError;
use crate::state::AppState;

const HELP_NO_PROJECT: &str = "Hello, it looks like you don't currently have a workshop \
     environment created. To get started run `./boot shell`.";

const HELP_WITH_PROJECT: &str = "Hello, it looks like your workshop environment is in the \
     process of, or has been booted. The instructor will inform you of the next course of actions.";

/// `./help`: point the caller at the next step.
pub async fn run(state: AppState, cmd: Command) -> Result<(), BotError> {
    let user_id = cmd.user();
    let channel = state.chat.open_direct_channel(user_id).await?;

    let msg = match existing_project(&state, user_id).await? {
        Some(_) => HELP_WITH_PROJECT,
        None => HELP_NO_PROJECT,
    };
    state.chat.post_to_channel(&channel, msg, &[]).await?;
    Ok(())
}
