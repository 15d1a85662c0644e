use tracing::warn;

use super::{NO_PROJECT, existing_project};
use crate::dispatch::Command;
use crate::error::BotError;
use crate::state::AppState;

const BOT_NAME: &str = "confbot";

/// `./hello`: introduce the bot and say whether the caller has a project.
pub async fn run(state: AppState, cmd: Command) -> Result<(), BotError> {
    let user_id = cmd.user();

    let name = match state.chat.user_name(user_id).await {
        Ok(name) => name,
        Err(e) => {
            warn!(user_id, error = %e, "hello: unable to lookup user");
            user_id.to_string()
        }
    };

    state
        .chat
        .im(
            user_id,
            &format!(
                "Hello, *{name}*, I'm {BOT_NAME}, and I will be working with you during the \
                 workshop. I can help you create your environment, and offer help when I can. \
                 To get started, you will have to issue me a command."
            ),
        )
        .await?;

    let reply = match existing_project(&state, user_id).await? {
        Some(id) => format!(
            "It looks like you already have a project (_{id}_) defined. If you require help or \
             want to know what to do next, ask me for help with `./help`"
        ),
        None => NO_PROJECT.to_string(),
    };
    state.chat.im(user_id, &reply).await?;
    Ok(())
}
