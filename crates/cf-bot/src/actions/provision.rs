use tracing::info;

use super::project_or_notice;
use crate::dispatch::Command;
use crate::error::BotError;
use crate::provision::Provision;
use crate::state::AppState;

/// `./provision`: run the provisioning state machine for the caller's project,
/// reporting to the channel the command came from.
pub async fn run(state: AppState, cmd: Command) -> Result<(), BotError> {
    let user_id = cmd.user();
    let Some(project_id) = project_or_notice(&state, user_id).await? else {
        return Ok(());
    };

    info!(user_id, %project_id, "provision: creating provisioner");
    let outcome = Provision::new(state, user_id, &project_id, &cmd.message.channel)
        .run()
        .await;
    info!(user_id, %project_id, succeeded = outcome.succeeded(), "provision: run finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn provisions_in_the_calling_channel() {
        let h = Harness::new();
        h.state.registry.register("abc1234", "U1").await.unwrap();

        let cmd = Command {
            message: Harness::message("U1", "./provision"),
            args: Vec::new(),
        };
        run(h.state.clone(), cmd).await.unwrap();

        assert_eq!(h.executor.commands().len(), 5);
        assert!(h.chat.posted().iter().all(|p| p.channel == "C-U1"));
        assert_eq!(h.chat.texts()[0], "*Provisioning process started*");
    }

    #[tokio::test]
    async fn nothing_runs_without_a_project() {
        let h = Harness::new();

        let cmd = Command {
            message: Harness::message("U1", "./provision"),
            args: Vec::new(),
        };
        run(h.state.clone(), cmd).await.unwrap();

        assert!(h.executor.commands().is_empty());
        assert_eq!(h.chat.posted()[0].channel, "DU1");
    }
}
