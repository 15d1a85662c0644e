use tracing::{error, info};

use crate::dispatch::Command;
use crate::error::BotError;
use crate::state::AppState;

/// `./reset`: forget the caller's project without touching cloud resources.
pub async fn run(state: AppState, cmd: Command) -> Result<(), BotError> {
    let user_id = cmd.user();
    info!(user_id, "reset: resetting project");

    state.chat.im(user_id, "resetting your projects").await?;

    if let Err(e) = state.registry.reset(user_id).await {
        error!(user_id, error = %e, "reset: unable to reset project");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn clears_the_registry_entry() {
        let h = Harness::new();
        h.state.registry.register("abc1234", "U1").await.unwrap();

        let cmd = Command {
            message: Harness::message("U1", "./reset"),
            args: Vec::new(),
        };
        run(h.state.clone(), cmd).await.unwrap();

        assert!(h.state.registry.project_id_for_user("U1").await.is_err());
        assert!(h.state.registry.user_for_project("abc1234").await.is_err());
        assert_eq!(h.chat.texts(), vec!["resetting your projects"]);
    }
}
