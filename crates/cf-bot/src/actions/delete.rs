use tracing::{error, info};

use super::project_or_notice;
use crate::dispatch::Command;
use crate::error::BotError;
use crate::state::AppState;

/// `./delete`: tear down every resource of the caller's project, reporting each step.
///
/// Stops at the first failing step; whatever was removed before it stays removed.
pub async fn run(state: AppState, cmd: Command) -> Result<(), BotError> {
    let user_id = cmd.user();
    let Some(project_id) = project_or_notice(&state, user_id).await? else {
        return Ok(());
    };

    let result = teardown(&state, user_id, &project_id).await;
    if let Err(e) = &result {
        error!(user_id, %project_id, error = %e, "delete: unable to delete project");
        state
            .chat
            .im(user_id, &format!("unable to delete project _{project_id}_"))
            .await?;
    }
    result
}

async fn teardown(state: &AppState, user_id: &str, project_id: &str) -> Result<(), BotError> {
    let chat = &state.chat;
    let reclaimer = &state.reclaimer;

    chat.im(
        user_id,
        &format!("Deleting project _{project_id}_ and its associated resources"),
    )
    .await?;

    chat.im(user_id, "*... Deleting DNS records*").await?;
    reclaimer.delete_records(project_id).await?;

    chat.im(user_id, "*... Deleting SSH Keys*").await?;
    reclaimer.delete_keys(project_id).await?;

    chat.im(user_id, "*... Deleting Droplets*").await?;
    reclaimer.delete_hosts(project_id).await?;

    chat.im(user_id, "*... Resetting project*").await?;
    reclaimer.clear_registry(user_id).await?;

    chat.im(
        user_id,
        &format!(
            "Project _{project_id}_ has been deleted. Send command `./boot shell` to start a \
             new project."
        ),
    )
    .await?;

    info!(user_id, project_id, "delete: project deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    fn command(user: &str) -> Command {
        Command {
            message: Harness::message(user, "./delete"),
            args: Vec::new(),
        }
    }

    #[tokio::test]
    async fn deletes_resources_and_reports_each_step() {
        let h = Harness::new();
        h.state.registry.register("abc1234", "U1").await.unwrap();
        h.master.add_record("x.pifft.com", "A", "shell.abc1234", "203.0.113.7");
        h.pool.add_key("oscon-abc1234");
        h.pool.add_host("shell.abc1234");
        h.pool.add_host("shell.other00");

        run(h.state.clone(), command("U1")).await.unwrap();

        assert!(h.master.records().is_empty());
        assert!(h.pool.keys().is_empty());
        assert_eq!(h.pool.hosts().len(), 1);
        assert!(h.state.registry.project_id_for_user("U1").await.is_err());

        let texts = h.chat.texts();
        assert_eq!(
            texts[1..5].to_vec(),
            vec![
                "*... Deleting DNS records*",
                "*... Deleting SSH Keys*",
                "*... Deleting Droplets*",
                "*... Resetting project*",
            ]
        );
        assert!(texts[5].starts_with("Project _abc1234_ has been deleted."));
        assert!(h.chat.posted().iter().all(|p| p.channel == "DU1"));
    }

    #[tokio::test]
    async fn failing_step_is_reported_and_registry_kept() {
        let h = Harness::new();
        h.state.registry.register("abc1234", "U1").await.unwrap();
        h.pool.add_host("shell.abc1234");
        h.pool.fail_host_deletes();

        let err = run(h.state.clone(), command("U1")).await.unwrap_err();

        assert!(matches!(err, BotError::Infra(_)));
        assert_eq!(
            h.chat.texts().last().map(String::as_str),
            Some("unable to delete project _abc1234_")
        );
        assert_eq!(h.state.registry.project_id_for_user("U1").await.unwrap(), "abc1234");
    }

    #[tokio::test]
    async fn user_without_project_is_told_so() {
        let h = Harness::new();

        run(h.state.clone(), command("U9")).await.unwrap();

        assert!(h.chat.texts()[0].contains("./boot shell"));
        assert!(h.pool.pages_requested("hosts").is_empty());
    }
}
