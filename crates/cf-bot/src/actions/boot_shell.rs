use cf_infra::booter::generate_project_id;
use cf_store::ErrorKind;
use tracing::{error, info, warn};

use crate::dispatch::Command;
use crate::error::BotError;
use crate::state::AppState;

const REACTION_NEW: &str = "warning";
const REACTION_UP: &str = "white_check_mark";

/// `./boot shell`: register a fresh project for the caller and boot its shell host.
pub async fn run(state: AppState, cmd: Command) -> Result<(), BotError> {
    let user_id = cmd.user();
    let project_id = generate_project_id();
    let region = state
        .workshop
        .pick_region()
        .ok_or(cf_infra::Error::NoRegion)?
        .to_string();

    info!(user_id, %project_id, %region, "boot-shell: new shell request");

    if let Err(err) = state.registry.register(&project_id, user_id).await {
        if err.kind() != ErrorKind::AlreadyExists {
            state.chat.im(user_id, &format!("unknown error: {err}")).await?;
            return Err(err.into());
        }

        state.chat.im(user_id, "unable to boot shell: project exists").await?;
        let existing = state.registry.project_id_for_user(user_id).await?;
        state
            .chat
            .im(user_id, &format!("You already have an existing shell at *{existing}*"))
            .await?;
        return Ok(());
    }

    let notice = state
        .chat
        .im(user_id, &format!("booting shell for project _{project_id}_"))
        .await?;
    if let Err(e) = state.chat.add_reaction(&notice, REACTION_NEW).await {
        warn!(error = %e, "boot-shell: unable to add reaction");
    }

    let account = state.pool.pick();
    let shell = match state
        .booter
        .boot(&project_id, account, state.pool.master(), &region)
        .await
    {
        Ok(shell) => shell,
        Err(e) => {
            error!(user_id, %project_id, error = %e, "boot-shell: couldn't boot shell");
            state.chat.im(user_id, &format!("couldn't boot shell: {e}")).await?;
            return Ok(());
        }
    };

    state
        .registry
        .save_key(&project_id, shell.key_pair.private_key())
        .await?;

    if let Err(e) = state.chat.remove_reaction(&notice, REACTION_NEW).await {
        warn!(error = %e, "boot-shell: unable to remove reaction");
    }
    if let Err(e) = state.chat.add_reaction(&notice, REACTION_UP).await {
        warn!(error = %e, "boot-shell: unable to add reaction");
    }

    state
        .chat
        .im(
            user_id,
            &format!(
                "Your shell is up at *{}*. Run `./provision` to set up the rest of your \
                 environment.",
                shell.hostname
            ),
        )
        .await?;

    info!(user_id, %project_id, hostname = %shell.hostname, "boot-shell: shell booted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    async fn boot(h: &Harness, user: &str) {
        let cmd = Command {
            message: Harness::message(user, "./boot shell"),
            args: Vec::new(),
        };
        run(h.state.clone(), cmd).await.unwrap();
    }

    #[tokio::test]
    async fn boots_registers_and_saves_the_key() {
        let h = Harness::new();

        boot(&h, "U1").await;

        let project = h.state.registry.project_id_for_user("U1").await.unwrap();
        assert_eq!(project.len(), 7);
        assert_eq!(h.state.registry.user_for_project(&project).await.unwrap(), "U1");

        let hosts = h.pool.created_hosts();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, format!("shell.{project}"));

        let records = h.master.created_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.kind, "A");
        assert_eq!(records[0].1.name, format!("shell.{project}"));
        let address = h.pool.hosts()[0].public_ipv4.clone().unwrap();
        assert_eq!(records[0].1.data, address);

        let key = h.state.registry.key_for_project(&project).await.unwrap();
        assert!(String::from_utf8(key).unwrap().contains("PRIVATE KEY"));

        let texts = h.chat.texts();
        assert_eq!(texts[0], format!("booting shell for project _{project}_"));
        assert!(texts[1].contains("./provision"));

        let reactions: Vec<(String, String)> = h
            .chat
            .reactions()
            .into_iter()
            .map(|(op, _, name)| (op, name))
            .collect();
        assert_eq!(
            reactions,
            vec![
                ("add".to_string(), "warning".to_string()),
                ("remove".to_string(), "warning".to_string()),
                ("add".to_string(), "white_check_mark".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn second_boot_reports_existing_project_without_new_host() {
        let h = Harness::new();
        boot(&h, "U1").await;
        let project = h.state.registry.project_id_for_user("U1").await.unwrap();

        boot(&h, "U1").await;

        assert_eq!(h.pool.created_hosts().len(), 1);
        assert_eq!(h.state.registry.project_id_for_user("U1").await.unwrap(), project);
        let texts = h.chat.texts();
        let tail = &texts[texts.len() - 2..];
        assert_eq!(tail[0], "unable to boot shell: project exists");
        assert_eq!(tail[1], format!("You already have an existing shell at *{project}*"));
    }

    #[tokio::test]
    async fn boot_failure_is_reported_to_the_user() {
        let h = Harness::new();
        h.pool.omit_create_action();

        boot(&h, "U1").await;

        let texts = h.chat.texts();
        assert!(texts.last().unwrap().starts_with("couldn't boot shell: "));
        assert!(h.master.created_records().is_empty());
        let project = h.state.registry.project_id_for_user("U1").await.unwrap();
        assert!(h.state.registry.key_for_project(&project).await.is_err());
    }
}
