use slack_api::{Attachment, AttachmentField};

use super::project_or_notice;
use crate::dispatch::Command;
use crate::error::BotError;
use crate::state::AppState;

/// Settings card for a project.
pub fn settings_attachment(project_id: &str, domain: &str) -> Attachment {
    let field = |title: &str, value: String, short: bool| AttachmentField {
        title: title.to_string(),
        value,
        short,
    };

    Attachment {
        fallback: Some(format!("Settings for project {project_id}")),
        fields: vec![
            field("Project ID", project_id.to_string(), false),
            field("Consul URL", format!("http://app.{project_id}.{domain}"), true),
            field("Kibana URL", format!("http://app.{project_id}.{domain}:5601"), true),
        ],
    }
}

/// `./settings`: show the caller's project id and service URLs.
pub async fn run(state: AppState, cmd: Command) -> Result<(), BotError> {
    let user_id = cmd.user();
    let Some(project_id) = project_or_notice(&state, user_id).await? else {
        return Ok(());
    };

    let attachment = settings_attachment(&project_id, &state.workshop.domain);
    state
        .chat
        .send_direct_message(user_id, "Settings", &[attachment])
        .await?;
    Ok(())
}
