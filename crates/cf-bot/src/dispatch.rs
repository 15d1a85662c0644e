use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use slack_api::SlackClient;
use slack_api::socket::SocketConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::chat::IncomingMessage;
use crate::error::BotError;
use crate::state::AppState;

const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// A matched message plus the trigger's capture groups (group 1 onwards;
/// unmatched optional groups are empty strings).
#[derive(Debug, Clone)]
pub struct Command {
    pub message: IncomingMessage,
    pub args: Vec<String>,
}

impl Command {
    pub fn user(&self) -> &str {
        &self.message.user
    }

    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or_default()
    }
}

type ActionFuture = Pin<Box<dyn Future<Output = Result<(), BotError>> + Send>>;
type ActionFn = Arc<dyn Fn(AppState, Command) -> ActionFuture + Send + Sync>;

struct TextAction {
    name: &'static str,
    trigger: Regex,
    action: ActionFn,
}

/// Routes chat messages to actions by regular-expression trigger.
///
/// Every trigger that matches a message runs in its own task, so a slow
/// action never holds up the receive loop or other users.
pub struct Dispatcher {
    state: AppState,
    actions: Vec<TextAction>,
}

impl Dispatcher {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            actions: Vec::new(),
        }
    }

    pub fn add<F, Fut>(
        &mut self,
        name: &'static str,
        trigger: &str,
        action: F,
    ) -> Result<(), BotError>
    where
        F: Fn(AppState, Command) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BotError>> + Send + 'static,
    {
        let trigger = Regex::new(trigger)?;
        info!(action = name, trigger = %trigger, "dispatch: adding text action");
        self.actions.push(TextAction {
            name,
            trigger,
            action: Arc::new(move |state, command| Box::pin(action(state, command))),
        });
        Ok(())
    }

    /// Names of the actions whose trigger matches `text`.
    pub fn matching(&self, text: &str) -> Vec<&'static str> {
        self.actions
            .iter()
            .filter(|a| a.trigger.is_match(text))
            .map(|a| a.name)
            .collect()
    }

    /// Spawn every action matching the message.
    pub fn dispatch(&self, message: IncomingMessage) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        for text_action in &self.actions {
            let Some(captures) = text_action.trigger.captures(&message.text) else {
                continue;
            };
            let args = captures
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect();

            let command = Command {
                message: message.clone(),
                args,
            };
            let name = text_action.name;
            let user_id = message.user.clone();
            let future = (text_action.action)(self.state.clone(), command);

            info!(action = name, %user_id, "dispatch: running action");
            handles.push(tokio::spawn(async move {
                if let Err(e) = future.await {
                    error!(action = name, %user_id, error = %e, "dispatch: action failed");
                }
            }));
        }

        handles
    }

    /// Receive messages over Socket Mode forever, reconnecting after a pause
    /// whenever the connection drops.
    pub async fn listen(&self, client: &SlackClient) {
        loop {
            match SocketConnection::connect(client).await {
                Ok(mut conn) => {
                    info!("dispatch: connected to slack");
                    loop {
                        match conn.next_message().await {
                            Ok(Some(event)) => {
                                self.dispatch(event.into());
                            }
                            Ok(None) => {
                                warn!("dispatch: slack connection closed");
                                break;
                            }
                            Err(e) => {
                                error!(error = %e, "dispatch: error receiving message from slack");
                                break;
                            }
                        }
                    }
                }
                Err(e) => error!(error = %e, "dispatch: unable to connect to slack"),
            }
            tokio::time::sleep(RECONNECT_PAUSE).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::actions;
    use crate::testing::Harness;

    fn dispatcher() -> Dispatcher {
        let mut dispatcher = Dispatcher::new(Harness::new().state);
        actions::register_all(&mut dispatcher).unwrap();
        dispatcher
    }

    #[test]
    fn triggers_route_to_their_actions() {
        let d = dispatcher();

        assert_eq!(d.matching("./boot shell"), vec!["boot-shell"]);
        assert_eq!(d.matching("please ./provision now"), vec!["provision"]);
        assert_eq!(d.matching("./delete"), vec!["delete"]);
        assert_eq!(d.matching("./reset"), vec!["reset"]);
        assert_eq!(d.matching("./configure ssh windows"), vec!["configure-ssh"]);
        assert_eq!(d.matching("./settings"), vec!["settings"]);
        assert_eq!(d.matching("./hello"), vec!["hello"]);
        assert_eq!(d.matching("./help"), vec!["help"]);
        assert!(d.matching("boot shell").is_empty());
        assert!(d.matching("./configure ssh").is_empty());
    }

    #[tokio::test]
    async fn every_match_runs_with_its_captures() {
        let h = Harness::new();
        let mut d = Dispatcher::new(h.state.clone());
        let runs = Arc::new(AtomicUsize::new(0));

        for (name, trigger) in [("first", r"\./say (\w+)"), ("second", r"say")] {
            let runs = runs.clone();
            d.add(name, trigger, move |_state, command: Command| {
                let runs = runs.clone();
                async move {
                    if command.args.len() == 1 {
                        assert_eq!(command.arg(0), "hi");
                    }
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();
        }

        for handle in d.dispatch(Harness::message("U1", "./say hi")) {
            handle.await.unwrap();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalid_trigger_is_rejected() {
        let mut d = Dispatcher::new(Harness::new().state);
        let err = d.add("broken", "(", |_, _| async { Ok(()) }).unwrap_err();
        assert!(matches!(err, BotError::Trigger(_)));
    }
}
