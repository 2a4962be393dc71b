use serde::Serialize;

use crate::auth::{AuthSession, CredentialStore};
use crate::cache::CacheRefreshNotifier;
use crate::config::Settings;
use crate::error::{AppError, AppResult, MutationError};
use crate::launcher::Launcher;

use super::client::{Confirmation, GmailActionClient, LabelSet};
use super::request::{ActionKind, ActionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "action", rename_all = "snake_case")]
pub enum DispatchState {
    ParsingRequest,
    Deauthorizing,
    Dispatching(ActionKind),
    OpeningMessage,
    Done,
}

impl DispatchState {
    fn route(request: &ActionRequest) -> Self {
        match request.action {
            Some(ActionKind::Deauthorize) => Self::Deauthorizing,
            Some(kind) => Self::Dispatching(kind),
            None => Self::OpeningMessage,
        }
    }
}

/// Everything one dispatch did, in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub states: Vec<DispatchState>,
    /// Lines meant for the launcher.
    pub status: Vec<String>,
    /// Labels passed to the cache refresh, when one happened.
    pub refreshed: Option<LabelSet>,
    pub search: Option<String>,
    pub opened_url: Option<String>,
}

impl DispatchReport {
    fn say(&mut self, line: impl Into<String>) {
        self.status.push(line.into());
    }

    fn settle(&mut self, result: Result<Confirmation, MutationError>) -> LabelSet {
        match result {
            Ok(confirmation) => {
                self.say(confirmation.message);
                confirmation.labels
            }
            Err(MutationError::MissingMessageId) => {
                tracing::info!("no message id supplied, nothing to trash");
                LabelSet::default()
            }
            Err(err) => {
                match &err {
                    MutationError::Transport(source) => {
                        tracing::warn!(error = %source, "mailbox call failed");
                    }
                    MutationError::VerificationFailed { expected } => {
                        tracing::warn!(expected = %expected, "mutation not confirmed");
                    }
                    MutationError::MissingMessageId => {}
                }
                self.say(err.to_string());
                LabelSet::default()
            }
        }
    }
}

/// Routes one action request to the mailbox and its side effects.
pub struct ActionDispatcher<'a> {
    settings: &'a Settings,
    store: &'a dyn CredentialStore,
    session: &'a AuthSession<'a>,
    cache: &'a dyn CacheRefreshNotifier,
    launcher: &'a dyn Launcher,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(
        settings: &'a Settings,
        store: &'a dyn CredentialStore,
        session: &'a AuthSession<'a>,
        cache: &'a dyn CacheRefreshNotifier,
        launcher: &'a dyn Launcher,
    ) -> Self {
        Self {
            settings,
            store,
            session,
            cache,
            launcher,
        }
    }

    /// Runs the request in `payload` to completion.
    ///
    /// Request problems and missing credentials end the dispatch quietly;
    /// mailbox failures become status lines. Only credential storage errors
    /// and a failed interactive authorization are returned as `Err`.
    pub async fn dispatch(&self, payload: &str) -> AppResult<DispatchReport> {
        let mut report = DispatchReport {
            states: vec![DispatchState::ParsingRequest],
            ..DispatchReport::default()
        };

        let request = match ActionRequest::parse(payload) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring action request");
                report.states.push(DispatchState::Done);
                return Ok(report);
            }
        };
        tracing::info!(
            thread_id = %request.thread_id,
            action = request.action.map_or("open", ActionKind::as_str),
            "dispatching"
        );

        let mut state = DispatchState::route(&request);
        loop {
            report.states.push(state);
            state = match state {
                DispatchState::Deauthorizing => self.deauthorize(&mut report)?,
                DispatchState::Dispatching(kind) => {
                    self.run_action(kind, &request, &mut report).await?
                }
                DispatchState::OpeningMessage => self.open_message(&request, &mut report),
                DispatchState::ParsingRequest | DispatchState::Done => break,
            };
        }

        Ok(report)
    }

    fn deauthorize(&self, report: &mut DispatchReport) -> AppResult<DispatchState> {
        self.store.delete(self.session.key())?;
        self.cache.clear()?;
        report.say("Workflow deauthorized.");
        Ok(DispatchState::Done)
    }

    async fn run_action(
        &self,
        kind: ActionKind,
        request: &ActionRequest,
        report: &mut DispatchReport,
    ) -> AppResult<DispatchState> {
        match kind {
            ActionKind::Deauthorize => return Ok(DispatchState::Deauthorizing),
            ActionKind::Reply if request.message.is_none() => {
                report.say("No message found.");
                return Ok(DispatchState::Done);
            }
            ActionKind::Label if request.label.is_none() => {
                report.say("No label found.");
                return Ok(DispatchState::Done);
            }
            _ => {}
        }

        let transport = match self.session.ensure_authorized().await {
            Ok(transport) => transport,
            Err(AppError::CredentialsUnavailable(key)) => {
                tracing::error!(%key, "credentials not found");
                return Ok(DispatchState::Done);
            }
            Err(err) => return Err(err),
        };
        let client = GmailActionClient::new(&transport);
        let thread_id = request.thread_id.as_str();

        match kind {
            ActionKind::MarkRead | ActionKind::MarkUnread => {
                let result = if kind == ActionKind::MarkRead {
                    client.mark_read(thread_id).await
                } else {
                    client.mark_unread(thread_id).await
                };
                report.settle(result);

                // Read state is not cached, so these hand straight back to the search.
                let target = request.query.clone().unwrap_or_default();
                self.launcher.open_search(&target);
                report.search = Some(target);
            }
            ActionKind::Archive => {
                let outcome = report.settle(client.archive(thread_id).await);
                self.refresh(outcome, report);
            }
            ActionKind::TrashMessage => {
                let result = client.trash_message(request.message_id.as_deref()).await;
                let outcome = report.settle(result);
                self.refresh(outcome, report);
            }
            ActionKind::TrashConversation => {
                let outcome = report.settle(client.trash_conversation(thread_id).await);
                self.refresh(outcome, report);
            }
            ActionKind::Label => {
                if let Some(label) = &request.label {
                    let outcome = report.settle(client.add_label(thread_id, label).await);
                    self.refresh(outcome, report);
                }
            }
            ActionKind::Reply => {
                if let Some(message) = &request.message {
                    let outcome = client.reply(thread_id, message).await;
                    self.refresh(outcome, report);
                }
            }
            ActionKind::Deauthorize => {}
        }

        Ok(DispatchState::Done)
    }

    fn open_message(&self, request: &ActionRequest, report: &mut DispatchReport) -> DispatchState {
        if let Some(message_id) = &request.message_id {
            let url = self.settings.message_url(message_id);
            self.launcher.open_url(&url);
            report.opened_url = Some(url);
        }

        DispatchState::Done
    }

    fn refresh(&self, outcome: LabelSet, report: &mut DispatchReport) {
        self.cache.refresh(&outcome);
        report.refreshed = Some(outcome);
    }
}
