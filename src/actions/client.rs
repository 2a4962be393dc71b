use serde::Serialize;

use crate::api::models::labels;
use crate::api::{LabelDelta, MailboxTransport, Message, Thread};
use crate::error::MutationError;

use super::request::Label;

/// Label ids of a message as Gmail reported them after a confirmed mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    pub fn new(ids: Vec<String>) -> Self {
        Self(ids)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, label_id: &str) -> bool {
        self.0.iter().any(|id| id == label_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// What a confirmed mutation produced: the outcome handed to the cache and the
/// status line for the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub labels: LabelSet,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
enum Expectation<'a> {
    Has(&'a str),
    Lacks(&'a str),
}

impl Expectation<'_> {
    fn holds(self, message: &Message) -> bool {
        match self {
            Self::Has(label) => message.has_label(label) == Some(true),
            Self::Lacks(label) => message.has_label(label) == Some(false),
        }
    }

    fn describe(self) -> String {
        match self {
            Self::Has(label) => format!("every message labeled {label}"),
            Self::Lacks(label) => format!("no message labeled {label}"),
        }
    }
}

/// Mailbox mutations, each confirmed by an independent read before it counts
/// as done.
pub struct GmailActionClient<'a> {
    transport: &'a dyn MailboxTransport,
}

impl<'a> GmailActionClient<'a> {
    pub fn new(transport: &'a dyn MailboxTransport) -> Self {
        Self { transport }
    }

    pub async fn mark_read(&self, thread_id: &str) -> Result<Confirmation, MutationError> {
        self.modify_thread(
            thread_id,
            LabelDelta::remove(labels::UNREAD),
            Expectation::Lacks(labels::UNREAD),
            "Conversation marked as read.".to_string(),
        )
        .await
    }

    pub async fn mark_unread(&self, thread_id: &str) -> Result<Confirmation, MutationError> {
        self.modify_thread(
            thread_id,
            LabelDelta::add(labels::UNREAD),
            Expectation::Has(labels::UNREAD),
            "Conversation marked as unread.".to_string(),
        )
        .await
    }

    pub async fn archive(&self, thread_id: &str) -> Result<Confirmation, MutationError> {
        self.modify_thread(
            thread_id,
            LabelDelta::remove(labels::INBOX),
            Expectation::Lacks(labels::INBOX),
            "Conversation archived.".to_string(),
        )
        .await
    }

    pub async fn add_label(
        &self,
        thread_id: &str,
        label: &Label,
    ) -> Result<Confirmation, MutationError> {
        self.modify_thread(
            thread_id,
            LabelDelta::add(label.id.as_str()),
            Expectation::Has(&label.id),
            format!("Labeled with {}.", label.name),
        )
        .await
    }

    /// Trashing needs a concrete message; without one nothing is sent.
    pub async fn trash_message(
        &self,
        message_id: Option<&str>,
    ) -> Result<Confirmation, MutationError> {
        let Some(message_id) = message_id else {
            return Err(MutationError::MissingMessageId);
        };

        self.transport
            .trash_message(message_id)
            .await
            .map_err(MutationError::Transport)?;
        let message = self
            .transport
            .get_message(message_id)
            .await
            .map_err(MutationError::Transport)?;

        let expectation = Expectation::Has(labels::TRASH);
        if !expectation.holds(&message) {
            return Err(MutationError::VerificationFailed {
                expected: expectation.describe(),
            });
        }

        Ok(Confirmation {
            labels: LabelSet::new(message.label_ids.unwrap_or_default()),
            message: "Mail moved to trash.".to_string(),
        })
    }

    pub async fn trash_conversation(&self, thread_id: &str) -> Result<Confirmation, MutationError> {
        self.transport
            .trash_thread(thread_id)
            .await
            .map_err(MutationError::Transport)?;

        let labels = self
            .verify_thread(thread_id, Expectation::Has(labels::TRASH))
            .await?;
        Ok(Confirmation {
            labels,
            message: "Conversation moved to trash.".to_string(),
        })
    }

    /// Sending replies is not supported yet. The call is accepted and nothing
    /// is sent.
    pub async fn reply(&self, thread_id: &str, message: &str) -> LabelSet {
        tracing::warn!(
            thread_id,
            chars = message.chars().count(),
            "reply is not supported; nothing was sent"
        );
        LabelSet::default()
    }

    async fn modify_thread(
        &self,
        thread_id: &str,
        delta: LabelDelta,
        expectation: Expectation<'_>,
        message: String,
    ) -> Result<Confirmation, MutationError> {
        self.transport
            .modify_thread_labels(thread_id, &delta)
            .await
            .map_err(MutationError::Transport)?;

        let labels = self.verify_thread(thread_id, expectation).await?;
        Ok(Confirmation { labels, message })
    }

    async fn verify_thread(
        &self,
        thread_id: &str,
        expectation: Expectation<'_>,
    ) -> Result<LabelSet, MutationError> {
        let thread = self
            .transport
            .get_thread(thread_id)
            .await
            .map_err(MutationError::Transport)?;

        confirmed_labels(&thread, expectation)
    }
}

fn confirmed_labels(thread: &Thread, expectation: Expectation<'_>) -> Result<LabelSet, MutationError> {
    let failed = || MutationError::VerificationFailed {
        expected: expectation.describe(),
    };

    let last = thread.messages.last().ok_or_else(failed)?;
    if !thread.messages.iter().all(|message| expectation.holds(message)) {
        return Err(failed());
    }

    Ok(LabelSet::new(last.label_ids.clone().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{AppError, AppResult};

    fn message(id: &str, label_ids: Option<&[&str]>) -> Message {
        Message {
            id: id.to_string(),
            thread_id: Some("T1".to_string()),
            label_ids: label_ids.map(|ids| ids.iter().map(|id| id.to_string()).collect()),
        }
    }

    fn thread(messages: Vec<Message>) -> Thread {
        Thread {
            id: "T1".to_string(),
            messages,
        }
    }

    /// Applies deltas to an in-memory thread and records every call.
    struct FakeTransport {
        thread: Mutex<Thread>,
        calls: Mutex<Vec<String>>,
        fail_reads: bool,
        ignore_mutations: bool,
    }

    impl FakeTransport {
        fn new(thread: Thread) -> Self {
            Self {
                thread: Mutex::new(thread),
                calls: Mutex::new(Vec::new()),
                fail_reads: false,
                ignore_mutations: false,
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().expect("calls lock").push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }

        fn apply(&self, add: &[String], remove: &[String], only: Option<&str>) {
            if self.ignore_mutations {
                return;
            }
            let mut thread = self.thread.lock().expect("thread lock");
            for message in thread
                .messages
                .iter_mut()
                .filter(|message| only.is_none_or(|id| message.id == id))
            {
                let ids = message.label_ids.get_or_insert_with(Vec::new);
                ids.retain(|id| !remove.contains(id));
                for label in add {
                    if !ids.contains(label) {
                        ids.push(label.clone());
                    }
                }
            }
        }

        fn read_thread(&self) -> AppResult<Thread> {
            if self.fail_reads {
                return Err(AppError::Api("socket closed".to_string()));
            }
            Ok(self.thread.lock().expect("thread lock").clone())
        }
    }

    #[async_trait]
    impl MailboxTransport for FakeTransport {
        async fn modify_thread_labels(
            &self,
            thread_id: &str,
            delta: &LabelDelta,
        ) -> AppResult<Thread> {
            self.record(format!("modify {thread_id}"));
            self.apply(&delta.add, &delta.remove, None);
            Ok(self.thread.lock().expect("thread lock").clone())
        }

        async fn trash_message(&self, message_id: &str) -> AppResult<Message> {
            self.record(format!("trash_message {message_id}"));
            self.apply(&[labels::TRASH.to_string()], &[], Some(message_id));
            let thread = self.thread.lock().expect("thread lock");
            thread
                .messages
                .iter()
                .find(|message| message.id == message_id)
                .cloned()
                .ok_or_else(|| AppError::Api("not found".to_string()))
        }

        async fn trash_thread(&self, thread_id: &str) -> AppResult<Thread> {
            self.record(format!("trash_thread {thread_id}"));
            self.apply(&[labels::TRASH.to_string()], &[], None);
            Ok(self.thread.lock().expect("thread lock").clone())
        }

        async fn get_thread(&self, thread_id: &str) -> AppResult<Thread> {
            self.record(format!("get_thread {thread_id}"));
            self.read_thread()
        }

        async fn get_message(&self, message_id: &str) -> AppResult<Message> {
            self.record(format!("get_message {message_id}"));
            self.read_thread()?
                .messages
                .into_iter()
                .find(|message| message.id == message_id)
                .ok_or_else(|| AppError::Api("not found".to_string()))
        }
    }

    fn unread_thread() -> Thread {
        thread(vec![
            message("m1", Some(&["INBOX", "UNREAD"])),
            message("m2", Some(&["INBOX", "UNREAD", "IMPORTANT"])),
        ])
    }

    #[tokio::test]
    async fn mark_read_clears_unread_on_every_message() {
        let transport = FakeTransport::new(unread_thread());
        let client = GmailActionClient::new(&transport);

        let confirmation = client.mark_read("T1").await.expect("confirmed");

        assert_eq!(confirmation.message, "Conversation marked as read.");
        assert_eq!(
            confirmation.labels,
            LabelSet::from_iter(["INBOX", "IMPORTANT"])
        );
        let reread = transport.read_thread().expect("thread");
        assert!(
            reread
                .messages
                .iter()
                .all(|message| message.has_label(labels::UNREAD) == Some(false))
        );
        assert_eq!(transport.calls(), ["modify T1", "get_thread T1"]);
    }

    #[tokio::test]
    async fn mark_unread_sets_unread_on_every_message() {
        let transport = FakeTransport::new(thread(vec![
            message("m1", Some(&["INBOX"])),
            message("m2", Some(&[])),
        ]));
        let client = GmailActionClient::new(&transport);

        let confirmation = client.mark_unread("T1").await.expect("confirmed");

        assert!(confirmation.labels.contains(labels::UNREAD));
        let reread = transport.read_thread().expect("thread");
        assert!(
            reread
                .messages
                .iter()
                .all(|message| message.has_label(labels::UNREAD) == Some(true))
        );
    }

    #[tokio::test]
    async fn unapplied_mutation_fails_verification() {
        let mut transport = FakeTransport::new(unread_thread());
        transport.ignore_mutations = true;
        let client = GmailActionClient::new(&transport);

        let err = client.archive("T1").await.expect_err("not confirmed");

        assert!(matches!(err, MutationError::VerificationFailed { .. }));
        assert_eq!(err.to_string(), "An error occurred.");
    }

    #[tokio::test]
    async fn message_without_label_ids_fails_verification() {
        let mut transport = FakeTransport::new(thread(vec![
            message("m1", Some(&["IMPORTANT"])),
            message("m2", None),
        ]));
        transport.ignore_mutations = true;
        let client = GmailActionClient::new(&transport);

        let err = client.archive("T1").await.expect_err("not confirmed");
        assert!(matches!(err, MutationError::VerificationFailed { .. }));
    }

    #[tokio::test]
    async fn empty_thread_fails_verification() {
        let transport = FakeTransport::new(thread(Vec::new()));
        let client = GmailActionClient::new(&transport);

        let err = client.trash_conversation("T1").await.expect_err("nothing to confirm");
        assert!(matches!(err, MutationError::VerificationFailed { .. }));
    }

    #[tokio::test]
    async fn failed_verify_read_is_a_connection_error() {
        let mut transport = FakeTransport::new(unread_thread());
        transport.fail_reads = true;
        let client = GmailActionClient::new(&transport);

        let err = client.archive("T1").await.expect_err("read fails");

        assert!(matches!(err, MutationError::Transport(_)));
        assert_eq!(err.to_string(), "Connection error");
    }

    #[tokio::test]
    async fn add_label_confirms_and_names_the_label() {
        let transport = FakeTransport::new(unread_thread());
        let client = GmailActionClient::new(&transport);
        let label = Label {
            id: "L1".to_string(),
            name: "Work".to_string(),
        };

        let confirmation = client.add_label("T1", &label).await.expect("confirmed");

        assert!(confirmation.message.contains("Work"));
        let reread = transport.read_thread().expect("thread");
        assert!(
            reread
                .messages
                .iter()
                .all(|message| message.has_label("L1") == Some(true))
        );
    }

    #[tokio::test]
    async fn trash_message_without_id_makes_no_calls() {
        let transport = FakeTransport::new(unread_thread());
        let client = GmailActionClient::new(&transport);

        let err = client.trash_message(None).await.expect_err("no id");

        assert!(matches!(err, MutationError::MissingMessageId));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn trash_message_confirms_single_message() {
        let transport = FakeTransport::new(unread_thread());
        let client = GmailActionClient::new(&transport);

        let confirmation = client.trash_message(Some("m2")).await.expect("confirmed");

        assert_eq!(confirmation.message, "Mail moved to trash.");
        assert!(confirmation.labels.contains(labels::TRASH));
        assert_eq!(transport.calls(), ["trash_message m2", "get_message m2"]);
    }

    #[tokio::test]
    async fn trash_conversation_requires_trash_on_every_message() {
        let transport = FakeTransport::new(unread_thread());
        let client = GmailActionClient::new(&transport);

        let confirmation = client.trash_conversation("T1").await.expect("confirmed");

        assert_eq!(confirmation.message, "Conversation moved to trash.");
        assert!(confirmation.labels.contains(labels::TRASH));
    }

    #[tokio::test]
    async fn reply_sends_nothing() {
        let transport = FakeTransport::new(unread_thread());
        let client = GmailActionClient::new(&transport);

        let outcome = client.reply("T1", "thanks!").await;

        assert!(outcome.is_empty());
        assert!(transport.calls().is_empty());
    }
}
