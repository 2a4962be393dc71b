use async_trait::async_trait;

use crate::error::AppResult;

use super::models::{LabelDelta, Message, Thread};

/// Authorized access to the mailbox mutations the launcher performs, plus the
/// reads used to confirm them.
#[async_trait]
pub trait MailboxTransport: Send + Sync {
    async fn modify_thread_labels(&self, thread_id: &str, delta: &LabelDelta) -> AppResult<Thread>;
    async fn trash_message(&self, message_id: &str) -> AppResult<Message>;
    async fn trash_thread(&self, thread_id: &str) -> AppResult<Thread>;
    async fn get_thread(&self, thread_id: &str) -> AppResult<Thread>;
    async fn get_message(&self, message_id: &str) -> AppResult<Message>;
}
