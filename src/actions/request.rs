use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionKind {
    #[serde(rename = "deauthorize")]
    Deauthorize,
    #[serde(rename = "mark_as_read")]
    MarkRead,
    #[serde(rename = "mark_as_unread")]
    MarkUnread,
    #[serde(rename = "archive_conversation")]
    Archive,
    #[serde(rename = "trash_message")]
    TrashMessage,
    #[serde(rename = "trash_conversation")]
    TrashConversation,
    #[serde(rename = "reply")]
    Reply,
    #[serde(rename = "label")]
    Label,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deauthorize => "deauthorize",
            Self::MarkRead => "mark_as_read",
            Self::MarkUnread => "mark_as_unread",
            Self::Archive => "archive_conversation",
            Self::TrashMessage => "trash_message",
            Self::TrashConversation => "trash_conversation",
            Self::Reply => "reply",
            Self::Label => "label",
        }
    }
}

impl FromStr for ActionKind {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let kind = match value.trim() {
            "deauthorize" => Self::Deauthorize,
            "mark_as_read" => Self::MarkRead,
            "mark_as_unread" => Self::MarkUnread,
            "archive_conversation" => Self::Archive,
            "trash_message" => Self::TrashMessage,
            "trash_conversation" => Self::TrashConversation,
            "reply" => Self::Reply,
            "label" => Self::Label,
            other => return Err(RequestError::UnknownAction(other.to_string())),
        };
        Ok(kind)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user label as picked in the launcher. The id is trusted as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub thread_id: String,
    pub message_id: Option<String>,
    /// `None` opens the message instead of mutating anything.
    pub action: Option<ActionKind>,
    pub query: Option<String>,
    pub message: Option<String>,
    pub label: Option<Label>,
}

/// Wire shape of the payload. Fields other than `action` are loosely typed; a
/// value of the wrong type reads as absent.
#[derive(Debug, Deserialize)]
struct RawActionRequest {
    #[serde(default)]
    thread_id: Option<Value>,
    #[serde(default)]
    message_id: Option<Value>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    query: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    label: Option<Value>,
}

impl ActionRequest {
    pub fn parse(payload: &str) -> Result<Self, RequestError> {
        let raw: RawActionRequest = serde_json::from_str(payload)?;

        let thread_id = present(raw.thread_id).ok_or(RequestError::MissingThreadId)?;
        let action = raw
            .action
            .as_deref()
            .map(str::parse::<ActionKind>)
            .transpose()?;

        Ok(Self {
            thread_id,
            message_id: present(raw.message_id),
            action,
            query: text(raw.query),
            message: text(raw.message),
            label: raw.label.and_then(usable_label),
        })
    }
}

fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        _ => None,
    }
}

fn present(value: Option<Value>) -> Option<String> {
    text(value)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn usable_label(value: Value) -> Option<Label> {
    let label: Label = serde_json::from_value(value).ok()?;
    if label.id.trim().is_empty() || label.name.trim().is_empty() {
        return None;
    }
    Some(label)
}
