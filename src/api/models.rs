use serde::{Deserialize, Serialize};

/// System label ids Gmail applies to every account.
pub mod labels {
    pub const INBOX: &str = "INBOX";
    pub const UNREAD: &str = "UNREAD";
    pub const TRASH: &str = "TRASH";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "threadId", default)]
    pub thread_id: Option<String>,
    /// Absent when Gmail omits the field, which is distinct from an empty set.
    #[serde(rename = "labelIds", default)]
    pub label_ids: Option<Vec<String>>,
}

impl Message {
    pub fn has_label(&self, label_id: &str) -> Option<bool> {
        self.label_ids
            .as_ref()
            .map(|ids| ids.iter().any(|id| id == label_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Body of a `threads.modify` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelDelta {
    #[serde(rename = "addLabelIds", skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<String>,
    #[serde(rename = "removeLabelIds", skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

impl LabelDelta {
    pub fn add(label_id: impl Into<String>) -> Self {
        Self {
            add: vec![label_id.into()],
            remove: Vec::new(),
        }
    }

    pub fn remove(label_id: impl Into<String>) -> Self {
        Self {
            add: Vec::new(),
            remove: vec![label_id.into()],
        }
    }
}
