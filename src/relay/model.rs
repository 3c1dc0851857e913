// relay/model.rs — Wire types for the relay protocol.

use serde::{Deserialize, Serialize};

// ─── Message ─────────────────────────────────────────────────────────────────

/// A point-to-point message relayed between session participants.
///
/// The payload is an opaque blob — the relay never inspects `body`. The `to`
/// list is used only for fan-out at post time; stored copies keep it for
/// informational purposes. `to = None` means the field was absent from the
/// request entirely, which `post_message` treats as malformed; an explicit
/// empty list is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}
