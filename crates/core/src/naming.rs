//! Remote folder naming convention.
//!
//! Every submission gets its own folder under the configured root:
//! `{root}/{date}-{org}-{title}`. Uploads made before any submission exist
//! land in `{root}/{inbox}/{user_id}`; files shared with everybody live in
//! `{root}/{local}`.

use crate::types::UserId;

/// Longest name component kept after sanitization, in characters.
pub const MAX_NAME_LEN: usize = 120;

/// Name used when a component sanitizes to nothing.
pub const UNTITLED: &str = "Untitled";

const FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Make a string safe to use as one remote path component.
///
/// Forbidden characters become `_`, whitespace runs collapse to a single
/// space, and the result is truncated to [`MAX_NAME_LEN`] characters.
///
/// ```
/// use lightdesk_core::naming::sanitize_name;
///
/// assert_eq!(sanitize_name("Acme: Lights / Sound"), "Acme_ Lights _ Sound");
/// assert_eq!(sanitize_name("   "), "Untitled");
/// ```
pub fn sanitize_name(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_NAME_LEN).collect();
    let trimmed = truncated.trim();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Resolved remote folder layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    pub root: String,
    pub inbox: String,
    pub local: String,
}

impl FolderLayout {
    pub fn new(root: impl Into<String>, inbox: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            root: root.into().trim_end_matches('/').to_string(),
            inbox: inbox.into(),
            local: local.into(),
        }
    }

    /// Folder for one submission.
    pub fn submission_folder(&self, event_date: &str, org: &str, event_title: &str) -> String {
        format!(
            "{}/{}-{}-{}",
            self.root,
            sanitize_name(event_date),
            sanitize_name(org),
            sanitize_name(event_title)
        )
    }

    /// Per-user folder for uploads made before the first submission.
    pub fn inbox_folder(&self, user_id: UserId) -> String {
        format!("{}/{}/{user_id}", self.root, sanitize_name(&self.inbox))
    }

    /// Folder holding files offered to every user.
    pub fn shared_folder(&self) -> String {
        format!("{}/{}", self.root, sanitize_name(&self.local))
    }
}
