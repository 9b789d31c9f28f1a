use std::collections::HashSet;
use std::sync::Arc;

use lightdesk_core::naming::FolderLayout;
use lightdesk_core::ports::{DocRenderer, FileVault, Messenger, Store};
use lightdesk_core::types::UserId;

use crate::tokens::DownloadTokens;

/// Shared collaborators handed to every chat session.
///
/// Cheaply cloneable; all fields are reference counted.
#[derive(Clone)]
pub struct BotState {
    pub messenger: Arc<dyn Messenger>,
    pub store: Arc<dyn Store>,
    pub vault: Arc<dyn FileVault>,
    pub renderer: Arc<dyn DocRenderer>,
    pub folders: Arc<FolderLayout>,
    pub admins: Arc<HashSet<UserId>>,
    pub tokens: Arc<DownloadTokens>,
}

impl BotState {
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admins.contains(&user_id)
    }
}
