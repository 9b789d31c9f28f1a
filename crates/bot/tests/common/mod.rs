#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use lightdesk_bot::docx::DocxRenderer;
use lightdesk_bot::event::UserEvent;
use lightdesk_bot::session::ChatSession;
use lightdesk_bot::state::BotState;
use lightdesk_bot::tokens::DownloadTokens;
use lightdesk_core::dialogue::Draft;
use lightdesk_core::error::CoreError;
use lightdesk_core::naming::FolderLayout;
use lightdesk_core::ports::{FileVault, MessageId, Messenger, PortError, Store};
use lightdesk_core::prompt::{Markup, Prompt};
use lightdesk_core::submission::{
    LastPointer, NewSubmission, NewUploadRecord, RemoteFile, Submission, SubmissionPatch,
    UploadRecord, YearMonth,
};
use lightdesk_core::types::{DbId, UserId};

pub const USER: UserId = 100;
pub const OTHER_USER: UserId = 200;
pub const ADMIN: UserId = 1;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreInner {
    drafts: HashMap<UserId, serde_json::Value>,
    submissions: BTreeMap<DbId, Submission>,
    last: HashMap<UserId, LastPointer>,
    uploads: Vec<UploadRecord>,
    next_id: DbId,
}

/// In-memory [`Store`]. Drafts go through JSON like the real table.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn draft(&self, user_id: UserId) -> Option<Draft> {
        let inner = self.inner.lock().unwrap();
        inner
            .drafts
            .get(&user_id)
            .map(|v| Draft::from_json(v.clone()).unwrap())
    }

    pub fn has_draft(&self, user_id: UserId) -> bool {
        self.inner.lock().unwrap().drafts.contains_key(&user_id)
    }

    pub fn corrupt_draft(&self, user_id: UserId) {
        self.inner
            .lock()
            .unwrap()
            .drafts
            .insert(user_id, serde_json::json!({ "state": "warp_drive", "answers": 7 }));
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.inner.lock().unwrap().submissions.values().cloned().collect()
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.inner.lock().unwrap().uploads.clone()
    }

    pub fn last_pointer(&self, user_id: UserId) -> Option<LastPointer> {
        self.inner.lock().unwrap().last.get(&user_id).cloned()
    }

    fn next_id(inner: &mut StoreInner) -> DbId {
        inner.next_id += 1;
        inner.next_id
    }

    fn insert(inner: &mut StoreInner, input: &NewSubmission) -> Submission {
        let now = Utc::now();
        let submission = Submission {
            id: Self::next_id(inner),
            user_id: input.user_id,
            answers: input.answers.clone(),
            folder_path: input.folder_path.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.submissions.insert(submission.id, submission.clone());
        submission
    }
}

/// `DD.MM.YYYY` falls in the month.
fn in_month(date: &str, month: YearMonth) -> bool {
    date.get(3..5) == Some(month.month_key().as_str()) && date.get(6..10) == Some(month.year_key().as_str())
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_draft(&self, user_id: UserId, draft: &Draft) -> Result<(), PortError> {
        let value = draft.to_json()?;
        self.inner.lock().unwrap().drafts.insert(user_id, value);
        Ok(())
    }

    async fn load_draft(&self, user_id: UserId) -> Result<Option<Draft>, PortError> {
        let value = self.inner.lock().unwrap().drafts.get(&user_id).cloned();
        match value {
            Some(v) => Ok(Some(Draft::from_json(v)?)),
            None => Ok(None),
        }
    }

    async fn delete_draft(&self, user_id: UserId) -> Result<(), PortError> {
        self.inner.lock().unwrap().drafts.remove(&user_id);
        Ok(())
    }

    async fn insert_submission(&self, input: &NewSubmission) -> Result<Submission, PortError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(Self::insert(&mut inner, input))
    }

    async fn commit_submission(&self, input: &NewSubmission) -> Result<Submission, PortError> {
        let mut inner = self.inner.lock().unwrap();
        let submission = Self::insert(&mut inner, input);
        inner.last.insert(
            input.user_id,
            LastPointer {
                user_id: input.user_id,
                submission_id: Some(submission.id),
                folder_path: submission.folder_path.clone(),
                updated_at: Utc::now(),
            },
        );
        inner.drafts.remove(&input.user_id);
        Ok(submission)
    }

    async fn patch_submission(&self, id: DbId, patch: &SubmissionPatch) -> Result<Submission, PortError> {
        let mut inner = self.inner.lock().unwrap();
        let submission = inner.submissions.get_mut(&id).ok_or(CoreError::NotFound {
            entity: "submission",
            id,
        })?;
        submission.apply(patch);
        submission.updated_at = Utc::now();
        Ok(submission.clone())
    }

    async fn get_submission(&self, id: DbId) -> Result<Option<Submission>, PortError> {
        Ok(self.inner.lock().unwrap().submissions.get(&id).cloned())
    }

    async fn get_last_submission_by_user(&self, user_id: UserId) -> Result<Option<Submission>, PortError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .submissions
            .values()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| s.id)
            .cloned())
    }

    async fn list_submissions_by_month(&self, month: YearMonth) -> Result<Vec<Submission>, PortError> {
        let inner = self.inner.lock().unwrap();
        let mut list: Vec<Submission> = inner
            .submissions
            .values()
            .filter(|s| s.answers.event_date.as_deref().is_some_and(|d| in_month(d, month)))
            .cloned()
            .collect();
        list.sort_by(|a, b| (&a.answers.event_date, a.id).cmp(&(&b.answers.event_date, b.id)));
        Ok(list)
    }

    async fn delete_submission(&self, id: DbId) -> Result<bool, PortError> {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner.submissions.remove(&id).is_some();
        for pointer in inner.last.values_mut() {
            if pointer.submission_id == Some(id) {
                pointer.submission_id = None;
            }
        }
        for record in inner.uploads.iter_mut() {
            if record.submission_id == Some(id) {
                record.submission_id = None;
            }
        }
        Ok(removed)
    }

    async fn count_submissions(&self) -> Result<i64, PortError> {
        Ok(self.inner.lock().unwrap().submissions.len() as i64)
    }

    async fn upsert_last_pointer(
        &self,
        user_id: UserId,
        submission_id: Option<DbId>,
        folder_path: &str,
    ) -> Result<(), PortError> {
        self.inner.lock().unwrap().last.insert(
            user_id,
            LastPointer {
                user_id,
                submission_id,
                folder_path: folder_path.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_last_pointer(&self, user_id: UserId) -> Result<Option<LastPointer>, PortError> {
        Ok(self.last_pointer(user_id))
    }

    async fn save_upload_record(&self, input: &NewUploadRecord) -> Result<UploadRecord, PortError> {
        let mut inner = self.inner.lock().unwrap();
        let record = UploadRecord {
            id: Self::next_id(&mut inner),
            user_id: input.user_id,
            submission_id: input.submission_id,
            file_name: input.file_name.clone(),
            remote_path: input.remote_path.clone(),
            created_at: Utc::now(),
        };
        inner.uploads.push(record.clone());
        Ok(record)
    }

    async fn list_upload_records(&self, user_id: UserId) -> Result<Vec<UploadRecord>, PortError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .uploads
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_upload_record(&self, id: DbId) -> Result<Option<UploadRecord>, PortError> {
        Ok(self.inner.lock().unwrap().uploads.iter().find(|r| r.id == id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Messenger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Prompt { chat: UserId, prompt: Prompt },
    Refresh { chat: UserId, message: MessageId, markup: Markup },
    Notice { callback: String, text: String },
    Document { chat: UserId, name: String, bytes: Vec<u8>, caption: String },
}

/// [`Messenger`] that records everything it is asked to send.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    next_message: AtomicI64,
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Prompt { prompt, .. } => Some(prompt),
                _ => None,
            })
            .collect()
    }

    pub fn last_prompt(&self) -> Prompt {
        self.prompts().pop().expect("no prompt was sent")
    }

    pub fn notices(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Notice { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn refreshes(&self) -> Vec<Markup> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Refresh { markup, .. } => Some(markup),
                _ => None,
            })
            .collect()
    }

    /// `(file name, bytes, caption)` of every sent document.
    pub fn documents(&self) -> Vec<(String, Vec<u8>, String)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Document { name, bytes, caption, .. } => Some((name, bytes, caption)),
                _ => None,
            })
            .collect()
    }

    /// Make a user file available to `download_file`.
    pub fn put_file(&self, file_id: &str, bytes: &[u8]) {
        self.files.lock().unwrap().insert(file_id.to_string(), bytes.to_vec());
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn prompt(&self, chat: UserId, prompt: &Prompt) -> Result<MessageId, PortError> {
        self.sent.lock().unwrap().push(Sent::Prompt {
            chat,
            prompt: prompt.clone(),
        });
        Ok(self.next_message.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn refresh_markup(&self, chat: UserId, message: MessageId, markup: &Markup) -> Result<(), PortError> {
        self.sent.lock().unwrap().push(Sent::Refresh {
            chat,
            message,
            markup: markup.clone(),
        });
        Ok(())
    }

    async fn notice(&self, callback_id: &str, text: &str, _alert: bool) -> Result<(), PortError> {
        self.sent.lock().unwrap().push(Sent::Notice {
            callback: callback_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_document(
        &self,
        chat: UserId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
        _markup: &Markup,
    ) -> Result<(), PortError> {
        self.sent.lock().unwrap().push(Sent::Document {
            chat,
            name: file_name.to_string(),
            bytes,
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, PortError> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| PortError::Remote(format!("unknown file {file_id}")))
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// In-memory [`FileVault`] with switchable failures.
#[derive(Default)]
pub struct MemoryVault {
    folders: Mutex<BTreeSet<String>>,
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    pub fail_ensure: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_upload: AtomicBool,
}

impl MemoryVault {
    pub fn put(&self, path: &str, bytes: &[u8]) {
        self.files.lock().unwrap().insert(path.to_string(), bytes.to_vec());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn has_folder(&self, path: &str) -> bool {
        self.folders.lock().unwrap().contains(path)
    }
}

#[async_trait]
impl FileVault for MemoryVault {
    async fn ensure_folder(&self, path: &str) -> Result<(), PortError> {
        if self.fail_ensure.load(Ordering::SeqCst) {
            return Err(PortError::Remote("disk unavailable".to_string()));
        }
        let mut folders = self.folders.lock().unwrap();
        let mut prefix = String::new();
        for part in path.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            folders.insert(prefix.clone());
        }
        Ok(())
    }

    async fn upload_bytes(&self, path: &str, bytes: Vec<u8>, _overwrite: bool) -> Result<(), PortError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(PortError::Remote("upload rejected".to_string()));
        }
        self.files.lock().unwrap().insert(path.to_string(), bytes);
        Ok(())
    }

    async fn list_files(&self, folder: &str) -> Result<Vec<RemoteFile>, PortError> {
        let prefix = format!("{folder}/");
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|path| {
                let name = path.strip_prefix(&prefix)?;
                (!name.contains('/')).then(|| RemoteFile {
                    name: name.to_string(),
                    path: path.clone(),
                })
            })
            .collect())
    }

    async fn get_download_url(&self, path: &str) -> Result<String, PortError> {
        Ok(format!("https://disk.test/{path}"))
    }

    async fn download_bytes(&self, path: &str) -> Result<Vec<u8>, PortError> {
        self.file(path)
            .ok_or_else(|| PortError::Remote(format!("{path} not found")))
    }

    async fn delete_folder(&self, path: &str, _permanent: bool) -> Result<(), PortError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(PortError::Remote("delete rejected".to_string()));
        }
        let prefix = format!("{path}/");
        self.files.lock().unwrap().retain(|p, _| !p.starts_with(&prefix));
        self.folders
            .lock()
            .unwrap()
            .retain(|f| f != path && !f.starts_with(&prefix));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub messenger: Arc<RecordingMessenger>,
    pub vault: Arc<MemoryVault>,
    pub state: BotState,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let messenger = Arc::new(RecordingMessenger::default());
        let vault = Arc::new(MemoryVault::default());
        let state = BotState {
            messenger: messenger.clone(),
            store: store.clone(),
            vault: vault.clone(),
            renderer: Arc::new(DocxRenderer),
            folders: Arc::new(FolderLayout::new("Festival", "INBOX", "Shared files")),
            admins: Arc::new(HashSet::from([ADMIN])),
            tokens: Arc::new(DownloadTokens::default()),
        };
        Self {
            store,
            messenger,
            vault,
            state,
        }
    }

    pub fn session(&self, user_id: UserId) -> ChatSession {
        ChatSession::new(user_id, self.state.clone())
    }
}

pub async fn say(session: &mut ChatSession, text: &str) {
    session.handle(UserEvent::Text(text.to_string())).await;
}

pub async fn press(session: &mut ChatSession, data: &str) {
    session
        .handle(UserEvent::Choice {
            callback_id: format!("cb:{data}"),
            data: data.to_string(),
            message_id: 1,
        })
        .await;
}

/// Answer every question up to (not including) the power block.
pub async fn answer_until_power(session: &mut ChatSession) {
    say(session, "📝 Take survey").await;
    say(session, "Acme").await;
    say(session, "Stage manager").await;
    say(session, "Jane Doe").await;
    say(session, "01.01.2030").await;
    say(session, "Gala").await;
    press(session, "venue:0").await;
    press(session, "night_mount:1").await;
    press(session, "mount_who:1").await;
    say(session, "2").await;
    press(session, "extra_equipment:1").await;
    say(session, "2x Schuko").await;
}

/// Two power types: the first on two placements, the second on one.
pub async fn answer_power(session: &mut ChatSession) {
    press(session, "pw:t:0").await;
    press(session, "pw:t:1").await;
    press(session, "pw:next").await;
    say(session, "2").await;
    press(session, "pw:w:0").await;
    press(session, "pw:w:1").await;
    say(session, "1").await;
    press(session, "pw:w:2").await;
}

/// Everything after the power block, ending on the confirm screen.
pub async fn answer_after_power(session: &mut ChatSession) {
    press(session, "dimmer_choice:0").await;
    say(session, "12 channels, stage left").await;
    press(session, "fx:t:0").await;
    press(session, "fx:t:4").await;
    press(session, "fx:next").await;
    say(session, "Bubbles").await;
    press(session, "operator_choice:0").await;
    press(session, "console_help:2").await;
    say(session, "Avolites Tiger Touch").await;
    say(session, "+79001234567").await;
}

/// Complete and save a whole survey pass.
pub async fn complete_survey(session: &mut ChatSession) {
    answer_until_power(session).await;
    answer_power(session).await;
    answer_after_power(session).await;
    press(session, "confirm:0").await;
}
