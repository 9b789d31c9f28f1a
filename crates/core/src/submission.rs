//! Committed submissions and the records hanging off them.

use serde::{Deserialize, Serialize};

use crate::answers::Answers;
use crate::options::{ConsoleHelp, ExtraEquipment, MountWho, Operator, Venue, YesNo};
use crate::power::PowerSummary;
use crate::types::{DbId, Timestamp, UserId};

/// Most submissions returned by one month listing.
pub const MONTH_LIST_LIMIT: i64 = 200;

/// A completed survey pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: DbId,
    pub user_id: UserId,
    pub answers: Answers,
    pub folder_path: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Submission {
    /// One-line label used in admin pickers: `#id date | org | title`.
    pub fn list_label(&self) -> String {
        let a = &self.answers;
        let label = format!(
            "#{} {} | {} | {}",
            self.id,
            a.event_date.as_deref().unwrap_or_default(),
            a.org.as_deref().unwrap_or_default(),
            a.event_title.as_deref().unwrap_or_default(),
        );
        label.chars().take(120).collect()
    }

    /// Apply a patch in memory, in field order.
    pub fn apply(&mut self, patch: &SubmissionPatch) {
        for field in &patch.fields {
            field.apply(&mut self.answers, &mut self.folder_path);
        }
    }
}

/// DTO for inserting a submission.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: UserId,
    pub answers: Answers,
    pub folder_path: String,
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

/// One field written by the edit flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch {
    Org(String),
    Role(String),
    Name(String),
    Phone(String),
    EventDate(String),
    EventTitle(String),
    Venue(Venue),
    NightMount(YesNo),
    MountWho(MountWho),
    TechsCount(u32),
    ExtraEquipment(ExtraEquipment),
    Plugs(String),
    DimmerNeeded(YesNo),
    DimmerText(String),
    Sfx(Vec<String>),
    SfxOther(String),
    Operator(Operator),
    /// `None` clears the answer (shown as the placeholder).
    ConsoleHelp(Option<ConsoleHelp>),
    ConsoleModel(String),
    Power(PowerSummary),
    FolderPath(String),
}

impl FieldPatch {
    fn apply(&self, a: &mut Answers, folder: &mut String) {
        match self.clone() {
            FieldPatch::Org(v) => a.org = Some(v),
            FieldPatch::Role(v) => a.role = Some(v),
            FieldPatch::Name(v) => a.name = Some(v),
            FieldPatch::Phone(v) => a.phone = Some(v),
            FieldPatch::EventDate(v) => a.event_date = Some(v),
            FieldPatch::EventTitle(v) => a.event_title = Some(v),
            FieldPatch::Venue(v) => a.venue = Some(v),
            FieldPatch::NightMount(v) => a.night_mount = Some(v),
            FieldPatch::MountWho(v) => a.mount_who = Some(v),
            FieldPatch::TechsCount(v) => a.techs_count = Some(v),
            FieldPatch::ExtraEquipment(v) => a.extra_equipment = Some(v),
            FieldPatch::Plugs(v) => a.plugs = Some(v),
            FieldPatch::DimmerNeeded(v) => a.dimmer_needed = Some(v),
            FieldPatch::DimmerText(v) => a.dimmer_text = Some(v),
            FieldPatch::Sfx(v) => a.sfx = Some(v),
            FieldPatch::SfxOther(v) => a.sfx_other = Some(v),
            FieldPatch::Operator(v) => a.operator = Some(v),
            FieldPatch::ConsoleHelp(v) => a.console_help = v,
            FieldPatch::ConsoleModel(v) => a.console_model = Some(v),
            FieldPatch::Power(p) => {
                a.power_type = Some(p.power_type);
                a.power_count = Some(p.power_count);
                a.power_where = Some(p.power_where);
            }
            FieldPatch::FolderPath(v) => *folder = v,
        }
    }

    /// True for the fields the folder name is built from.
    pub fn affects_folder(&self) -> bool {
        matches!(
            self,
            FieldPatch::Org(_) | FieldPatch::EventDate(_) | FieldPatch::EventTitle(_)
        )
    }
}

/// An ordered set of field writes applied to one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionPatch {
    pub fields: Vec<FieldPatch>,
}

impl SubmissionPatch {
    pub fn new(fields: Vec<FieldPatch>) -> Self {
        Self { fields }
    }

    pub fn single(field: FieldPatch) -> Self {
        Self {
            fields: vec![field],
        }
    }

    pub fn push(&mut self, field: FieldPatch) {
        self.fields.push(field);
    }

    /// True when the folder path must be recomputed after applying.
    pub fn needs_new_folder(&self) -> bool {
        self.fields.iter().any(FieldPatch::affects_folder)
    }
}

// ---------------------------------------------------------------------------
// Pointers, uploads, remote files
// ---------------------------------------------------------------------------

/// The submission a user touched last, used as the upload target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastPointer {
    pub user_id: UserId,
    pub submission_id: Option<DbId>,
    pub folder_path: String,
    pub updated_at: Timestamp,
}

/// One stored file. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub id: DbId,
    pub user_id: UserId,
    pub submission_id: Option<DbId>,
    pub file_name: String,
    pub remote_path: String,
    pub created_at: Timestamp,
}

/// DTO for recording a stored file.
#[derive(Debug, Clone)]
pub struct NewUploadRecord {
    pub user_id: UserId,
    pub submission_id: Option<DbId>,
    pub file_name: String,
    pub remote_path: String,
}

/// A file listed in a remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub name: String,
    pub path: String,
}

// ---------------------------------------------------------------------------
// Month filter
// ---------------------------------------------------------------------------

/// A calendar month, labelled `YYYY-MM`. Submissions are filed under the
/// month of their event date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Shift by a signed number of months.
    pub fn shift(self, delta: i32) -> Self {
        let zero_based = self.year * 12 + self.month as i32 - 1 + delta;
        Self {
            year: zero_based.div_euclid(12),
            month: zero_based.rem_euclid(12) as u32 + 1,
        }
    }

    /// Find the first `YYYY-MM` in a button label.
    pub fn parse_label(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        (0..bytes.len().saturating_sub(6)).find_map(|i| {
            let window = s.get(i..i + 7)?;
            let (y, m) = window.split_once('-')?;
            if y.len() != 4 || m.len() != 2 {
                return None;
            }
            if !y.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
                return None;
            }
            Self::new(y.parse().ok()?, m.parse().ok()?)
        })
    }

    /// Month component as stored in `DD.MM.YYYY` dates.
    pub fn month_key(self) -> String {
        format!("{:02}", self.month)
    }

    /// Year component as stored in `DD.MM.YYYY` dates.
    pub fn year_key(self) -> String {
        format!("{:04}", self.year)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
