//! Submission rows, the insert DTO and the patch DTO.
//!
//! Every answer column is `NOT NULL`; skipped and not-applicable answers
//! are stored as the placeholder. Fixed-choice answers are stored by their
//! database key.

use lightdesk_core::answers::Answers;
use lightdesk_core::error::CoreError;
use lightdesk_core::options::{
    ConsoleHelp, ExtraEquipment, MountWho, Operator, Venue, YesNo, PLACEHOLDER,
};
use lightdesk_core::submission::{FieldPatch, NewSubmission, Submission, SubmissionPatch};
use lightdesk_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `submissions` table.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: DbId,
    pub user_id: i64,
    pub org: String,
    pub role: String,
    pub name: String,
    pub phone: String,
    pub event_date: String,
    pub event_title: String,
    pub venue: String,
    pub night_mount: String,
    pub mount_who: String,
    pub techs_count: i64,
    pub extra_equipment: String,
    pub plugs: String,
    pub power_type: String,
    pub power_count: i64,
    pub power_where: Json<Vec<String>>,
    pub dimmer_needed: String,
    pub dimmer_text: String,
    pub sfx: Json<Vec<String>>,
    pub sfx_other: String,
    pub operator: String,
    pub console_help: String,
    pub console_model: String,
    pub folder_path: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn choice<T>(stored: &str, parse: fn(&str) -> Result<T, CoreError>) -> Result<Option<T>, CoreError> {
    if stored.is_empty() || stored == PLACEHOLDER {
        Ok(None)
    } else {
        parse(stored).map(Some)
    }
}

fn choice_key<T: Copy>(value: Option<T>, key: fn(T) -> &'static str) -> String {
    value.map(key).unwrap_or(PLACEHOLDER).to_string()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn count(value: i64) -> Option<u32> {
    u32::try_from(value).ok()
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = CoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let answers = Answers {
            venue: choice(&row.venue, Venue::from_str_db)?,
            night_mount: choice(&row.night_mount, YesNo::from_str_db)?,
            mount_who: choice(&row.mount_who, MountWho::from_str_db)?,
            extra_equipment: choice(&row.extra_equipment, ExtraEquipment::from_str_db)?,
            dimmer_needed: choice(&row.dimmer_needed, YesNo::from_str_db)?,
            operator: choice(&row.operator, Operator::from_str_db)?,
            console_help: choice(&row.console_help, ConsoleHelp::from_str_db)?,
            techs_count: count(row.techs_count).filter(|n| *n > 0),
            power_count: count(row.power_count),
            org: Some(row.org),
            role: Some(row.role),
            name: Some(row.name),
            phone: Some(row.phone),
            event_date: Some(row.event_date),
            event_title: Some(row.event_title),
            plugs: Some(row.plugs),
            power_type: Some(row.power_type),
            power_where: Some(row.power_where.0),
            dimmer_text: Some(row.dimmer_text),
            sfx: Some(row.sfx.0),
            sfx_other: Some(row.sfx_other),
            console_model: Some(row.console_model),
        };
        Ok(Submission {
            id: row.id,
            user_id: row.user_id,
            answers,
            folder_path: row.folder_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Column values for inserting a submission.
#[derive(Debug, Clone)]
pub struct CreateSubmission {
    pub user_id: i64,
    pub org: String,
    pub role: String,
    pub name: String,
    pub phone: String,
    pub event_date: String,
    pub event_title: String,
    pub venue: String,
    pub night_mount: String,
    pub mount_who: String,
    pub techs_count: i64,
    pub extra_equipment: String,
    pub plugs: String,
    pub power_type: String,
    pub power_count: i64,
    pub power_where: Vec<String>,
    pub dimmer_needed: String,
    pub dimmer_text: String,
    pub sfx: Vec<String>,
    pub sfx_other: String,
    pub operator: String,
    pub console_help: String,
    pub console_model: String,
    pub folder_path: String,
}

impl From<&NewSubmission> for CreateSubmission {
    fn from(input: &NewSubmission) -> Self {
        let a = &input.answers;
        Self {
            user_id: input.user_id,
            org: text(&a.org),
            role: text(&a.role),
            name: text(&a.name),
            phone: text(&a.phone),
            event_date: text(&a.event_date),
            event_title: text(&a.event_title),
            venue: choice_key(a.venue, Venue::as_str),
            night_mount: choice_key(a.night_mount, YesNo::as_str),
            mount_who: choice_key(a.mount_who, MountWho::as_str),
            techs_count: i64::from(a.techs_count.unwrap_or(0)),
            extra_equipment: choice_key(a.extra_equipment, ExtraEquipment::as_str),
            plugs: text(&a.plugs),
            power_type: text(&a.power_type),
            power_count: i64::from(a.power_count.unwrap_or(0)),
            power_where: a.power_where.clone().unwrap_or_default(),
            dimmer_needed: choice_key(a.dimmer_needed, YesNo::as_str),
            dimmer_text: text(&a.dimmer_text),
            sfx: a.sfx.clone().unwrap_or_default(),
            sfx_other: text(&a.sfx_other),
            operator: choice_key(a.operator, Operator::as_str),
            console_help: choice_key(a.console_help, ConsoleHelp::as_str),
            console_model: text(&a.console_model),
            folder_path: input.folder_path.clone(),
        }
    }
}

/// Column values for a patch. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSubmission {
    pub org: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub event_date: Option<String>,
    pub event_title: Option<String>,
    pub venue: Option<String>,
    pub night_mount: Option<String>,
    pub mount_who: Option<String>,
    pub techs_count: Option<i64>,
    pub extra_equipment: Option<String>,
    pub plugs: Option<String>,
    pub power_type: Option<String>,
    pub power_count: Option<i64>,
    pub power_where: Option<Vec<String>>,
    pub dimmer_needed: Option<String>,
    pub dimmer_text: Option<String>,
    pub sfx: Option<Vec<String>>,
    pub sfx_other: Option<String>,
    pub operator: Option<String>,
    pub console_help: Option<String>,
    pub console_model: Option<String>,
    pub folder_path: Option<String>,
}

impl From<&SubmissionPatch> for UpdateSubmission {
    fn from(patch: &SubmissionPatch) -> Self {
        let mut u = UpdateSubmission::default();
        for field in &patch.fields {
            match field.clone() {
                FieldPatch::Org(v) => u.org = Some(v),
                FieldPatch::Role(v) => u.role = Some(v),
                FieldPatch::Name(v) => u.name = Some(v),
                FieldPatch::Phone(v) => u.phone = Some(v),
                FieldPatch::EventDate(v) => u.event_date = Some(v),
                FieldPatch::EventTitle(v) => u.event_title = Some(v),
                FieldPatch::Venue(v) => u.venue = Some(v.as_str().to_string()),
                FieldPatch::NightMount(v) => u.night_mount = Some(v.as_str().to_string()),
                FieldPatch::MountWho(v) => u.mount_who = Some(v.as_str().to_string()),
                FieldPatch::TechsCount(v) => u.techs_count = Some(i64::from(v)),
                FieldPatch::ExtraEquipment(v) => u.extra_equipment = Some(v.as_str().to_string()),
                FieldPatch::Plugs(v) => u.plugs = Some(v),
                FieldPatch::DimmerNeeded(v) => u.dimmer_needed = Some(v.as_str().to_string()),
                FieldPatch::DimmerText(v) => u.dimmer_text = Some(v),
                FieldPatch::Sfx(v) => u.sfx = Some(v),
                FieldPatch::SfxOther(v) => u.sfx_other = Some(v),
                FieldPatch::Operator(v) => u.operator = Some(v.as_str().to_string()),
                FieldPatch::ConsoleHelp(v) => u.console_help = Some(choice_key(v, ConsoleHelp::as_str)),
                FieldPatch::ConsoleModel(v) => u.console_model = Some(v),
                FieldPatch::Power(p) => {
                    u.power_type = Some(p.power_type);
                    u.power_count = Some(i64::from(p.power_count));
                    u.power_where = Some(p.power_where);
                }
                FieldPatch::FolderPath(v) => u.folder_path = Some(v),
            }
        }
        u
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row() -> SubmissionRow {
        SubmissionRow {
            id: 1,
            user_id: 5,
            org: "Acme".into(),
            role: "Producer".into(),
            name: "Jane".into(),
            phone: "+79123456789".into(),
            event_date: "01.01.2030".into(),
            event_title: "Gala".into(),
            venue: "main_hall".into(),
            night_mount: "no".into(),
            mount_who: "joint".into(),
            techs_count: 2,
            extra_equipment: "none".into(),
            plugs: "—".into(),
            power_type: "None".into(),
            power_count: 0,
            power_where: Json(Vec::new()),
            dimmer_needed: "no".into(),
            dimmer_text: "—".into(),
            sfx: Json(vec!["Haze".into()]),
            sfx_other: "—".into(),
            operator: "venue".into(),
            console_help: "—".into(),
            console_model: "—".into(),
            folder_path: "Festival/01.01.2030-Acme-Gala".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_placeholder_choice_to_none() {
        let s = Submission::try_from(row()).unwrap();
        assert_eq!(s.answers.console_help, None);
        assert_eq!(s.answers.operator, Some(Operator::Venue));
        assert_eq!(s.answers.techs_count, Some(2));
    }

    #[test]
    fn unknown_choice_key_is_an_error() {
        let mut r = row();
        r.venue = "rooftop".into();
        assert!(Submission::try_from(r).is_err());
    }

    #[test]
    fn insert_and_read_back_agree() {
        let s = Submission::try_from(row()).unwrap();
        let create = CreateSubmission::from(&NewSubmission {
            user_id: s.user_id,
            answers: s.answers.clone(),
            folder_path: s.folder_path.clone(),
        });
        assert_eq!(create.venue, "main_hall");
        assert_eq!(create.console_help, "—");
        assert_eq!(create.sfx, vec!["Haze"]);
    }

    #[test]
    fn cleared_console_help_is_written_as_placeholder() {
        let u = UpdateSubmission::from(&SubmissionPatch::new(vec![
            FieldPatch::Operator(Operator::Venue),
            FieldPatch::ConsoleHelp(None),
        ]));
        assert_eq!(u.operator.as_deref(), Some("venue"));
        assert_eq!(u.console_help.as_deref(), Some("—"));
        assert_eq!(u.org, None);
    }

    #[test]
    fn effects_patch_writes_list_and_details() {
        let u = UpdateSubmission::from(&SubmissionPatch::new(vec![
            FieldPatch::Sfx(vec!["Haze".into(), "Other".into()]),
            FieldPatch::SfxOther("bubbles".into()),
        ]));
        assert_eq!(u.sfx, Some(vec!["Haze".to_string(), "Other".to_string()]));
        assert_eq!(u.sfx_other.as_deref(), Some("bubbles"));
        assert_eq!(u.power_where, None);
    }
}
