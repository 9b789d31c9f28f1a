//! Single-field revision of a committed submission.
//!
//! The user picks a field from a reply keyboard, types or picks the new
//! value, and the engine produces a [`SubmissionPatch`] with the
//! dependent resets applied. "Power connections" re-runs the power
//! sub-loop seeded from the stored placements and ends in its own
//! save/discard confirmation. "Special effects" re-runs the effects
//! multi-select seeded from the stored list and asks for the "Other"
//! details only when that option stays selected.

use crate::answers::{group_placements, Answers};
use crate::error::CoreError;
use crate::options::{
    ConsoleHelp, ExtraEquipment, MountWho, Operator, Venue, YesNo, DEFAULT_EVENT_TITLE,
    PLACEHOLDER,
};
use crate::power::{Finalized, Placement, PowerSubflow};
use crate::prompt::{
    parse_choice, single_choice_markup, Input, Markup, MultiSelectAction, Prompt, BACK_LABEL,
};
use crate::sfx::{SfxOutcome, SfxSubflow};
use crate::submission::{FieldPatch, Submission, SubmissionPatch};
use crate::types::DbId;
use crate::validation::{validate_date, validate_phone, validate_positive_int};

/// Payload scope of the power edit confirmation.
pub const POWER_CONFIRM_SCOPE: &str = "edpw";

const POWER_CONFIRM_LABELS: [&str; 2] = ["✅ Save", "❌ Discard"];

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// A field offered in the edit menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditField {
    Org,
    Role,
    Name,
    Phone,
    EventDate,
    EventTitle,
    Venue,
    NightMount,
    MountWho,
    TechsCount,
    ExtraEquipment,
    Plugs,
    Power,
    DimmerNeeded,
    DimmerText,
    Sfx,
    Operator,
    ConsoleHelp,
    ConsoleModel,
}

impl EditField {
    /// Menu order.
    pub const ALL: &'static [EditField] = &[
        EditField::Org,
        EditField::Role,
        EditField::Name,
        EditField::Phone,
        EditField::EventDate,
        EditField::EventTitle,
        EditField::Venue,
        EditField::NightMount,
        EditField::MountWho,
        EditField::TechsCount,
        EditField::ExtraEquipment,
        EditField::Plugs,
        EditField::Power,
        EditField::DimmerNeeded,
        EditField::DimmerText,
        EditField::Sfx,
        EditField::Operator,
        EditField::ConsoleHelp,
        EditField::ConsoleModel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditField::Org => "Organization",
            EditField::Role => "Position",
            EditField::Name => "Name",
            EditField::Phone => "Phone",
            EditField::EventDate => "Event date",
            EditField::EventTitle => "Event title",
            EditField::Venue => "Venue",
            EditField::NightMount => "Night rigging",
            EditField::MountWho => "Rigging by",
            EditField::TechsCount => "Technicians",
            EditField::ExtraEquipment => "Extra equipment",
            EditField::Plugs => "Plugs",
            EditField::Power => "Power connections",
            EditField::DimmerNeeded => "Dimmer channels",
            EditField::DimmerText => "Dimmer details",
            EditField::Sfx => "Special effects",
            EditField::Operator => "Operator",
            EditField::ConsoleHelp => "Console help",
            EditField::ConsoleModel => "Console",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.label() == s.trim())
    }

    /// Option labels for fixed-choice fields; `None` for free text.
    fn choices(self) -> Option<Vec<&'static str>> {
        fn labels<T: Copy>(all: &[T], label: fn(T) -> &'static str) -> Option<Vec<&'static str>> {
            Some(all.iter().copied().map(label).collect())
        }
        match self {
            EditField::Venue => labels(Venue::ALL, Venue::label),
            EditField::NightMount | EditField::DimmerNeeded => labels(YesNo::ALL, YesNo::label),
            EditField::MountWho => labels(MountWho::ALL, MountWho::label),
            EditField::ExtraEquipment => labels(ExtraEquipment::ALL, ExtraEquipment::label),
            EditField::Operator => labels(Operator::ALL, Operator::label),
            EditField::ConsoleHelp => labels(ConsoleHelp::ALL, ConsoleHelp::label),
            _ => None,
        }
    }

    fn current_value(self, a: &Answers) -> String {
        fn show<T: std::fmt::Display>(v: Option<T>) -> String {
            v.map(|v| v.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        }
        match self {
            EditField::Org => show(a.org.as_deref()),
            EditField::Role => show(a.role.as_deref()),
            EditField::Name => show(a.name.as_deref()),
            EditField::Phone => show(a.phone.as_deref()),
            EditField::EventDate => show(a.event_date.as_deref()),
            EditField::EventTitle => show(a.event_title.as_deref()),
            EditField::Venue => show(a.venue),
            EditField::NightMount => show(a.night_mount),
            EditField::MountWho => show(a.mount_who),
            EditField::TechsCount => show(a.techs_count),
            EditField::ExtraEquipment => show(a.extra_equipment),
            EditField::Plugs => show(a.plugs.as_deref()),
            EditField::Power => show(a.power_type.as_deref()),
            EditField::DimmerNeeded => show(a.dimmer_needed),
            EditField::DimmerText => show(a.dimmer_text.as_deref()),
            EditField::Sfx => {
                let sfx = a.derived_sfx();
                if sfx.is_empty() {
                    PLACEHOLDER.to_string()
                } else {
                    sfx.join(", ")
                }
            }
            EditField::Operator => show(a.operator),
            EditField::ConsoleHelp => show(a.console_help),
            EditField::ConsoleModel => a.derived_console_model(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Position inside the edit flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    PickField,
    Value(EditField),
    PowerSelect,
    PowerCount,
    PowerWhere,
    PowerConfirm,
    SfxSelect,
    SfxOther,
}

/// One edit session over one submission. Lives only in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub submission_id: DbId,
    pub state: EditState,
    pub power: PowerSubflow,
    pub sfx: SfxSubflow,
}

/// What the router should do after one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditStep {
    /// Show this prompt as a new message.
    Ask(Prompt),
    /// Redraw the keyboard of the message the button belongs to.
    Refresh(Markup),
    /// The value failed validation; show the hint and ask again.
    Reject(Prompt),
    UseButtons,
    Stale,
    /// Write this patch, then return to the field menu.
    Patch(SubmissionPatch),
    /// The power edit was discarded; back at the field menu.
    Discarded(Prompt),
    /// Leave the edit flow.
    Back,
}

impl EditSession {
    pub fn new(submission_id: DbId) -> Self {
        Self {
            submission_id,
            state: EditState::PickField,
            power: PowerSubflow::default(),
            sfx: SfxSubflow::default(),
        }
    }

    /// The field menu.
    pub fn menu_prompt() -> Prompt {
        let mut rows: Vec<Vec<String>> = EditField::ALL
            .chunks(2)
            .map(|pair| pair.iter().map(|f| f.label().to_string()).collect())
            .collect();
        rows.push(vec![BACK_LABEL.to_string()]);
        Prompt::new("Which answer do you want to change?", Markup::Reply(rows))
    }

    /// Prompt of the current state.
    pub fn prompt(&self, submission: &Submission) -> Prompt {
        match self.state {
            EditState::PickField => Self::menu_prompt(),
            EditState::Value(field) => value_prompt(field, &submission.answers),
            EditState::PowerSelect => self.power.select_prompt(),
            EditState::PowerCount => self.power.count_prompt(),
            EditState::PowerWhere => self.power.place_prompt(),
            EditState::PowerConfirm => self.power_confirm_prompt(),
            EditState::SfxSelect => self.sfx.select_prompt(),
            EditState::SfxOther => sfx_other_prompt(&submission.answers),
        }
    }

    /// Apply one input.
    pub fn handle(&mut self, submission: &Submission, input: &Input) -> EditStep {
        if let Input::Text(text) = input {
            if text.trim() == BACK_LABEL {
                return self.back();
            }
        }
        match (self.state, input) {
            (EditState::PickField, Input::Text(text)) => self.pick_field(submission, text),
            (EditState::Value(field), Input::Text(text)) => {
                match build_patch(field, text) {
                    Ok(patch) => {
                        self.state = EditState::PickField;
                        EditStep::Patch(patch)
                    }
                    Err(e) => {
                        let prompt = self.prompt(submission);
                        EditStep::Reject(Prompt::new(
                            format!("{}\n\n{}", hint(&e), prompt.text),
                            prompt.markup,
                        ))
                    }
                }
            }
            (EditState::PowerCount, Input::Text(text)) => match validate_positive_int(text) {
                Ok(n) if self.power.set_count(n).is_some() => {
                    self.state = EditState::PowerWhere;
                    EditStep::Ask(self.power.place_prompt())
                }
                Ok(_) => EditStep::Stale,
                Err(e) => {
                    let prompt = self.power.count_prompt();
                    EditStep::Reject(Prompt::new(format!("{}\n\n{}", hint(&e), prompt.text), prompt.markup))
                }
            },
            (EditState::SfxOther, Input::Text(text)) => {
                let patch = SubmissionPatch::new(vec![
                    FieldPatch::Sfx(self.sfx.selected.clone()),
                    FieldPatch::SfxOther(text_value(text)),
                ]);
                self.state = EditState::PickField;
                self.sfx = SfxSubflow::default();
                EditStep::Patch(patch)
            }
            (EditState::PowerSelect, Input::Choice(data)) => self.power_select(data),
            (EditState::PowerWhere, Input::Choice(data)) => self.power_where(data),
            (EditState::PowerConfirm, Input::Choice(data)) => self.power_confirm(data),
            (EditState::SfxSelect, Input::Choice(data)) => self.sfx_select(submission, data),
            (
                EditState::PowerSelect
                | EditState::PowerWhere
                | EditState::PowerConfirm
                | EditState::SfxSelect,
                Input::Text(_),
            ) => EditStep::UseButtons,
            (_, Input::Choice(_)) => EditStep::Stale,
        }
    }

    fn back(&mut self) -> EditStep {
        match self.state {
            EditState::PickField => EditStep::Back,
            _ => {
                self.state = EditState::PickField;
                self.power = PowerSubflow::default();
                self.sfx = SfxSubflow::default();
                EditStep::Ask(Self::menu_prompt())
            }
        }
    }

    fn pick_field(&mut self, submission: &Submission, text: &str) -> EditStep {
        let Some(field) = EditField::from_label(text) else {
            let menu = Self::menu_prompt();
            return EditStep::Reject(Prompt::new(
                format!("Please choose a field from the keyboard.\n\n{}", menu.text),
                menu.markup,
            ));
        };
        if field == EditField::Power {
            let stored = submission.answers.power_where.as_deref().unwrap_or_default();
            let items = group_placements(stored);
            self.power = PowerSubflow::preselected(items.into_iter().map(|i| i.kind));
            self.state = EditState::PowerSelect;
            return EditStep::Ask(self.power.select_prompt());
        }
        if field == EditField::Sfx {
            let stored = submission.answers.sfx.as_deref().unwrap_or_default();
            self.sfx = SfxSubflow::preselected(stored);
            self.state = EditState::SfxSelect;
            return EditStep::Ask(self.sfx.select_prompt());
        }
        self.state = EditState::Value(field);
        EditStep::Ask(value_prompt(field, &submission.answers))
    }

    fn power_select(&mut self, data: &str) -> EditStep {
        match PowerSubflow::parse_select(data) {
            Some(MultiSelectAction::Toggle(i)) if self.power.toggle(i) => {
                EditStep::Refresh(self.power.select_markup())
            }
            Some(MultiSelectAction::Clear) if self.power.clear() => {
                EditStep::Refresh(self.power.select_markup())
            }
            Some(MultiSelectAction::Finish) => match self.power.finalize() {
                Finalized::Empty => {
                    self.state = EditState::PowerConfirm;
                    EditStep::Ask(self.power_confirm_prompt())
                }
                Finalized::Items => {
                    self.state = EditState::PowerCount;
                    EditStep::Ask(self.power.count_prompt())
                }
            },
            _ => EditStep::Stale,
        }
    }

    fn sfx_select(&mut self, submission: &Submission, data: &str) -> EditStep {
        match SfxSubflow::parse(data) {
            Some(MultiSelectAction::Toggle(i)) if self.sfx.toggle(i) => {
                EditStep::Refresh(self.sfx.select_markup())
            }
            Some(MultiSelectAction::Clear) if self.sfx.clear() => {
                EditStep::Refresh(self.sfx.select_markup())
            }
            Some(MultiSelectAction::Finish) => match self.sfx.finalize() {
                SfxOutcome::NeedsOther => {
                    self.state = EditState::SfxOther;
                    EditStep::Ask(sfx_other_prompt(&submission.answers))
                }
                SfxOutcome::Done => {
                    let patch = SubmissionPatch::new(vec![
                        FieldPatch::Sfx(self.sfx.selected.clone()),
                        FieldPatch::SfxOther(PLACEHOLDER.to_string()),
                    ]);
                    self.state = EditState::PickField;
                    self.sfx = SfxSubflow::default();
                    EditStep::Patch(patch)
                }
            },
            _ => EditStep::Stale,
        }
    }

    fn power_where(&mut self, data: &str) -> EditStep {
        let Some(place) = PowerSubflow::parse_place(data) else {
            return EditStep::Stale;
        };
        match self.power.add_placement(place) {
            Some(Placement::More { .. }) => EditStep::Ask(self.power.place_prompt()),
            Some(Placement::NextItem) => {
                self.state = EditState::PowerCount;
                EditStep::Ask(self.power.count_prompt())
            }
            Some(Placement::Done) => {
                self.state = EditState::PowerConfirm;
                EditStep::Ask(self.power_confirm_prompt())
            }
            None => EditStep::Stale,
        }
    }

    fn power_confirm(&mut self, data: &str) -> EditStep {
        match parse_choice(data, POWER_CONFIRM_SCOPE) {
            Some(0) => {
                let summary = self.power.summary();
                self.state = EditState::PickField;
                self.power = PowerSubflow::default();
                EditStep::Patch(SubmissionPatch::single(FieldPatch::Power(summary)))
            }
            Some(1) => {
                self.state = EditState::PickField;
                self.power = PowerSubflow::default();
                let menu = Self::menu_prompt();
                EditStep::Discarded(Prompt::new(
                    format!("Changes discarded.\n\n{}", menu.text),
                    menu.markup,
                ))
            }
            _ => EditStep::Stale,
        }
    }

    fn power_confirm_prompt(&self) -> Prompt {
        let summary = self.power.summary();
        let placements = if summary.power_where.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            summary
                .power_where
                .iter()
                .map(|p| format!("  - {p}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        Prompt::new(
            format!(
                "New power connections:\nTypes: {}\nPlacements:\n{placements}\n\nSave these changes?",
                summary.power_type
            ),
            single_choice_markup(POWER_CONFIRM_SCOPE, &POWER_CONFIRM_LABELS),
        )
    }
}

fn value_prompt(field: EditField, a: &Answers) -> Prompt {
    let current = field.current_value(a);
    match field.choices() {
        Some(labels) => {
            let mut rows: Vec<Vec<String>> =
                labels.iter().map(|l| vec![l.to_string()]).collect();
            rows.push(vec![BACK_LABEL.to_string()]);
            Prompt::new(
                format!("{}\nCurrent value: {current}\nChoose a new value:", field.label()),
                Markup::Reply(rows),
            )
        }
        None => Prompt::new(
            format!("{}\nCurrent value: {current}\nType a new value:", field.label()),
            Markup::Reply(vec![vec![BACK_LABEL.to_string()]]),
        ),
    }
}

fn sfx_other_prompt(a: &Answers) -> Prompt {
    let current = a.sfx_other.as_deref().unwrap_or(PLACEHOLDER);
    Prompt::new(
        format!("Describe the other special effects.\nCurrent value: {current}"),
        Markup::Reply(vec![vec![BACK_LABEL.to_string()]]),
    )
}

fn hint(err: &CoreError) -> &str {
    match err {
        CoreError::Validation(hint) => hint,
        _ => "Please try again.",
    }
}

fn pick<T: Copy>(from_label: fn(&str) -> Option<T>, text: &str) -> Result<T, CoreError> {
    from_label(text)
        .ok_or_else(|| CoreError::Validation("Please choose one of the options.".to_string()))
}

fn text_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Validate the new value and build the patch with dependent resets.
fn build_patch(field: EditField, raw: &str) -> Result<SubmissionPatch, CoreError> {
    let placeholder = || PLACEHOLDER.to_string();
    let fields = match field {
        EditField::Org => vec![FieldPatch::Org(text_value(raw))],
        EditField::Role => vec![FieldPatch::Role(text_value(raw))],
        EditField::Name => vec![FieldPatch::Name(text_value(raw))],
        EditField::Phone => vec![FieldPatch::Phone(validate_phone(raw)?)],
        EditField::EventDate => vec![FieldPatch::EventDate(validate_date(raw)?)],
        EditField::EventTitle => {
            let title = raw.trim();
            vec![FieldPatch::EventTitle(if title.is_empty() {
                DEFAULT_EVENT_TITLE.to_string()
            } else {
                title.to_string()
            })]
        }
        EditField::Venue => vec![FieldPatch::Venue(pick(Venue::from_label, raw)?)],
        EditField::NightMount => vec![FieldPatch::NightMount(pick(YesNo::from_label, raw)?)],
        EditField::MountWho => vec![FieldPatch::MountWho(pick(MountWho::from_label, raw)?)],
        EditField::TechsCount => vec![FieldPatch::TechsCount(validate_positive_int(raw)?)],
        EditField::ExtraEquipment => {
            let v = pick(ExtraEquipment::from_label, raw)?;
            let mut fields = vec![FieldPatch::ExtraEquipment(v)];
            if v == ExtraEquipment::None {
                fields.push(FieldPatch::Plugs(placeholder()));
            }
            fields
        }
        EditField::Plugs => vec![FieldPatch::Plugs(text_value(raw))],
        EditField::DimmerNeeded => {
            let v = pick(YesNo::from_label, raw)?;
            let mut fields = vec![FieldPatch::DimmerNeeded(v)];
            if v == YesNo::No {
                fields.push(FieldPatch::DimmerText(placeholder()));
            }
            fields
        }
        EditField::DimmerText => vec![FieldPatch::DimmerText(text_value(raw))],
        EditField::Operator => {
            let v = pick(Operator::from_label, raw)?;
            let mut fields = vec![FieldPatch::Operator(v)];
            if v.is_venue_provided() {
                fields.push(FieldPatch::ConsoleHelp(None));
                fields.push(FieldPatch::ConsoleModel(placeholder()));
            }
            fields
        }
        EditField::ConsoleHelp => {
            let v = pick(ConsoleHelp::from_label, raw)?;
            let mut fields = vec![FieldPatch::ConsoleHelp(Some(v))];
            if v != ConsoleHelp::BringOwn {
                fields.push(FieldPatch::ConsoleModel(placeholder()));
            }
            fields
        }
        EditField::ConsoleModel => vec![FieldPatch::ConsoleModel(text_value(raw))],
        EditField::Power | EditField::Sfx => {
            return Err(CoreError::Internal(format!(
                "{} is edited through its sub-loop",
                field.label()
            )))
        }
    };
    Ok(SubmissionPatch::new(fields))
}
