//! Survey dialogue state machine.
//!
//! The machine is a pure function of the [`Draft`] and one [`Input`]:
//! [`DialogueEngine::handle`] mutates the draft and reports what the
//! router should show next. [`DialogueEngine::prompt`] renders the prompt
//! of the draft's current state and is used both when moving forward and
//! when resuming a paused draft, so the two can never drift apart.
//!
//! Backbone:
//!
//! ```text
//! org → role → name → event_date → event_title → venue → night_mount →
//! mount_who → tech_count → extra_equipment → [plugs] → power_type_select →
//! {power_count → power_where}* → dimmer_choice → [dimmer_text] →
//! sfx_select → [sfx_other] → operator_choice → [console_help →
//! [console_model]] → phone → confirm
//! ```

use serde::{Deserialize, Serialize};

use crate::answers::{AnswerSummary, Answers};
use crate::error::CoreError;
use crate::options::{
    Confirm, ConsoleHelp, ExtraEquipment, MountWho, Operator, Venue, YesNo, DEFAULT_EVENT_TITLE,
    PLACEHOLDER,
};
use crate::power::{Finalized, Placement, PowerSubflow};
use crate::prompt::{
    parse_choice, single_choice_markup, Input, Markup, MultiSelectAction, Prompt, PAUSE_LABEL,
};
use crate::sfx::{SfxOutcome, SfxSubflow};
use crate::validation::{validate_date, validate_phone, validate_positive_int};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Position of a draft in the survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyState {
    Org,
    Role,
    Name,
    EventDate,
    EventTitle,
    Venue,
    NightMount,
    MountWho,
    TechCount,
    ExtraEquipment,
    Plugs,
    PowerTypeSelect,
    PowerCount,
    PowerWhere,
    DimmerChoice,
    DimmerText,
    SfxSelect,
    SfxOther,
    OperatorChoice,
    ConsoleHelp,
    ConsoleModel,
    Phone,
    Confirm,
}

impl SurveyState {
    /// Stable identifier, also used as the payload scope of the state's
    /// single-choice buttons.
    pub fn as_str(self) -> &'static str {
        match self {
            SurveyState::Org => "org",
            SurveyState::Role => "role",
            SurveyState::Name => "name",
            SurveyState::EventDate => "event_date",
            SurveyState::EventTitle => "event_title",
            SurveyState::Venue => "venue",
            SurveyState::NightMount => "night_mount",
            SurveyState::MountWho => "mount_who",
            SurveyState::TechCount => "tech_count",
            SurveyState::ExtraEquipment => "extra_equipment",
            SurveyState::Plugs => "plugs",
            SurveyState::PowerTypeSelect => "power_type_select",
            SurveyState::PowerCount => "power_count",
            SurveyState::PowerWhere => "power_where",
            SurveyState::DimmerChoice => "dimmer_choice",
            SurveyState::DimmerText => "dimmer_text",
            SurveyState::SfxSelect => "sfx_select",
            SurveyState::SfxOther => "sfx_other",
            SurveyState::OperatorChoice => "operator_choice",
            SurveyState::ConsoleHelp => "console_help",
            SurveyState::ConsoleModel => "console_model",
            SurveyState::Phone => "phone",
            SurveyState::Confirm => "confirm",
        }
    }

    /// True for states answered by typing.
    pub fn expects_text(self) -> bool {
        matches!(
            self,
            SurveyState::Org
                | SurveyState::Role
                | SurveyState::Name
                | SurveyState::EventDate
                | SurveyState::EventTitle
                | SurveyState::TechCount
                | SurveyState::Plugs
                | SurveyState::PowerCount
                | SurveyState::DimmerText
                | SurveyState::SfxOther
                | SurveyState::ConsoleModel
                | SurveyState::Phone
        )
    }

    /// True inside the power or special-effects sub-loop, where pausing is
    /// refused.
    pub fn in_subloop(self) -> bool {
        matches!(
            self,
            SurveyState::PowerTypeSelect
                | SurveyState::PowerCount
                | SurveyState::PowerWhere
                | SurveyState::SfxSelect
                | SurveyState::SfxOther
        )
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// A survey pass in progress. Persisted as one JSON document per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub state: SurveyState,
    #[serde(default)]
    pub answers: Answers,
    #[serde(default)]
    pub power: PowerSubflow,
    #[serde(default)]
    pub sfx: SfxSubflow,
}

impl Default for Draft {
    fn default() -> Self {
        Self::new()
    }
}

impl Draft {
    /// A fresh draft at the first question.
    pub fn new() -> Self {
        Self {
            state: SurveyState::Org,
            answers: Answers::default(),
            power: PowerSubflow::default(),
            sfx: SfxSubflow::default(),
        }
    }

    /// Serialize for storage.
    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        serde_json::to_value(self).map_err(|e| CoreError::Internal(format!("draft encode: {e}")))
    }

    /// Restore from storage. Any decoding problem is a validation error;
    /// callers discard such drafts.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(|e| CoreError::Validation(format!("draft decode: {e}")))
    }

    /// Summary as shown on the confirm screen, taking pending power items
    /// into account.
    pub fn summary(&self) -> AnswerSummary {
        AnswerSummary::derive(&self.answers, &self.power.items, &self.power.selected)
    }

    /// Answers ready to be committed, with every skipped field defaulted.
    pub fn finalized_answers(&self) -> Answers {
        let mut a = self.answers.clone();
        let placeholder = || Some(PLACEHOLDER.to_string());

        if a.event_title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            a.event_title = Some(DEFAULT_EVENT_TITLE.to_string());
        }
        if a.plugs.is_none() {
            a.plugs = placeholder();
        }
        if a.power_type.is_none() || a.power_where.is_none() || a.power_count.is_none() {
            let p = self.power.summary();
            a.power_type.get_or_insert(p.power_type);
            a.power_where.get_or_insert(p.power_where);
            a.power_count.get_or_insert(p.power_count);
        }
        if a.dimmer_text.is_none() {
            a.dimmer_text = placeholder();
        }
        a.sfx.get_or_insert_with(|| self.sfx.selected.clone());
        if a.sfx_other.is_none() {
            a.sfx_other = placeholder();
        }
        if a.console_model.is_none() {
            a.console_model = placeholder();
        }
        a
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// What the router should do after one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The input was accepted; show this prompt as a new message.
    Advance(Prompt),
    /// A multi-select option changed; redraw the keyboard in place.
    Refresh(Markup),
    /// Free text failed validation; show the hint and ask again.
    Reject(Prompt),
    /// Text arrived on a step that only accepts buttons.
    UseButtons,
    /// A button that does not belong to the current step.
    Stale,
    /// "Save" was pressed; commit these answers.
    Commit(Answers),
    /// "Start over" was pressed; discard the draft.
    Restart,
}

/// Stateless driver of the survey state machine.
pub struct DialogueEngine;

impl DialogueEngine {
    /// Prompt for the draft's current state.
    pub fn prompt(draft: &Draft) -> Prompt {
        let state = draft.state;
        let choices = |labels: Vec<&str>| single_choice_markup(state.as_str(), labels.as_slice());
        match state {
            SurveyState::Org => text_prompt("Which organization do you represent?"),
            SurveyState::Role => text_prompt("What is your position?"),
            SurveyState::Name => text_prompt("Your full name?"),
            SurveyState::EventDate => text_prompt("Event date (DD.MM.YYYY)?"),
            SurveyState::EventTitle => text_prompt("Event title?"),
            SurveyState::Venue => Prompt::new(
                "Which hall is the event in?",
                choices(Venue::ALL.iter().map(|v| v.label()).collect()),
            ),
            SurveyState::NightMount => Prompt::new(
                "Do you need night rigging?",
                choices(YesNo::ALL.iter().map(|v| v.label()).collect()),
            ),
            SurveyState::MountWho => Prompt::new(
                "Who will rig the lighting equipment?",
                choices(MountWho::ALL.iter().map(|v| v.label()).collect()),
            ),
            SurveyState::TechCount => {
                text_prompt("How many of your technicians will be on site?")
            }
            SurveyState::ExtraEquipment => Prompt::new(
                "Will there be additional lighting equipment?",
                choices(ExtraEquipment::ALL.iter().map(|v| v.label()).collect()),
            ),
            SurveyState::Plugs => {
                text_prompt("Which plugs and how many does the additional equipment need?")
            }
            SurveyState::PowerTypeSelect => draft.power.select_prompt(),
            SurveyState::PowerCount => draft.power.count_prompt(),
            SurveyState::PowerWhere => draft.power.place_prompt(),
            SurveyState::DimmerChoice => Prompt::new(
                "Do you need dimmer channels?",
                choices(YesNo::ALL.iter().map(|v| v.label()).collect()),
            ),
            SurveyState::DimmerText => text_prompt("How many dimmer channels, and where?"),
            SurveyState::SfxSelect => draft.sfx.select_prompt(),
            SurveyState::SfxOther => text_prompt("Describe the other special effects."),
            SurveyState::OperatorChoice => Prompt::new(
                "Who will operate the lighting console?",
                choices(Operator::ALL.iter().map(|v| v.label()).collect()),
            ),
            SurveyState::ConsoleHelp => {
                let model = draft.answers.venue.unwrap_or(Venue::SmallHall).console_model();
                Prompt::new(
                    format!("The hall console is {model}. Do you need help with it?"),
                    choices(ConsoleHelp::ALL.iter().map(|v| v.label()).collect()),
                )
            }
            SurveyState::ConsoleModel => text_prompt("Which console will you bring?"),
            SurveyState::Phone => text_prompt("Contact phone number?"),
            SurveyState::Confirm => Prompt::new(
                format!("Please check your answers:\n\n{}", draft.summary().to_text()),
                choices(Confirm::ALL.iter().map(|v| v.label()).collect()),
            ),
        }
    }

    /// Apply one input to the draft.
    ///
    /// Rejected and stale inputs leave the draft untouched.
    pub fn handle(draft: &mut Draft, input: &Input) -> Step {
        let state = draft.state;
        match input {
            Input::Text(_) if !state.expects_text() => Step::UseButtons,
            Input::Choice(_) if state.expects_text() => Step::Stale,
            Input::Text(text) => Self::handle_text(draft, text),
            Input::Choice(data) => Self::handle_choice(draft, data),
        }
    }

    fn handle_text(draft: &mut Draft, raw: &str) -> Step {
        let a = &mut draft.answers;
        let next = match draft.state {
            SurveyState::Org => {
                a.org = Some(text_or_placeholder(raw));
                SurveyState::Role
            }
            SurveyState::Role => {
                a.role = Some(text_or_placeholder(raw));
                SurveyState::Name
            }
            SurveyState::Name => {
                a.name = Some(text_or_placeholder(raw));
                SurveyState::EventDate
            }
            SurveyState::EventDate => match validate_date(raw) {
                Ok(date) => {
                    a.event_date = Some(date);
                    SurveyState::EventTitle
                }
                Err(e) => return reject(draft, &e),
            },
            SurveyState::EventTitle => {
                let title = raw.trim();
                a.event_title = Some(if title.is_empty() {
                    DEFAULT_EVENT_TITLE.to_string()
                } else {
                    title.to_string()
                });
                SurveyState::Venue
            }
            SurveyState::TechCount => match validate_positive_int(raw) {
                Ok(n) => {
                    a.techs_count = Some(n);
                    SurveyState::ExtraEquipment
                }
                Err(e) => return reject(draft, &e),
            },
            SurveyState::Plugs => {
                a.plugs = Some(text_or_placeholder(raw));
                SurveyState::PowerTypeSelect
            }
            SurveyState::PowerCount => match validate_positive_int(raw) {
                Ok(n) => {
                    if draft.power.set_count(n).is_none() {
                        return Step::Stale;
                    }
                    SurveyState::PowerWhere
                }
                Err(e) => return reject(draft, &e),
            },
            SurveyState::DimmerText => {
                a.dimmer_text = Some(text_or_placeholder(raw));
                SurveyState::SfxSelect
            }
            SurveyState::SfxOther => {
                a.sfx_other = Some(text_or_placeholder(raw));
                SurveyState::OperatorChoice
            }
            SurveyState::ConsoleModel => {
                a.console_model = Some(text_or_placeholder(raw));
                SurveyState::Phone
            }
            SurveyState::Phone => match validate_phone(raw) {
                Ok(phone) => {
                    a.phone = Some(phone);
                    SurveyState::Confirm
                }
                Err(e) => return reject(draft, &e),
            },
            _ => return Step::UseButtons,
        };
        advance(draft, next)
    }

    fn handle_choice(draft: &mut Draft, data: &str) -> Step {
        let state = draft.state;
        let index = parse_choice(data, state.as_str());
        let a = &mut draft.answers;

        let next = match state {
            SurveyState::Venue => match index.and_then(Venue::from_index) {
                Some(v) => {
                    a.venue = Some(v);
                    SurveyState::NightMount
                }
                None => return Step::Stale,
            },
            SurveyState::NightMount => match index.and_then(YesNo::from_index) {
                Some(v) => {
                    a.night_mount = Some(v);
                    SurveyState::MountWho
                }
                None => return Step::Stale,
            },
            SurveyState::MountWho => match index.and_then(MountWho::from_index) {
                Some(v) => {
                    a.mount_who = Some(v);
                    SurveyState::TechCount
                }
                None => return Step::Stale,
            },
            SurveyState::ExtraEquipment => match index.and_then(ExtraEquipment::from_index) {
                Some(ExtraEquipment::None) => {
                    a.extra_equipment = Some(ExtraEquipment::None);
                    a.plugs = Some(PLACEHOLDER.to_string());
                    SurveyState::PowerTypeSelect
                }
                Some(v) => {
                    a.extra_equipment = Some(v);
                    SurveyState::Plugs
                }
                None => return Step::Stale,
            },
            SurveyState::PowerTypeSelect => return Self::handle_power_select(draft, data),
            SurveyState::PowerWhere => {
                let Some(place) = PowerSubflow::parse_place(data) else {
                    return Step::Stale;
                };
                match draft.power.add_placement(place) {
                    Some(Placement::More { .. }) => SurveyState::PowerWhere,
                    Some(Placement::NextItem) => SurveyState::PowerCount,
                    Some(Placement::Done) => {
                        store_power(draft);
                        SurveyState::DimmerChoice
                    }
                    None => return Step::Stale,
                }
            }
            SurveyState::DimmerChoice => match index.and_then(YesNo::from_index) {
                Some(YesNo::Yes) => {
                    a.dimmer_needed = Some(YesNo::Yes);
                    SurveyState::DimmerText
                }
                Some(YesNo::No) => {
                    a.dimmer_needed = Some(YesNo::No);
                    a.dimmer_text = Some(PLACEHOLDER.to_string());
                    SurveyState::SfxSelect
                }
                None => return Step::Stale,
            },
            SurveyState::SfxSelect => return Self::handle_sfx_select(draft, data),
            SurveyState::OperatorChoice => match index.and_then(Operator::from_index) {
                Some(op) if op.is_venue_provided() => {
                    a.operator = Some(op);
                    a.console_help = None;
                    a.console_model = Some(PLACEHOLDER.to_string());
                    SurveyState::Phone
                }
                Some(op) => {
                    a.operator = Some(op);
                    SurveyState::ConsoleHelp
                }
                None => return Step::Stale,
            },
            SurveyState::ConsoleHelp => match index.and_then(ConsoleHelp::from_index) {
                Some(ConsoleHelp::BringOwn) => {
                    a.console_help = Some(ConsoleHelp::BringOwn);
                    SurveyState::ConsoleModel
                }
                Some(help) => {
                    a.console_help = Some(help);
                    a.console_model = Some(PLACEHOLDER.to_string());
                    SurveyState::Phone
                }
                None => return Step::Stale,
            },
            SurveyState::Confirm => {
                return match index.and_then(Confirm::from_index) {
                    Some(Confirm::Save) => Step::Commit(draft.finalized_answers()),
                    Some(Confirm::Restart) => Step::Restart,
                    None => Step::Stale,
                };
            }
            _ => return Step::Stale,
        };
        advance(draft, next)
    }

    fn handle_power_select(draft: &mut Draft, data: &str) -> Step {
        match PowerSubflow::parse_select(data) {
            Some(MultiSelectAction::Toggle(i)) if draft.power.toggle(i) => {
                Step::Refresh(draft.power.select_markup())
            }
            Some(MultiSelectAction::Clear) if draft.power.clear() => {
                Step::Refresh(draft.power.select_markup())
            }
            Some(MultiSelectAction::Finish) => match draft.power.finalize() {
                Finalized::Empty => {
                    store_power(draft);
                    advance(draft, SurveyState::DimmerChoice)
                }
                Finalized::Items => advance(draft, SurveyState::PowerCount),
            },
            _ => Step::Stale,
        }
    }

    fn handle_sfx_select(draft: &mut Draft, data: &str) -> Step {
        match SfxSubflow::parse(data) {
            Some(MultiSelectAction::Toggle(i)) if draft.sfx.toggle(i) => {
                Step::Refresh(draft.sfx.select_markup())
            }
            Some(MultiSelectAction::Clear) if draft.sfx.clear() => {
                Step::Refresh(draft.sfx.select_markup())
            }
            Some(MultiSelectAction::Finish) => {
                let outcome = draft.sfx.finalize();
                draft.answers.sfx = Some(draft.sfx.selected.clone());
                match outcome {
                    SfxOutcome::NeedsOther => advance(draft, SurveyState::SfxOther),
                    SfxOutcome::Done => {
                        draft.answers.sfx_other = Some(PLACEHOLDER.to_string());
                        advance(draft, SurveyState::OperatorChoice)
                    }
                }
            }
            _ => Step::Stale,
        }
    }
}

/// Free-text prompt with the pause key under the input field.
fn text_prompt(text: &str) -> Prompt {
    Prompt::new(text, Markup::Reply(vec![vec![PAUSE_LABEL.to_string()]]))
}

fn text_or_placeholder(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

fn advance(draft: &mut Draft, next: SurveyState) -> Step {
    draft.state = next;
    Step::Advance(DialogueEngine::prompt(draft))
}

fn reject(draft: &Draft, err: &CoreError) -> Step {
    let hint = match err {
        CoreError::Validation(hint) => hint.as_str(),
        _ => "Please try again.",
    };
    let prompt = DialogueEngine::prompt(draft);
    Step::Reject(Prompt::new(format!("{hint}\n\n{}", prompt.text), prompt.markup))
}

/// Write the finished power sub-loop into the answers.
fn store_power(draft: &mut Draft) {
    let summary = draft.power.summary();
    draft.answers.power_type = Some(summary.power_type);
    draft.answers.power_count = Some(summary.power_count);
    draft.answers.power_where = Some(summary.power_where);
}
