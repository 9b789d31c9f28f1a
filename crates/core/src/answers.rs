//! Answer model and the derivation rules used whenever an answer set is
//! rendered (review screen, "my answers", admin view, summary document).
//!
//! Rendering is a pure function of the stored answers plus any power
//! items still pending in a draft, so a draft reviewed on the confirm
//! screen and the submission committed from it render identically.

use serde::{Deserialize, Serialize};

use crate::options::{
    ConsoleHelp, ExtraEquipment, MountWho, Operator, Venue, YesNo, PLACEHOLDER, POWER_NONE,
    SFX_OTHER,
};

// ---------------------------------------------------------------------------
// Power items
// ---------------------------------------------------------------------------

/// One selected power connection type with its requested count and the
/// placements picked so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u32,
    #[serde(rename = "where")]
    pub places: Vec<String>,
}

impl PowerItem {
    /// A freshly selected type with no count and no placements yet.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            count: 0,
            places: Vec::new(),
        }
    }

    /// Placements still to be picked for this item.
    pub fn remaining(&self) -> u32 {
        self.count.saturating_sub(self.places.len() as u32)
    }

    /// True once every requested placement has been picked.
    pub fn is_filled(&self) -> bool {
        self.count > 0 && self.remaining() == 0
    }
}

/// Flatten items into `"type: location"` strings, one per placement.
pub fn flatten_placements(items: &[PowerItem]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| {
            item.places
                .iter()
                .map(move |place| format!("{}: {}", item.kind, place))
        })
        .collect()
}

/// Join the item types into the stored type summary (`"A, B"`).
pub fn join_types<S: AsRef<str>>(types: &[S]) -> String {
    types
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rebuild grouped items from a flattened `"type: location"` list.
///
/// Types keep the order of their first appearance; each item's count is
/// the number of placements found for it. Entries without a `": "`
/// separator are skipped.
pub fn group_placements<S: AsRef<str>>(flat: &[S]) -> Vec<PowerItem> {
    let mut items: Vec<PowerItem> = Vec::new();
    for entry in flat {
        let Some((kind, place)) = entry.as_ref().split_once(": ") else {
            continue;
        };
        let kind = kind.trim();
        let place = place.trim();
        if kind.is_empty() {
            continue;
        }
        match items.iter_mut().find(|item| item.kind == kind) {
            Some(item) => item.places.push(place.to_string()),
            None => items.push(PowerItem {
                kind: kind.to_string(),
                count: 0,
                places: vec![place.to_string()],
            }),
        }
    }
    for item in &mut items {
        item.count = item.places.len() as u32;
    }
    items
}

/// Sum of the requested counts across all items.
pub fn total_count(items: &[PowerItem]) -> u32 {
    items.iter().map(|item| item.count).sum()
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// One answer set. Every field is optional so the same struct serves a
/// half-filled draft and a committed submission; the dialogue state tag
/// tells which fields are already populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Answers {
    pub org: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub event_date: Option<String>,
    pub event_title: Option<String>,
    pub venue: Option<Venue>,
    pub night_mount: Option<YesNo>,
    pub mount_who: Option<MountWho>,
    pub techs_count: Option<u32>,
    pub extra_equipment: Option<ExtraEquipment>,
    pub plugs: Option<String>,
    /// Explicit power type summary (`"A, B"` or `"None"`).
    pub power_type: Option<String>,
    /// Explicit flattened placements (`"type: location"`).
    pub power_where: Option<Vec<String>>,
    pub power_count: Option<u32>,
    pub dimmer_needed: Option<YesNo>,
    pub dimmer_text: Option<String>,
    pub sfx: Option<Vec<String>>,
    pub sfx_other: Option<String>,
    pub operator: Option<Operator>,
    pub console_help: Option<ConsoleHelp>,
    pub console_model: Option<String>,
    pub phone: Option<String>,
}

/// Power information as displayed, after applying the derivation rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPower {
    pub needed: YesNo,
    pub type_summary: String,
    pub placements: Vec<String>,
}

/// Type summaries that mean "no power connection".
const EMPTY_POWER_TYPES: &[&str] = &["", PLACEHOLDER, POWER_NONE, "0"];

impl Answers {
    /// Apply the power derivation rules.
    ///
    /// `pending_items` and `pending_types` are the draft's power sub-loop
    /// state; pass empty slices for a committed submission.
    pub fn derive_power(&self, pending_items: &[PowerItem], pending_types: &[String]) -> DerivedPower {
        let placements = match &self.power_where {
            Some(list) if !list.is_empty() => list.clone(),
            _ if !pending_items.is_empty() => flatten_placements(pending_items),
            _ => Vec::new(),
        };

        let explicit = self
            .power_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let type_summary = match explicit {
            Some(t) => t.to_string(),
            None if !pending_items.is_empty() => {
                let kinds: Vec<&str> = pending_items.iter().map(|i| i.kind.as_str()).collect();
                join_types(&kinds)
            }
            None => join_types(pending_types),
        };

        let mut needed = !(placements.is_empty() && EMPTY_POWER_TYPES.contains(&type_summary.as_str()));
        if type_summary == POWER_NONE {
            needed = false;
        }
        if !needed && (!pending_items.is_empty() || !pending_types.is_empty()) {
            needed = true;
        }

        DerivedPower {
            needed: if needed { YesNo::Yes } else { YesNo::No },
            type_summary,
            placements,
        }
    }

    /// Console model as displayed: nothing for the venue operator, the
    /// client's own model when they bring one, otherwise the hall console.
    pub fn derived_console_model(&self) -> String {
        if self.operator.is_some_and(Operator::is_venue_provided) {
            return PLACEHOLDER.to_string();
        }
        if self.console_help == Some(ConsoleHelp::BringOwn) {
            return non_blank(self.console_model.as_deref())
                .unwrap_or(PLACEHOLDER)
                .to_string();
        }
        match self.venue {
            Some(Venue::MainHall) => Venue::MainHall.console_model().to_string(),
            _ => Venue::SmallHall.console_model().to_string(),
        }
    }

    /// Special effects as displayed, with `"Other"` expanded to
    /// `"Other: <text>"` when an elaboration was given.
    pub fn derived_sfx(&self) -> Vec<String> {
        let other = non_blank(self.sfx_other.as_deref());
        self.sfx
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|label| match (label.as_str(), other) {
                (SFX_OTHER, Some(text)) => format!("{SFX_OTHER}: {text}"),
                _ => label.clone(),
            })
            .collect()
    }

    /// Render the review summary of a committed answer set.
    pub fn summary(&self) -> AnswerSummary {
        AnswerSummary::derive(self, &[], &[])
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Value of one summary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValue {
    Text(String),
    List(Vec<String>),
}

impl RowValue {
    fn text(value: Option<&str>) -> Self {
        RowValue::Text(non_blank(value).unwrap_or(PLACEHOLDER).to_string())
    }

    fn display<T: std::fmt::Display>(value: Option<T>) -> Self {
        match value {
            Some(v) => RowValue::Text(v.to_string()),
            None => RowValue::Text(PLACEHOLDER.to_string()),
        }
    }

    /// Single-cell rendering: list entries joined by newlines.
    pub fn as_cell(&self) -> String {
        match self {
            RowValue::Text(s) => s.clone(),
            RowValue::List(items) if items.is_empty() => PLACEHOLDER.to_string(),
            RowValue::List(items) => items.join("\n"),
        }
    }
}

/// One question/answer pair of the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: RowValue,
}

/// The rendered answer set shared by the chat review screen and the
/// summary document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSummary {
    pub rows: Vec<SummaryRow>,
}

impl AnswerSummary {
    /// Build the summary, applying every derivation rule in order.
    pub fn derive(answers: &Answers, pending_items: &[PowerItem], pending_types: &[String]) -> Self {
        let power = answers.derive_power(pending_items, pending_types);
        let dimmer = answers.dimmer_needed;

        let mut rows = vec![
            row("Organization", RowValue::text(answers.org.as_deref())),
            row("Position", RowValue::text(answers.role.as_deref())),
            row("Name", RowValue::text(answers.name.as_deref())),
            row("Phone", RowValue::text(answers.phone.as_deref())),
            row("Event date", RowValue::text(answers.event_date.as_deref())),
            row("Event title", RowValue::text(answers.event_title.as_deref())),
            row("Venue", RowValue::display(answers.venue)),
            row("Night rigging", RowValue::display(answers.night_mount)),
            row("Rigging by", RowValue::display(answers.mount_who)),
            row("Technicians", RowValue::display(answers.techs_count)),
            row("Extra equipment", RowValue::display(answers.extra_equipment)),
            row("Plugs", RowValue::text(answers.plugs.as_deref())),
            row("Power connections", RowValue::Text(power.needed.to_string())),
            row("Power types", RowValue::text(Some(&power.type_summary))),
            row("Power placements", RowValue::List(power.placements)),
            row("Dimmer channels", RowValue::display(dimmer)),
        ];
        if dimmer == Some(YesNo::Yes) {
            rows.push(row("Dimmer details", RowValue::text(answers.dimmer_text.as_deref())));
        }
        rows.extend([
            row("Special effects", RowValue::List(answers.derived_sfx())),
            row("Operator", RowValue::display(answers.operator)),
            row("Console help", RowValue::display(answers.console_help)),
            row("Console", RowValue::Text(answers.derived_console_model())),
        ]);

        Self { rows }
    }

    /// Look up a row value by label.
    pub fn get(&self, label: &str) -> Option<&RowValue> {
        self.rows.iter().find(|r| r.label == label).map(|r| &r.value)
    }

    /// Plain-text rendering for chat messages.
    pub fn to_text(&self) -> String {
        self.rows
            .iter()
            .map(|r| match &r.value {
                RowValue::Text(s) => format!("{}: {s}", r.label),
                RowValue::List(items) if items.is_empty() => format!("{}: {PLACEHOLDER}", r.label),
                RowValue::List(items) => {
                    let lines: Vec<String> = items.iter().map(|i| format!("  - {i}")).collect();
                    format!("{}:\n{}", r.label, lines.join("\n"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn row(label: &'static str, value: RowValue) -> SummaryRow {
    SummaryRow { label, value }
}
