//! Power-connection sub-loop.
//!
//! The user first multi-selects connection types. After "Next" the
//! selection is frozen and turned into one [`PowerItem`] per type; each
//! item then asks for a count and for that many placement picks. The same
//! sub-loop runs inside the survey and, seeded from a stored submission,
//! inside the edit flow.

use serde::{Deserialize, Serialize};

use crate::answers::{flatten_placements, join_types, total_count, PowerItem};
use crate::options::{POWER_NONE, POWER_PLACES, POWER_TYPES};
use crate::prompt::{
    multi_select_markup, parse_choice, parse_multi_select, single_choice_markup, Markup,
    MultiSelectAction, Prompt,
};

/// Payload scope of the type multi-select.
pub const TYPE_SCOPE: &str = "pw";

/// Payload scope of the placement picker.
pub const PLACE_SCOPE: &str = "pw:w";

/// Result of finalizing the type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalized {
    /// Nothing selected; power is not needed.
    Empty,
    /// Items created; the first count prompt follows.
    Items,
}

/// Result of one placement pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The current item still needs `left` placements.
    More { left: u32 },
    /// The current item is filled; the next item's count prompt follows.
    NextItem,
    /// Every item is filled.
    Done,
}

/// Flattened power answer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerSummary {
    pub power_type: String,
    pub power_count: u32,
    pub power_where: Vec<String>,
}

/// State of the power sub-loop. Serialized into the draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerSubflow {
    /// Selected type labels in toggle order.
    pub selected: Vec<String>,
    /// One item per selected type, created on finalize.
    pub items: Vec<PowerItem>,
    /// Index of the item being filled.
    pub cursor: usize,
    /// True once "Next" was pressed.
    pub frozen: bool,
}

impl PowerSubflow {
    /// Start with the given types pre-selected (used by the edit flow).
    pub fn preselected(types: impl IntoIterator<Item = String>) -> Self {
        let mut selected: Vec<String> = Vec::new();
        for t in types {
            if !selected.contains(&t) {
                selected.push(t);
            }
        }
        Self {
            selected,
            ..Default::default()
        }
    }

    /// The item being filled, if any.
    pub fn current(&self) -> Option<&PowerItem> {
        self.items.get(self.cursor)
    }

    /// Flip one option. Returns false when the selection is frozen or the
    /// index is out of range.
    pub fn toggle(&mut self, index: usize) -> bool {
        let Some(option) = POWER_TYPES.get(index) else {
            return false;
        };
        if self.frozen {
            return false;
        }
        match self.selected.iter().position(|s| s == option) {
            Some(pos) => {
                self.selected.remove(pos);
            }
            None => self.selected.push(option.to_string()),
        }
        true
    }

    /// Clear the selection. Returns false when frozen.
    pub fn clear(&mut self) -> bool {
        if self.frozen {
            return false;
        }
        self.selected.clear();
        true
    }

    /// Freeze the selection and create one item per selected type.
    pub fn finalize(&mut self) -> Finalized {
        self.frozen = true;
        self.cursor = 0;
        self.items = self.selected.iter().map(PowerItem::new).collect();
        if self.items.is_empty() {
            Finalized::Empty
        } else {
            Finalized::Items
        }
    }

    /// Record the count of the current item. Returns the number of
    /// placements to pick, or `None` when no item is awaiting a count.
    pub fn set_count(&mut self, count: u32) -> Option<u32> {
        let item = self.items.get_mut(self.cursor)?;
        if item.count != 0 || count == 0 {
            return None;
        }
        item.count = count;
        Some(count)
    }

    /// Record one placement for the current item. Duplicates are allowed.
    pub fn add_placement(&mut self, place: &str) -> Option<Placement> {
        let item = self.items.get_mut(self.cursor)?;
        if item.count == 0 || item.is_filled() {
            return None;
        }
        item.places.push(place.to_string());
        if !item.is_filled() {
            return Some(Placement::More {
                left: item.remaining(),
            });
        }
        self.cursor += 1;
        if self.cursor < self.items.len() {
            Some(Placement::NextItem)
        } else {
            Some(Placement::Done)
        }
    }

    /// The stored answer fields for the current items.
    pub fn summary(&self) -> PowerSummary {
        if self.items.is_empty() {
            return PowerSummary {
                power_type: POWER_NONE.to_string(),
                power_count: 0,
                power_where: Vec::new(),
            };
        }
        let kinds: Vec<&str> = self.items.iter().map(|i| i.kind.as_str()).collect();
        PowerSummary {
            power_type: join_types(&kinds),
            power_count: total_count(&self.items),
            power_where: flatten_placements(&self.items),
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Decode a type-selection payload.
    pub fn parse_select(data: &str) -> Option<MultiSelectAction> {
        parse_multi_select(data, TYPE_SCOPE)
    }

    /// Decode a placement payload into the placement label.
    pub fn parse_place(data: &str) -> Option<&'static str> {
        parse_choice(data, PLACE_SCOPE).and_then(|i| POWER_PLACES.get(i).copied())
    }

    // -----------------------------------------------------------------------
    // Prompts
    // -----------------------------------------------------------------------

    pub fn select_markup(&self) -> Markup {
        multi_select_markup(TYPE_SCOPE, POWER_TYPES, &self.selected)
    }

    pub fn select_prompt(&self) -> Prompt {
        Prompt::new(
            "Which power connections do you need? Select all that apply, then press Next.",
            self.select_markup(),
        )
    }

    /// Count prompt for the current item.
    pub fn count_prompt(&self) -> Prompt {
        let kind = self.current().map(|i| i.kind.as_str()).unwrap_or_default();
        Prompt::new(
            format!("How many \"{kind}\" connections do you need?"),
            Markup::None,
        )
    }

    /// Placement prompt for the current item, with the "N left" suffix.
    pub fn place_prompt(&self) -> Prompt {
        let (kind, left) = self
            .current()
            .map(|i| (i.kind.as_str(), i.remaining()))
            .unwrap_or_default();
        Prompt::new(
            format!("Where should the \"{kind}\" connection go? ({left} left)"),
            single_choice_markup(PLACE_SCOPE, POWER_PLACES),
        )
    }
}
