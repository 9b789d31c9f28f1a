//! Special-effects sub-loop: one multi-select with an optional free-text
//! elaboration when "Other" is picked.

use serde::{Deserialize, Serialize};

use crate::options::{SFX_OPTIONS, SFX_OTHER};
use crate::prompt::{multi_select_markup, parse_multi_select, Markup, MultiSelectAction, Prompt};

/// Payload scope of the effects multi-select.
pub const SFX_SCOPE: &str = "fx";

/// What follows a finalized selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfxOutcome {
    /// "Other" was selected; ask for details.
    NeedsOther,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SfxSubflow {
    pub selected: Vec<String>,
    pub frozen: bool,
}

impl SfxSubflow {
    /// Unfrozen selection seeded from stored labels.
    pub fn preselected(labels: &[String]) -> Self {
        let mut selected: Vec<String> = Vec::new();
        for label in labels {
            if !selected.contains(label) {
                selected.push(label.clone());
            }
        }
        Self {
            selected,
            frozen: false,
        }
    }

    /// Flip one option. Returns false when frozen or out of range.
    pub fn toggle(&mut self, index: usize) -> bool {
        let Some(option) = SFX_OPTIONS.get(index) else {
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

    pub fn clear(&mut self) -> bool {
        if self.frozen {
            return false;
        }
        self.selected.clear();
        true
    }

    /// Freeze the selection.
    pub fn finalize(&mut self) -> SfxOutcome {
        self.frozen = true;
        if self.selected.iter().any(|s| s == SFX_OTHER) {
            SfxOutcome::NeedsOther
        } else {
            SfxOutcome::Done
        }
    }

    pub fn parse(data: &str) -> Option<MultiSelectAction> {
        parse_multi_select(data, SFX_SCOPE)
    }

    pub fn select_markup(&self) -> Markup {
        multi_select_markup(SFX_SCOPE, SFX_OPTIONS, &self.selected)
    }

    pub fn select_prompt(&self) -> Prompt {
        Prompt::new(
            "Do you need any special effects? Select all that apply, then press Next.",
            self.select_markup(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_triggers_follow_up() {
        let mut s = SfxSubflow::default();
        s.toggle(0);
        s.toggle(4);
        assert_eq!(s.finalize(), SfxOutcome::NeedsOther);
        assert_eq!(s.selected, vec!["Haze", "Other"]);
    }

    #[test]
    fn plain_selection_finishes() {
        let mut s = SfxSubflow::default();
        s.toggle(2);
        assert_eq!(s.finalize(), SfxOutcome::Done);
    }

    #[test]
    fn empty_selection_finishes() {
        let mut s = SfxSubflow::default();
        s.toggle(1);
        s.clear();
        assert_eq!(s.finalize(), SfxOutcome::Done);
        assert!(s.selected.is_empty());
    }

    #[test]
    fn frozen_selection_ignores_toggles() {
        let mut s = SfxSubflow::default();
        s.finalize();
        assert!(!s.toggle(0));
        assert!(!s.clear());
    }

    #[test]
    fn preselected_keeps_stored_order() {
        let stored = vec!["Confetti".to_string(), "Haze".to_string(), "Haze".to_string()];
        let mut s = SfxSubflow::preselected(&stored);
        assert_eq!(s.selected, vec!["Confetti", "Haze"]);
        assert!(s.toggle(0));
        assert_eq!(s.selected, vec!["Confetti"]);
    }
}
