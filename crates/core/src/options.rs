//! Fixed answer options for the intake questionnaire.
//!
//! Single-choice questions are modelled as enums carrying a stable
//! database key (`as_str`) and a user-facing button label (`label`).
//! Multi-select questions (power types, placements, special effects) are
//! plain label lists because their answers are stored as label strings.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Placeholder stored for skipped or defaulted text fields.
pub const PLACEHOLDER: &str = "—";

/// Power type summary stored when no power connection is needed.
pub const POWER_NONE: &str = "None";

/// Multi-select special-effects option that triggers a free-text follow-up.
pub const SFX_OTHER: &str = "Other";

/// Event title stored when the user left it blank.
pub const DEFAULT_EVENT_TITLE: &str = "Event";

/// Console installed in the main hall.
pub const MAIN_HALL_CONSOLE: &str = "GrandMA2 Light";

/// Console installed in every other hall.
pub const SMALL_HALL_CONSOLE: &str = "ChamSys MQ500";

/// Selectable power connection types.
pub const POWER_TYPES: &[&str] = &["63A - 5 pin", "32A - 5 pin", "32A - 3 pin"];

/// Selectable placements for a single power connection.
pub const POWER_PLACES: &[&str] = &["Stage left", "Upstage", "Stage right", "Downstage"];

/// Selectable special effects.
pub const SFX_OPTIONS: &[&str] = &["Haze", "Heavy smoke", "Confetti", "Cold sparks", SFX_OTHER];

macro_rules! define_choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($key:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant in button order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Convert to a database-compatible string.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $key ),+
                }
            }

            /// User-facing button label.
            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Parse a value stored in the database.
            pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
                match s {
                    $( $key => Ok($name::$variant), )+
                    _ => Err(CoreError::Validation(format!(
                        "Invalid {} '{s}'",
                        stringify!($name)
                    ))),
                }
            }

            /// Resolve a button label typed back by the user.
            pub fn from_label(s: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.label() == s.trim())
            }

            /// Resolve a button by its position in [`Self::ALL`].
            pub fn from_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }

            /// Position of this variant in [`Self::ALL`].
            pub fn index(self) -> usize {
                Self::ALL.iter().position(|v| *v == self).unwrap_or(0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

define_choice_enum! {
    /// Hall in which the event takes place.
    Venue {
        MainHall => ("main_hall", "Main hall"),
        SmallHall => ("small_hall", "Small hall"),
    }
}

define_choice_enum! {
    /// Generic yes/no answer.
    YesNo {
        Yes => ("yes", "Yes"),
        No => ("no", "No"),
    }
}

define_choice_enum! {
    /// Who rigs the lighting equipment.
    MountWho {
        ClientCrew => ("client_crew", "Your crew"),
        VenueCrew => ("venue_crew", "Venue crew"),
        Joint => ("joint", "Joint crew"),
    }
}

define_choice_enum! {
    /// Whether additional lighting equipment is brought in.
    ExtraEquipment {
        None => ("none", "None"),
        OwnGear => ("own_gear", "We bring our own"),
        Rental => ("rental", "We rent it"),
    }
}

define_choice_enum! {
    /// Who operates the lighting console during the event.
    Operator {
        Client => ("client", "Your operator"),
        Venue => ("venue", "Venue operator"),
    }
}

define_choice_enum! {
    /// Whether the client needs help with the venue console.
    ConsoleHelp {
        Yes => ("yes", "Yes"),
        No => ("no", "No"),
        BringOwn => ("bring_own", "We bring our own console"),
    }
}

define_choice_enum! {
    /// Final confirmation of a survey pass or a power edit.
    Confirm {
        Save => ("save", "✅ Save"),
        Restart => ("restart", "🔁 Start over"),
    }
}

impl Operator {
    /// True for the operator provided by the venue, which makes the
    /// console questions irrelevant.
    pub fn is_venue_provided(self) -> bool {
        self == Operator::Venue
    }
}

impl Venue {
    /// Console model installed in this hall.
    pub fn console_model(self) -> &'static str {
        match self {
            Venue::MainHall => MAIN_HALL_CONSOLE,
            Venue::SmallHall => SMALL_HALL_CONSOLE,
        }
    }
}
