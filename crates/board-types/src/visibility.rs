//! Vacancy visibility state machine.
//!
//! ```text
//!            Publish / Toggle
//!   ┌───────┐ ───────────────► ┌───────────┐
//!   │ Draft │                  │ Published │
//!   └───────┘ ◄─────────────── └───────────┘
//!           Unpublish / Toggle
//! ```
//!
//! `Draft` is `is_active = false`, `Published` is `is_active = true`. There is
//! no review state in between; publishing takes effect immediately.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub visibility_machine(Draft)

    Draft => {
        Publish => Published,
        Unpublish => Draft,
        Toggle => Published
    },
    Published => {
        Publish => Published,
        Unpublish => Draft,
        Toggle => Draft
    }
}

pub use visibility_machine::Input as VisibilityInput;
pub use visibility_machine::State as VisibilityMachineState;
pub use visibility_machine::StateMachine as VisibilityMachine;

/// Public visibility of a vacancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyVisibility {
    Draft,
    Published,
}

impl VacancyVisibility {
    pub fn from_active(is_active: bool) -> Self {
        if is_active {
            VacancyVisibility::Published
        } else {
            VacancyVisibility::Draft
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, VacancyVisibility::Published)
    }

    /// Run `input` through the machine starting from `self`.
    pub fn apply(self, input: VisibilityInput) -> VacancyVisibility {
        let mut machine = VisibilityMachine::from_state(self.into());
        // Every input is defined for every state, so consume cannot fail.
        let _ = machine.consume(&input);
        VacancyVisibility::from(machine.state())
    }

    pub fn toggled(self) -> VacancyVisibility {
        self.apply(VisibilityInput::Toggle)
    }
}

impl From<&VisibilityMachineState> for VacancyVisibility {
    fn from(state: &VisibilityMachineState) -> Self {
        match state {
            VisibilityMachineState::Draft => VacancyVisibility::Draft,
            VisibilityMachineState::Published => VacancyVisibility::Published,
        }
    }
}

impl From<VacancyVisibility> for VisibilityMachineState {
    fn from(v: VacancyVisibility) -> Self {
        match v {
            VacancyVisibility::Draft => VisibilityMachineState::Draft,
            VacancyVisibility::Published => VisibilityMachineState::Published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_both_ways() {
        assert_eq!(
            VacancyVisibility::Draft.toggled(),
            VacancyVisibility::Published
        );
        assert_eq!(
            VacancyVisibility::Published.toggled(),
            VacancyVisibility::Draft
        );
    }

    #[test]
    fn publish_and_unpublish_are_idempotent() {
        let published = VacancyVisibility::Draft.apply(VisibilityInput::Publish);
        assert_eq!(published.apply(VisibilityInput::Publish), published);

        let draft = published.apply(VisibilityInput::Unpublish);
        assert_eq!(draft, VacancyVisibility::Draft);
        assert_eq!(draft.apply(VisibilityInput::Unpublish), draft);
    }

    #[test]
    fn maps_to_is_active() {
        assert!(VacancyVisibility::from_active(true).is_active());
        assert!(!VacancyVisibility::from_active(false).is_active());
    }
}
