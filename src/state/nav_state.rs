/// Navigation state definitions for one selection session
///
/// Each state names the deepest cascading selection currently in force.
use crate::session::Level;
use crate::HarvestError;
use std::fmt;

/// Where a session currently is in the cascading form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavState {
    /// Form loaded, nothing selected (also the state after a reset)
    AtRoot,

    /// A faculty is selected; program type options are loading or loaded
    FacultySelected,

    /// A program type is selected; program options are loading or loaded
    ProgramTypeSelected,

    /// A program is selected; plan type options are loading or loaded
    ProgramSelected,

    /// A plan type is selected; the form can be submitted
    PlanTypeSelected,

    /// The form was submitted and the iteration listing is showing
    SubmittedIterationList,
}

impl NavState {
    /// Number of selections in force
    pub fn depth(&self) -> usize {
        match self {
            Self::AtRoot => 0,
            Self::FacultySelected => 1,
            Self::ProgramTypeSelected => 2,
            Self::ProgramSelected => 3,
            Self::PlanTypeSelected => 4,
            Self::SubmittedIterationList => 5,
        }
    }

    /// The state reached by selecting an option at `level`
    pub fn after_selecting(level: Level) -> Self {
        match level {
            Level::Faculty => Self::FacultySelected,
            Level::ProgramType => Self::ProgramTypeSelected,
            Level::Program => Self::ProgramSelected,
            Level::PlanType => Self::PlanTypeSelected,
        }
    }

    /// Returns true if the form is showing (anything but the listing page)
    pub fn is_on_form(&self) -> bool {
        !matches!(self, Self::SubmittedIterationList)
    }

    /// Returns true if `next` is reachable in one step
    ///
    /// - Reloading the form (or a detected reset) returns to `AtRoot` from anywhere.
    /// - Selecting at some level requires its parent level to be selected and
    ///   drops every deeper selection, so moving "up" by re-selecting is allowed.
    /// - Only a fully selected form can be submitted.
    /// - Going back from the listing restores the form with its selections.
    pub fn can_transition_to(&self, next: NavState) -> bool {
        match (self, next) {
            (_, Self::AtRoot) => true,
            (Self::SubmittedIterationList, Self::PlanTypeSelected) => true,
            (Self::SubmittedIterationList, _) => false,
            (Self::PlanTypeSelected, Self::SubmittedIterationList) => true,
            (_, Self::SubmittedIterationList) => false,
            (current, next) => current.depth() + 1 >= next.depth(),
        }
    }

    /// Validates and performs a transition
    pub fn transition(self, next: NavState) -> Result<NavState, HarvestError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(HarvestError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns all states in traversal order
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::AtRoot,
            Self::FacultySelected,
            Self::ProgramTypeSelected,
            Self::ProgramSelected,
            Self::PlanTypeSelected,
            Self::SubmittedIterationList,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtRoot => "at_root",
            Self::FacultySelected => "faculty_selected",
            Self::ProgramTypeSelected => "program_type_selected",
            Self::ProgramSelected => "program_selected",
            Self::PlanTypeSelected => "plan_type_selected",
            Self::SubmittedIterationList => "submitted_iteration_list",
        }
    }
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
