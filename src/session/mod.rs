//! Cascading selection sessions
//!
//! A session is one browser-equivalent context driving the selection form.
//! The form is abstracted behind [`SelectionUi`] so the traversal logic in
//! [`NavigationSession`] does not care whether it is talking to the live
//! site over HTTP ([`HttpSelectionUi`]) or to a simulation.
//!
//! The four cascading dropdowns are modelled by [`Level`]: selecting an
//! option at one level triggers a round trip that repopulates the level
//! below it and clears everything deeper.

mod http_ui;
mod navigator;
#[cfg(test)]
pub(crate) mod sim;

pub use http_ui::{HttpSelectionUi, HttpSessionFactory};
pub use navigator::{NavigationSession, SessionStats};

use crate::Result;
use async_trait::async_trait;
use std::fmt;
use url::Url;

/// One dropdown of the cascading form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Faculty,
    ProgramType,
    Program,
    PlanType,
}

impl Level {
    /// All levels, parents first
    pub const ALL: [Level; 4] = [
        Level::Faculty,
        Level::ProgramType,
        Level::Program,
        Level::PlanType,
    ];

    /// Zero-based position in the cascade
    pub fn index(&self) -> usize {
        match self {
            Self::Faculty => 0,
            Self::ProgramType => 1,
            Self::Program => 2,
            Self::PlanType => 3,
        }
    }

    /// The level this one populates when selected
    pub fn dependent(&self) -> Option<Level> {
        Level::ALL.get(self.index() + 1).copied()
    }

    /// Form field name of the `<select>` for this level
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Faculty => "FakulteId",
            Self::ProgramType => "ProgramTipiId",
            Self::Program => "programKodu",
            Self::PlanType => "planTipiKodu",
        }
    }

    /// Whether the first option of this dropdown is a "please select" placeholder
    ///
    /// Only the faculty and program type dropdowns carry one.
    pub fn has_placeholder_option(&self) -> bool {
        matches!(self, Self::Faculty | Self::ProgramType)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Faculty => "faculty",
            Self::ProgramType => "program type",
            Self::Program => "program",
            Self::PlanType => "plan type",
        };
        write!(f, "{}", name)
    }
}

/// One `<option>` of a dropdown
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectOption {
    /// Submitted value
    pub value: String,
    /// Display text
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A browser-equivalent view of the cascading selection form
///
/// Implementations hold the form state of exactly one session and are never
/// shared between workers.
#[async_trait]
pub trait SelectionUi: Send {
    /// Loads the form from scratch, clearing every selection
    async fn open(&mut self) -> Result<()>;

    /// Reads the options currently populated for `level`
    ///
    /// Fails with `NotPopulated` if the dropdown has not been filled, which
    /// happens when its parent is not selected.
    async fn options(&mut self, level: Level) -> Result<Vec<SelectOption>>;

    /// Selects `option` at `level`, populating the dependent level
    ///
    /// Fails with `StaleState` if the option is not among the options
    /// currently populated for `level`.
    async fn select(&mut self, level: Level, option: &SelectOption) -> Result<()>;

    /// Submits the fully selected form and returns the iteration listing URL
    async fn submit(&mut self) -> Result<Url>;

    /// Navigates back from the listing to the form
    async fn back(&mut self) -> Result<()>;

    /// Whether the form currently shows placeholder markers instead of selections
    async fn shows_placeholders(&mut self) -> Result<bool>;
}

/// Creates a fresh, isolated session for each claimed faculty
pub trait SessionFactory: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn SelectionUi>>;
}
