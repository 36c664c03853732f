//! State module for tracking navigation progress
//!
//! `NavState` tracks how deep into the cascading form a session currently is
//! and validates every move it makes.

mod nav_state;

pub use nav_state::NavState;
