//! Meet inputs: event program, predicted performances, opponent scenarios.
//!
//! # Key Components
//!
//! - [`Meet`] / [`Event`] / [`Column`]: the event taxonomy. Relays expand
//!   into leg columns, so no event is ever classified by parsing its name.
//! - [`RawPerformance`] → [`PreparedRoster`]: predicted times with gaps
//!   filled by per-column defaults, plus ghost athletes.
//! - [`ScenarioSet`]: weighted opponent lineups.

mod roster;
mod scenario;
mod taxonomy;

pub use roster::{Athlete, AthleteId, PreparedRoster, RawPerformance};
pub use scenario::{OpponentLineup, Scenario, ScenarioId, ScenarioSet};
pub use taxonomy::{Column, Event, EventId, EventKind, LegRole, Meet, Stroke};
