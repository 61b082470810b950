//! Swim meet lineup optimization.
//!
//! Assigns a team's athletes to the events of a dual meet so as to
//! maximize the expected score against one or more weighted opponent
//! scenarios:
//!
//! - **Meet**: Event taxonomy, predicted-performance tables with gap
//!   filling and ghost athletes, and validated opponent scenarios.
//! - **Lineup**: Mixed-integer formulation with rank roles, relay
//!   composition, per-athlete caps, big-M rank times and placement
//!   indicators; result extraction and marginal-value probes.
//! - **MIP**: Domain-agnostic linear modelling layer with a `good_lp`
//!   backend behind the [`mip::MipSolver`] trait.
//!
//! # Architecture
//!
//! Inputs flow `RawPerformance` → [`meet::PreparedRoster`] →
//! [`lineup::LineupModel`] → [`mip::MipSolver`] → [`lineup::LineupResult`].
//! The assembled model is immutable; marginal probes layer their
//! exclusions on top of it instead of editing it.
//!
//! # Example
//!
//! ```
//! use u_lineup::lineup::{LineupModel, LineupRunner, MeetConfig};
//! use u_lineup::meet::{Column, Event, Meet, OpponentLineup, RawPerformance, ScenarioSet};
//! use u_lineup::mip::SolverConfig;
//!
//! let meet = Meet::new(vec![Event::individual("100F"), Event::individual("100BK")]).unwrap();
//! let free = meet.require("100F").unwrap();
//! let back = meet.require("100BK").unwrap();
//!
//! let mut raw = RawPerformance::new();
//! for (name, f, b) in [("Ada", 49.9, 55.0), ("Bo", 50.6, 54.1), ("Cy", 51.2, 56.3)] {
//!     raw.record(name, Column::Individual(free), f);
//!     raw.record(name, Column::Individual(back), b);
//! }
//! let opponent = OpponentLineup::new()
//!     .with_times(free, vec![50.1, 50.8, 52.0])
//!     .with_times(back, vec![54.5, 55.5, 57.0]);
//! let scenarios = ScenarioSet::single(opponent).unwrap();
//!
//! let model = LineupModel::prepare(&meet, &raw, &scenarios, &MeetConfig::default().with_relay_size(1))
//!     .unwrap();
//! let result = LineupRunner::run(&model, &SolverConfig::default()).unwrap();
//! assert!(result.expected_score > 0.0);
//! println!("{result}");
//! ```

pub mod error;
pub mod lineup;
pub mod meet;
pub mod mip;

pub use error::LineupError;
