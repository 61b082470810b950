//! Lineup optimization.
//!
//! Assigns a roster to the 1st/2nd/3rd entries of every event so that the
//! expected score against weighted opponent scenarios is maximal.
//!
//! # Key Components
//!
//! - [`MeetConfig`]: scoring rules, per-athlete caps, back-to-back pairs
//! - [`LineupModel`]: the assembled MIP with typed variable handles
//! - [`LineupRunner`]: solve and read back a [`LineupResult`]
//! - [`Exclusion`] / [`marginal_values`]: value of an athlete or entry by
//!   re-solving without it
//!
//! # Formulation
//!
//! Role indicators place athletes in rank entries. Each entry's rank time
//! is linearized with a per-event big-M (see [`event_bound`]), ordered
//! across ranks, and compared against each scenario's opponent times
//! through placement indicators. Scenario scores sum the place points of
//! the credited placements; the objective is their probability-weighted
//! sum. An optional second solve holds that sum (within
//! [`SCORE_TOLERANCE`]) and minimizes total rank time, so ties go to the
//! faster entries without trading away expected points.
//!
//! # References
//!
//! Wolsey (1998), "Integer Programming", ch. 1 (big-M formulations)

mod builder;
mod config;
mod extract;
mod marginal;
mod ranking;
mod runner;
mod scoring;
mod types;

pub use builder::{LineupModel, LineupVars};
pub use config::{MeetConfig, PointTable, RelayAdjustment};
pub use extract::{format_time, Entrant, EventLineup, LineupResult, RankEntry};
pub use marginal::{
    athlete_probes, entry_probes, marginal_value, marginal_values, Exclusion, MarginalValue,
};
pub use ranking::{event_bound, legs, placement_big_m, sentinel};
pub use runner::LineupRunner;
pub use scoring::SCORE_TOLERANCE;
pub use types::{HomeRank, PlacementKey, RoleKey, Slot};
