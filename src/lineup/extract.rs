//! Reading a lineup back out of a MIP solution.

use super::builder::LineupModel;
use super::types::{HomeRank, Slot};
use crate::error::LineupError;
use crate::meet::{AthleteId, EventId, EventKind, ScenarioId};
use crate::mip::{MipSolution, SolverStatus};
use std::fmt;
use std::time::Duration;

/// One athlete swimming in a rank entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Entrant {
    pub athlete: AthleteId,
    pub name: String,
    pub ghost: bool,
    pub slot: Slot,
    /// Predicted time of this leg, in seconds.
    pub time: f64,
}

/// The 1st, 2nd or 3rd entry of an event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RankEntry {
    pub rank: HomeRank,
    /// Swimmers in slot order. Empty when the entry is conceded.
    pub entrants: Vec<Entrant>,
    /// Predicted entry time (sum of legs for relays).
    pub time: Option<f64>,
    /// Place credited under the reference scenario.
    pub place: Option<u8>,
}

impl RankEntry {
    pub fn is_empty(&self) -> bool {
        self.entrants.is_empty()
    }
}

/// All rank entries of one event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EventLineup {
    pub event: EventId,
    pub name: String,
    pub kind: EventKind,
    pub ranks: Vec<RankEntry>,
}

/// A solved lineup.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LineupResult {
    /// Solver status.
    pub status: SolverStatus,
    /// Entries per event, in program order.
    pub events: Vec<EventLineup>,
    /// Score under each scenario.
    pub scenario_scores: Vec<f64>,
    /// Σ probability × scenario score.
    pub expected_score: f64,
    /// Objective reported by the solver. After a tie-break solve this is
    /// the expected score of the refined lineup.
    pub objective_value: f64,
    /// Scenario the reported places refer to.
    pub reference_scenario: ScenarioId,
    /// Wall-clock solve time.
    pub solve_time: Duration,
}

impl LineupResult {
    /// Extracts the lineup from a solution of `model`.
    ///
    /// # Errors
    ///
    /// [`LineupError::NoSolution`] when the status carries no solution.
    pub fn extract(model: &LineupModel, solution: &MipSolution) -> Result<Self, LineupError> {
        if !solution.is_solution_found() {
            return Err(LineupError::NoSolution {
                status: solution.status,
                message: solution.message.clone(),
            });
        }

        let reference = ScenarioId::new(model.config.reference_scenario);
        let events = model
            .meet
            .event_ids()
            .map(|event| EventLineup {
                event,
                name: model.meet.event(event).name.clone(),
                kind: model.meet.event(event).kind,
                ranks: HomeRank::ALL
                    .iter()
                    .map(|&rank| rank_entry(model, solution, event, rank, reference))
                    .collect(),
            })
            .collect();

        Ok(Self {
            status: solution.status,
            events,
            scenario_scores: model.scenario_scores(solution),
            expected_score: model.expected_score(solution),
            objective_value: solution.objective_value.unwrap_or_default(),
            reference_scenario: reference,
            solve_time: solution.solve_time,
        })
    }

    /// Lineup of one event.
    pub fn event(&self, event: EventId) -> Option<&EventLineup> {
        self.events.iter().find(|e| e.event == event)
    }

    /// Lineup of one event, by name.
    pub fn event_named(&self, name: &str) -> Option<&EventLineup> {
        self.events.iter().find(|e| e.name == name)
    }

    /// Events an athlete swims, with the rank entry they belong to.
    pub fn assignments(&self, athlete: AthleteId) -> Vec<(EventId, HomeRank)> {
        self.events
            .iter()
            .flat_map(|e| {
                e.ranks
                    .iter()
                    .filter(|r| r.entrants.iter().any(|x| x.athlete == athlete))
                    .map(move |r| (e.event, r.rank))
            })
            .collect()
    }
}

fn rank_entry(
    model: &LineupModel,
    solution: &MipSolution,
    event: EventId,
    rank: HomeRank,
    reference: ScenarioId,
) -> RankEntry {
    let mut entrants: Vec<Entrant> = model
        .vars
        .roles()
        .filter(|(key, var)| key.event == event && key.rank == rank && solution.is_set(*var))
        .map(|(key, _)| {
            let athlete = model.roster.athlete(key.athlete);
            Entrant {
                athlete: key.athlete,
                name: athlete.name.clone(),
                ghost: athlete.ghost,
                slot: key.slot,
                time: model.roster.time(key.athlete, key.slot.column(event)),
            }
        })
        .collect();
    entrants.sort_by_key(|e| (e.slot, e.athlete));

    let time = (!entrants.is_empty()).then(|| entrants.iter().map(|e| e.time).sum::<f64>());
    RankEntry {
        rank,
        entrants,
        time,
        place: model.credited_place(solution, event, rank, reference),
    }
}

/// Formats seconds as `m:ss.ss`.
///
/// # Examples
///
/// ```
/// use u_lineup::lineup::format_time;
///
/// assert_eq!(format_time(49.87), "0:49.87");
/// assert_eq!(format_time(125.4), "2:05.40");
/// ```
pub fn format_time(seconds: f64) -> String {
    let hundredths = (seconds.max(0.0) * 100.0).round() as u64;
    let minutes = hundredths / 6000;
    let rest = hundredths % 6000;
    format!("{minutes}:{:02}.{:02}", rest / 100, rest % 100)
}

impl fmt::Display for LineupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "{}", event.name)?;
            for entry in &event.ranks {
                write!(f, "  {}.", entry.rank)?;
                if entry.is_empty() {
                    writeln!(f, " (empty)")?;
                    continue;
                }
                let names: Vec<String> = entry
                    .entrants
                    .iter()
                    .map(|e| match e.slot {
                        Slot::Individual | Slot::RelayFlying => e.name.clone(),
                        slot => format!("{} ({})", e.name, slot.code()),
                    })
                    .collect();
                write!(f, " {}", names.join(", "))?;
                if let Some(time) = entry.time {
                    write!(f, "  {}", format_time(time))?;
                }
                match entry.place {
                    Some(place) => writeln!(f, "  place {place}")?,
                    None => writeln!(f)?,
                }
            }
        }
        for (s, score) in self.scenario_scores.iter().enumerate() {
            writeln!(f, "scenario {s}: {score:.2}")?;
        }
        write!(f, "expected score: {:.2}", self.expected_score)
    }
}
