//! Opponent scenarios.

use super::taxonomy::EventId;
use crate::error::LineupError;
use std::collections::BTreeMap;

/// Index of a scenario within its [`ScenarioSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioId(pub(crate) usize);

impl ScenarioId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Predicted opponent times per event.
///
/// For relays the time is the whole relay team's time. Events without
/// entries are treated as uncontested by the opponent.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpponentLineup {
    times: BTreeMap<EventId, Vec<f64>>,
}

impl OpponentLineup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the opponent entrants' times for one event (any order).
    pub fn set_times(&mut self, event: EventId, mut times: Vec<f64>) {
        times.sort_by(f64::total_cmp);
        self.times.insert(event, times);
    }

    pub fn with_times(mut self, event: EventId, times: Vec<f64>) -> Self {
        self.set_times(event, times);
        self
    }

    /// Opponent times for an event, fastest first.
    pub fn times(&self, event: EventId) -> &[f64] {
        self.times.get(&event).map_or(&[], Vec::as_slice)
    }

    fn validate(&self) -> Result<(), String> {
        for times in self.times.values() {
            if let Some(t) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
                return Err(format!("invalid opponent time {t}"));
            }
        }
        Ok(())
    }
}

/// An opponent lineup and its probability.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scenario {
    pub lineup: OpponentLineup,
    pub probability: f64,
}

/// Validated set of scenarios whose probabilities sum to one.
///
/// # Examples
///
/// ```
/// use u_lineup::meet::{OpponentLineup, ScenarioSet};
///
/// let set = ScenarioSet::new(
///     vec![OpponentLineup::new(), OpponentLineup::new()],
///     vec![0.25, 0.75],
/// )
/// .unwrap();
/// assert_eq!(set.len(), 2);
///
/// assert!(ScenarioSet::new(vec![OpponentLineup::new()], vec![0.5]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    /// Allowed deviation of the probability sum from one.
    pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

    /// Pairs lineups with probabilities.
    ///
    /// # Errors
    ///
    /// [`LineupError::InvalidScenarios`] when the lists are empty or of
    /// different lengths, a probability is negative or not finite, the
    /// probabilities do not sum to one, or an opponent time is invalid.
    pub fn new(lineups: Vec<OpponentLineup>, probabilities: Vec<f64>) -> Result<Self, LineupError> {
        let invalid = |msg: String| Err(LineupError::InvalidScenarios(msg));
        if lineups.is_empty() {
            return invalid("at least one scenario is required".into());
        }
        if lineups.len() != probabilities.len() {
            return invalid(format!(
                "{} lineups but {} probabilities",
                lineups.len(),
                probabilities.len()
            ));
        }
        if let Some(p) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return invalid(format!("invalid probability {p}"));
        }
        let total: f64 = probabilities.iter().sum();
        if (total - 1.0).abs() > Self::PROBABILITY_TOLERANCE {
            return invalid(format!("probabilities sum to {total}, expected 1"));
        }
        for lineup in &lineups {
            if let Err(msg) = lineup.validate() {
                return invalid(msg);
            }
        }

        Ok(Self {
            scenarios: lineups
                .into_iter()
                .zip(probabilities)
                .map(|(lineup, probability)| Scenario {
                    lineup,
                    probability,
                })
                .collect(),
        })
    }

    /// A single certain scenario.
    pub fn single(lineup: OpponentLineup) -> Result<Self, LineupError> {
        Self::new(vec![lineup], vec![1.0])
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ScenarioId> + '_ {
        (0..self.scenarios.len()).map(ScenarioId)
    }

    pub fn get(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios.get(id.0)
    }

    pub fn probability(&self, id: ScenarioId) -> f64 {
        self.scenarios[id.0].probability
    }

    pub fn lineup(&self, id: ScenarioId) -> &OpponentLineup {
        &self.scenarios[id.0].lineup
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScenarioId, &Scenario)> + '_ {
        self.scenarios
            .iter()
            .enumerate()
            .map(|(i, s)| (ScenarioId(i), s))
    }
}
