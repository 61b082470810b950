//! Predicted-performance tables and roster preparation.

use super::taxonomy::{Column, Meet};
use crate::error::LineupError;
use std::collections::BTreeMap;
use tracing::debug;

/// Index of an athlete within a [`PreparedRoster`].
///
/// Real athletes come first, in the order of the raw table, followed by
/// ghosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AthleteId(pub(crate) usize);

impl AthleteId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A roster member.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Athlete {
    /// Display name.
    pub name: String,
    /// Synthetic worst-case placeholder.
    pub ghost: bool,
}

/// Raw predicted times, with gaps.
///
/// Times are seconds. An absent entry means the athlete has never swum
/// that column.
///
/// # Examples
///
/// ```
/// use u_lineup::meet::{Column, Event, Meet, RawPerformance};
///
/// let meet = Meet::new(vec![Event::individual("100F")]).unwrap();
/// let free = Column::Individual(meet.require("100F").unwrap());
///
/// let raw = RawPerformance::new()
///     .with_time("Ada", free, 49.8)
///     .with_athlete("Bo");
/// assert_eq!(raw.time("Ada", free), Some(49.8));
/// assert_eq!(raw.time("Bo", free), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "RawRecords", into = "RawRecords")
)]
pub struct RawPerformance {
    athletes: Vec<String>,
    times: BTreeMap<(usize, Column), f64>,
}

impl RawPerformance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an athlete (no-op if already present) and returns its row.
    pub fn add_athlete(&mut self, name: &str) -> usize {
        match self.athletes.iter().position(|a| a == name) {
            Some(row) => row,
            None => {
                self.athletes.push(name.to_string());
                self.athletes.len() - 1
            }
        }
    }

    /// Records a predicted time, registering the athlete if needed.
    pub fn record(&mut self, athlete: &str, column: Column, seconds: f64) {
        let row = self.add_athlete(athlete);
        self.times.insert((row, column), seconds);
    }

    pub fn with_athlete(mut self, athlete: &str) -> Self {
        self.add_athlete(athlete);
        self
    }

    pub fn with_time(mut self, athlete: &str, column: Column, seconds: f64) -> Self {
        self.record(athlete, column, seconds);
        self
    }

    /// Athlete names in row order.
    pub fn athletes(&self) -> &[String] {
        &self.athletes
    }

    pub fn time(&self, athlete: &str, column: Column) -> Option<f64> {
        let row = self.athletes.iter().position(|a| a == athlete)?;
        self.times.get(&(row, column)).copied()
    }

    fn row_time(&self, row: usize, column: Column) -> Option<f64> {
        self.times.get(&(row, column)).copied()
    }
}

/// Serialized form of [`RawPerformance`]: one record per known time.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawRecords {
    athletes: Vec<String>,
    records: Vec<RawRecord>,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawRecord {
    athlete: String,
    column: Column,
    seconds: f64,
}

#[cfg(feature = "serde")]
impl From<RawPerformance> for RawRecords {
    fn from(raw: RawPerformance) -> Self {
        let records = raw
            .times
            .iter()
            .map(|(&(row, column), &seconds)| RawRecord {
                athlete: raw.athletes[row].clone(),
                column,
                seconds,
            })
            .collect();
        Self {
            athletes: raw.athletes,
            records,
        }
    }
}

#[cfg(feature = "serde")]
impl From<RawRecords> for RawPerformance {
    fn from(records: RawRecords) -> Self {
        let mut raw = RawPerformance::new();
        for athlete in &records.athletes {
            raw.add_athlete(athlete);
        }
        for r in records.records {
            raw.record(&r.athlete, r.column, r.seconds);
        }
        raw
    }
}

/// Filled performance table plus ghost athletes.
///
/// Every (athlete, column) pair of the meet resolves to a finite time:
/// gaps hold the column default, which is the worst recorded time in that
/// column. Ghosts carry the defaults everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRoster {
    athletes: Vec<Athlete>,
    columns: BTreeMap<Column, usize>,
    defaults: Vec<f64>,
    /// Row-major `athletes × columns`.
    times: Vec<f64>,
    recorded: Vec<bool>,
}

impl PreparedRoster {
    /// Fills gaps with column defaults and appends `ghosts` placeholder athletes.
    ///
    /// # Errors
    ///
    /// - [`LineupError::InvalidTime`] for a negative or non-finite time
    /// - [`LineupError::UnknownEvent`] for a column outside the meet
    /// - [`LineupError::NoRecordedTimes`] when a column has no recorded time
    pub fn prepare(meet: &Meet, raw: &RawPerformance, ghosts: usize) -> Result<Self, LineupError> {
        for (&(row, column), &value) in &raw.times {
            if meet.column_index(column).is_none() {
                return Err(LineupError::UnknownEvent(format!("{column:?}")));
            }
            if !value.is_finite() || value < 0.0 {
                return Err(LineupError::InvalidTime {
                    athlete: raw.athletes[row].clone(),
                    column: meet.column_label(column),
                    value,
                });
            }
        }

        let columns = meet.columns().to_vec();
        let defaults = columns
            .iter()
            .map(|&column| {
                (0..raw.athletes.len())
                    .filter_map(|row| raw.row_time(row, column))
                    .reduce(f64::max)
                    .ok_or_else(|| LineupError::NoRecordedTimes {
                        column: meet.column_label(column),
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let mut athletes = Vec::with_capacity(raw.athletes.len() + ghosts);
        let mut times = Vec::with_capacity((raw.athletes.len() + ghosts) * columns.len());
        let mut recorded = Vec::with_capacity(times.capacity());

        for (row, name) in raw.athletes.iter().enumerate() {
            athletes.push(Athlete {
                name: name.clone(),
                ghost: false,
            });
            for (c, &column) in columns.iter().enumerate() {
                let time = raw.row_time(row, column);
                times.push(time.unwrap_or(defaults[c]));
                recorded.push(time.is_some());
            }
        }
        for g in 0..ghosts {
            athletes.push(Athlete {
                name: format!("ghost{g}"),
                ghost: true,
            });
            times.extend_from_slice(&defaults);
            recorded.extend(std::iter::repeat(false).take(columns.len()));
        }

        debug!(
            real = raw.athletes.len(),
            ghosts,
            columns = columns.len(),
            "prepared roster"
        );

        Ok(Self {
            athletes,
            columns: columns.iter().enumerate().map(|(i, &c)| (c, i)).collect(),
            defaults,
            times,
            recorded,
        })
    }

    pub fn athletes(&self) -> &[Athlete] {
        &self.athletes
    }

    pub fn athlete(&self, id: AthleteId) -> &Athlete {
        &self.athletes[id.0]
    }

    /// All athletes, real and ghost.
    pub fn athlete_ids(&self) -> impl Iterator<Item = AthleteId> + '_ {
        (0..self.athletes.len()).map(AthleteId)
    }

    /// Real athletes only.
    pub fn real_athlete_ids(&self) -> impl Iterator<Item = AthleteId> + '_ {
        self.athlete_ids().filter(|&id| !self.athlete(id).ghost)
    }

    pub fn ghost_count(&self) -> usize {
        self.athletes.iter().filter(|a| a.ghost).count()
    }

    pub fn len(&self) -> usize {
        self.athletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.athletes.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<AthleteId> {
        self.athletes
            .iter()
            .position(|a| !a.ghost && a.name == name)
            .map(AthleteId)
    }

    /// Like [`find`](Self::find) but fails with [`LineupError::UnknownAthlete`].
    pub fn require(&self, name: &str) -> Result<AthleteId, LineupError> {
        self.find(name)
            .ok_or_else(|| LineupError::UnknownAthlete(name.to_string()))
    }

    /// Whether every column of `meet` has a slot in this roster.
    pub fn covers(&self, meet: &Meet) -> bool {
        self.columns.len() == meet.columns().len()
            && meet.columns().iter().all(|c| self.columns.contains_key(c))
    }

    fn column(&self, column: Column) -> usize {
        match self.columns.get(&column) {
            Some(&c) => c,
            None => panic!("column {column:?} not in roster"),
        }
    }

    fn slot(&self, athlete: AthleteId, column: Column) -> usize {
        athlete.0 * self.columns.len() + self.column(column)
    }

    /// Predicted time (recorded or default).
    ///
    /// # Panics
    ///
    /// Panics if the column is not part of the meet the roster was prepared for.
    pub fn time(&self, athlete: AthleteId, column: Column) -> f64 {
        self.times[self.slot(athlete, column)]
    }

    /// Whether the time comes from the raw table rather than a default.
    pub fn is_recorded(&self, athlete: AthleteId, column: Column) -> bool {
        self.recorded[self.slot(athlete, column)]
    }

    /// Worst recorded time of a column.
    pub fn default_time(&self, column: Column) -> f64 {
        self.defaults[self.column(column)]
    }
}
