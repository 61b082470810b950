//! Keys of the lineup model's decision variables.

use crate::meet::{AthleteId, Column, EventId, EventKind, LegRole, ScenarioId, Stroke};
use std::fmt;

/// Home team rank within one event: the 1st, 2nd or 3rd fastest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HomeRank {
    First,
    Second,
    Third,
}

impl HomeRank {
    /// All ranks, fastest first.
    pub const ALL: [HomeRank; 3] = [HomeRank::First, HomeRank::Second, HomeRank::Third];

    /// 1-based rank number.
    pub fn number(self) -> u8 {
        match self {
            HomeRank::First => 1,
            HomeRank::Second => 2,
            HomeRank::Third => 3,
        }
    }

    /// The next slower rank, if any.
    pub fn next(self) -> Option<HomeRank> {
        match self {
            HomeRank::First => Some(HomeRank::Second),
            HomeRank::Second => Some(HomeRank::Third),
            HomeRank::Third => None,
        }
    }
}

impl fmt::Display for HomeRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Role an athlete fills within a rank entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Slot {
    /// Sole swimmer of an individual event.
    Individual,
    /// Leadoff leg of a freestyle relay.
    RelayStart,
    /// Exchange leg of a freestyle relay.
    RelayFlying,
    /// One stroke leg of a medley relay.
    Medley(Stroke),
}

impl Slot {
    /// Short code used in variable names.
    pub fn code(self) -> &'static str {
        match self {
            Slot::Individual => "ind",
            Slot::RelayStart => "start",
            Slot::RelayFlying => "fly",
            Slot::Medley(stroke) => stroke.code(),
        }
    }

    /// Slots an event of the given kind is split into.
    pub fn of_kind(kind: EventKind) -> Vec<Slot> {
        match kind {
            EventKind::Individual => vec![Slot::Individual],
            EventKind::Relay => vec![Slot::RelayStart, Slot::RelayFlying],
            EventKind::MedleyRelay => Stroke::ALL.iter().map(|&s| Slot::Medley(s)).collect(),
        }
    }

    /// Performance column whose time this slot swims.
    pub fn column(self, event: EventId) -> Column {
        match self {
            Slot::Individual => Column::Individual(event),
            Slot::RelayStart => Column::RelayLeg {
                relay: event,
                role: LegRole::Start,
            },
            Slot::RelayFlying => Column::RelayLeg {
                relay: event,
                role: LegRole::Flying,
            },
            Slot::Medley(stroke) => Column::MedleyLeg {
                relay: event,
                stroke,
            },
        }
    }
}

/// Key of a role indicator: athlete holds `slot` of rank entry `rank` in `event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleKey {
    pub athlete: AthleteId,
    pub event: EventId,
    pub slot: Slot,
    pub rank: HomeRank,
}

/// Key of a placement indicator: entry `rank` of `event` finishes at
/// overall `place` under `scenario`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlacementKey {
    pub event: EventId,
    pub rank: HomeRank,
    pub place: u8,
    pub scenario: ScenarioId,
}
