//! Event taxonomy.
//!
//! A [`Meet`] is an ordered list of [`Event`]s. Each event expands into
//! one or more performance [`Column`]s: individual events have one,
//! freestyle relays a starting leg and a flying leg, medley relays one
//! leg per stroke.

use crate::error::LineupError;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Index of an event within its [`Meet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(pub(crate) usize);

impl EventId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Classification of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// One athlete per entry.
    Individual,
    /// Freestyle relay: one starting leg plus `relay_size - 1` flying legs.
    Relay,
    /// Medley relay: one leg per stroke.
    MedleyRelay,
}

/// Medley relay stroke, in swimming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stroke {
    Backstroke,
    Breaststroke,
    Butterfly,
    Freestyle,
}

impl Stroke {
    /// All strokes in medley order.
    pub const ALL: [Stroke; 4] = [
        Stroke::Backstroke,
        Stroke::Breaststroke,
        Stroke::Butterfly,
        Stroke::Freestyle,
    ];

    /// Short code used in labels and variable names.
    pub fn code(self) -> &'static str {
        match self {
            Stroke::Backstroke => "bk",
            Stroke::Breaststroke => "br",
            Stroke::Butterfly => "fl",
            Stroke::Freestyle => "fr",
        }
    }
}

/// Role of a freestyle relay leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LegRole {
    /// Leadoff leg, flat start.
    Start,
    /// Any exchange leg.
    Flying,
}

/// A column of the predicted-performance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Column {
    Individual(EventId),
    RelayLeg { relay: EventId, role: LegRole },
    MedleyLeg { relay: EventId, stroke: Stroke },
}

impl Column {
    /// Event this column belongs to.
    pub fn event(self) -> EventId {
        match self {
            Column::Individual(event) => event,
            Column::RelayLeg { relay, .. } | Column::MedleyLeg { relay, .. } => relay,
        }
    }
}

/// A contested event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Event name (unique within a meet).
    pub name: String,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    pub fn individual(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EventKind::Individual,
        }
    }

    pub fn relay(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EventKind::Relay,
        }
    }

    pub fn medley_relay(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EventKind::MedleyRelay,
        }
    }

    /// Whether this event is a relay of either kind.
    pub fn is_relay(&self) -> bool {
        self.kind != EventKind::Individual
    }

    fn columns(&self, id: EventId) -> Vec<Column> {
        match self.kind {
            EventKind::Individual => vec![Column::Individual(id)],
            EventKind::Relay => vec![
                Column::RelayLeg {
                    relay: id,
                    role: LegRole::Start,
                },
                Column::RelayLeg {
                    relay: id,
                    role: LegRole::Flying,
                },
            ],
            EventKind::MedleyRelay => Stroke::ALL
                .iter()
                .map(|&stroke| Column::MedleyLeg { relay: id, stroke })
                .collect(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The event program of one meet.
///
/// # Examples
///
/// ```
/// use u_lineup::meet::{Event, Meet};
///
/// let meet = Meet::new(vec![
///     Event::medley_relay("200MR"),
///     Event::individual("100F"),
///     Event::relay("200FR"),
/// ])
/// .unwrap();
/// assert_eq!(meet.columns().len(), 4 + 1 + 2);
/// assert!(meet.find("100F").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meet {
    events: Vec<Event>,
    columns: Vec<Column>,
    column_index: BTreeMap<Column, usize>,
}

impl Meet {
    /// Creates a meet, rejecting duplicate event names.
    pub fn new(events: Vec<Event>) -> Result<Self, LineupError> {
        let mut seen = HashSet::new();
        for event in &events {
            if !seen.insert(event.name.as_str()) {
                return Err(LineupError::DuplicateEvent(event.name.clone()));
            }
        }
        let columns: Vec<Column> = events
            .iter()
            .enumerate()
            .flat_map(|(i, e)| e.columns(EventId(i)))
            .collect();
        let column_index = columns.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        Ok(Self {
            events,
            columns,
            column_index,
        })
    }

    /// Standard collegiate dual meet program (yards).
    pub fn dual_meet() -> Self {
        let events = vec![
            Event::medley_relay("200MR"),
            Event::individual("1000F"),
            Event::individual("200F"),
            Event::individual("100BS"),
            Event::individual("100BR"),
            Event::individual("200FL"),
            Event::individual("50F"),
            Event::individual("100F"),
            Event::individual("200BS"),
            Event::individual("200BR"),
            Event::individual("500F"),
            Event::individual("100FL"),
            Event::individual("200IM"),
            Event::relay("200FR"),
        ];
        Self::new(events).expect("dual meet event names are unique")
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, id: EventId) -> &Event {
        &self.events[id.0]
    }

    pub fn event_ids(&self) -> impl Iterator<Item = EventId> + '_ {
        (0..self.events.len()).map(EventId)
    }

    /// Event ids of the given kind, in program order.
    pub fn events_of_kind(&self, kind: EventKind) -> impl Iterator<Item = EventId> + '_ {
        self.event_ids().filter(move |&id| self.event(id).kind == kind)
    }

    pub fn find(&self, name: &str) -> Option<EventId> {
        self.events.iter().position(|e| e.name == name).map(EventId)
    }

    /// Like [`find`](Self::find) but fails with [`LineupError::UnknownEvent`].
    pub fn require(&self, name: &str) -> Result<EventId, LineupError> {
        self.find(name)
            .ok_or_else(|| LineupError::UnknownEvent(name.to_string()))
    }

    /// All columns, grouped by event in program order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index(&self, column: Column) -> Option<usize> {
        self.column_index.get(&column).copied()
    }

    /// Columns belonging to one event.
    pub fn columns_of(&self, event: EventId) -> impl Iterator<Item = Column> + '_ {
        self.columns
            .iter()
            .copied()
            .filter(move |c| c.event() == event)
    }

    /// Human-readable column label, e.g. `200FR (start)` or `200MR (br)`.
    pub fn column_label(&self, column: Column) -> String {
        let name = self
            .events
            .get(column.event().0)
            .map_or("?", |e| e.name.as_str());
        match column {
            Column::Individual(_) => name.to_string(),
            Column::RelayLeg { role, .. } => match role {
                LegRole::Start => format!("{name} (start)"),
                LegRole::Flying => format!("{name} (flying)"),
            },
            Column::MedleyLeg { stroke, .. } => format!("{name} ({})", stroke.code()),
        }
    }
}
