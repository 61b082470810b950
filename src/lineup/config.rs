//! Meet scoring rules and model parameters.

use super::types::HomeRank;

/// Points awarded per overall finishing place.
///
/// Index 0 holds the points for place 1. Places past the end of the table
/// score nothing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointTable(Vec<f64>);

impl PointTable {
    pub fn new(points: Vec<f64>) -> Self {
        Self(points)
    }

    /// Dual meet individual scoring: 9-4-3-2-1.
    pub fn individual_dual() -> Self {
        Self(vec![9.0, 4.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0])
    }

    /// Dual meet relay scoring: 11-4-2.
    pub fn relay_dual() -> Self {
        Self(vec![11.0, 4.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0])
    }

    /// Points for a 1-based place.
    pub fn points(&self, place: u8) -> f64 {
        match place {
            0 => 0.0,
            p => self.0.get(usize::from(p) - 1).copied().unwrap_or(0.0),
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Relay-only correction for the rule that one team may not sweep a relay.
///
/// `bonus` is added when the `bonus_rank` relay finishes at `bonus_place`,
/// `penalty` subtracted when the `penalty_rank` relay finishes at
/// `penalty_place`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelayAdjustment {
    pub bonus: f64,
    pub bonus_rank: HomeRank,
    pub bonus_place: u8,
    pub penalty: f64,
    pub penalty_rank: HomeRank,
    pub penalty_place: u8,
}

impl RelayAdjustment {
    /// No adjustment.
    pub fn none() -> Self {
        Self {
            bonus: 0.0,
            penalty: 0.0,
            ..Self::default()
        }
    }
}

impl Default for RelayAdjustment {
    fn default() -> Self {
        Self {
            bonus: 2.0,
            bonus_rank: HomeRank::First,
            bonus_place: 4,
            penalty: 2.0,
            penalty_rank: HomeRank::Third,
            penalty_place: 3,
        }
    }
}

/// Configuration of the lineup model.
///
/// # Examples
///
/// ```
/// use u_lineup::lineup::MeetConfig;
///
/// let config = MeetConfig::default()
///     .with_relay_size(4)
///     .with_max_events(4)
///     .with_back_to_back(vec![("100F".into(), "500F".into())])
///     .with_tie_break(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeetConfig {
    /// Swimmers per relay team. Also the number of ghost athletes.
    pub relay_size: usize,

    /// Maximum roles per athlete across all events.
    pub max_events: usize,

    /// Maximum relay roles (freestyle and medley) per athlete.
    pub max_relay_events: usize,

    /// Maximum individual roles per athlete.
    pub max_individual_events: usize,

    /// Event name pairs no athlete may swim both of.
    pub back_to_back: Vec<(String, String)>,

    /// Individual event points by place.
    pub individual_points: PointTable,

    /// Relay points by place.
    pub relay_points: PointTable,

    /// Relay sweep correction.
    pub relay_adjustment: RelayAdjustment,

    /// Opponent ranks considered per home rank in individual events.
    pub opponent_window_individual: u8,

    /// Opponent ranks considered per home rank in relays.
    pub opponent_window_relay: u8,

    /// Extra scaling of the placement big-M for relays.
    pub relay_big_m_multiplier: f64,

    /// Number of scoring places.
    pub places: u8,

    /// Among lineups with the best expected score, pick the one with the
    /// fastest rank times. Costs a second solve.
    pub tie_break: bool,

    /// Scenario whose placements are reported.
    pub reference_scenario: usize,
}

impl Default for MeetConfig {
    fn default() -> Self {
        Self {
            relay_size: 4,
            max_events: 4,
            max_relay_events: 3,
            max_individual_events: 2,
            back_to_back: vec![
                ("100F".into(), "500F".into()),
                ("200F".into(), "200IM".into()),
                ("100BS".into(), "100BR".into()),
            ],
            individual_points: PointTable::individual_dual(),
            relay_points: PointTable::relay_dual(),
            relay_adjustment: RelayAdjustment::default(),
            opponent_window_individual: 3,
            opponent_window_relay: 3,
            relay_big_m_multiplier: 1.0,
            places: 8,
            tie_break: true,
            reference_scenario: 0,
        }
    }
}

impl MeetConfig {
    pub fn with_relay_size(mut self, n: usize) -> Self {
        self.relay_size = n;
        self
    }

    pub fn with_max_events(mut self, n: usize) -> Self {
        self.max_events = n;
        self
    }

    pub fn with_max_relay_events(mut self, n: usize) -> Self {
        self.max_relay_events = n;
        self
    }

    pub fn with_max_individual_events(mut self, n: usize) -> Self {
        self.max_individual_events = n;
        self
    }

    pub fn with_back_to_back(mut self, pairs: Vec<(String, String)>) -> Self {
        self.back_to_back = pairs;
        self
    }

    pub fn with_individual_points(mut self, table: PointTable) -> Self {
        self.individual_points = table;
        self
    }

    pub fn with_relay_points(mut self, table: PointTable) -> Self {
        self.relay_points = table;
        self
    }

    pub fn with_relay_adjustment(mut self, adjustment: RelayAdjustment) -> Self {
        self.relay_adjustment = adjustment;
        self
    }

    pub fn with_opponent_windows(mut self, individual: u8, relay: u8) -> Self {
        self.opponent_window_individual = individual;
        self.opponent_window_relay = relay;
        self
    }

    pub fn with_relay_big_m_multiplier(mut self, multiplier: f64) -> Self {
        self.relay_big_m_multiplier = multiplier;
        self
    }

    pub fn with_places(mut self, places: u8) -> Self {
        self.places = places;
        self
    }

    pub fn with_tie_break(mut self, enabled: bool) -> Self {
        self.tie_break = enabled;
        self
    }

    pub fn with_reference_scenario(mut self, index: usize) -> Self {
        self.reference_scenario = index;
        self
    }

    /// Whether any relay adjustment can lower a scenario score.
    pub fn has_penalty(&self) -> bool {
        self.relay_adjustment.penalty > 0.0
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.relay_size == 0 {
            return Err("relay_size must be at least 1".into());
        }
        if self.max_events == 0 {
            return Err("max_events must be at least 1".into());
        }
        if self.places == 0 {
            return Err("places must be at least 1".into());
        }
        if self.opponent_window_individual == 0 || self.opponent_window_relay == 0 {
            return Err("opponent windows must be at least 1".into());
        }
        if !self.relay_big_m_multiplier.is_finite() || self.relay_big_m_multiplier < 1.0 {
            return Err(format!(
                "relay_big_m_multiplier must be >= 1, got {}",
                self.relay_big_m_multiplier
            ));
        }
        for (label, table) in [
            ("individual_points", &self.individual_points),
            ("relay_points", &self.relay_points),
        ] {
            if table.0.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(format!("{label} must be finite and non-negative"));
            }
        }
        let adj = &self.relay_adjustment;
        if !adj.bonus.is_finite() || !adj.penalty.is_finite() || adj.bonus < 0.0 || adj.penalty < 0.0 {
            return Err("relay adjustment amounts must be finite and non-negative".into());
        }
        for (rank, place) in [
            (adj.bonus_rank, adj.bonus_place),
            (adj.penalty_rank, adj.penalty_place),
        ] {
            if place < rank.number() || place > self.places {
                return Err(format!(
                    "relay adjustment place {place} unreachable for rank {rank}"
                ));
            }
        }
        for (a, b) in &self.back_to_back {
            if a == b {
                return Err(format!("back-to-back pair repeats event {a}"));
            }
        }
        Ok(())
    }
}
