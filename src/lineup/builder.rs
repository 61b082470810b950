//! Lineup model assembly: decision variables and assignment constraints.

use super::config::MeetConfig;
use super::ranking;
use super::types::{HomeRank, PlacementKey, RoleKey, Slot};
use crate::error::LineupError;
use crate::meet::{
    AthleteId, EventId, EventKind, Meet, PreparedRoster, RawPerformance, ScenarioId, ScenarioSet,
    Stroke,
};
use crate::mip::{LinearConstraint, LinearExpr, LinearModel, VarId, Variable};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Typed handles of every decision variable in a [`LineupModel`].
#[derive(Debug, Clone, Default)]
pub struct LineupVars {
    pub(crate) roles: BTreeMap<RoleKey, VarId>,
    pub(crate) assigned: BTreeMap<(AthleteId, EventId), VarId>,
    pub(crate) rank_times: BTreeMap<(EventId, HomeRank), VarId>,
    pub(crate) placements: BTreeMap<PlacementKey, VarId>,
    pub(crate) scenario_scores: Vec<VarId>,
}

impl LineupVars {
    pub fn role(&self, key: RoleKey) -> Option<VarId> {
        self.roles.get(&key).copied()
    }

    pub fn roles(&self) -> impl Iterator<Item = (RoleKey, VarId)> + '_ {
        self.roles.iter().map(|(&k, &v)| (k, v))
    }

    /// Role indicators of one athlete in one event.
    pub fn roles_of(
        &self,
        athlete: AthleteId,
        event: EventId,
    ) -> impl Iterator<Item = (RoleKey, VarId)> + '_ {
        self.roles
            .range(role_range(athlete, event))
            .map(|(&k, &v)| (k, v))
    }

    pub fn assigned(&self, athlete: AthleteId, event: EventId) -> Option<VarId> {
        self.assigned.get(&(athlete, event)).copied()
    }

    pub fn rank_time(&self, event: EventId, rank: HomeRank) -> Option<VarId> {
        self.rank_times.get(&(event, rank)).copied()
    }

    pub fn placement(&self, key: PlacementKey) -> Option<VarId> {
        self.placements.get(&key).copied()
    }

    pub fn placements(&self) -> impl Iterator<Item = (PlacementKey, VarId)> + '_ {
        self.placements.iter().map(|(&k, &v)| (k, v))
    }

    pub fn scenario_score(&self, scenario: ScenarioId) -> Option<VarId> {
        self.scenario_scores.get(scenario.index()).copied()
    }
}

fn role_range(athlete: AthleteId, event: EventId) -> std::ops::RangeInclusive<RoleKey> {
    let lo = RoleKey {
        athlete,
        event,
        slot: Slot::Individual,
        rank: HomeRank::First,
    };
    let hi = RoleKey {
        athlete,
        event,
        slot: Slot::Medley(Stroke::Freestyle),
        rank: HomeRank::Third,
    };
    lo..=hi
}

/// The assembled lineup MIP together with the inputs it was built from.
///
/// The linear model is never modified after [`build`](Self::build); probes
/// layer extra constraints on top through
/// [`MipProblem::with_overlay`](crate::mip::MipProblem::with_overlay).
///
/// # Examples
///
/// ```
/// use u_lineup::lineup::{LineupModel, MeetConfig};
/// use u_lineup::meet::{Column, Event, Meet, OpponentLineup, RawPerformance, ScenarioSet};
///
/// let meet = Meet::new(vec![Event::individual("50F")]).unwrap();
/// let free = Column::Individual(meet.require("50F").unwrap());
/// let raw = RawPerformance::new()
///     .with_time("Ada", free, 21.5)
///     .with_time("Bo", free, 22.0);
/// let scenarios = ScenarioSet::single(OpponentLineup::new()).unwrap();
/// let config = MeetConfig::default().with_relay_size(1);
///
/// let model = LineupModel::prepare(&meet, &raw, &scenarios, &config).unwrap();
/// assert_eq!(model.roster().len(), 3);
/// assert!(model.model().validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct LineupModel {
    pub(crate) meet: Meet,
    pub(crate) roster: PreparedRoster,
    pub(crate) scenarios: ScenarioSet,
    pub(crate) config: MeetConfig,
    pub(crate) model: LinearModel,
    pub(crate) vars: LineupVars,
    pub(crate) bounds: BTreeMap<EventId, f64>,
}

impl LineupModel {
    /// Prepares the roster (with `relay_size` ghosts) and builds the model.
    pub fn prepare(
        meet: &Meet,
        raw: &RawPerformance,
        scenarios: &ScenarioSet,
        config: &MeetConfig,
    ) -> Result<Self, LineupError> {
        config.validate().map_err(LineupError::InvalidConfig)?;
        let roster = PreparedRoster::prepare(meet, raw, config.relay_size)?;
        Self::build(meet, roster, scenarios, config)
    }

    /// Builds the full model from a prepared roster.
    ///
    /// # Errors
    ///
    /// - [`LineupError::InvalidConfig`] when the configuration fails
    ///   validation, the reference scenario does not exist, or a medley
    ///   relay cannot hold `relay_size` distinct strokes
    /// - [`LineupError::InvalidModel`] when the roster was prepared for a
    ///   different meet or the assembled model is malformed
    pub fn build(
        meet: &Meet,
        roster: PreparedRoster,
        scenarios: &ScenarioSet,
        config: &MeetConfig,
    ) -> Result<Self, LineupError> {
        config.validate().map_err(LineupError::InvalidConfig)?;
        if config.reference_scenario >= scenarios.len() {
            return Err(LineupError::InvalidConfig(format!(
                "reference_scenario {} out of range ({} scenarios)",
                config.reference_scenario,
                scenarios.len()
            )));
        }
        if meet.events_of_kind(EventKind::MedleyRelay).next().is_some()
            && config.relay_size > Stroke::ALL.len()
        {
            return Err(LineupError::InvalidConfig(format!(
                "relay_size {} exceeds the {} medley strokes",
                config.relay_size,
                Stroke::ALL.len()
            )));
        }
        if !roster.covers(meet) {
            return Err(LineupError::InvalidModel(
                "roster was prepared for a different meet".into(),
            ));
        }

        let bounds = meet
            .event_ids()
            .map(|e| (e, ranking::event_bound(meet, &roster, e)))
            .collect();

        let mut this = Self {
            meet: meet.clone(),
            roster,
            scenarios: scenarios.clone(),
            config: config.clone(),
            model: LinearModel::new("swim_lineup"),
            vars: LineupVars::default(),
            bounds,
        };

        this.add_roles();
        this.add_assignment_constraints();
        this.add_rank_times();
        this.add_placements();
        this.add_scores();
        this.set_objective();

        this.model.validate().map_err(LineupError::InvalidModel)?;
        debug!(
            events = this.meet.events().len(),
            athletes = this.roster.len(),
            scenarios = this.scenarios.len(),
            variables = this.model.variable_count(),
            binaries = this.model.binary_count(),
            constraints = this.model.constraint_count(),
            "lineup model assembled"
        );
        Ok(this)
    }

    pub fn meet(&self) -> &Meet {
        &self.meet
    }

    pub fn roster(&self) -> &PreparedRoster {
        &self.roster
    }

    pub fn scenarios(&self) -> &ScenarioSet {
        &self.scenarios
    }

    pub fn config(&self) -> &MeetConfig {
        &self.config
    }

    /// The underlying linear model.
    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    pub fn vars(&self) -> &LineupVars {
        &self.vars
    }

    /// Big-M bound of an event, see [`ranking::event_bound`].
    pub fn bound(&self, event: EventId) -> f64 {
        self.bounds.get(&event).copied().unwrap_or(0.0)
    }

    /// Number of legs one rank entry of `event` swims.
    pub fn legs(&self, event: EventId) -> usize {
        ranking::legs(self.meet.event(event).kind, self.config.relay_size)
    }

    /// Sum of an athlete's role indicators in one event.
    pub fn event_roles(&self, athlete: AthleteId, event: EventId) -> LinearExpr {
        LinearExpr::sum(self.vars.roles_of(athlete, event).map(|(_, v)| v))
    }

    /// Sum of the role indicators filling one slot of one rank entry.
    pub(crate) fn slot_fill(&self, event: EventId, slot: Slot, rank: HomeRank) -> LinearExpr {
        LinearExpr::sum(self.roster.athlete_ids().filter_map(|athlete| {
            self.vars.role(RoleKey {
                athlete,
                event,
                slot,
                rank,
            })
        }))
    }

    fn add_roles(&mut self) {
        let events: Vec<EventId> = self.meet.event_ids().collect();
        let athletes: Vec<AthleteId> = self.roster.athlete_ids().collect();
        for &event in &events {
            for rank in HomeRank::ALL {
                for slot in Slot::of_kind(self.meet.event(event).kind) {
                    for &athlete in &athletes {
                        let var = self.model.add_variable(Variable::binary(format!(
                            "role_a{}_e{}_{}_r{}",
                            athlete.index(),
                            event.index(),
                            slot.code(),
                            rank.number()
                        )));
                        let key = RoleKey {
                            athlete,
                            event,
                            slot,
                            rank,
                        };
                        self.vars.roles.insert(key, var);
                    }
                }
            }
        }
        for &athlete in &athletes {
            for &event in &events {
                let var = self.model.add_variable(Variable::binary(format!(
                    "asgn_a{}_e{}",
                    athlete.index(),
                    event.index()
                )));
                self.vars.assigned.insert((athlete, event), var);
            }
        }
    }

    fn add_assignment_constraints(&mut self) {
        let relay_size = self.config.relay_size as f64;
        let mut constraints = Vec::new();

        for event in self.meet.event_ids() {
            let e = event.index();
            for rank in HomeRank::ALL {
                let k = rank.number();
                match self.meet.event(event).kind {
                    EventKind::Individual => constraints.push(LinearConstraint::le(
                        format!("slot_e{e}_r{k}"),
                        self.slot_fill(event, Slot::Individual, rank),
                        1.0,
                    )),
                    EventKind::Relay => {
                        constraints.push(LinearConstraint::eq(
                            format!("flying_e{e}_r{k}"),
                            self.slot_fill(event, Slot::RelayFlying, rank),
                            relay_size - 1.0,
                        ));
                        constraints.push(LinearConstraint::eq(
                            format!("start_e{e}_r{k}"),
                            self.slot_fill(event, Slot::RelayStart, rank),
                            1.0,
                        ));
                    }
                    EventKind::MedleyRelay => {
                        let mut legs = LinearExpr::new();
                        for stroke in Stroke::ALL {
                            let fill = self.slot_fill(event, Slot::Medley(stroke), rank);
                            legs += fill.clone();
                            constraints.push(LinearConstraint::le(
                                format!("stroke_e{e}_r{k}_{}", stroke.code()),
                                fill,
                                1.0,
                            ));
                        }
                        constraints.push(LinearConstraint::eq(
                            format!("medley_e{e}_r{k}"),
                            legs,
                            relay_size,
                        ));
                    }
                }
            }
        }

        let pairs = self.back_to_back_pairs();
        for athlete in self.roster.athlete_ids() {
            let a = athlete.index();
            let mut total = LinearExpr::new();
            let mut relay = LinearExpr::new();
            let mut individual = LinearExpr::new();

            for event in self.meet.event_ids() {
                let roles = self.event_roles(athlete, event);
                constraints.push(LinearConstraint::le(
                    format!("once_a{a}_e{}", event.index()),
                    roles.clone(),
                    1.0,
                ));
                if let Some(assigned) = self.vars.assigned(athlete, event) {
                    constraints.push(LinearConstraint::eq(
                        format!("asgn_a{a}_e{}", event.index()),
                        LinearExpr::from(assigned) - roles.clone(),
                        0.0,
                    ));
                }
                if self.meet.event(event).is_relay() {
                    relay += roles.clone();
                } else {
                    individual += roles.clone();
                }
                total += roles;
            }

            constraints.push(LinearConstraint::le(
                format!("max_events_a{a}"),
                total,
                self.config.max_events as f64,
            ));
            constraints.push(LinearConstraint::le(
                format!("max_relay_a{a}"),
                relay,
                self.config.max_relay_events as f64,
            ));
            constraints.push(LinearConstraint::le(
                format!("max_indiv_a{a}"),
                individual,
                self.config.max_individual_events as f64,
            ));

            for &(first, second) in &pairs {
                constraints.push(LinearConstraint::le(
                    format!("b2b_a{a}_e{}_e{}", first.index(), second.index()),
                    self.event_roles(athlete, first) + self.event_roles(athlete, second),
                    1.0,
                ));
            }
        }

        for c in constraints {
            self.model.add_constraint(c);
        }
    }

    /// Back-to-back pairs whose events both exist in the meet.
    fn back_to_back_pairs(&self) -> Vec<(EventId, EventId)> {
        self.config
            .back_to_back
            .iter()
            .filter_map(|(first, second)| {
                match (self.meet.find(first), self.meet.find(second)) {
                    (Some(a), Some(b)) => Some((a, b)),
                    _ => {
                        warn!(%first, %second, "back-to-back pair skipped: event not in meet");
                        None
                    }
                }
            })
            .collect()
    }
}
