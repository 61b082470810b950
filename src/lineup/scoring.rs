//! Scenario scores and the expected-score objective.

use super::builder::LineupModel;
use super::ranking::sentinel;
use super::types::{HomeRank, PlacementKey};
use crate::meet::{EventId, EventKind, ScenarioId};
use crate::mip::{LinearConstraint, LinearExpr, MipSolution, Objective, Variable};

/// Relative slack on the expected score while the tie-break runs.
pub const SCORE_TOLERANCE: f64 = 1e-7;

impl LineupModel {
    /// Points for rank entry `rank` of `event` finishing at `place`,
    /// including any relay sweep adjustment.
    pub fn place_points(&self, event: EventId, rank: HomeRank, place: u8) -> f64 {
        match self.meet.event(event).kind {
            EventKind::Individual => self.config.individual_points.points(place),
            EventKind::Relay | EventKind::MedleyRelay => {
                let adj = &self.config.relay_adjustment;
                let mut points = self.config.relay_points.points(place);
                if rank == adj.bonus_rank && place == adj.bonus_place {
                    points += adj.bonus;
                }
                if rank == adj.penalty_rank && place == adj.penalty_place {
                    points -= adj.penalty;
                }
                points
            }
        }
    }

    pub(super) fn add_scores(&mut self) {
        let scenarios: Vec<ScenarioId> = self.scenarios.ids().collect();
        let free = self.config.has_penalty();

        for scenario in scenarios {
            let s = scenario.index();
            let mut var = Variable::continuous(format!("score_s{s}"));
            if !free {
                var = var.with_min(0.0);
            }
            let score = self.model.add_variable(var);
            self.vars.scenario_scores.push(score);

            // score − Σ points·w = 0
            let mut expr = LinearExpr::from(score);
            for (key, w) in self.vars.placements() {
                if key.scenario != scenario {
                    continue;
                }
                let points = self.place_points(key.event, key.rank, key.place);
                if points != 0.0 {
                    expr.add_term(w, -points);
                }
            }
            self.model
                .add_constraint(LinearConstraint::eq(format!("score_def_s{s}"), expr, 0.0));
        }
    }

    pub(super) fn set_objective(&mut self) {
        let goal = self.expected_score_expr();
        self.model.set_objective(Objective::maximize(goal));
    }

    /// Σ p_s · score_s.
    pub fn expected_score_expr(&self) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for (scenario, &score) in self.scenarios.ids().zip(&self.vars.scenario_scores) {
            expr.add_term(score, self.scenarios.probability(scenario));
        }
        expr
    }

    /// Second-stage problem of the tie-break: keep the expected score at
    /// `best` (less [`SCORE_TOLERANCE`], relative) and minimize the total
    /// rank time, scaled by the total sentinel.
    pub fn tie_break_stage(&self, best: f64) -> (LinearConstraint, Objective) {
        let floor = best - SCORE_TOLERANCE * best.abs().max(1.0);
        let hold = LinearConstraint::ge("hold_expected_score", self.expected_score_expr(), floor);

        let total_sentinel: f64 = self
            .vars
            .rank_times
            .keys()
            .map(|&(event, rank)| sentinel(self.bound(event), self.legs(event), rank))
            .sum();
        let weight = if total_sentinel > 0.0 {
            1.0 / total_sentinel
        } else {
            1.0
        };
        let mut goal = LinearExpr::new();
        for &rt in self.vars.rank_times.values() {
            goal.add_term(rt, weight);
        }
        (hold, Objective::minimize(goal))
    }

    /// Probability-weighted score of a solution.
    pub fn expected_score(&self, solution: &MipSolution) -> f64 {
        self.scenarios
            .ids()
            .zip(&self.vars.scenario_scores)
            .map(|(s, &score)| self.scenarios.probability(s) * solution.value(score))
            .sum()
    }

    /// Score of each scenario at a solution.
    pub fn scenario_scores(&self, solution: &MipSolution) -> Vec<f64> {
        self.vars
            .scenario_scores
            .iter()
            .map(|&score| solution.value(score))
            .collect()
    }

    /// Place credited to a rank entry under a scenario, if any.
    pub fn credited_place(
        &self,
        solution: &MipSolution,
        event: EventId,
        rank: HomeRank,
        scenario: ScenarioId,
    ) -> Option<u8> {
        self.candidate_places(event, rank).find(|&place| {
            self.vars
                .placement(PlacementKey {
                    event,
                    rank,
                    place,
                    scenario,
                })
                .is_some_and(|w| solution.is_set(w))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::{MeetConfig, RelayAdjustment};
    use crate::meet::{Column, Event, LegRole, Meet, OpponentLineup, RawPerformance, ScenarioSet};
    use crate::mip::{SolverStatus, VarId};

    fn model(config: &MeetConfig, probabilities: Vec<f64>) -> LineupModel {
        let meet = Meet::new(vec![Event::individual("100F"), Event::relay("200FR")]).unwrap();
        let free = Column::Individual(meet.require("100F").unwrap());
        let relay = meet.require("200FR").unwrap();
        let mut raw = RawPerformance::new();
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            raw.record(name, free, 50.0 + i as f64);
            for role in [LegRole::Start, LegRole::Flying] {
                raw.record(name, Column::RelayLeg { relay, role }, 22.0 + i as f64);
            }
        }
        let lineups = probabilities.iter().map(|_| OpponentLineup::new()).collect();
        let scenarios = ScenarioSet::new(lineups, probabilities).unwrap();
        LineupModel::prepare(&meet, &raw, &scenarios, config).unwrap()
    }

    #[test]
    fn test_place_points() {
        let m = model(&MeetConfig::default().with_relay_size(1), vec![1.0]);
        let free = m.meet().require("100F").unwrap();
        let relay = m.meet().require("200FR").unwrap();

        assert_eq!(m.place_points(free, HomeRank::First, 1), 9.0);
        assert_eq!(m.place_points(free, HomeRank::Third, 5), 1.0);
        assert_eq!(m.place_points(relay, HomeRank::First, 1), 11.0);
        // no-sweep rule
        assert_eq!(m.place_points(relay, HomeRank::First, 4), 2.0);
        assert_eq!(m.place_points(relay, HomeRank::Third, 3), 0.0);
        assert_eq!(m.place_points(relay, HomeRank::Second, 3), 2.0);
    }

    #[test]
    fn test_score_bounds_follow_penalty() {
        let penalized = model(&MeetConfig::default().with_relay_size(1), vec![1.0]);
        let score = penalized.vars().scenario_score(ScenarioId::new(0)).unwrap();
        assert_eq!(penalized.model().variable(score).min, None);

        let plain = model(
            &MeetConfig::default()
                .with_relay_size(1)
                .with_relay_adjustment(RelayAdjustment::none()),
            vec![1.0],
        );
        let score = plain.vars().scenario_score(ScenarioId::new(0)).unwrap();
        assert_eq!(plain.model().variable(score).min, Some(0.0));
    }

    #[test]
    fn test_expected_score_weights() {
        let m = model(&MeetConfig::default().with_relay_size(1), vec![0.25, 0.75]);
        let mut values = vec![0.0; m.model().variable_count()];
        let s0: VarId = m.vars().scenario_score(ScenarioId::new(0)).unwrap();
        let s1: VarId = m.vars().scenario_score(ScenarioId::new(1)).unwrap();
        values[s0.index()] = 40.0;
        values[s1.index()] = 20.0;
        let solution = MipSolution {
            values,
            ..MipSolution::empty(SolverStatus::Optimal)
        };

        assert!((m.expected_score(&solution) - 25.0).abs() < 1e-12);
        assert_eq!(m.scenario_scores(&solution), vec![40.0, 20.0]);
    }

    #[test]
    fn test_objective_is_expected_score_only() {
        let m = model(&MeetConfig::default().with_relay_size(1), vec![0.4, 0.6]);
        let objective = m.model().objective().unwrap();
        assert_eq!(objective.sense, crate::mip::Sense::Maximize);
        assert_eq!(objective.expr, m.expected_score_expr());
        assert_eq!(objective.expr.len(), 2);
        assert!(objective.expr.terms.iter().all(|&(_, coef)| coef > 0.0));
    }

    #[test]
    fn test_tie_break_stage() {
        let m = model(&MeetConfig::default().with_relay_size(1), vec![1.0]);
        let (hold, objective) = m.tie_break_stage(20.0);

        assert_eq!(hold.cmp, crate::mip::Comparison::GreaterEq);
        assert_eq!(hold.expr, m.expected_score_expr());
        assert!(hold.rhs < 20.0);
        assert!(hold.rhs > 20.0 - 1e-5);

        assert_eq!(objective.sense, crate::mip::Sense::Minimize);
        assert_eq!(objective.expr.len(), m.vars().rank_times.len());
        // all entries empty sums to exactly one
        let empty: f64 = objective
            .expr
            .terms
            .iter()
            .map(|&(var, coef)| {
                let (&(event, rank), _) = m
                    .vars()
                    .rank_times
                    .iter()
                    .find(|(_, v)| **v == var)
                    .unwrap();
                coef * sentinel(m.bound(event), m.legs(event), rank)
            })
            .sum();
        assert!((empty - 1.0).abs() < 1e-12);
    }
}
