//! Big-M linearization of rank times and finishing places.
//!
//! Each rank entry of each event gets a continuous rank time equal to the
//! swum time of whoever fills it, or a sentinel when it is left empty.
//! Placement indicators then compare that time with the opponent's
//! predicted times:
//!
//! ```text
//! RT(k) = Σ time·role + legs·c − Σ role·c,     c = bound/2 + k
//!
//! p = k:          RT ≤ o₁·w + M(1 − w)
//! k < p < k + T:  RT ≤ o_{p−k+1}·w + M(1 − w)
//! k < p ≤ k + T:  RT ≥ o_{p−k}·w
//! ```
//!
//! with opponent times `o₁ ≤ o₂ ≤ …` and window `T`.

use super::builder::LineupModel;
use super::types::{HomeRank, PlacementKey, RoleKey, Slot};
use crate::meet::{EventId, EventKind, Meet, PreparedRoster};
use crate::mip::{LinearConstraint, LinearExpr, Variable};

/// Per-event big-M bound: twice the worst default time among the event's
/// columns.
///
/// Half the bound is an upper bound on any single leg, so a rank time built
/// around `bound / 2` is never beaten by an empty slot.
pub fn event_bound(meet: &Meet, roster: &PreparedRoster, event: EventId) -> f64 {
    2.0 * meet
        .columns_of(event)
        .map(|c| roster.default_time(c))
        .fold(0.0, f64::max)
}

/// Legs swum by one rank entry.
pub fn legs(kind: EventKind, relay_size: usize) -> usize {
    match kind {
        EventKind::Individual => 1,
        EventKind::Relay | EventKind::MedleyRelay => relay_size,
    }
}

/// Per-leg offset of rank `rank`.
fn offset(bound: f64, rank: HomeRank) -> f64 {
    bound / 2.0 + f64::from(rank.number())
}

/// Rank time of an unfilled rank entry.
pub fn sentinel(bound: f64, legs: usize, rank: HomeRank) -> f64 {
    legs as f64 * offset(bound, rank)
}

/// Big-M of the placement inequalities. Exceeds every sentinel.
pub fn placement_big_m(bound: f64, legs: usize, multiplier: f64) -> f64 {
    legs as f64 * (bound + 3.0) * multiplier
}

/// Opponent time at 1-based opponent rank `i`, with missing or
/// out-of-range times replaced by `big_m`.
fn opponent_time(times: &[f64], i: usize, big_m: f64) -> f64 {
    match i.checked_sub(1).and_then(|i| times.get(i)) {
        Some(&t) if t <= big_m => t,
        _ => big_m,
    }
}

impl LineupModel {
    /// Placement big-M of one event.
    pub fn big_m(&self, event: EventId) -> f64 {
        let multiplier = if self.meet.event(event).is_relay() {
            self.config.relay_big_m_multiplier
        } else {
            1.0
        };
        placement_big_m(self.bound(event), self.legs(event), multiplier)
    }

    /// Opponent rank window of one event.
    pub(crate) fn window(&self, event: EventId) -> u8 {
        if self.meet.event(event).is_relay() {
            self.config.opponent_window_relay
        } else {
            self.config.opponent_window_individual
        }
    }

    /// Places rank `rank` can be credited with.
    pub(crate) fn candidate_places(&self, event: EventId, rank: HomeRank) -> std::ops::RangeInclusive<u8> {
        let k = rank.number();
        k..=self.config.places.min(k.saturating_add(self.window(event)))
    }

    pub(super) fn add_rank_times(&mut self) {
        let events: Vec<EventId> = self.meet.event_ids().collect();
        for &event in &events {
            let e = event.index();
            let bound = self.bound(event);
            let legs = self.legs(event);
            let slots = Slot::of_kind(self.meet.event(event).kind);

            for rank in HomeRank::ALL {
                let rt = self.model.add_variable(
                    Variable::continuous(format!("rt_e{e}_r{}", rank.number())).with_min(0.0),
                );
                self.vars.rank_times.insert((event, rank), rt);

                // rt − Σ (time − c)·role = legs·c
                let c = offset(bound, rank);
                let mut expr = LinearExpr::from(rt);
                for athlete in self.roster.athlete_ids() {
                    for &slot in &slots {
                        let key = RoleKey {
                            athlete,
                            event,
                            slot,
                            rank,
                        };
                        if let Some(role) = self.vars.role(key) {
                            let time = self.roster.time(athlete, slot.column(event));
                            expr.add_term(role, -(time - c));
                        }
                    }
                }
                self.model.add_constraint(LinearConstraint::eq(
                    format!("rank_time_e{e}_r{}", rank.number()),
                    expr,
                    sentinel(bound, legs, rank),
                ));
            }

            for rank in HomeRank::ALL {
                if let Some(next) = rank.next() {
                    let (Some(rt), Some(rt_next)) = (
                        self.vars.rank_time(event, rank),
                        self.vars.rank_time(event, next),
                    ) else {
                        continue;
                    };
                    self.model.add_constraint(LinearConstraint::le(
                        format!("rank_order_e{e}_r{}", rank.number()),
                        LinearExpr::from(rt) - LinearExpr::from(rt_next),
                        0.0,
                    ));
                }
            }
        }
    }

    pub(super) fn add_placements(&mut self) {
        let events: Vec<EventId> = self.meet.event_ids().collect();
        let scenarios: Vec<_> = self.scenarios.ids().collect();

        for &event in &events {
            let e = event.index();
            let big_m = self.big_m(event);
            let window = self.window(event);
            let individual = self.meet.event(event).kind == EventKind::Individual;

            for rank in HomeRank::ALL {
                let k = rank.number();
                let Some(rt) = self.vars.rank_time(event, rank) else {
                    continue;
                };
                let occupancy = if individual {
                    self.slot_fill(event, Slot::Individual, rank)
                } else {
                    LinearExpr::new()
                };

                for &scenario in &scenarios {
                    let s = scenario.index();
                    let times = self.scenarios.lineup(scenario).times(event).to_vec();
                    let mut claimed = LinearExpr::new();

                    for place in self.candidate_places(event, rank) {
                        let w = self.model.add_variable(Variable::binary(format!(
                            "w_e{e}_r{k}_p{place}_s{s}"
                        )));
                        self.vars.placements.insert(
                            PlacementKey {
                                event,
                                rank,
                                place,
                                scenario,
                            },
                            w,
                        );
                        claimed.add_term(w, 1.0);

                        let ahead = usize::from(place - k);
                        let name = format!("place_e{e}_r{k}_p{place}_s{s}");
                        // at most `ahead` opponents finish before this entry
                        if place == k || place < k.saturating_add(window) {
                            let o = opponent_time(&times, ahead + 1, big_m);
                            self.model.add_constraint(LinearConstraint::le(
                                format!("{name}_fast"),
                                LinearExpr::from(rt).with_term(w, big_m - o),
                                big_m,
                            ));
                        }
                        // at least `ahead` opponents finish before this entry
                        if place > k {
                            let o = opponent_time(&times, ahead, big_m);
                            self.model.add_constraint(LinearConstraint::ge(
                                format!("{name}_slow"),
                                LinearExpr::from(rt).with_term(w, -o),
                                0.0,
                            ));
                        }
                    }

                    let (expr, cap) = if individual {
                        (claimed - occupancy.clone(), 0.0)
                    } else {
                        (claimed, 1.0)
                    };
                    self.model.add_constraint(LinearConstraint::le(
                        format!("one_place_e{e}_r{k}_s{s}"),
                        expr,
                        cap,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::MeetConfig;
    use crate::meet::{Column, Event, LegRole, OpponentLineup, RawPerformance, ScenarioSet};

    #[test]
    fn test_event_bound() {
        let meet = Meet::new(vec![Event::individual("100F"), Event::relay("200FR")]).unwrap();
        let free = Column::Individual(meet.require("100F").unwrap());
        let relay = meet.require("200FR").unwrap();
        let raw = RawPerformance::new()
            .with_time("A", free, 50.0)
            .with_time("B", free, 55.0)
            .with_time("A", Column::RelayLeg { relay, role: LegRole::Start }, 23.0)
            .with_time("A", Column::RelayLeg { relay, role: LegRole::Flying }, 21.0)
            .with_time("B", Column::RelayLeg { relay, role: LegRole::Flying }, 24.0);
        let roster = PreparedRoster::prepare(&meet, &raw, 0).unwrap();

        assert_eq!(event_bound(&meet, &roster, meet.require("100F").unwrap()), 110.0);
        assert_eq!(event_bound(&meet, &roster, relay), 48.0);
    }

    #[test]
    fn test_sentinel_beyond_any_entry() {
        let bound = 110.0;
        // worst real entry swims bound / 2
        for rank in HomeRank::ALL {
            assert!(sentinel(bound, 1, rank) > bound / 2.0);
            assert!(sentinel(bound, 4, rank) > 4.0 * bound / 2.0);
            assert!(placement_big_m(bound, 1, 1.0) > sentinel(bound, 1, rank));
        }
        assert!(sentinel(bound, 1, HomeRank::First) < sentinel(bound, 1, HomeRank::Second));
        assert!(sentinel(bound, 1, HomeRank::Second) < sentinel(bound, 1, HomeRank::Third));
    }

    #[test]
    fn test_legs() {
        assert_eq!(legs(EventKind::Individual, 4), 1);
        assert_eq!(legs(EventKind::Relay, 4), 4);
        assert_eq!(legs(EventKind::MedleyRelay, 3), 3);
    }

    #[test]
    fn test_opponent_time_padding() {
        let times = [50.0, 52.0, 1e9];
        assert_eq!(opponent_time(&times, 1, 200.0), 50.0);
        assert_eq!(opponent_time(&times, 2, 200.0), 52.0);
        assert_eq!(opponent_time(&times, 3, 200.0), 200.0);
        assert_eq!(opponent_time(&times, 4, 200.0), 200.0);
        assert_eq!(opponent_time(&times, 0, 200.0), 200.0);
    }

    fn small_model(places: u8, window: u8) -> LineupModel {
        let meet = Meet::new(vec![Event::individual("100F")]).unwrap();
        let free = Column::Individual(meet.require("100F").unwrap());
        let raw = RawPerformance::new()
            .with_time("A", free, 50.0)
            .with_time("B", free, 51.0);
        let lineup = OpponentLineup::new().with_times(meet.require("100F").unwrap(), vec![50.5]);
        let scenarios = ScenarioSet::new(vec![lineup, OpponentLineup::new()], vec![0.5, 0.5]).unwrap();
        let config = MeetConfig::default()
            .with_relay_size(1)
            .with_places(places)
            .with_opponent_windows(window, window)
            .with_relay_adjustment(crate::lineup::RelayAdjustment::none());
        LineupModel::prepare(&meet, &raw, &scenarios, &config).unwrap()
    }

    #[test]
    fn test_placement_window() {
        let model = small_model(8, 3);
        let event = model.meet().require("100F").unwrap();
        assert_eq!(model.candidate_places(event, HomeRank::First), 1..=4);
        assert_eq!(model.candidate_places(event, HomeRank::Third), 3..=6);
        // 3 ranks × 4 places × 2 scenarios
        assert_eq!(model.vars().placements.len(), 24);

        let clipped = small_model(4, 3);
        assert_eq!(clipped.candidate_places(event, HomeRank::Third), 3..=4);
    }

    #[test]
    fn test_rank_time_matches_entry() {
        let model = small_model(8, 3);
        let event = model.meet().require("100F").unwrap();
        let a = model.roster().require("A").unwrap();
        let bound = model.bound(event);
        let constraint = model
            .model()
            .constraints()
            .iter()
            .find(|c| c.name == "rank_time_e0_r1")
            .unwrap();

        let rt = model.vars().rank_time(event, HomeRank::First).unwrap();
        let role = model
            .vars()
            .role(RoleKey {
                athlete: a,
                event,
                slot: Slot::Individual,
                rank: HomeRank::First,
            })
            .unwrap();

        let mut values = vec![0.0; model.model().variable_count()];
        values[role.index()] = 1.0;
        values[rt.index()] = 50.0;
        assert!(constraint.is_satisfied(&values, 1e-9));

        values[role.index()] = 0.0;
        values[rt.index()] = sentinel(bound, 1, HomeRank::First);
        assert!(constraint.is_satisfied(&values, 1e-9));
    }
}
