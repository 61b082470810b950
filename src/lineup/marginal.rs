//! Marginal value of athletes and entries.
//!
//! A probe re-solves the lineup model with one [`Exclusion`] layered on
//! top and compares the expected score with the baseline. The base model
//! is shared immutably, so probes are independent of each other and of
//! the order they run in.
//!
//! Probes solve the expected-score objective only; the rank-time
//! tie-break has no bearing on a value.

use super::builder::LineupModel;
use crate::meet::{AthleteId, EventId, EventKind};
use crate::mip::{
    LinearConstraint, LinearExpr, MipProblem, MipSolver, SolverConfig, SolverStatus,
};
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// What a probe takes away from the home roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Exclusion {
    /// The athlete swims nothing.
    Athlete(AthleteId),
    /// The athlete does not swim this event.
    Entry(AthleteId, EventId),
}

impl Exclusion {
    pub fn athlete(self) -> AthleteId {
        match self {
            Exclusion::Athlete(a) | Exclusion::Entry(a, _) => a,
        }
    }

    /// Overlay constraints pinning the excluded roles to zero.
    pub fn constraints(self, model: &LineupModel) -> Vec<LinearConstraint> {
        let athlete = self.athlete();
        let a = athlete.index();
        match self {
            Exclusion::Athlete(_) => {
                let mut roles = LinearExpr::new();
                for event in model.meet().event_ids() {
                    roles += model.event_roles(athlete, event);
                }
                vec![LinearConstraint::eq(format!("exclude_a{a}"), roles, 0.0)]
            }
            Exclusion::Entry(_, event) => vec![LinearConstraint::eq(
                format!("exclude_a{a}_e{}", event.index()),
                model.event_roles(athlete, event),
                0.0,
            )],
        }
    }

    /// Human-readable label.
    pub fn describe(self, model: &LineupModel) -> String {
        let name = &model.roster().athlete(self.athlete()).name;
        match self {
            Exclusion::Athlete(_) => name.clone(),
            Exclusion::Entry(_, event) => format!("{name} / {}", model.meet().event(event).name),
        }
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MarginalValue {
    pub exclusion: Exclusion,
    pub status: SolverStatus,
    /// Expected score without the excluded roles.
    pub expected_score: Option<f64>,
    /// Baseline minus `expected_score`: points the excluded roles are worth.
    pub value: Option<f64>,
}

/// One probe per real athlete.
pub fn athlete_probes(model: &LineupModel) -> Vec<Exclusion> {
    model
        .roster()
        .real_athlete_ids()
        .map(Exclusion::Athlete)
        .collect()
}

/// One probe per (real athlete, event) the athlete could plausibly swim.
///
/// Individual and freestyle relay entries are probed only when the
/// athlete has a recorded time in one of the event's columns. Medley
/// relay entries are always probed.
pub fn entry_probes(model: &LineupModel) -> Vec<Exclusion> {
    let meet = model.meet();
    let roster = model.roster();
    let mut probes = Vec::new();
    for athlete in roster.real_athlete_ids() {
        for event in meet.event_ids() {
            let probe = meet.event(event).kind == EventKind::MedleyRelay
                || meet
                    .columns_of(event)
                    .any(|c| roster.is_recorded(athlete, c));
            if probe {
                probes.push(Exclusion::Entry(athlete, event));
            }
        }
    }
    probes
}

/// Solves `model` with `exclusion` applied and values it against `baseline`.
pub fn marginal_value<S: MipSolver + ?Sized>(
    solver: &S,
    model: &LineupModel,
    config: &SolverConfig,
    baseline: f64,
    exclusion: Exclusion,
) -> MarginalValue {
    let overlay = exclusion.constraints(model);
    let problem = MipProblem::with_overlay(model.model(), &overlay);
    let solution = solver.solve(&problem, config);

    let expected_score = solution
        .is_solution_found()
        .then(|| model.expected_score(&solution));
    match expected_score {
        Some(score) => debug!(
            probe = %exclusion.describe(model),
            score,
            value = baseline - score,
            "marginal probe solved"
        ),
        None => warn!(
            probe = %exclusion.describe(model),
            status = ?solution.status,
            message = solution.message.as_deref().unwrap_or(""),
            "marginal probe failed"
        ),
    }

    MarginalValue {
        exclusion,
        status: solution.status,
        expected_score,
        value: expected_score.map(|score| baseline - score),
    }
}

/// Runs every probe, in input order.
///
/// With the `parallel` feature the probes are solved concurrently on the
/// rayon thread pool.
pub fn marginal_values<S: MipSolver + Sync + ?Sized>(
    solver: &S,
    model: &LineupModel,
    config: &SolverConfig,
    baseline: f64,
    exclusions: &[Exclusion],
) -> Vec<MarginalValue> {
    debug!(probes = exclusions.len(), baseline, "running marginal probes");

    #[cfg(feature = "parallel")]
    {
        exclusions
            .par_iter()
            .map(|&e| marginal_value(solver, model, config, baseline, e))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        exclusions
            .iter()
            .map(|&e| marginal_value(solver, model, config, baseline, e))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::MeetConfig;
    use crate::meet::{Column, Event, Meet, OpponentLineup, RawPerformance, ScenarioSet};
    use crate::mip::{Comparison, MipSolution};

    fn model() -> LineupModel {
        let meet = Meet::new(vec![
            Event::individual("100F"),
            Event::individual("100BK"),
            Event::medley_relay("200MR"),
        ])
        .unwrap();
        let free = Column::Individual(meet.require("100F").unwrap());
        let back = Column::Individual(meet.require("100BK").unwrap());
        let medley = meet.require("200MR").unwrap();
        let mut raw = RawPerformance::new()
            .with_time("A", free, 50.0)
            .with_time("A", back, 60.0)
            .with_time("B", free, 51.0);
        for stroke in crate::meet::Stroke::ALL {
            raw.record("C", Column::MedleyLeg { relay: medley, stroke }, 26.0);
        }
        let scenarios = ScenarioSet::single(OpponentLineup::new()).unwrap();
        LineupModel::prepare(&meet, &raw, &scenarios, &MeetConfig::default().with_relay_size(1))
            .unwrap()
    }

    #[test]
    fn test_athlete_probes_skip_ghosts() {
        let model = model();
        let probes = athlete_probes(&model);
        assert_eq!(probes.len(), 3);
        assert!(probes
            .iter()
            .all(|p| !model.roster().athlete(p.athlete()).ghost));
    }

    #[test]
    fn test_entry_probes_need_recorded_time() {
        let model = model();
        let probes = entry_probes(&model);
        let meet = model.meet();
        let a = model.roster().require("A").unwrap();
        let b = model.roster().require("B").unwrap();
        let c = model.roster().require("C").unwrap();
        let free = meet.require("100F").unwrap();
        let back = meet.require("100BK").unwrap();
        let medley = meet.require("200MR").unwrap();

        assert_eq!(
            probes,
            vec![
                Exclusion::Entry(a, free),
                Exclusion::Entry(a, back),
                Exclusion::Entry(a, medley),
                Exclusion::Entry(b, free),
                Exclusion::Entry(b, medley),
                Exclusion::Entry(c, medley),
            ]
        );
    }

    #[test]
    fn test_exclusion_constraints() {
        let model = model();
        let a = model.roster().require("A").unwrap();
        let free = model.meet().require("100F").unwrap();

        let whole = Exclusion::Athlete(a).constraints(&model);
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].cmp, Comparison::Equal);
        // 3 ranks × (1 + 1 + 4 medley strokes)
        assert_eq!(whole[0].expr.len(), 18);

        let entry = Exclusion::Entry(a, free).constraints(&model);
        assert_eq!(entry[0].expr.len(), 3);
        assert_eq!(Exclusion::Entry(a, free).describe(&model), "A / 100F");
    }

    struct FailingSolver;

    impl MipSolver for FailingSolver {
        fn solve(&self, _: &MipProblem<'_>, _: &SolverConfig) -> MipSolution {
            MipSolution::failed(SolverStatus::Infeasible, "no")
        }
    }

    #[test]
    fn test_failed_probe_has_no_value() {
        let model = model();
        let a = model.roster().require("A").unwrap();
        let values = marginal_values(
            &FailingSolver,
            &model,
            &SolverConfig::default(),
            10.0,
            &[Exclusion::Athlete(a)],
        );
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].status, SolverStatus::Infeasible);
        assert_eq!(values[0].value, None);
    }
}
