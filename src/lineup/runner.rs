//! Lineup solve orchestration.

use super::builder::LineupModel;
use super::extract::LineupResult;
use super::marginal::{marginal_values, Exclusion, MarginalValue};
use crate::error::LineupError;
use crate::mip::{GoodLpSolver, MipProblem, MipSolution, MipSolver, SolverConfig, SolverStatus};
use tracing::{info, warn};

/// Solves lineup models.
///
/// # Examples
///
/// ```
/// use u_lineup::lineup::{LineupModel, LineupRunner, MeetConfig};
/// use u_lineup::meet::{Column, Event, Meet, OpponentLineup, RawPerformance, ScenarioSet};
/// use u_lineup::mip::SolverConfig;
///
/// let meet = Meet::new(vec![Event::individual("50F")]).unwrap();
/// let event = meet.require("50F").unwrap();
/// let raw = RawPerformance::new()
///     .with_time("Ada", Column::Individual(event), 21.5)
///     .with_time("Bo", Column::Individual(event), 22.0);
/// let scenarios =
///     ScenarioSet::single(OpponentLineup::new().with_times(event, vec![21.8, 22.5])).unwrap();
/// let config = MeetConfig::default().with_relay_size(1);
///
/// let model = LineupModel::prepare(&meet, &raw, &scenarios, &config).unwrap();
/// let result = LineupRunner::run(&model, &SolverConfig::default()).unwrap();
/// assert_eq!(result.event(event).unwrap().ranks[0].place, Some(1));
/// ```
pub struct LineupRunner;

impl LineupRunner {
    /// Solves with the default [`GoodLpSolver`].
    pub fn run(model: &LineupModel, config: &SolverConfig) -> Result<LineupResult, LineupError> {
        Self::run_with(&GoodLpSolver::new(), model, config)
    }

    /// Solves with a caller-supplied solver.
    ///
    /// With [`MeetConfig::tie_break`](super::MeetConfig::tie_break) set, a
    /// second solve shares what is left of the time limit.
    pub fn run_with<S: MipSolver + ?Sized>(
        solver: &S,
        model: &LineupModel,
        config: &SolverConfig,
    ) -> Result<LineupResult, LineupError> {
        config.validate().map_err(LineupError::InvalidConfig)?;

        let mut solution = solver.solve(&MipProblem::new(model.model()), config);
        if model.config().tie_break && solution.is_solution_found() {
            solution = Self::break_ties(solver, model, config, solution);
        }
        let result = LineupResult::extract(model, &solution)?;

        info!(
            status = ?result.status,
            expected_score = result.expected_score,
            objective = result.objective_value,
            elapsed_ms = result.solve_time.as_millis() as u64,
            "lineup solved"
        );
        Ok(result)
    }

    /// Re-solves with the expected score held at its optimum, minimizing
    /// total rank time. Falls back to `best` when the second solve fails or
    /// no time is left.
    fn break_ties<S: MipSolver + ?Sized>(
        solver: &S,
        model: &LineupModel,
        config: &SolverConfig,
        best: MipSolution,
    ) -> MipSolution {
        let remaining = config.time_limit.saturating_sub(best.solve_time);
        if remaining.is_zero() {
            warn!("no time left for the tie-break solve");
            return best;
        }

        let expected = model.expected_score(&best);
        let (hold, objective) = model.tie_break_stage(expected);
        let overlay = [hold];
        let problem = MipProblem::with_overlay(model.model(), &overlay).with_objective(&objective);
        let mut refined = solver.solve(&problem, &config.clone().with_time_limit(remaining));
        if !refined.is_solution_found() {
            warn!(
                status = ?refined.status,
                message = refined.message.as_deref().unwrap_or(""),
                "tie-break solve failed, keeping first-stage lineup"
            );
            return best;
        }

        if best.status == SolverStatus::TimeLimitFeasible {
            refined.status = SolverStatus::TimeLimitFeasible;
        }
        refined.objective_value = Some(model.expected_score(&refined));
        refined.solve_time += best.solve_time;
        refined
    }

    /// Values each exclusion against `baseline` with the default solver.
    pub fn marginal(
        model: &LineupModel,
        baseline: &LineupResult,
        exclusions: &[Exclusion],
        config: &SolverConfig,
    ) -> Result<Vec<MarginalValue>, LineupError> {
        Self::marginal_with(&GoodLpSolver::new(), model, baseline, exclusions, config)
    }

    /// Values each exclusion against `baseline` with a caller-supplied solver.
    pub fn marginal_with<S: MipSolver + Sync + ?Sized>(
        solver: &S,
        model: &LineupModel,
        baseline: &LineupResult,
        exclusions: &[Exclusion],
        config: &SolverConfig,
    ) -> Result<Vec<MarginalValue>, LineupError> {
        config.validate().map_err(LineupError::InvalidConfig)?;
        Ok(marginal_values(
            solver,
            model,
            config,
            baseline.expected_score,
            exclusions,
        ))
    }
}
