//! MIP solver interface and the `good_lp` backends.

use super::model::{Comparison, LinearModel, MipProblem, Sense};
use super::variables::{LinearExpr, VarId, VarKind};
use good_lp::{
    variable, Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus,
    SolverModel,
};
#[cfg(feature = "highs")]
use good_lp::{WithMipGap, WithTimeLimit};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Absolute tolerance when checking an incumbent against the constraints.
const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStatus {
    /// Optimal solution found, within the configured gap.
    Optimal,
    /// Time limit reached; the best feasible solution found is returned.
    TimeLimitFeasible,
    /// No feasible solution exists.
    Infeasible,
    /// The objective is unbounded.
    Unbounded,
    /// Solver failure, invalid model, or time limit without a solution.
    Error,
}

impl SolverStatus {
    /// Whether variable values are meaningful for this status.
    pub fn has_solution(self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::TimeLimitFeasible)
    }
}

/// MIP engine used behind [`GoodLpSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backend {
    /// Pure-Rust branch and bound from the `microlp` crate.
    ///
    /// Runs on the calling thread to proven optimality and cannot be
    /// interrupted: an overrun of the time limit is only logged, and a
    /// positive optimality gap is rejected as unsupported.
    #[default]
    Microlp,
    /// HiGHS, with a native time limit and relative MIP gap. On expiry the
    /// incumbent is returned as [`SolverStatus::TimeLimitFeasible`].
    #[cfg(feature = "highs")]
    Highs,
}

impl Backend {
    /// Whether the engine stops at a relative optimality gap.
    pub fn supports_gap(self) -> bool {
        match self {
            Backend::Microlp => false,
            #[cfg(feature = "highs")]
            Backend::Highs => true,
        }
    }
}

/// Solver configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_lineup::mip::SolverConfig;
///
/// let config = SolverConfig::default().with_time_limit(Duration::from_secs(30));
/// assert!(config.validate().is_ok());
///
/// // microlp always closes the gap
/// assert!(config.with_optimality_gap(0.01).validate().is_err());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Wall-clock budget for one solve.
    pub time_limit: Duration,
    /// Relative optimality gap at which the search may stop, in [0, 1].
    pub optimality_gap: f64,
    /// MIP engine.
    pub backend: Backend,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            optimality_gap: 0.0,
            backend: Backend::default(),
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_optimality_gap(mut self, gap: f64) -> Self {
        self.optimality_gap = gap;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_limit.is_zero() {
            return Err("time_limit must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.optimality_gap) {
            return Err(format!(
                "optimality_gap must be in [0, 1], got {}",
                self.optimality_gap
            ));
        }
        if self.optimality_gap > 0.0 && !self.backend.supports_gap() {
            return Err(format!(
                "optimality_gap {} is not supported by the {:?} backend",
                self.optimality_gap, self.backend
            ));
        }
        Ok(())
    }
}

/// Solution from a MIP solver.
#[derive(Debug, Clone)]
pub struct MipSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Objective function value, when a solution was found.
    pub objective_value: Option<f64>,
    /// Variable values indexed by [`VarId`]. Empty without a solution.
    pub values: Vec<f64>,
    /// Backend message for failures.
    pub message: Option<String>,
    /// Wall-clock solve time.
    pub solve_time: Duration,
}

impl MipSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            values: Vec::new(),
            message: None,
            solve_time: Duration::ZERO,
        }
    }

    /// Creates an empty solution carrying a failure message.
    pub fn failed(status: SolverStatus, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty(status)
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution()
    }

    /// Value of one variable (0 when absent).
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }

    /// Whether a binary variable is set.
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }

    /// Evaluates an expression at this solution.
    pub fn eval(&self, expr: &LinearExpr) -> f64 {
        expr.terms
            .iter()
            .map(|&(var, coef)| coef * self.value(var))
            .sum::<f64>()
            + expr.constant
    }
}

/// Trait for MIP solver implementations.
///
/// The contract: on any status where [`SolverStatus::has_solution`] is
/// false, `values` carries no meaning and callers must not extract from it.
pub trait MipSolver {
    /// Solves the problem and returns a solution.
    fn solve(&self, problem: &MipProblem<'_>, config: &SolverConfig) -> MipSolution;
}

/// Solver backed by `good_lp`, with the engine chosen by
/// [`SolverConfig::backend`].
///
/// The solve blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl MipSolver for GoodLpSolver {
    fn solve(&self, problem: &MipProblem<'_>, config: &SolverConfig) -> MipSolution {
        if let Err(e) = config.validate() {
            return MipSolution::failed(SolverStatus::Error, format!("invalid solver config: {e}"));
        }
        if let Err(e) = problem.validate() {
            return MipSolution::failed(SolverStatus::Error, format!("invalid model: {e}"));
        }

        let model = problem.to_model();
        debug!(
            model = %model.name,
            variables = model.variable_count(),
            binaries = model.binary_count(),
            constraints = model.constraint_count(),
            backend = ?config.backend,
            "starting MIP solve"
        );

        let start = Instant::now();
        let mut solution = solve_good_lp(&model, config);
        solution.solve_time = start.elapsed();

        if config.backend == Backend::Microlp && solution.solve_time > config.time_limit {
            warn!(
                limit = ?config.time_limit,
                elapsed = ?solution.solve_time,
                "microlp solve overran the time limit"
            );
        }
        info!(
            status = ?solution.status,
            objective = ?solution.objective_value,
            elapsed_ms = solution.solve_time.as_millis() as u64,
            "MIP solve finished"
        );
        solution
    }
}

fn to_expression(expr: &LinearExpr, handles: &[good_lp::Variable]) -> Expression {
    let mut out = Expression::from_other_affine(expr.constant);
    for &(var, coef) in &expr.terms {
        out.add_mul(coef, handles[var.0]);
    }
    out
}

fn solve_good_lp(model: &LinearModel, config: &SolverConfig) -> MipSolution {
    let Some(objective) = model.objective() else {
        return MipSolution::failed(SolverStatus::Error, "objective not set");
    };

    let mut vars = ProblemVariables::new();
    let handles: Vec<good_lp::Variable> = model
        .variables()
        .iter()
        .map(|v| {
            let mut def = variable().name(v.name.clone());
            if v.kind == VarKind::Binary {
                def = def.binary();
            }
            if let Some(min) = v.min {
                def = def.min(min);
            }
            if let Some(max) = v.max {
                def = def.max(max);
            }
            vars.add(def)
        })
        .collect();

    let goal = to_expression(&objective.expr, &handles);
    let unsolved = match objective.sense {
        Sense::Maximize => vars.maximise(goal),
        Sense::Minimize => vars.minimise(goal),
    };

    match config.backend {
        Backend::Microlp => finish(model, &handles, unsolved.using(good_lp::microlp)),
        #[cfg(feature = "highs")]
        Backend::Highs => {
            let problem = unsolved
                .using(good_lp::highs)
                .with_time_limit(config.time_limit.as_secs_f64());
            match problem.with_mip_gap(config.optimality_gap as f32) {
                Ok(problem) => finish(model, &handles, problem),
                Err(e) => MipSolution::failed(SolverStatus::Error, e),
            }
        }
    }
}

/// Adds the constraints, solves, and maps the engine outcome to a status.
fn finish<P>(model: &LinearModel, handles: &[good_lp::Variable], mut problem: P) -> MipSolution
where
    P: SolverModel<Error = ResolutionError>,
{
    for c in model.constraints() {
        let lhs = to_expression(&c.expr, handles);
        problem = problem.with(match c.cmp {
            Comparison::LessEq => lhs.leq(c.rhs),
            Comparison::GreaterEq => lhs.geq(c.rhs),
            Comparison::Equal => lhs.eq(c.rhs),
        });
    }

    match problem.solve() {
        Ok(sol) => {
            let timed_out = matches!(sol.status(), SolutionStatus::TimeLimit);
            let values = handles.iter().map(|&h| sol.value(h)).collect();
            incumbent(model, values, timed_out)
        }
        Err(ResolutionError::Infeasible) => MipSolution::empty(SolverStatus::Infeasible),
        Err(ResolutionError::Unbounded) => MipSolution::empty(SolverStatus::Unbounded),
        Err(other) => MipSolution::failed(SolverStatus::Error, other.to_string()),
    }
}

/// Classifies the values returned by an engine.
///
/// A run stopped by the time limit may come back without an incumbent;
/// its values are then checked against every constraint before they are
/// reported as [`SolverStatus::TimeLimitFeasible`].
fn incumbent(model: &LinearModel, values: Vec<f64>, timed_out: bool) -> MipSolution {
    if timed_out
        && !model
            .constraints()
            .iter()
            .all(|c| c.is_satisfied(&values, FEASIBILITY_TOLERANCE))
    {
        warn!("time limit reached without a feasible solution");
        return MipSolution::failed(
            SolverStatus::Error,
            "time limit reached without a feasible solution",
        );
    }

    let objective_value = model.objective().map(|o| o.expr.eval(&values));
    MipSolution {
        status: if timed_out {
            SolverStatus::TimeLimitFeasible
        } else {
            SolverStatus::Optimal
        },
        objective_value,
        values,
        message: None,
        solve_time: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::{LinearConstraint, Objective, Variable};

    fn knapsack() -> (LinearModel, Vec<VarId>) {
        // values 6, 5, 4 with weights 3, 2, 2 and capacity 4
        let mut model = LinearModel::new("knapsack");
        let items: Vec<VarId> = (0..3)
            .map(|i| model.add_variable(Variable::binary(format!("take_{i}"))))
            .collect();
        model.add_constraint(LinearConstraint::le(
            "capacity",
            LinearExpr::new()
                .with_term(items[0], 3.0)
                .with_term(items[1], 2.0)
                .with_term(items[2], 2.0),
            4.0,
        ));
        model.set_objective(Objective::maximize(
            LinearExpr::new()
                .with_term(items[0], 6.0)
                .with_term(items[1], 5.0)
                .with_term(items[2], 4.0),
        ));
        (model, items)
    }

    #[test]
    fn test_solve_knapsack() {
        let (model, items) = knapsack();
        let solution = GoodLpSolver::new().solve(&MipProblem::new(&model), &SolverConfig::default());

        assert_eq!(solution.status, SolverStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 9.0).abs() < 1e-6);
        assert!(!solution.is_set(items[0]));
        assert!(solution.is_set(items[1]));
        assert!(solution.is_set(items[2]));
    }

    #[test]
    fn test_overlay_pin() {
        let (model, items) = knapsack();
        let pin = [LinearConstraint::eq("pin", LinearExpr::from(items[1]), 0.0)];
        let solution = GoodLpSolver::new().solve(
            &MipProblem::with_overlay(&model, &pin),
            &SolverConfig::default(),
        );

        assert_eq!(solution.status, SolverStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 6.0).abs() < 1e-6);
        assert!(!solution.is_set(items[1]));
        assert_eq!(model.constraint_count(), 1);
    }

    #[test]
    fn test_infeasible() {
        let mut model = LinearModel::new("infeasible");
        let x = model.add_variable(Variable::binary("x"));
        model.add_constraint(LinearConstraint::ge("too_much", LinearExpr::from(x), 2.0));
        model.set_objective(Objective::maximize(LinearExpr::from(x)));

        let solution = GoodLpSolver::new().solve(&MipProblem::new(&model), &SolverConfig::default());
        assert_eq!(solution.status, SolverStatus::Infeasible);
        assert!(!solution.is_solution_found());
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_continuous_with_constant() {
        let mut model = LinearModel::new("shifted");
        let t = model.add_variable(Variable::continuous("t").with_min(0.0).with_max(10.0));
        model.add_constraint(LinearConstraint::le(
            "shifted_cap",
            LinearExpr::from(t) + LinearExpr::constant(3.0),
            8.0,
        ));
        model.set_objective(Objective::maximize(LinearExpr::from(t) + LinearExpr::constant(1.0)));

        let solution = GoodLpSolver::new().solve(&MipProblem::new(&model), &SolverConfig::default());
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert!((solution.value(t) - 5.0).abs() < 1e-6);
        assert!((solution.objective_value.unwrap() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_model_reports_error() {
        let model = LinearModel::new("no_objective");
        let solution = GoodLpSolver::new().solve(&MipProblem::new(&model), &SolverConfig::default());
        assert_eq!(solution.status, SolverStatus::Error);
        assert!(solution.message.unwrap().contains("objective"));
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let (model, _) = knapsack();
        let config = SolverConfig::default().with_optimality_gap(1.5);
        let solution = GoodLpSolver::new().solve(&MipProblem::new(&model), &config);
        assert_eq!(solution.status, SolverStatus::Error);
    }

    #[test]
    fn test_gap_rejected_by_microlp() {
        let (model, _) = knapsack();
        let config = SolverConfig::default().with_optimality_gap(0.3);
        assert!(config.validate().unwrap_err().contains("optimality_gap"));

        let solution = GoodLpSolver::new().solve(&MipProblem::new(&model), &config);
        assert_eq!(solution.status, SolverStatus::Error);
        assert!(solution.message.unwrap().contains("not supported"));
    }

    #[test]
    fn test_incumbent_after_time_limit() {
        let (model, _) = knapsack();

        let feasible = incumbent(&model, vec![0.0, 1.0, 1.0], true);
        assert_eq!(feasible.status, SolverStatus::TimeLimitFeasible);
        assert!(feasible.is_solution_found());
        assert!((feasible.objective_value.unwrap() - 9.0).abs() < 1e-9);

        // over capacity: no usable incumbent
        let garbage = incumbent(&model, vec![1.0, 1.0, 1.0], true);
        assert_eq!(garbage.status, SolverStatus::Error);
        assert!(garbage.values.is_empty());

        let finished = incumbent(&model, vec![0.0, 1.0, 1.0], false);
        assert_eq!(finished.status, SolverStatus::Optimal);
    }

    #[cfg(feature = "highs")]
    #[test]
    fn test_highs_with_gap_and_limit() {
        let (model, _) = knapsack();
        let config = SolverConfig::default()
            .with_backend(Backend::Highs)
            .with_time_limit(Duration::from_secs(5))
            .with_optimality_gap(0.3);
        assert!(config.validate().is_ok());

        let solution = GoodLpSolver::new().solve(&MipProblem::new(&model), &config);
        assert!(solution.is_solution_found());
        assert!(solution.objective_value.unwrap() >= 9.0 * 0.7 - 1e-6);
        assert!(model
            .constraints()
            .iter()
            .all(|c| c.is_satisfied(&solution.values, 1e-6)));
    }

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit, Duration::from_secs(60));
        assert_eq!(config.optimality_gap, 0.0);
        assert_eq!(config.backend, Backend::Microlp);
        assert!(!config.backend.supports_gap());
        assert!(config.validate().is_ok());
        assert!(config.with_time_limit(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_status_has_solution() {
        assert!(SolverStatus::Optimal.has_solution());
        assert!(SolverStatus::TimeLimitFeasible.has_solution());
        assert!(!SolverStatus::Infeasible.has_solution());
        assert!(!SolverStatus::Unbounded.has_solution());
        assert!(!SolverStatus::Error.has_solution());
    }

    #[test]
    fn test_solution_eval() {
        let mut solution = MipSolution::empty(SolverStatus::Optimal);
        solution.values = vec![1.0, 0.0, 2.0];
        let expr = LinearExpr::term(VarId(0), 2.0).with_term(VarId(2), 0.5) + LinearExpr::constant(1.0);
        assert!((solution.eval(&expr) - 4.0).abs() < 1e-12);
        assert_eq!(solution.value(VarId(10)), 0.0);
    }
}
