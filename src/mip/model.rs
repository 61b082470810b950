//! MIP model definition.

use super::variables::{LinearExpr, VarId, VarKind, Variable};
use std::fmt;

/// Relation between the two sides of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Comparison {
    /// `expr <= rhs`
    LessEq,
    /// `expr >= rhs`
    GreaterEq,
    /// `expr == rhs`
    Equal,
}

impl Comparison {
    fn symbol(self) -> &'static str {
        match self {
            Comparison::LessEq => "<=",
            Comparison::GreaterEq => ">=",
            Comparison::Equal => "=",
        }
    }
}

/// A linear constraint `expr (<=|>=|=) rhs`.
///
/// The name is only used for diagnostics and LP export; constraints are
/// never looked up by name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearConstraint {
    /// Constraint name.
    pub name: String,
    /// Left-hand side.
    pub expr: LinearExpr,
    /// Relation.
    pub cmp: Comparison,
    /// Right-hand side.
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn le(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            cmp: Comparison::LessEq,
            rhs,
        }
    }

    pub fn ge(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            cmp: Comparison::GreaterEq,
            rhs,
        }
    }

    pub fn eq(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            cmp: Comparison::Equal,
            rhs,
        }
    }

    /// Checks the constraint against dense variable values.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.eval(values);
        match self.cmp {
            Comparison::LessEq => lhs <= self.rhs + tolerance,
            Comparison::GreaterEq => lhs >= self.rhs - tolerance,
            Comparison::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sense {
    Maximize,
    Minimize,
}

/// Linear objective function.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    /// Optimization direction.
    pub sense: Sense,
    /// Expression to optimize.
    pub expr: LinearExpr,
}

impl Objective {
    pub fn maximize(expr: LinearExpr) -> Self {
        Self {
            sense: Sense::Maximize,
            expr,
        }
    }

    pub fn minimize(expr: LinearExpr) -> Self {
        Self {
            sense: Sense::Minimize,
            expr,
        }
    }
}

/// A mixed-integer linear model.
///
/// Contains variables, constraints, and an objective. Variables are
/// addressed by the [`VarId`] returned from [`add_variable`](Self::add_variable).
///
/// # Examples
///
/// ```
/// use u_lineup::mip::{LinearConstraint, LinearExpr, LinearModel, Objective, Variable};
///
/// let mut model = LinearModel::new("example");
/// let x = model.add_variable(Variable::binary("x"));
/// let y = model.add_variable(Variable::binary("y"));
/// model.add_constraint(LinearConstraint::le("pick_one", LinearExpr::sum([x, y]), 1.0));
/// model.set_objective(Objective::maximize(LinearExpr::term(x, 2.0).with_term(y, 3.0)));
/// assert!(model.validate().is_ok());
/// assert_eq!(model.binary_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearModel {
    /// Model name.
    pub name: String,
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    objective: Option<Objective>,
}

impl LinearModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Adds a variable and returns its handle.
    pub fn add_variable(&mut self, var: Variable) -> VarId {
        self.variables.push(var);
        VarId(self.variables.len() - 1)
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    /// Sets the objective function.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Returns the number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Returns the number of binary variables.
    pub fn binary_count(&self) -> usize {
        self.variables.iter().filter(|v| v.is_binary()).count()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Validates the model for consistency.
    ///
    /// Checks that an objective is set, every referenced variable exists,
    /// bounds are ordered and all coefficients are finite.
    pub fn validate(&self) -> Result<(), String> {
        for var in &self.variables {
            if let (Some(min), Some(max)) = (var.min, var.max) {
                if min > max {
                    return Err(format!("variable {}: min {min} > max {max}", var.name));
                }
            }
        }
        let objective = self.objective.as_ref().ok_or("objective not set")?;
        self.check_expr("objective", &objective.expr)?;
        for c in &self.constraints {
            self.check_constraint(c)?;
        }
        Ok(())
    }

    /// Validates a constraint against this model's variables.
    pub fn check_constraint(&self, c: &LinearConstraint) -> Result<(), String> {
        if !c.rhs.is_finite() {
            return Err(format!("constraint {}: non-finite rhs", c.name));
        }
        self.check_expr(&c.name, &c.expr)
    }

    fn check_expr(&self, owner: &str, expr: &LinearExpr) -> Result<(), String> {
        if !expr.constant.is_finite() {
            return Err(format!("{owner}: non-finite constant"));
        }
        for &(var, coef) in &expr.terms {
            if var.0 >= self.variables.len() {
                return Err(format!("{owner}: undefined variable #{}", var.0));
            }
            if !coef.is_finite() {
                return Err(format!("{owner}: non-finite coefficient"));
            }
        }
        Ok(())
    }

    /// Writes the model in CPLEX LP format.
    ///
    /// Constants on constraint left-hand sides are moved to the right-hand
    /// side. Names are sanitized to the LP identifier alphabet.
    pub fn write_lp<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "\\ {}", self.name)?;
        match &self.objective {
            Some(obj) => {
                let header = match obj.sense {
                    Sense::Maximize => "Maximize",
                    Sense::Minimize => "Minimize",
                };
                writeln!(out, "{header}")?;
                write!(out, " obj:")?;
                self.write_terms(out, &obj.expr)?;
                if obj.expr.constant != 0.0 {
                    write!(out, " {} {}", sign(obj.expr.constant), obj.expr.constant.abs())?;
                }
                writeln!(out)?;
            }
            None => writeln!(out, "Maximize\n obj: 0")?,
        }

        writeln!(out, "Subject To")?;
        for (i, c) in self.constraints.iter().enumerate() {
            write!(out, " {}_{i}:", lp_name(&c.name))?;
            self.write_terms(out, &c.expr)?;
            writeln!(out, " {} {}", c.cmp.symbol(), c.rhs - c.expr.constant)?;
        }

        writeln!(out, "Bounds")?;
        for var in self.variables.iter().filter(|v| !v.is_binary()) {
            let name = lp_name(&var.name);
            match (var.min, var.max) {
                (None, None) => writeln!(out, " {name} free")?,
                (Some(min), None) => writeln!(out, " {name} >= {min}")?,
                (None, Some(max)) => writeln!(out, " -inf <= {name} <= {max}")?,
                (Some(min), Some(max)) => writeln!(out, " {min} <= {name} <= {max}")?,
            }
        }

        let binaries: Vec<String> = self
            .variables
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .map(|v| lp_name(&v.name))
            .collect();
        if !binaries.is_empty() {
            writeln!(out, "Binaries")?;
            for chunk in binaries.chunks(8) {
                writeln!(out, " {}", chunk.join(" "))?;
            }
        }
        writeln!(out, "End")
    }

    fn write_terms<W: fmt::Write>(&self, out: &mut W, expr: &LinearExpr) -> fmt::Result {
        if expr.terms.is_empty() {
            return write!(out, " 0");
        }
        for &(var, coef) in &expr.terms {
            write!(
                out,
                " {} {} {}",
                sign(coef),
                coef.abs(),
                lp_name(&self.variables[var.0].name)
            )?;
        }
        Ok(())
    }
}

fn sign(value: f64) -> char {
    if value < 0.0 {
        '-'
    } else {
        '+'
    }
}

fn lp_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "_.".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A base model plus extra constraints layered on top for one solve,
/// optionally with a replacement objective.
///
/// The base model is borrowed immutably, so layering never changes it.
#[derive(Debug, Clone, Copy)]
pub struct MipProblem<'a> {
    model: &'a LinearModel,
    overlay: &'a [LinearConstraint],
    objective: Option<&'a Objective>,
}

impl<'a> MipProblem<'a> {
    /// Problem consisting of the model alone.
    pub fn new(model: &'a LinearModel) -> Self {
        Self {
            model,
            overlay: &[],
            objective: None,
        }
    }

    /// Problem consisting of the model plus `overlay` constraints.
    pub fn with_overlay(model: &'a LinearModel, overlay: &'a [LinearConstraint]) -> Self {
        Self {
            model,
            overlay,
            objective: None,
        }
    }

    /// Replaces the model's objective for this solve.
    pub fn with_objective(mut self, objective: &'a Objective) -> Self {
        self.objective = Some(objective);
        self
    }

    pub fn model(&self) -> &'a LinearModel {
        self.model
    }

    pub fn overlay(&self) -> &'a [LinearConstraint] {
        self.overlay
    }

    /// Objective in effect: the replacement if set, else the model's.
    pub fn objective(&self) -> Option<&'a Objective> {
        self.objective.or(self.model.objective.as_ref())
    }

    /// All constraints: base first, then overlay.
    pub fn constraints(&self) -> impl Iterator<Item = &'a LinearConstraint> + 'a {
        self.model.constraints.iter().chain(self.overlay.iter())
    }

    /// Validates the base model, the overlay and any replacement objective.
    pub fn validate(&self) -> Result<(), String> {
        self.model.validate()?;
        for c in self.overlay {
            self.model.check_constraint(c)?;
        }
        if let Some(objective) = self.objective {
            self.model.check_expr("objective", &objective.expr)?;
        }
        Ok(())
    }

    /// Flattens base, overlay and objective into one owned model.
    pub fn to_model(&self) -> LinearModel {
        let mut model = self.model.clone();
        model.constraints.extend(self.overlay.iter().cloned());
        if let Some(objective) = self.objective {
            model.objective = Some(objective.clone());
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> (LinearModel, VarId, VarId) {
        let mut model = LinearModel::new("test");
        let x = model.add_variable(Variable::binary("x"));
        let t = model.add_variable(Variable::continuous("t[0]").with_min(0.0));
        model.add_constraint(LinearConstraint::le(
            "cap",
            LinearExpr::term(x, 2.0).with_term(t, 1.0),
            10.0,
        ));
        model.set_objective(Objective::maximize(LinearExpr::from(t)));
        (model, x, t)
    }

    #[test]
    fn test_model_creation() {
        let (model, x, _) = small_model();
        assert_eq!(model.variable_count(), 2);
        assert_eq!(model.binary_count(), 1);
        assert_eq!(model.constraint_count(), 1);
        assert_eq!(model.variable(x).name, "x");
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_missing_objective() {
        let mut model = LinearModel::new("test");
        model.add_variable(Variable::binary("x"));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_undefined_variable() {
        let (mut model, _, _) = small_model();
        model.add_constraint(LinearConstraint::eq("bad", LinearExpr::from(VarId(7)), 0.0));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_non_finite_coefficient() {
        let (mut model, x, _) = small_model();
        model.add_constraint(LinearConstraint::ge("nan", LinearExpr::term(x, f64::NAN), 0.0));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_inverted_bounds() {
        let mut model = LinearModel::new("test");
        let v = model.add_variable(Variable::continuous("v").with_min(3.0).with_max(1.0));
        model.set_objective(Objective::minimize(LinearExpr::from(v)));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_constraint_satisfaction() {
        let c = LinearConstraint::le("c", LinearExpr::term(VarId(0), 1.0), 1.0);
        assert!(c.is_satisfied(&[1.0], 1e-9));
        assert!(!c.is_satisfied(&[1.5], 1e-9));

        let e = LinearConstraint::eq("e", LinearExpr::from(VarId(0)) + LinearExpr::constant(1.0), 2.0);
        assert!(e.is_satisfied(&[1.0], 1e-9));
        assert!(!e.is_satisfied(&[0.0], 1e-9));
    }

    #[test]
    fn test_overlay_leaves_base_untouched() {
        let (model, x, _) = small_model();
        let pin = [LinearConstraint::eq("pin", LinearExpr::from(x), 0.0)];
        let problem = MipProblem::with_overlay(&model, &pin);

        assert_eq!(problem.constraints().count(), 2);
        assert!(problem.validate().is_ok());
        assert_eq!(problem.to_model().constraint_count(), 2);
        assert_eq!(model.constraint_count(), 1);
    }

    #[test]
    fn test_replacement_objective() {
        let (model, x, _) = small_model();
        let objective = Objective::minimize(LinearExpr::from(x));
        let problem = MipProblem::new(&model).with_objective(&objective);

        assert!(problem.validate().is_ok());
        assert_eq!(problem.objective().unwrap().sense, Sense::Minimize);
        assert_eq!(problem.to_model().objective(), Some(&objective));
        assert_eq!(model.objective().unwrap().sense, Sense::Maximize);

        let dangling = Objective::minimize(LinearExpr::from(VarId(7)));
        assert!(MipProblem::new(&model)
            .with_objective(&dangling)
            .validate()
            .is_err());
    }

    #[test]
    fn test_overlay_validation() {
        let (model, _, _) = small_model();
        let bad = [LinearConstraint::eq("pin", LinearExpr::from(VarId(9)), 0.0)];
        assert!(MipProblem::with_overlay(&model, &bad).validate().is_err());
    }

    #[test]
    fn test_write_lp() {
        let (mut model, x, _) = small_model();
        model.add_constraint(LinearConstraint::eq(
            "shift",
            LinearExpr::from(x) + LinearExpr::constant(1.0),
            1.0,
        ));
        let mut out = String::new();
        model.write_lp(&mut out).unwrap();

        assert!(out.contains("Maximize"));
        assert!(out.contains(" obj: + 1 t_0_"));
        assert!(out.contains(" cap_0: + 2 x + 1 t_0_ <= 10"));
        assert!(out.contains(" shift_1: + 1 x = 0"));
        assert!(out.contains(" t_0_ >= 0"));
        assert!(out.contains("Binaries\n x\n"));
        assert!(out.ends_with("End\n"));
    }

    #[test]
    fn test_write_lp_empty_expression() {
        let mut model = LinearModel::new("empty");
        model.set_objective(Objective::maximize(LinearExpr::new()));
        let mut out = String::new();
        model.write_lp(&mut out).unwrap();

        assert!(out.contains(" obj: 0\n"));
        assert!(!out.contains(" 0 x"));
        assert!(!out.contains("Binaries"));
    }
}
