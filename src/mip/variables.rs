//! MIP variable types and linear expressions.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Handle to a variable inside a [`LinearModel`](super::LinearModel).
///
/// Handles are dense indices assigned in insertion order, so a solution
/// can be stored as a plain `Vec<f64>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of this variable in the model.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarKind {
    /// 0/1 integer variable.
    Binary,
    /// Real-valued variable with optional bounds.
    Continuous,
}

/// A decision variable with a name and bounds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    /// Variable name (unique identifier within a model).
    pub name: String,
    /// Variable domain.
    pub kind: VarKind,
    /// Lower bound. `None` = unbounded below.
    pub min: Option<f64>,
    /// Upper bound. `None` = unbounded above.
    pub max: Option<f64>,
}

impl Variable {
    /// Creates a binary variable.
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Binary,
            min: Some(0.0),
            max: Some(1.0),
        }
    }

    /// Creates a free continuous variable.
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Continuous,
            min: None,
            max: None,
        }
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Whether this variable is binary.
    pub fn is_binary(&self) -> bool {
        self.kind == VarKind::Binary
    }
}

/// An affine expression `Σ coef·var + constant`.
///
/// Terms are kept in insertion order; repeated variables are allowed and
/// are summed by the backend.
///
/// # Examples
///
/// ```
/// use u_lineup::mip::{LinearExpr, LinearModel, Variable};
///
/// let mut model = LinearModel::new("example");
/// let x = model.add_variable(Variable::binary("x"));
/// let y = model.add_variable(Variable::binary("y"));
///
/// let expr = LinearExpr::sum([x, y]) * 2.0 + LinearExpr::constant(1.0);
/// assert_eq!(expr.eval(&[1.0, 0.0]), 3.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearExpr {
    /// (variable, coefficient) pairs.
    pub terms: Vec<(VarId, f64)>,
    /// Constant offset.
    pub constant: f64,
}

impl LinearExpr {
    /// Creates the zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a constant expression.
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Creates a single-term expression.
    pub fn term(var: VarId, coef: f64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0.0,
        }
    }

    /// Sum of variables with unit coefficients.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    /// Number of terms (not counting the constant).
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression for dense variable values indexed by [`VarId`].
    ///
    /// # Panics
    ///
    /// Panics if a term refers to a variable outside `values`.
    pub fn eval(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * values[var.0])
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::term(var, 1.0)
    }
}

impl AddAssign for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self += rhs;
        self
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1.0
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: LinearExpr) -> LinearExpr {
        self + (-rhs)
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, rhs: f64) -> LinearExpr {
        for (_, coef) in &mut self.terms {
            *coef *= rhs;
        }
        self.constant *= rhs;
        self
    }
}
