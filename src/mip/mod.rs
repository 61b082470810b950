//! Mixed-Integer Programming (MIP) layer.
//!
//! Provides a domain-agnostic model for expressing linear optimization
//! problems over binary and continuous variables.
//!
//! # Key Components
//!
//! - **Variables**: [`Variable`], [`VarId`], [`LinearExpr`]: decision variables and affine expressions
//! - **Model**: [`LinearModel`]: container for variables, constraints, objective
//! - **Problem**: [`MipProblem`]: a model plus overlay constraints for one solve
//! - **Solver**: [`MipSolver`] trait: interface for solver implementations
//!
//! # Design
//!
//! The model is plain data. It is only translated into a backend
//! representation inside [`MipSolver::solve`], so an assembled model can be
//! shared by many solves (each with its own overlay) without being mutated.
//!
//! [`GoodLpSolver`] wraps `good_lp`: the pure-Rust `microlp` engine by
//! default, or HiGHS (feature `highs`) for time-limited, gap-bounded solves.
//!
//! # References
//!
//! Wolsey (1998), "Integer Programming"

mod model;
mod solver;
mod variables;

pub use model::{Comparison, LinearConstraint, LinearModel, MipProblem, Objective, Sense};
pub use solver::{Backend, GoodLpSolver, MipSolution, MipSolver, SolverConfig, SolverStatus};
pub use variables::{LinearExpr, VarId, VarKind, Variable};
