use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use tracing::*;

use crate::graph::{Network, Params};
use crate::model;
use crate::solution::{self, RouteSummary};

pub mod recorder;
#[cfg(feature = "gurobi")]
pub mod gurobi;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VarKind {
    Binary,
    Integer,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Relation {
    Le,
    Eq,
    Ge,
}

impl Relation {
    /// Whether `lhs REL rhs` holds up to `tol`.
    pub fn holds(&self, lhs: f64, rhs: f64, tol: f64) -> bool {
        match self {
            Relation::Le => lhs <= rhs + tol,
            Relation::Eq => (lhs - rhs).abs() <= tol,
            Relation::Ge => lhs >= rhs - tol,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::Le => "<=",
            Relation::Eq => "==",
            Relation::Ge => ">=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ObjSense {
    Minimize,
    Maximize,
}

/// Terminal state reported by a solving engine. Anything that is not one of
/// the three recognised outcomes is passed through verbatim as `Other`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Other(i32),
}

/// A linear expression over solver variable handles.
#[derive(Debug, Clone)]
pub struct LinExpr<V> {
    terms: Vec<(f64, V)>,
}

impl<V: Copy> LinExpr<V> {
    pub fn new() -> Self {
        LinExpr { terms: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        LinExpr { terms: Vec::with_capacity(cap) }
    }

    pub fn term(coeff: f64, var: V) -> Self {
        let mut e = Self::with_capacity(1);
        e.add_term(coeff, var);
        return e;
    }

    pub fn add_term(&mut self, coeff: f64, var: V) {
        if coeff != 0.0 {
            self.terms.push((coeff, var));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, V)> + '_ {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate the expression under the given variable valuation.
    pub fn value(&self, val: impl Fn(V) -> f64) -> f64 {
        self.terms.iter().map(|&(c, v)| c * val(v)).sum()
    }
}

/// The capability an external mixed-integer solving engine must provide.
/// The model generator drives this interface only; it never inspects the
/// engine behind it. Solution records and infeasibility certificates are
/// opaque artifacts owned by the engine.
pub trait Solver {
    type Var: Copy + Eq + Hash + fmt::Debug;
    type Error: std::error::Error + Send + Sync + 'static;

    fn create_var(&mut self, name: &str, kind: VarKind, lb: f64) -> Result<Self::Var, Self::Error>;

    fn add_constr(
        &mut self,
        name: &str,
        lhs: LinExpr<Self::Var>,
        rel: Relation,
        rhs: f64,
    ) -> Result<(), Self::Error>;

    fn set_objective(&mut self, expr: LinExpr<Self::Var>, sense: ObjSense) -> Result<(), Self::Error>;

    /// Run to completion (or a solver-side limit) and report the terminal status.
    fn optimize(&mut self) -> Result<SolveStatus, Self::Error>;

    fn objective_value(&self) -> Result<f64, Self::Error>;

    fn var_value(&self, var: &Self::Var) -> Result<f64, Self::Error>;

    fn write_solution(&self, path: &Path) -> Result<(), Self::Error>;

    fn write_infeasibility_certificate(&mut self, path: &Path) -> Result<(), Self::Error>;
}

/// A solve that terminated without an optimal assignment. The model is never
/// repaired or approximated here; the condition is surfaced as-is.
#[derive(Debug, Clone)]
pub enum SolveFailure {
    Infeasible { certificate: Option<PathBuf> },
    Unbounded,
    Status(i32),
}

impl fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveFailure::Infeasible { certificate: Some(p) } =>
                write!(f, "model is infeasible (certificate written to {:?})", p),
            SolveFailure::Infeasible { certificate: None } =>
                write!(f, "model is infeasible"),
            SolveFailure::Unbounded =>
                write!(f, "model is unbounded"),
            SolveFailure::Status(code) =>
                write!(f, "solver stopped with status {}", code),
        }
    }
}

impl std::error::Error for SolveFailure {}

#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    pub solution_file: Option<PathBuf>,
    pub certificate_file: Option<PathBuf>,
}

/// Build the model, hand it to the engine and, on an optimal outcome, read
/// back the arc assignment and reconstruct routes. Any other outcome
/// short-circuits with a [`SolveFailure`]; for an infeasible model a
/// certificate is requested first if a path was configured.
pub fn solve_to_routes<S: Solver>(
    net: &Network,
    params: &Params,
    solver: &mut S,
    opts: &SolveOptions,
) -> anyhow::Result<RouteSummary> {
    let vars = model::build_model(net, params, solver)?;
    let status = solver.optimize()?;
    debug!(?status, "solver returned");

    match status {
        SolveStatus::Optimal => {
            if let Some(p) = &opts.solution_file {
                solver.write_solution(p)?;
                info!(path=?p, "solution written");
            }
            let assignment = solution::extract_assignment(net, &vars, solver)?;
            let summary = solution::analyze_result(net, &assignment)?;
            return Ok(summary);
        }
        SolveStatus::Infeasible => {
            let certificate = match &opts.certificate_file {
                Some(p) => match solver.write_infeasibility_certificate(p) {
                    Ok(()) => {
                        info!(path=?p, "infeasibility certificate written");
                        Some(p.clone())
                    }
                    Err(e) => {
                        warn!(error=%e, "could not produce infeasibility certificate");
                        None
                    }
                },
                None => None,
            };
            return Err(SolveFailure::Infeasible { certificate }.into());
        }
        SolveStatus::Unbounded => return Err(SolveFailure::Unbounded.into()),
        SolveStatus::Other(code) => return Err(SolveFailure::Status(code).into()),
    }
}
