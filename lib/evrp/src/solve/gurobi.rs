use std::path::Path;

use grb::prelude::*;

use super::{LinExpr, ObjSense, Relation, Solver, SolveStatus, VarKind};

/// Thin adapter onto a Gurobi model. One instance per solve; sweeps create
/// one per trial so no solver context is ever shared across threads.
pub struct GurobiSolver {
    model: Model,
}

impl GurobiSolver {
    pub fn new(name: &str) -> grb::Result<GurobiSolver> {
        let model = Model::new(name)?;
        Ok(GurobiSolver { model })
    }

    /// Wall-clock limit for the solve, in seconds. The engine then reports
    /// its best-effort status, which is surfaced verbatim if not optimal.
    pub fn set_time_limit(&mut self, seconds: f64) -> grb::Result<()> {
        self.model.set_param(param::TimeLimit, seconds)
    }

    fn to_grb_expr(expr: &LinExpr<Var>) -> grb::expr::LinExpr {
        let mut e = grb::expr::LinExpr::new();
        for &(coeff, var) in expr.iter() {
            e.add_term(coeff, var);
        }
        e
    }
}

impl Solver for GurobiSolver {
    type Var = Var;
    type Error = grb::Error;

    fn create_var(&mut self, name: &str, kind: VarKind, lb: f64) -> grb::Result<Var> {
        let (vtype, ub) = match kind {
            VarKind::Binary => (VarType::Binary, 1.0),
            VarKind::Integer => (VarType::Integer, grb::INFINITY),
        };
        self.model.add_var(name, vtype, 0.0, lb, ub, std::iter::empty())
    }

    fn add_constr(&mut self, name: &str, lhs: LinExpr<Var>, rel: Relation, rhs: f64) -> grb::Result<()> {
        let e = Self::to_grb_expr(&lhs);
        match rel {
            Relation::Le => self.model.add_constr(name, c!(e <= rhs))?,
            Relation::Eq => self.model.add_constr(name, c!(e == rhs))?,
            Relation::Ge => self.model.add_constr(name, c!(e >= rhs))?,
        };
        Ok(())
    }

    fn set_objective(&mut self, expr: LinExpr<Var>, sense: ObjSense) -> grb::Result<()> {
        let e = Self::to_grb_expr(&expr);
        let sense = match sense {
            ObjSense::Minimize => ModelSense::Minimize,
            ObjSense::Maximize => ModelSense::Maximize,
        };
        self.model.set_objective(e, sense)
    }

    fn optimize(&mut self) -> grb::Result<SolveStatus> {
        self.model.optimize()?;
        let status = self.model.status()?;
        let mapped = match status {
            Status::Optimal => SolveStatus::Optimal,
            Status::Infeasible => SolveStatus::Infeasible,
            Status::Unbounded => SolveStatus::Unbounded,
            other => SolveStatus::Other(other as i32),
        };
        Ok(mapped)
    }

    fn objective_value(&self) -> grb::Result<f64> {
        self.model.get_attr(attr::ObjVal)
    }

    fn var_value(&self, var: &Var) -> grb::Result<f64> {
        self.model.get_obj_attr(attr::X, var)
    }

    fn write_solution(&self, path: &Path) -> grb::Result<()> {
        self.model.write(&path.to_string_lossy())
    }

    fn write_infeasibility_certificate(&mut self, path: &Path) -> grb::Result<()> {
        self.model.compute_iis()?;
        self.model.write(&path.to_string_lossy())
    }
}
