use std::fmt;
use std::path::Path;

use crate::Map;
use super::{LinExpr, ObjSense, Relation, Solver, SolveStatus, VarKind};

const TOL: f64 = 1e-6;

/// Variable handle of the [`ModelRecorder`]: the creation index.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RecVar(pub usize);

#[derive(Debug, Clone)]
pub struct VarInfo {
    pub name: String,
    pub kind: VarKind,
    pub lb: f64,
}

#[derive(Debug, Clone)]
pub struct ConstrInfo {
    pub name: String,
    pub lhs: LinExpr<RecVar>,
    pub rel: Relation,
    pub rhs: f64,
}

/// The recorder emits models, it does not solve them.
#[derive(Debug, Copy, Clone)]
pub struct Unsupported(pub &'static str);

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation not supported by the model recorder: {}", self.0)
    }
}

impl std::error::Error for Unsupported {}


/// An engine-shaped sink that records every variable, constraint and the
/// objective as emitted. Used for model statistics and for checking a
/// candidate assignment against the recorded rows.
#[derive(Debug, Default)]
pub struct ModelRecorder {
    vars: Vec<VarInfo>,
    constrs: Vec<ConstrInfo>,
    objective: Option<(LinExpr<RecVar>, ObjSense)>,
}

#[derive(Debug, Clone)]
pub struct ModelStats {
    pub num_vars: usize,
    pub num_binary: usize,
    pub num_integer: usize,
    pub num_constrs: usize,
    /// Constraint counts grouped by the name prefix before `[`.
    pub families: Vec<(String, usize)>,
}

impl ModelRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vars(&self) -> usize { self.vars.len() }

    pub fn num_constrs(&self) -> usize { self.constrs.len() }

    pub fn vars(&self) -> &[VarInfo] { &self.vars }

    pub fn constrs(&self) -> &[ConstrInfo] { &self.constrs }

    pub fn objective(&self) -> Option<&(LinExpr<RecVar>, ObjSense)> {
        self.objective.as_ref()
    }

    /// Map from variable name to handle. Names are unique per model.
    pub fn name_lookup(&self) -> Map<&str, RecVar> {
        self.vars.iter()
            .enumerate()
            .map(|(i, v)| (v.name.as_str(), RecVar(i)))
            .collect()
    }

    pub fn objective_at(&self, values: &[f64]) -> Option<f64> {
        self.objective.as_ref().map(|(expr, _)| expr.value(|RecVar(i)| values[i]))
    }

    /// Every recorded row and bound the assignment violates, as printable
    /// descriptions. An empty result means the assignment is feasible.
    pub fn check_assignment(&self, values: &[f64]) -> Vec<String> {
        debug_assert_eq!(values.len(), self.vars.len());
        let mut violations = Vec::new();

        for (i, var) in self.vars.iter().enumerate() {
            let v = values[i];
            if v < var.lb - TOL {
                violations.push(format!("{} = {} below lower bound {}", var.name, v, var.lb));
            }
            if (v - v.round()).abs() > TOL {
                violations.push(format!("{} = {} is not integral", var.name, v));
            }
            if var.kind == VarKind::Binary && v > 1.0 + TOL {
                violations.push(format!("{} = {} exceeds binary bound", var.name, v));
            }
        }

        for c in &self.constrs {
            let lhs = c.lhs.value(|RecVar(i)| values[i]);
            if !c.rel.holds(lhs, c.rhs, TOL) {
                violations.push(format!("{}: {} {} {}", c.name, lhs, c.rel, c.rhs));
            }
        }

        return violations;
    }

    pub fn stats(&self) -> ModelStats {
        let num_binary = self.vars.iter().filter(|v| v.kind == VarKind::Binary).count();
        let num_integer = self.vars.iter().filter(|v| v.kind == VarKind::Integer).count();

        let mut by_family: Map<&str, usize> = Map::default();
        for c in &self.constrs {
            let prefix = c.name.split('[').next().unwrap_or(&c.name);
            *by_family.entry(prefix).or_insert(0) += 1;
        }
        let mut families: Vec<(String, usize)> = by_family.into_iter()
            .map(|(k, n)| (k.to_string(), n))
            .collect();
        families.sort();

        return ModelStats {
            num_vars: self.vars.len(),
            num_binary,
            num_integer,
            num_constrs: self.constrs.len(),
            families,
        };
    }
}

impl Solver for ModelRecorder {
    type Var = RecVar;
    type Error = Unsupported;

    fn create_var(&mut self, name: &str, kind: VarKind, lb: f64) -> Result<RecVar, Unsupported> {
        let handle = RecVar(self.vars.len());
        self.vars.push(VarInfo { name: name.to_string(), kind, lb });
        return Ok(handle);
    }

    fn add_constr(&mut self, name: &str, lhs: LinExpr<RecVar>, rel: Relation, rhs: f64) -> Result<(), Unsupported> {
        self.constrs.push(ConstrInfo { name: name.to_string(), lhs, rel, rhs });
        return Ok(());
    }

    fn set_objective(&mut self, expr: LinExpr<RecVar>, sense: ObjSense) -> Result<(), Unsupported> {
        self.objective = Some((expr, sense));
        return Ok(());
    }

    fn optimize(&mut self) -> Result<SolveStatus, Unsupported> {
        Err(Unsupported("optimize"))
    }

    fn objective_value(&self) -> Result<f64, Unsupported> {
        Err(Unsupported("objective_value"))
    }

    fn var_value(&self, _var: &RecVar) -> Result<f64, Unsupported> {
        Err(Unsupported("var_value"))
    }

    fn write_solution(&self, _path: &Path) -> Result<(), Unsupported> {
        Err(Unsupported("write_solution"))
    }

    fn write_infeasibility_certificate(&mut self, _path: &Path) -> Result<(), Unsupported> {
        Err(Unsupported("write_infeasibility_certificate"))
    }
}
