//! Reference solving for tiny instances, used by tests only. Route plans are
//! enumerated exhaustively, each plan induces a full variable valuation, and
//! the recorded rows decide which valuations the model admits. This checks
//! the emitted constraints end-to-end without any external solving engine.

use std::path::Path;

use itertools::Itertools;

use crate::data::evrp::Loc;
use crate::graph::{Network, DEPOT};
use crate::solve::recorder::{ModelRecorder, RecVar, Unsupported};
use crate::solve::{LinExpr, ObjSense, Relation, Solver, SolveStatus, VarKind};

/// Ordered customer sequences, one per vehicle, no depot entries.
pub type Plan = Vec<Vec<Loc>>;

/// Split a customer permutation into consecutive routes; bit `i` of `mask`
/// opens a new route before `perm[i + 1]`.
pub fn routes_from_mask(perm: &[Loc], mask: u32) -> Plan {
    let mut plan: Plan = vec![vec![perm[0]]];
    for (i, &c) in perm.iter().enumerate().skip(1) {
        if mask & (1 << (i - 1)) != 0 {
            plan.push(Vec::new());
        }
        plan.last_mut().unwrap().push(c);
    }
    return plan;
}

/// Every plan over `customers`: all permutations, all consecutive splits.
/// Plans differing only in route order appear more than once, which is
/// harmless for an exhaustive minimization.
pub fn enumerate_plans(customers: &[Loc]) -> Vec<Plan> {
    let n = customers.len();
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut plans = Vec::new();
    for perm in customers.iter().cloned().permutations(n) {
        for mask in 0..(1u32 << (n - 1)) {
            plans.push(routes_from_mask(&perm, mask));
        }
    }
    return plans;
}

/// The full variable valuation the plan induces: arc usage, running load,
/// running time and distance per used arc, zero elsewhere, and the vehicle
/// count. `None` if the plan needs an arc the graph does not have.
pub fn induce_assignment(net: &Network, rec: &ModelRecorder, plan: &Plan) -> Option<Vec<f64>> {
    let lookup = rec.name_lookup();
    let mut values = vec![0.0; rec.num_vars()];

    for route in plan {
        let mut load = 0u32;
        let mut time = 0u32;
        let mut dist = 0u32;
        let mut prev = DEPOT;
        for &next in route.iter().chain(std::iter::once(&DEPOT)) {
            let a = net.find_arc(prev, next)?;
            let arc = net.arc(a);
            load += net.vertex(prev).demand;
            time += arc.travel_time + net.vertex(prev).service_time;
            dist += arc.distance;

            values[lookup[format!("x[{},{}]", prev, next).as_str()].0] = 1.0;
            values[lookup[format!("y[{},{}]", prev, next).as_str()].0] = load as f64;
            values[lookup[format!("z[{},{}]", prev, next).as_str()].0] = time as f64;
            values[lookup[format!("zd[{},{}]", prev, next).as_str()].0] = dist as f64;
            prev = next;
        }
    }
    values[lookup["k"].0] = plan.len() as f64;
    return Some(values);
}


/// A [`Solver`] that records the model and, on `optimize`, picks the best
/// plan-induced valuation the recorded rows admit. Only meaningful for
/// graphs with a handful of customers.
pub struct EnumSolver {
    net: Network,
    rec: ModelRecorder,
    values: Option<Vec<f64>>,
    objective: Option<f64>,
}

impl EnumSolver {
    pub fn new(net: &Network) -> Self {
        EnumSolver {
            net: net.clone(),
            rec: ModelRecorder::new(),
            values: None,
            objective: None,
        }
    }
}

impl Solver for EnumSolver {
    type Var = RecVar;
    type Error = Unsupported;

    fn create_var(&mut self, name: &str, kind: VarKind, lb: f64) -> Result<RecVar, Unsupported> {
        self.rec.create_var(name, kind, lb)
    }

    fn add_constr(&mut self, name: &str, lhs: LinExpr<RecVar>, rel: Relation, rhs: f64) -> Result<(), Unsupported> {
        self.rec.add_constr(name, lhs, rel, rhs)
    }

    fn set_objective(&mut self, expr: LinExpr<RecVar>, sense: ObjSense) -> Result<(), Unsupported> {
        self.rec.set_objective(expr, sense)
    }

    fn optimize(&mut self) -> Result<SolveStatus, Unsupported> {
        let customers: Vec<Loc> = self.net.customers().collect();
        let mut best: Option<(f64, Vec<f64>)> = None;

        for plan in enumerate_plans(&customers) {
            let values = match induce_assignment(&self.net, &self.rec, &plan) {
                Some(v) => v,
                None => continue,
            };
            if !self.rec.check_assignment(&values).is_empty() {
                continue;
            }
            let obj = self.rec.objective_at(&values).unwrap_or(0.0);
            if best.as_ref().map_or(true, |(b, _)| obj < *b) {
                best = Some((obj, values));
            }
        }

        match best {
            Some((obj, values)) => {
                self.objective = Some(obj);
                self.values = Some(values);
                Ok(SolveStatus::Optimal)
            }
            None => Ok(SolveStatus::Infeasible),
        }
    }

    fn objective_value(&self) -> Result<f64, Unsupported> {
        self.objective.ok_or(Unsupported("objective_value before optimize"))
    }

    fn var_value(&self, var: &RecVar) -> Result<f64, Unsupported> {
        match &self.values {
            Some(values) => Ok(values[var.0]),
            None => Err(Unsupported("var_value before optimize")),
        }
    }

    fn write_solution(&self, _path: &Path) -> Result<(), Unsupported> {
        Err(Unsupported("write_solution"))
    }

    fn write_infeasibility_certificate(&mut self, _path: &Path) -> Result<(), Unsupported> {
        Err(Unsupported("write_infeasibility_certificate"))
    }
}
