use tracing::*;

use crate::*;
use crate::graph::{Network, Params};
use crate::solve::{LinExpr, ObjSense, Solver};

pub mod constraints;
pub mod vars;

pub use vars::{ArcVars, ModelVars};

define_u32_id_type!(ModelId);

/// Total distance over used arcs; the quantity being minimized.
pub fn objective<V: Copy>(net: &Network, vars: &ModelVars<V>) -> LinExpr<V> {
    let mut expr = LinExpr::with_capacity(net.num_arcs());
    for (a, arc) in net.arcs() {
        expr.add_term(arc.distance as f64, vars.arcs[a].x);
    }
    return expr;
}

/// Emit a complete model instance through the solver interface: variables,
/// then constraints, then the objective. The graph and parameters are read
/// only; all created state lives behind the returned handles.
pub fn build_model<S: Solver>(
    net: &Network,
    params: &Params,
    solver: &mut S,
) -> Result<ModelVars<S::Var>, S::Error> {
    let model_id = ModelId::new();
    let span = debug_span!(
        "build_model",
        id = model_id.raw(),
        vertices = net.num_vertices(),
        arcs = net.num_arcs()
    );
    let _g = span.enter();

    let vars = vars::create_variables(net, solver)?;
    constraints::add_constraints(net, params, &vars, solver)?;
    solver.set_objective(objective(net, &vars), ObjSense::Minimize)?;

    debug!("model emitted");
    return Ok(vars);
}
