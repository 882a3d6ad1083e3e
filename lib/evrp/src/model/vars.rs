use tracing::*;

use crate::graph::Network;
use crate::solve::{Solver, VarKind};

/// The decision bundle attached to one arc `(i, j)`:
/// `x` is whether some vehicle traverses the arc, `y` the packages aboard
/// while doing so, `z` the elapsed route time (travel plus service) upon
/// arrival at `j`, and `z_dist` the route distance covered by then.
/// The cumulative quantities are forced to zero whenever `x` is zero.
#[derive(Debug, Clone, Copy)]
pub struct ArcVars<V> {
    pub x: V,
    pub y: V,
    pub z: V,
    pub z_dist: V,
}

/// All decision variables of one model instance, indexed by [`crate::graph::ArcId`],
/// plus the fleet-size variable `k`. Created fresh per model and never shared.
#[derive(Debug, Clone)]
pub struct ModelVars<V> {
    pub arcs: Vec<ArcVars<V>>,
    pub fleet_size: V,
}

pub fn create_variables<S: Solver>(net: &Network, solver: &mut S) -> Result<ModelVars<S::Var>, S::Error> {
    let mut arcs = Vec::with_capacity(net.num_arcs());
    for (_, arc) in net.arcs() {
        let x = solver.create_var(&format!("x[{},{}]", arc.from, arc.to), VarKind::Binary, 0.0)?;
        let y = solver.create_var(&format!("y[{},{}]", arc.from, arc.to), VarKind::Integer, 0.0)?;
        let z = solver.create_var(&format!("z[{},{}]", arc.from, arc.to), VarKind::Integer, 0.0)?;
        let z_dist = solver.create_var(&format!("zd[{},{}]", arc.from, arc.to), VarKind::Integer, 0.0)?;
        arcs.push(ArcVars { x, y, z, z_dist });
    }
    let fleet_size = solver.create_var("k", VarKind::Integer, 0.0)?;

    debug!(bundles = arcs.len(), "created decision variables");
    return Ok(ModelVars { arcs, fleet_size });
}
