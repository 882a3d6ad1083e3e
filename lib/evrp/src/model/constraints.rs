use tracing::*;

use crate::graph::{Arc, Network, Params, DEPOT};
use crate::solve::{LinExpr, Relation, Solver};
use super::vars::{ArcVars, ModelVars};

/// Emit every constraint family over the variable bundles. Constraints are
/// generated for existing arcs only; an absent arc contributes no variable
/// and no row. The emission order is fixed: visitation structure first,
/// then the load family, then the two cumulative-resource families.
pub fn add_constraints<S: Solver>(
    net: &Network,
    params: &Params,
    vars: &ModelVars<S::Var>,
    solver: &mut S,
) -> Result<(), S::Error> {
    customer_degrees(net, vars, solver)?;
    depot_degrees(net, vars, solver)?;
    package_flow(net, params, vars, solver)?;

    // elapsed time accumulates travel plus the service of the vertex
    // being departed; the depot has no service
    cumulative_resource(
        net,
        vars,
        solver,
        "t",
        params.max_time as f64,
        |arc: &Arc| (arc.travel_time + net.vertex(arc.from).service_time) as f64,
        |av| av.z,
    )?;

    // covered distance mirrors the time family with plain arc lengths,
    // which is what caps a route at the vehicle range
    cumulative_resource(
        net,
        vars,
        solver,
        "d",
        params.max_dist as f64,
        |arc: &Arc| arc.distance as f64,
        |av| av.z_dist,
    )?;

    return Ok(());
}

/// Exactly one used arc into and one used arc out of every customer.
fn customer_degrees<S: Solver>(
    net: &Network,
    vars: &ModelVars<S::Var>,
    solver: &mut S,
) -> Result<(), S::Error> {
    let mut emitted = 0usize;
    for j in net.customers() {
        let mut lhs = LinExpr::with_capacity(net.arcs_in(j).len());
        for &a in net.arcs_in(j) {
            lhs.add_term(1.0, vars.arcs[a].x);
        }
        solver.add_constr(&format!("indeg[{}]", j), lhs, Relation::Eq, 1.0)?;
        emitted += 1;
    }
    for i in net.customers() {
        let mut lhs = LinExpr::with_capacity(net.arcs_out(i).len());
        for &a in net.arcs_out(i) {
            lhs.add_term(1.0, vars.arcs[a].x);
        }
        solver.add_constr(&format!("outdeg[{}]", i), lhs, Relation::Eq, 1.0)?;
        emitted += 1;
    }
    debug!(emitted, "customer degree constraints");
    return Ok(());
}

/// As many used arcs leave the depot as return to it, and that count is the
/// fleet size `k`. `k` is not fixed anywhere, so the engine is free to pick
/// the smallest dispatch count the rest of the model admits.
fn depot_degrees<S: Solver>(
    net: &Network,
    vars: &ModelVars<S::Var>,
    solver: &mut S,
) -> Result<(), S::Error> {
    let mut out = LinExpr::with_capacity(net.arcs_out(DEPOT).len() + 1);
    for &a in net.arcs_out(DEPOT) {
        out.add_term(1.0, vars.arcs[a].x);
    }
    out.add_term(-1.0, vars.fleet_size);
    solver.add_constr("depot_out", out, Relation::Eq, 0.0)?;

    let mut inn = LinExpr::with_capacity(net.arcs_in(DEPOT).len() + 1);
    for &a in net.arcs_in(DEPOT) {
        inn.add_term(1.0, vars.arcs[a].x);
    }
    inn.add_term(-1.0, vars.fleet_size);
    solver.add_constr("depot_in", inn, Relation::Eq, 0.0)?;

    debug!("depot degree constraints tied to fleet size");
    return Ok(());
}

/// Single-commodity package flow: the load aboard is capped by capacity on
/// used arcs and forced to zero on unused ones, and the net load change
/// across a customer equals its demand. Together with the degree families
/// this is what rules out capacity-violating routes and, because an isolated
/// cycle cannot carry depot-originated flow, most subtours.
fn package_flow<S: Solver>(
    net: &Network,
    params: &Params,
    vars: &ModelVars<S::Var>,
    solver: &mut S,
) -> Result<(), S::Error> {
    let mut emitted = 0usize;
    for (a, arc) in net.arcs() {
        let mut lhs = LinExpr::with_capacity(2);
        lhs.add_term(1.0, vars.arcs[a].y);
        lhs.add_term(-(params.capacity as f64), vars.arcs[a].x);
        solver.add_constr(&format!("load_cap[{},{}]", arc.from, arc.to), lhs, Relation::Le, 0.0)?;
        emitted += 1;
    }
    for i in net.customers() {
        let mut lhs = LinExpr::new();
        for &a in net.arcs_out(i) {
            lhs.add_term(1.0, vars.arcs[a].y);
        }
        for &a in net.arcs_in(i) {
            lhs.add_term(-1.0, vars.arcs[a].y);
        }
        let demand = net.vertex(i).demand as f64;
        solver.add_constr(&format!("load_flow[{}]", i), lhs, Relation::Eq, demand)?;
        emitted += 1;
    }
    debug!(emitted, "package flow constraints");
    return Ok(());
}

/// One cumulative resource (time or distance) over the arc-usage skeleton.
/// `gain` is what a vehicle accrues by taking an arc out of its tail vertex.
/// Four families pin the cumulative variable to the true running total along
/// any route the degree constraints admit:
/// conservation across each customer, a cap tying it to zero on unused arcs
/// and to the route limit on used ones, a lower bound of one leg's gain on
/// arcs leaving a customer, and the exact first-leg value on arcs leaving
/// the depot.
fn cumulative_resource<S: Solver>(
    net: &Network,
    vars: &ModelVars<S::Var>,
    solver: &mut S,
    tag: &str,
    cap: f64,
    gain: impl Fn(&Arc) -> f64,
    pick: impl Fn(&ArcVars<S::Var>) -> S::Var,
) -> Result<(), S::Error> {
    let mut emitted = 0usize;

    for i in net.customers() {
        let mut lhs = LinExpr::new();
        for &a in net.arcs_out(i) {
            lhs.add_term(1.0, pick(&vars.arcs[a]));
            lhs.add_term(-gain(net.arc(a)), vars.arcs[a].x);
        }
        for &a in net.arcs_in(i) {
            lhs.add_term(-1.0, pick(&vars.arcs[a]));
        }
        solver.add_constr(&format!("{}_flow[{}]", tag, i), lhs, Relation::Eq, 0.0)?;
        emitted += 1;
    }

    for (a, arc) in net.arcs() {
        let mut lhs = LinExpr::with_capacity(2);
        lhs.add_term(1.0, pick(&vars.arcs[a]));
        lhs.add_term(-cap, vars.arcs[a].x);
        solver.add_constr(&format!("{}_cap[{},{}]", tag, arc.from, arc.to), lhs, Relation::Le, 0.0)?;
        emitted += 1;
    }

    for (a, arc) in net.arcs() {
        if arc.from == DEPOT {
            continue;
        }
        let mut lhs = LinExpr::with_capacity(2);
        lhs.add_term(1.0, pick(&vars.arcs[a]));
        lhs.add_term(-gain(arc), vars.arcs[a].x);
        solver.add_constr(&format!("{}_min[{},{}]", tag, arc.from, arc.to), lhs, Relation::Ge, 0.0)?;
        emitted += 1;
    }

    for &a in net.arcs_out(DEPOT) {
        let arc = net.arc(a);
        let mut lhs = LinExpr::with_capacity(2);
        lhs.add_term(1.0, pick(&vars.arcs[a]));
        lhs.add_term(-gain(arc), vars.arcs[a].x);
        solver.add_constr(&format!("{}_init[{},{}]", tag, arc.from, arc.to), lhs, Relation::Eq, 0.0)?;
        emitted += 1;
    }

    debug!(tag, emitted, "cumulative resource constraints");
    return Ok(());
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::get_evrp_instance_by_name;
    use crate::init_test_logging;
    use crate::model;
    use crate::solve::recorder::ModelRecorder;
    use crate::test_harness::{induce_assignment, routes_from_mask, Plan};
    use anyhow::Result;
    use proptest::prelude::*;

    fn recorded_nl2(params: Option<Params>) -> Result<(Network, ModelRecorder)> {
        let data = get_evrp_instance_by_name("nl-2")?;
        let net = Network::from_instance(&data)?;
        let params = params.unwrap_or_else(|| Params::of_instance(&data));
        let mut rec = ModelRecorder::new();
        model::build_model(&net, &params, &mut rec)?;
        Ok((net, rec))
    }

    #[test]
    fn family_counts() -> Result<()> {
        init_test_logging(None::<&str>);
        let (_, rec) = recorded_nl2(None)?;
        let stats = rec.stats();
        assert_eq!(stats.num_vars, 25);
        assert_eq!(stats.num_binary, 6);
        assert_eq!(stats.num_integer, 19);

        let families: crate::Map<&str, usize> = stats.families.iter()
            .map(|(k, n)| (k.as_str(), *n))
            .collect();
        assert_eq!(families["indeg"], 2);
        assert_eq!(families["outdeg"], 2);
        assert_eq!(families["depot_out"], 1);
        assert_eq!(families["depot_in"], 1);
        assert_eq!(families["load_cap"], 6);
        assert_eq!(families["load_flow"], 2);
        for tag in &["t", "d"] {
            assert_eq!(families[format!("{}_flow", tag).as_str()], 2);
            assert_eq!(families[format!("{}_cap", tag).as_str()], 6);
            assert_eq!(families[format!("{}_min", tag).as_str()], 4);
            assert_eq!(families[format!("{}_init", tag).as_str()], 2);
        }
        assert_eq!(stats.num_constrs, 6 + 6 + 2 + 14 + 14);
        return Ok(());
    }

    #[test]
    fn single_route_assignment_is_feasible() -> Result<()> {
        let (net, rec) = recorded_nl2(None)?;
        let plan: Plan = vec![vec![1, 2]];
        let values = induce_assignment(&net, &rec, &plan).unwrap();
        let violations = rec.check_assignment(&values);
        assert!(violations.is_empty(), "unexpected violations: {:?}", violations);
        assert_eq!(rec.objective_at(&values), Some(15.0));
        return Ok(());
    }

    #[test]
    fn over_capacity_route_is_cut() -> Result<()> {
        let data = get_evrp_instance_by_name("nl-2")?;
        let params = Params { capacity: 4, ..Params::of_instance(&data) };
        let (net, rec) = recorded_nl2(Some(params))?;
        // both customers on one vehicle carries 5 packages
        let values = induce_assignment(&net, &rec, &vec![vec![1, 2]]).unwrap();
        assert!(!rec.check_assignment(&values).is_empty());
        // split across two vehicles each route fits
        let values = induce_assignment(&net, &rec, &vec![vec![1], vec![2]]).unwrap();
        assert!(rec.check_assignment(&values).is_empty());
        return Ok(());
    }

    #[test]
    fn unused_arcs_carry_no_load() -> Result<()> {
        let (net, rec) = recorded_nl2(None)?;
        let plan: Plan = vec![vec![1], vec![2]];
        let mut values = induce_assignment(&net, &rec, &plan).unwrap();
        assert!(rec.check_assignment(&values).is_empty());

        // pushing load onto an unused arc must violate its linkage row
        let lookup = rec.name_lookup();
        values[lookup["y[1,2]"].0] = 1.0;
        assert!(!rec.check_assignment(&values).is_empty());
        return Ok(());
    }

    fn route_limits_ok(net: &Network, params: &Params, route: &[u16]) -> bool {
        let mut demand = 0u32;
        let mut time = 0u32;
        let mut dist = 0u32;
        let mut prev = DEPOT;
        for &c in route.iter().chain(std::iter::once(&DEPOT)) {
            let a = net.find_arc(prev, c).unwrap();
            time += net.arc(a).travel_time + net.vertex(prev).service_time;
            dist += net.arc(a).distance;
            prev = c;
            demand += net.vertex(c).demand;
        }
        demand <= params.capacity && time <= params.max_time && dist <= params.max_dist
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]
        /// On a complete graph, the model accepts a plan's induced assignment
        /// exactly when every route respects capacity, duration and range.
        #[test]
        fn plan_feasibility_matches_route_limits(
            perm in Just(vec![1u16, 2, 3, 4, 5]).prop_shuffle(),
            mask in 0u32..16,
        ) {
            let data = get_evrp_instance_by_name("nl-5").unwrap();
            let net = Network::from_instance(&data).unwrap();
            let params = Params::of_instance(&data);
            let mut rec = ModelRecorder::new();
            model::build_model(&net, &params, &mut rec).unwrap();

            let plan = routes_from_mask(&perm, mask);
            let values = induce_assignment(&net, &rec, &plan).unwrap();
            let feasible = rec.check_assignment(&values).is_empty();
            let expected = plan.iter().all(|r| route_limits_ok(&net, &params, r));
            prop_assert_eq!(feasible, expected);
        }

        /// A pair of zero-demand customers exchanging packages in a cycle away
        /// from the depot balances the load family on its own, but with
        /// positive travel times no valuation of the cumulative variables can
        /// balance the time family around the cycle.
        #[test]
        fn depot_disjoint_cycle_is_infeasible(z14 in 0u32..40, z41 in 0u32..40, d14 in 0u32..30, d41 in 0u32..30) {
            let mut data = get_evrp_instance_by_name("nl-5").unwrap();
            data.demand.insert(1, 0);
            data.demand.insert(4, 0);
            let net = Network::from_instance(&data).unwrap();
            let params = Params::of_instance(&data);
            let mut rec = ModelRecorder::new();
            model::build_model(&net, &params, &mut rec).unwrap();

            // serve the remaining demand legitimately, then close 1 and 4
            // into a two-cycle that never touches the depot
            let mut values = induce_assignment(&net, &rec, &vec![vec![2, 3, 5]]).unwrap();
            let lookup = rec.name_lookup();
            values[lookup["x[1,4]"].0] = 1.0;
            values[lookup["x[4,1]"].0] = 1.0;
            values[lookup["z[1,4]"].0] = z14 as f64;
            values[lookup["z[4,1]"].0] = z41 as f64;
            values[lookup["zd[1,4]"].0] = d14 as f64;
            values[lookup["zd[4,1]"].0] = d41 as f64;

            prop_assert!(!rec.check_assignment(&values).is_empty());
        }
    }
}
