use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::*;

use crate::data::evrp::*;
use crate::Set;

const UNREACHED: u64 = u64::MAX;

/// Single-source shortest potentials over an arbitrary weighted arc list.
/// Unreached vertices stay at `UNREACHED`.
fn shortest_potentials(n: usize, arcs: &[(usize, usize, u64)], src: usize) -> Vec<u64> {
    let mut adj = vec![Vec::new(); n];
    for &(i, j, w) in arcs {
        adj[i].push((j, w));
    }

    let mut dist = vec![UNREACHED; n];
    let mut heap = BinaryHeap::new();
    dist[src] = 0;
    heap.push(Reverse((0u64, src)));
    while let Some(Reverse((d, i))) = heap.pop() {
        if d > dist[i] {
            continue;
        }
        for &(j, w) in &adj[i] {
            let nd = d + w;
            if nd < dist[j] {
                dist[j] = nd;
                heap.push(Reverse((nd, j)));
            }
        }
    }
    return dist;
}

struct Potentials {
    dist_from: Vec<u64>,
    dist_to: Vec<u64>,
    time_from: Vec<u64>,
    time_to: Vec<u64>,
}

/// Cheapest way to reach each vertex from the depot and to return from it,
/// in plain distance and in elapsed time (travel plus service of the vertex
/// being departed). These are exact lower bounds on any route through the
/// vertex, whatever detours the arc set forces.
fn depot_potentials(data: &EvrpInstance) -> Potentials {
    let n = data.num_vertices();

    let fwd_dist: Vec<_> = data.distance.iter()
        .map(|(&(i, j), &d)| (i as usize, j as usize, d as u64))
        .collect();
    let rev_dist: Vec<_> = data.distance.iter()
        .map(|(&(i, j), &d)| (j as usize, i as usize, d as u64))
        .collect();
    let time_weight = |i: Loc, j: Loc| {
        (data.travel_time[&(i, j)] + data.service_time[&i]) as u64
    };
    let fwd_time: Vec<_> = data.travel_time.keys()
        .map(|&(i, j)| (i as usize, j as usize, time_weight(i, j)))
        .collect();
    let rev_time: Vec<_> = data.travel_time.keys()
        .map(|&(i, j)| (j as usize, i as usize, time_weight(i, j)))
        .collect();

    return Potentials {
        dist_from: shortest_potentials(n, &fwd_dist, 0),
        dist_to: shortest_potentials(n, &rev_dist, 0),
        time_from: shortest_potentials(n, &fwd_time, 0),
        time_to: shortest_potentials(n, &rev_time, 0),
    };
}

/// Drop customer-to-customer arcs no feasible route can use: the pair's
/// demand already exceeds capacity, or the cheapest depot-to-depot journey
/// through the arc breaks the range or duration limit.
fn remove_arcs(data: &mut EvrpInstance) {
    let parent_span = span!(Level::DEBUG, "remove_arcs");
    let _g = parent_span.enter();

    let pot = depot_potentials(data);

    let illegal_arcs: Set<(Loc, Loc)> = data.distance.iter()
        .filter_map(|(&(i, j), &d)| {
            if i == 0 || j == 0 {
                return None;
            }
            if data.demand[&i] as u64 + data.demand[&j] as u64 > data.capacity as u64 {
                trace!(i, j, "pairwise demand over capacity");
                return Some((i, j));
            }
            let best_dist = pot.dist_from[i as usize]
                .saturating_add(d as u64)
                .saturating_add(pot.dist_to[j as usize]);
            if best_dist > data.max_dist as u64 {
                trace!(i, j, best_dist, "best round trip over range limit");
                return Some((i, j));
            }
            let leg = (data.travel_time[&(i, j)] + data.service_time[&i]) as u64;
            let best_time = pot.time_from[i as usize]
                .saturating_add(leg)
                .saturating_add(pot.time_to[j as usize]);
            if best_time > data.max_time as u64 {
                trace!(i, j, best_time, "best round trip over duration limit");
                return Some((i, j));
            }
            return None;
        })
        .collect();

    let num_arcs_initial = data.distance.len();
    for arc in illegal_arcs.iter() {
        trace!(?arc, "removed");
        data.distance.remove(arc);
        data.travel_time.remove(arc);
    }
    debug!("Removed {} arcs, {} remaining", num_arcs_initial - data.distance.len(), data.distance.len());
}

/// Customers no single vehicle can serve: demand over capacity, or the
/// cheapest depot round trip through them over a limit. A non-empty result
/// means the scenario is infeasible before any model is built.
pub fn unreachable_customers(data: &EvrpInstance) -> Vec<Loc> {
    let pot = depot_potentials(data);
    let mut unreachable = Vec::new();
    for &i in &data.C {
        let round_dist = pot.dist_from[i as usize].saturating_add(pot.dist_to[i as usize]);
        let round_time = pot.time_from[i as usize].saturating_add(pot.time_to[i as usize]);
        if data.demand[&i] > data.capacity
            || round_dist > data.max_dist as u64
            || round_time > data.max_time as u64
        {
            unreachable.push(i);
        }
    }
    return unreachable;
}


pub fn preprocess(data: &mut EvrpInstance) {
    let s = span!(Level::DEBUG, "preprocess", data_id=?data.id);
    let _g = s.enter();
    remove_arcs(data);
}
