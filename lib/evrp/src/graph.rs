use anyhow::{bail, Result};

use crate::data::evrp::*;

pub const DEPOT: Loc = 0;

/// Stable index of an arc in [`Network::arcs`]; every per-arc quantity
/// (variable bundles, usage flags) is addressed by it.
pub type ArcId = usize;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Vertex {
  pub id: Loc,
  pub demand: Demand,
  pub service_time: Time,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Arc {
  pub from: Loc,
  pub to: Loc,
  pub distance: Dist,
  pub travel_time: Time,
}

/// The static routing graph: vertices and directed arcs stored once, with
/// out/in adjacency per vertex. Vertex 0 is the depot. Arcs are sorted by
/// `(from, to)` so indices are reproducible across runs.
#[derive(Debug, Clone)]
pub struct Network {
  vertices: Vec<Vertex>,
  arcs: Vec<Arc>,
  arcs_out: Vec<Vec<ArcId>>,
  arcs_in: Vec<Vec<ArcId>>,
}

impl Network {
  pub fn from_instance(data: &EvrpInstance) -> Result<Network> {
    let nv = data.num_vertices();

    let mut vertices = Vec::with_capacity(nv);
    for &i in &data.V {
      let demand = match data.demand.get(&i) {
        Some(&q) => q,
        None => bail!("vertex {} has no demand entry", i),
      };
      let service_time = match data.service_time.get(&i) {
        Some(&s) => s,
        None => bail!("vertex {} has no service time entry", i),
      };
      vertices.push(Vertex { id: i, demand, service_time });
    }

    let mut arc_keys: Vec<(Loc, Loc)> = data.distance.keys().cloned().collect();
    arc_keys.sort_unstable();

    let mut arcs = Vec::with_capacity(arc_keys.len());
    let mut arcs_out = vec![Vec::new(); nv];
    let mut arcs_in = vec![Vec::new(); nv];

    for (i, j) in arc_keys {
      if i == j {
        bail!("self-loop arc at vertex {}", i);
      }
      if i as usize >= nv || j as usize >= nv {
        bail!("arc ({}, {}) references an unknown vertex", i, j);
      }
      let travel_time = match data.travel_time.get(&(i, j)) {
        Some(&t) => t,
        None => bail!("arc ({}, {}) has a distance but no travel time", i, j),
      };
      let a: ArcId = arcs.len();
      arcs.push(Arc { from: i, to: j, distance: data.distance[&(i, j)], travel_time });
      arcs_out[i as usize].push(a);
      arcs_in[j as usize].push(a);
    }

    return Ok(Network { vertices, arcs, arcs_out, arcs_in });
  }

  #[inline]
  pub fn num_vertices(&self) -> usize { self.vertices.len() }

  #[inline]
  pub fn num_arcs(&self) -> usize { self.arcs.len() }

  #[inline]
  pub fn vertex(&self, i: Loc) -> &Vertex { &self.vertices[i as usize] }

  #[inline]
  pub fn arc(&self, a: ArcId) -> &Arc { &self.arcs[a] }

  pub fn arcs(&self) -> impl Iterator<Item=(ArcId, &Arc)> + '_ {
    self.arcs.iter().enumerate()
  }

  #[inline]
  pub fn arcs_out(&self, i: Loc) -> &[ArcId] { &self.arcs_out[i as usize] }

  #[inline]
  pub fn arcs_in(&self, i: Loc) -> &[ArcId] { &self.arcs_in[i as usize] }

  /// All vertices except the depot.
  pub fn customers(&self) -> impl Iterator<Item=Loc> + '_ {
    self.vertices[1..].iter().map(|v| v.id)
  }

  pub fn find_arc(&self, i: Loc, j: Loc) -> Option<ArcId> {
    self.arcs_out(i).iter().cloned().find(|&a| self.arcs[a].to == j)
  }
}


/// The per-scenario resource limits. A sweep overrides exactly one field
/// between solves; the graph itself is never touched.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Params {
  pub capacity: Demand,
  pub max_dist: Dist,
  pub max_time: Time,
}

impl Params {
  pub fn of_instance(data: &EvrpInstance) -> Params {
    return Params {
      capacity: data.capacity,
      max_dist: data.max_dist,
      max_time: data.max_time,
    };
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::get_evrp_instance_by_name;

  #[test]
  fn build_nl_2() -> Result<()> {
    let data = get_evrp_instance_by_name("nl-2")?;
    let net = Network::from_instance(&data)?;
    assert_eq!(net.num_vertices(), 3);
    assert_eq!(net.num_arcs(), 6);
    assert_eq!(net.arcs_out(DEPOT).len(), 2);
    assert_eq!(net.arcs_in(DEPOT).len(), 2);
    assert_eq!(net.customers().collect::<Vec<_>>(), vec![1, 2]);

    let a = net.find_arc(1, 2).unwrap();
    assert_eq!(net.arc(a).distance, 3);
    assert_eq!(net.arc(a).travel_time, 4);
    assert!(net.find_arc(1, 1).is_none());
    return Ok(());
  }

  #[test]
  fn arc_order_is_stable() -> Result<()> {
    let data = get_evrp_instance_by_name("nl-5")?;
    let n1 = Network::from_instance(&data)?;
    let n2 = Network::from_instance(&data)?;
    let order1: Vec<_> = n1.arcs().map(|(_, a)| (a.from, a.to)).collect();
    let order2: Vec<_> = n2.arcs().map(|(_, a)| (a.from, a.to)).collect();
    assert_eq!(order1, order2);
    let mut sorted = order1.clone();
    sorted.sort_unstable();
    assert_eq!(order1, sorted);
    return Ok(());
  }

  #[test]
  fn params_of_instance() -> Result<()> {
    let data = get_evrp_instance_by_name("nl-2")?;
    let params = Params::of_instance(&data);
    assert_eq!(params.capacity, 5);
    assert_eq!(params.max_dist, 1000);
    assert_eq!(params.max_time, 1000);
    return Ok(());
  }
}
