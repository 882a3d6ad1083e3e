use super::*;
use crate::Map;
use crate::parsers::{ParseInstance, NlFmt};
use crate::raw::evrp::RawEvrp;
use crate::raw::FromRaw;
use lazy_static::lazy_static;

pub type Time = u32;
pub type Dist = u32;
pub type Loc = u16;
pub type Demand = u32;


/// A single-depot fleet-routing scenario. The depot is always vertex 0 and
/// customers are `1..=n`. The arc set is directed and need not be complete;
/// `distance` and `travel_time` are keyed by the same arc set.
#[allow(non_snake_case)]
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct EvrpInstance {
  pub id: String,
  pub n: Loc,
  pub V: Vec<Loc>,
  pub C: Vec<Loc>,
  pub demand: Map<Loc, Demand>,
  pub service_time: Map<Loc, Time>,
  pub distance: Map<(Loc, Loc), Dist>,
  pub travel_time: Map<(Loc, Loc), Time>,
  pub capacity: Demand,
  pub max_dist: Dist,
  pub max_time: Time,
  pub depot: Loc,
}

impl FromRaw<RawEvrp> for EvrpInstance {
  fn from_raw(raw: RawEvrp, id: Cow<str>) -> EvrpInstance {
    let n = raw.num_customers as Loc;
    let locations: Vec<Loc> = (0..=n).collect();
    let customers: Vec<Loc> = (1..=n).collect();

    let demand: Map<_, _> = raw.vertices.iter()
      .map(|&(i, q, _)| (i as Loc, q))
      .collect();
    let service_time: Map<_, _> = raw.vertices.iter()
      .map(|&(i, _, s)| (i as Loc, s))
      .collect();
    let distance: Map<_, _> = raw.arcs.iter()
      .map(|&(i, j, d, _)| ((i as Loc, j as Loc), d))
      .collect();
    let travel_time: Map<_, _> = raw.arcs.iter()
      .map(|&(i, j, _, t)| ((i as Loc, j as Loc), t))
      .collect();

    EvrpInstance {
      id: id.into_owned(),
      n,
      V: locations,
      C: customers,
      demand,
      service_time,
      distance,
      travel_time,
      capacity: raw.capacity,
      max_dist: raw.max_dist,
      max_time: raw.max_time,
      depot: 0,
    }
  }
}

/// Configuration checks on the file-shaped data. Anything caught here is a
/// malformed instance, not a modelling condition: vertex rows must be the
/// depot followed by customers `1..=n` in order, arcs must connect distinct
/// known vertices exactly once, the depot must carry no demand or service,
/// and customer-to-customer legs must take nonzero time.
pub fn validate(raw: &RawEvrp) -> Result<()> {
  let n = raw.num_customers;
  if raw.vertices.len() != n + 1 {
    anyhow::bail!("expected {} vertex rows, found {}", n + 1, raw.vertices.len());
  }
  for (k, &(id, demand, service_time)) in raw.vertices.iter().enumerate() {
    if id != k {
      anyhow::bail!("vertex rows out of order: row {} has id {}", k, id);
    }
    if id == 0 && (demand != 0 || service_time != 0) {
      anyhow::bail!("depot must have zero demand and service time");
    }
  }

  let mut seen = fnv::FnvHashSet::default();
  for &(from, to, _, travel_time) in &raw.arcs {
    if from > n || to > n {
      anyhow::bail!("arc ({}, {}) references an unknown vertex", from, to);
    }
    if from == to {
      anyhow::bail!("self-loop arc at vertex {}", from);
    }
    if !seen.insert((from, to)) {
      anyhow::bail!("duplicate arc ({}, {})", from, to);
    }
    if from != 0 && to != 0 && travel_time == 0 {
      anyhow::bail!("arc ({}, {}) has zero travel time", from, to);
    }
  }
  Ok(())
}

/// Relax the range limit so only capacity and duration bind; the sum of all
/// arc distances bounds any route, so this never cuts a solution.
pub fn uncap_range(mut data: EvrpInstance) -> EvrpInstance {
  data.max_dist = data.distance.values().sum();
  data
}

pub enum EvrpNl {}

impl Dataset for StdLayout<EvrpNl> {
  type Instance = EvrpInstance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    let instance = self.index_to_name(idx)?.into_owned();
    let path = self.instance_path(idx)?;
    let raw = RawEvrp::parse(NlFmt(&path)).context(format!("failed to load {:?}", path))?;
    validate(&raw).context(format!("malformed instance {:?}", path))?;
    Ok(EvrpInstance::from_raw(raw, Cow::Owned(instance)))
  }
}

use crate::modify::{Mapped, DSetModify};

lazy_static!{
    pub static ref DSET: StdLayout<EvrpNl> = {
        pretty_unwrap(StdLayout::new("EVRP", "txt"))
    };

    pub static ref DSET_UNCAPPED: Mapped<&'static StdLayout<EvrpNl>, fn(EvrpInstance) -> EvrpInstance> = {
      (&*DSET).map(uncap_range)
    };
}
