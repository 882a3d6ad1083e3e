pub use instances::dataset::evrp::{
  Time,
  Dist,
  Loc,
  Demand,
  uncap_range,
};

pub type EvrpInstance = instances::dataset::evrp::EvrpInstance;

pub trait EvrpInstanceExt {
  fn is_customer(&self, i: Loc) -> bool;
  fn num_vertices(&self) -> usize;
  fn num_arcs(&self) -> usize;
}

impl EvrpInstanceExt for EvrpInstance {
    #[inline]
    fn is_customer(&self, i: Loc) -> bool {
        return 0 < i && i <= self.n;
    }

    #[inline]
    fn num_vertices(&self) -> usize {
        return self.n as usize + 1;
    }

    #[inline]
    fn num_arcs(&self) -> usize {
        return self.distance.len();
    }
}
