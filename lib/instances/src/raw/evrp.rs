/// File-shaped fleet-routing instance data: a header with the scalar
/// parameters, one row per vertex and one row per directed arc.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvrp {
  pub num_customers: usize,
  pub num_arcs: usize,
  pub capacity: u32,
  pub max_dist: u32,
  pub max_time: u32,
  /// `(id, demand, service_time)`, one row per vertex, depot first.
  pub vertices: Vec<(usize, u32, u32)>,
  /// `(from, to, distance, travel_time)`, one row per directed arc.
  pub arcs: Vec<(usize, usize, u32, u32)>,
}
