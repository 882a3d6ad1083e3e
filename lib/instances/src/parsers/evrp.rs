use std::path::Path;
use crate::Result;
use crate::raw::evrp::*;
use super::{
  ParseInstance,
  nom_prelude::*
};

/// The `.txt` instance layout: a header line
/// `NUM_CUSTOMERS NUM_ARCS CAPACITY MAX_DIST MAX_TIME`, followed by
/// `NUM_CUSTOMERS + 1` vertex lines `ID DEMAND SERVICE_TIME` (depot first)
/// and `NUM_ARCS` arc lines `FROM TO DISTANCE TRAVEL_TIME`.
#[derive(Debug, Copy, Clone)]
pub struct NlFmt<P>(pub P);

impl<P: AsRef<Path>> ParseInstance<NlFmt<P>> for RawEvrp {
  fn parse(path: NlFmt<P>) -> Result<RawEvrp> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path)?;
    match parsers::evrp(&data).finish() {
      Ok((_, instance)) => Ok(instance),
      Err(e) => Err(
        anyhow::Error::msg(e.to_string())
      ),
    }
  }
}


mod parsers {
  use super::*;
  use crate::parsers::{
    common::*
  };

  pub fn evrp(input: &str) -> IResult<&str, RawEvrp, error::VerboseError<&str>> {
    let usize_space = |i| terminated(usize_, space1)(i);
    let u32_space = |i| terminated(u32_, space1)(i);
    let u32_eol = |i| terminated(u32_, pair(space0, line_ending))(i);

    let (mut input, (num_customers, num_arcs, capacity, max_dist, max_time)) =
      tuple((usize_space, usize_space, u32_space, u32_space, u32_eol))(input)?;

    //  1 2 4
    let mut parse_vertex_line = preceded(space0, tuple((
      usize_space, // ID
      u32_space,   // demand
      u32_eol,     // service time
    )));

    let mut vertices = Vec::with_capacity(num_customers + 1);
    for _ in 0..num_customers + 1 {
      let (i, row) = parse_vertex_line(input)?;
      input = i;
      vertices.push(row);
    }

    //  0 1 5 6
    let mut parse_arc_line = preceded(space0, tuple((
      usize_space, // from
      usize_space, // to
      u32_space,   // distance
      u32_eol,     // travel time
    )));

    let mut arcs = Vec::with_capacity(num_arcs);
    for _ in 0..num_arcs {
      let (i, row) = parse_arc_line(input)?;
      input = i;
      arcs.push(row);
    }

    let (input, _) = terminated(multispace0, eof)(input)?;

    Ok((input, RawEvrp {
      num_customers,
      num_arcs,
      capacity,
      max_dist,
      max_time,
      vertices,
      arcs,
    }))
  }
}
