use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use rayon::prelude::*;
use tracing::*;

use crate::graph::{Network, Params};
use crate::solution::RouteSummary;
use crate::solve::{solve_to_routes, SolveFailure, SolveOptions, Solver};

/// Which scalar a sensitivity sweep varies. Parsed from and displayed with
/// the interface names `Q`, `Dmax`, `Tmax`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SweepParam {
    Capacity,
    MaxDist,
    MaxTime,
}

impl SweepParam {
    pub fn apply(&self, params: &mut Params, value: u32) {
        match self {
            SweepParam::Capacity => params.capacity = value,
            SweepParam::MaxDist => params.max_dist = value,
            SweepParam::MaxTime => params.max_time = value,
        }
    }
}

impl FromStr for SweepParam {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "Q" => Ok(Self::Capacity),
            "Dmax" => Ok(Self::MaxDist),
            "Tmax" => Ok(Self::MaxTime),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}

impl fmt::Display for SweepParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SweepParam::Capacity => "Q",
            SweepParam::MaxDist => "Dmax",
            SweepParam::MaxTime => "Tmax",
        };
        f.write_str(s)
    }
}


/// One sweep trial. An infeasible parameter value keeps its row with no
/// outcome; the batch never aborts because one combination has no solution.
#[derive(Debug, Clone)]
pub struct TrialRow {
    pub value: u32,
    pub outcome: Option<RouteSummary>,
}

/// Solve one model per value of the varied parameter. Each trial owns its
/// params copy and its solver, so trials run in parallel on the rayon pool.
/// Failures other than infeasibility (engine errors, malformed solutions)
/// do abort the sweep.
pub fn run_sweep<S, F>(
    net: &Network,
    base: &Params,
    param: SweepParam,
    values: &[u32],
    make_solver: F,
) -> Result<Vec<TrialRow>>
where
    S: Solver,
    F: Fn() -> Result<S> + Sync,
{
    info!(%param, trials = values.len(), "sweep start");
    values.par_iter()
        .map(|&value| {
            let span = info_span!("trial", %param, value);
            let _g = span.enter();

            let mut params = *base;
            param.apply(&mut params, value);
            let mut solver = make_solver()?;
            match solve_to_routes(net, &params, &mut solver, &SolveOptions::default()) {
                Ok(summary) => {
                    info!(objective = summary.objective, vehicles = summary.num_vehicles, "trial solved");
                    Ok(TrialRow { value, outcome: Some(summary) })
                }
                Err(e) => {
                    if let Some(SolveFailure::Infeasible { .. }) = e.downcast_ref::<SolveFailure>() {
                        info!("trial infeasible");
                        return Ok(TrialRow { value, outcome: None });
                    }
                    Err(e)
                }
            }
        })
        .collect()
}
