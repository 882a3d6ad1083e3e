use rayon::ThreadPoolBuilder;
use std::str::FromStr;
use anyhow::Result;
use tracing::*;

use evrp::*;
use evrp::data::get_evrp_instance_by_index;
use evrp::graph::{Network, Params};
use evrp::model;
use evrp::preprocessing;
use evrp::solve::recorder::{ModelRecorder, ModelStats};
use evrp::sweep::SweepParam;

mod common;
use common::*;

use structopt::StructOpt;

#[derive(Debug, Copy, Clone)]
enum RunMode {
    Model,
    Solve,
    Sweep,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "model" => Ok(Self::Model),
            "solve" => Ok(Self::Solve),
            "sweep" => Ok(Self::Sweep),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}


#[derive(Debug, StructOpt)]
struct ClArgs {
    #[structopt(parse(try_from_str))]
    mode: RunMode,
    #[structopt()]
    index: usize,
    #[structopt(long, short="c", default_value="1", validator=clap_range_validator(Some(1), None))]
    cpus: usize,
    #[structopt(long="no-preprocess", parse(from_flag=std::ops::Not::not))]
    preprocess: bool,
    /// Parameter a sweep varies: Q, Dmax or Tmax.
    #[structopt(long, parse(try_from_str))]
    param: Option<SweepParam>,
    /// Comma-separated values the swept parameter takes.
    #[structopt(long, use_delimiter = true)]
    values: Vec<u32>,
    /// Solver-side wall clock limit in seconds.
    #[structopt(long)]
    time_limit: Option<f64>,
    #[structopt(flatten)]
    output: OutputOptions,
}


struct ModelReport {
    instance: String,
    vertices: usize,
    arcs: usize,
    stats: ModelStats,
}

impl RunReport for ModelReport {
    fn write_json(&self, mut buf: impl std::io::Write) -> Result<()> {
        let mut families = json::JsonValue::new_object();
        for (name, count) in &self.stats.families {
            families[name.as_str()] = (*count).into();
        }
        let root = json::object! {
            instance: self.instance.as_str(),
            vertices: self.vertices,
            arcs: self.arcs,
            variables: self.stats.num_vars,
            binary: self.stats.num_binary,
            integer: self.stats.num_integer,
            constraints: self.stats.num_constrs,
            families: families,
        };
        root.write_pretty(&mut buf, 2)?;
        return Ok(())
    }

    fn write_json_summary(&self, mut buf: impl std::io::Write) -> Result<()> {
        let root = json::object! {
            instance: self.instance.as_str(),
            variables: self.stats.num_vars,
            constraints: self.stats.num_constrs,
        };
        root.write_pretty(&mut buf, 2)?;
        return Ok(())
    }
}

fn model_mode(args: &ClArgs, instance: &str, net: &Network, params: &Params) -> Result<()> {
    let mut rec = ModelRecorder::new();
    model::build_model(net, params, &mut rec)?;
    let report = ModelReport {
        instance: instance.to_string(),
        vertices: net.num_vertices(),
        arcs: net.num_arcs(),
        stats: rec.stats(),
    };
    output_report(&args.output, report)
}


#[cfg(feature = "gurobi")]
mod solving {
    use super::*;
    use evrp::solution::RouteSummary;
    use evrp::solve::gurobi::GurobiSolver;
    use evrp::solve::{solve_to_routes, SolveOptions};
    use evrp::sweep::{run_sweep, TrialRow};

    pub struct SolveReport {
        pub instance: String,
        pub summary: RouteSummary,
    }

    fn summary_record(summary: &RouteSummary, with_routes: bool) -> json::JsonValue {
        let mut rec = json::object! {
            objective: summary.objective,
            vehicles: summary.num_vehicles,
            total_dist: summary.total_dist,
            total_time: summary.total_time,
        };
        if with_routes {
            let routes: Vec<json::JsonValue> = summary.routes.iter()
                .map(|r| json::JsonValue::from(r.clone()))
                .collect();
            rec["routes"] = routes.into();
        }
        return rec;
    }

    impl RunReport for SolveReport {
        fn write_json(&self, mut buf: impl std::io::Write) -> Result<()> {
            let mut root = summary_record(&self.summary, true);
            root["instance"] = self.instance.as_str().into();
            root.write_pretty(&mut buf, 2)?;
            return Ok(())
        }

        fn write_json_summary(&self, mut buf: impl std::io::Write) -> Result<()> {
            let mut root = summary_record(&self.summary, false);
            root["instance"] = self.instance.as_str().into();
            root.write_pretty(&mut buf, 2)?;
            return Ok(())
        }
    }

    pub struct SweepReport {
        pub param: SweepParam,
        pub rows: Vec<TrialRow>,
    }

    impl RunReport for SweepReport {
        fn write_json(&self, buf: impl std::io::Write) -> Result<()> {
            self.write_rows(buf, true)
        }

        fn write_json_summary(&self, buf: impl std::io::Write) -> Result<()> {
            self.write_rows(buf, false)
        }
    }

    impl SweepReport {
        fn write_rows(&self, mut buf: impl std::io::Write, with_routes: bool) -> Result<()> {
            let rows: Vec<json::JsonValue> = self.rows.iter()
                .map(|row| {
                    let mut rec = match &row.outcome {
                        Some(summary) => summary_record(summary, with_routes),
                        None => json::JsonValue::new_object(),
                    };
                    rec["param"] = self.param.to_string().into();
                    rec["value"] = row.value.into();
                    return rec;
                })
                .collect();
            json::JsonValue::from(rows).write_pretty(&mut buf, 2)?;
            return Ok(())
        }
    }

    pub fn solve_mode(args: &ClArgs, instance: &str, net: &Network, params: &Params) -> Result<()> {
        let mut solver = GurobiSolver::new(instance)?;
        if let Some(seconds) = args.time_limit {
            solver.set_time_limit(seconds)?;
        }
        let opts = SolveOptions {
            solution_file: Some("solution.sol".into()),
            certificate_file: Some("infeasible_model.ilp".into()),
        };
        let summary = solve_to_routes(net, params, &mut solver, &opts)?;
        info!(objective = summary.objective, vehicles = summary.num_vehicles, "solved");
        output_report(&args.output, SolveReport { instance: instance.to_string(), summary })
    }

    pub fn sweep_mode(args: &ClArgs, net: &Network, params: &Params) -> Result<()> {
        let param = args.param
            .ok_or_else(|| anyhow::anyhow!("sweep mode requires --param"))?;
        if args.values.is_empty() {
            anyhow::bail!("sweep mode requires --values");
        }
        let rows = run_sweep(net, params, param, &args.values, || {
            let mut solver = GurobiSolver::new("sweep_trial")?;
            if let Some(seconds) = args.time_limit {
                solver.set_time_limit(seconds)?;
            }
            Ok(solver)
        })?;
        output_report(&args.output, SweepReport { param, rows })
    }
}

#[cfg(not(feature = "gurobi"))]
mod solving {
    use super::*;

    pub fn solve_mode(_args: &ClArgs, _instance: &str, _net: &Network, _params: &Params) -> Result<()> {
        anyhow::bail!("solving requires a Gurobi installation; rebuild with --features gurobi")
    }

    pub fn sweep_mode(_args: &ClArgs, _net: &Network, _params: &Params) -> Result<()> {
        anyhow::bail!("sweeping requires a Gurobi installation; rebuild with --features gurobi")
    }
}


fn main() -> anyhow::Result<()> {
    let args: ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.clone());
    debug!(?args);
    ThreadPoolBuilder::new().num_threads(args.cpus).build_global().expect("Failed to construct thread pool");

    let mut data = get_evrp_instance_by_index(args.index)?;
    if args.preprocess {
        preprocessing::preprocess(&mut data);
    }
    let data = data;

    let unreachable = preprocessing::unreachable_customers(&data);
    if !unreachable.is_empty() {
        warn!(?unreachable, "customers with no feasible round trip; the model cannot be satisfied");
    }

    let net = Network::from_instance(&data)?;
    let params = Params::of_instance(&data);

    match args.mode {
        RunMode::Model => model_mode(&args, &data.id, &net, &params)?,
        RunMode::Solve => solving::solve_mode(&args, &data.id, &net, &params)?,
        RunMode::Sweep => solving::sweep_mode(&args, &net, &params)?,
    }
    Ok(())
}
