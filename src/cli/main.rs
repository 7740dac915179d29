#![warn(clippy::all, clippy::pedantic)]
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{ArgAction, Parser, ValueEnum};
use csv::Writer;
use log::{LevelFilter, ParseLevelError};
use maxflow::{compare_strategies, Solution, Solver, SolverConfig, Strategy};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

type Network = DiGraph<String, f64>;

const DEFAULT_CAPACITY: f64 = 1.0;

/// Maximum flow and minimum cut of a CSV edge list
#[derive(Debug, Parser)]
#[command(name = "maxflow-cli", version, about, long_about = None)]
struct Cli {
    /// Edge list with `tail,head,capacity` columns; an empty capacity means 1
    input: PathBuf,

    /// Name of the source vertex
    #[arg(short, long)]
    source: String,

    /// Name of the sink vertex
    #[arg(short = 't', long)]
    sink: String,

    #[arg(long, value_enum, default_value_t = StrategyArg::Bfs)]
    strategy: StrategyArg,

    /// Where to write per-edge flows, stdout if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where to write the cut as `vertex,side` rows
    #[arg(long)]
    cut: Option<PathBuf>,

    /// Give up after this many augmenting paths
    #[arg(long)]
    max_augmentations: Option<usize>,

    /// Run both strategies and report whether they agree
    #[arg(long)]
    compare: bool,

    /// More output per occurrence (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log level, overrides --verbose
    #[arg(
        short,
        long,
        value_parser = ["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Bfs,
    BlockingFlow,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Bfs => Strategy::Bfs,
            StrategyArg::BlockingFlow => Strategy::BlockingFlow,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    tail: String,
    head: String,
    capacity: Option<f64>,
}

#[derive(Debug, Serialize)]
struct FlowRecord<'a> {
    tail: &'a str,
    head: &'a str,
    capacity: f64,
    flow: f64,
}

#[derive(Debug, Serialize)]
struct CutRecord<'a> {
    vertex: &'a str,
    side: &'static str,
}

// Vertices are named by the first column they appear in, in file order
fn read_edges_csv(path: &Path) -> Result<(Network, BTreeMap<String, NodeIndex>), Box<dyn Error>> {
    let mut rdr = csv::Reader::from_reader(File::open(path)?);
    let mut graph = Network::new();
    let mut names = BTreeMap::new();

    for record in rdr.deserialize() {
        let EdgeRecord {
            tail,
            head,
            capacity,
        } = record?;
        let u = *names
            .entry(tail.clone())
            .or_insert_with(|| graph.add_node(tail));
        let v = *names
            .entry(head.clone())
            .or_insert_with(|| graph.add_node(head));
        graph.add_edge(u, v, capacity.unwrap_or(DEFAULT_CAPACITY));
    }

    log::debug!(
        "read {} vertices and {} edges from {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok((graph, names))
}

fn write_flows_csv(
    graph: &Network,
    solution: &Solution<NodeIndex, f64>,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let out: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    let mut wtr = Writer::from_writer(out);
    for e in graph.edge_references() {
        let flow = solution
            .flow
            .flows
            .get(&(e.source(), e.target()))
            .copied()
            .unwrap_or_default();
        wtr.serialize(FlowRecord {
            tail: &graph[e.source()],
            head: &graph[e.target()],
            capacity: *e.weight(),
            flow,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_cut_csv(
    graph: &Network,
    solution: &Solution<NodeIndex, f64>,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(path)?;
    let sides = [
        ("source", &solution.cut.source_side),
        ("sink", &solution.cut.sink_side),
    ];
    for (side, vertices) in sides {
        for n in vertices {
            wtr.serialize(CutRecord {
                vertex: &graph[*n],
                side,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn level_filter(cli: &Cli) -> Result<LevelFilter, String> {
    match (&cli.log_level, cli.verbose) {
        (Some(level), _) => level.parse().map_err(|e: ParseLevelError| e.to_string()),
        (None, 0) => Ok(LevelFilter::Info),
        (None, 1) => Ok(LevelFilter::Debug),
        (None, _) => Ok(LevelFilter::Trace),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    TermLogger::init(
        level_filter(&cli)?,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .map_err(|e| e.to_string())?;

    let (graph, names) = read_edges_csv(&cli.input)?;

    // unknown names are left for the solver to reject as missing terminals
    let source = names.get(&cli.source).copied().unwrap_or_else(NodeIndex::end);
    let sink = names.get(&cli.sink).copied().unwrap_or_else(NodeIndex::end);

    if cli.compare {
        let start = Instant::now();
        let comparison =
            compare_strategies(&graph, source, sink).map_err(|e| e.to_string())?;
        log::info!("----------------------------------");
        log::info!("      BFS value = {} ({:?})", comparison.bfs_value, comparison.bfs_stats);
        log::info!(
            " Blocking value = {} ({:?})",
            comparison.blocking_value,
            comparison.blocking_stats
        );
        log::info!("          Equal = {}", comparison.equal);
        log::info!("   Elapsed time = {:?}", start.elapsed());
    }

    let config = SolverConfig {
        strategy: cli.strategy.into(),
        max_augmentations: cli.max_augmentations,
    };
    let start = Instant::now();
    let solution = Solver::new(config)
        .solve(&graph, source, sink)
        .map_err(|e| e.to_string())?;

    log::info!("----------------------------------");
    log::info!("       Strategy = {:?}", config.strategy);
    log::info!("     Flow value = {}", solution.flow.value);
    log::info!("      Cut value = {}", solution.cut.value);
    log::info!("  Augmentations = {}", solution.flow.stats.augmentations);
    log::info!("         Phases = {}", solution.flow.stats.phases);
    log::info!("   Elapsed time = {:?}", start.elapsed());

    write_flows_csv(&graph, &solution, cli.output.as_deref())?;
    if let Some(path) = &cli.cut {
        write_cut_csv(&graph, &solution, path)?;
    }

    Ok(())
}
