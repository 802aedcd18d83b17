//! Command line front end.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::LevelFilter;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::api::run_config_dto::RunConfigDto;
use crate::domain::benchmark::{BenchmarkConfig, run_benchmark};
use crate::domain::graph::analytics::{PathMetric, find_all_cycles, find_critical_path, is_connected};
use crate::domain::graph::generator::{GeneratorParams, generate_dag};
use crate::domain::graph::graph::{Dag, Topology, Traversal};
use crate::domain::scheduler::settings::SchedulerSettings;
use crate::domain::utils::statistics::{IntervalKind, timeline_rows};
use crate::loader::parser::{load_graph, parse_json_file, save_graph};
use crate::schedule_from_files;

#[derive(Debug, Clone, Parser)]
#[command(name = "static_sched", version, about = "Static list scheduling of task DAGs on multiprocessor topologies.", long_about = None)]
pub struct CliArgs {
    /// Logging level. Falls back to `RUST_LOG`, then `info`.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Schedule a DAG on a topology and print the unit timelines.
    Schedule(ScheduleArgs),

    /// Print critical paths, cycles and layering of a DAG.
    Analyse(AnalyseArgs),

    /// Generate a random DAG and save it as a graph record.
    Generate(GenerateArgs),

    /// Average speed-up and efficiency over random DAGs on one topology.
    Bench(BenchArgs),
}

/// Policy flags shared by `schedule` and `bench`. Given flags override the run configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct PolicyArgs {
    #[arg(long, value_name = "NAME")]
    pub queue_policy: Option<String>,

    #[arg(long, value_name = "NAME")]
    pub unit_priority: Option<String>,

    /// Preset: dummy, neighbour, advance-neighbour or modelling-neighbour.
    #[arg(long, value_name = "NAME")]
    pub scheduler: Option<String>,

    #[arg(long, value_name = "NAME")]
    pub unit_selector: Option<String>,

    #[arg(long, value_name = "NAME")]
    pub transfer_scheduler: Option<String>,

    #[arg(long, value_name = "NAME")]
    pub router: Option<String>,

    /// sum or max.
    #[arg(long, value_name = "NAME")]
    pub cost_aggregation: Option<String>,

    #[arg(long)]
    pub duplex: bool,

    /// Units have no IO processor: transfers and calculations exclude each other.
    #[arg(long)]
    pub no_io_cpu: bool,

    #[arg(long, value_name = "TICKS")]
    pub max_ticks: Option<i64>,
}

impl PolicyArgs {
    pub fn apply(&self, config: &mut RunConfigDto) {
        let names = [
            (&self.queue_policy, &mut config.queue_policy),
            (&self.unit_priority, &mut config.unit_priority),
            (&self.scheduler, &mut config.scheduler),
            (&self.router, &mut config.router),
            (&self.cost_aggregation, &mut config.cost_aggregation),
        ];
        for (flag, value) in names {
            if let Some(flag) = flag {
                *value = flag.clone();
            }
        }

        if self.unit_selector.is_some() {
            config.unit_selector = self.unit_selector.clone();
        }
        if self.transfer_scheduler.is_some() {
            config.transfer_scheduler = self.transfer_scheduler.clone();
        }
        if self.duplex {
            config.duplex = true;
        }
        if self.no_io_cpu {
            config.has_io_cpu = false;
        }
        if self.max_ticks.is_some() {
            config.max_ticks = self.max_ticks;
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ScheduleArgs {
    /// JSON run configuration.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    pub dag: Option<String>,

    #[arg(long, value_name = "PATH")]
    pub topology: Option<String>,

    /// Write the timelines as CSV to this file.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<String>,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Debug, Clone, Args)]
pub struct AnalyseArgs {
    /// Graph record of the task DAG.
    pub dag: String,

    /// Also check connectivity of this topology.
    #[arg(long, value_name = "PATH")]
    pub topology: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 16)]
    pub count: usize,

    #[arg(long, default_value_t = 5)]
    pub min_weight: i64,

    #[arg(long, default_value_t = 20)]
    pub max_weight: i64,

    /// Targeted share of computation in the total work, in (0, 1].
    #[arg(long, default_value_t = 0.5)]
    pub connectivity: f64,

    #[arg(long, default_value_t = 30.0)]
    pub connections_percent: f64,

    #[arg(long, default_value_t = 1)]
    pub min_edge_weight: i64,

    #[arg(long, default_value_t = 9999)]
    pub max_edge_weight: i64,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Lay the nodes out level by level before saving.
    #[arg(long)]
    pub arrange: bool,
}

#[derive(Debug, Clone, Args)]
pub struct BenchArgs {
    /// Graph record of the topology.
    pub topology: String,

    /// Tasks per unit in every generated DAG.
    #[arg(long, default_value_t = 1)]
    pub scale: usize,

    #[arg(long, default_value_t = 10)]
    pub samples: usize,

    /// Comma separated connectivity values. Defaults to 0.1 through 0.9.
    #[arg(long, value_delimiter = ',')]
    pub connectivity: Vec<f64>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}

pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Schedule(args) => schedule(args),
        Command::Analyse(args) => analyse(args),
        Command::Generate(args) => generate(args),
        Command::Bench(args) => bench(args),
    }
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn schedule(args: ScheduleArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => parse_json_file::<RunConfigDto>(path).with_context(|| format!("Failed to load run configuration '{}'", path.display()))?,
        None => RunConfigDto::default(),
    };
    if args.dag.is_some() {
        config.dag = args.dag.clone();
    }
    if args.topology.is_some() {
        config.topology = args.topology.clone();
    }
    if args.csv.is_some() {
        config.csv_output = args.csv.clone();
    }
    args.policy.apply(&mut config);

    let outcome = schedule_from_files(&config)?;

    let mut current_unit = String::new();
    for row in timeline_rows(&outcome.system) {
        if row.unit != current_unit {
            println!("{}", format!("Unit {}", row.unit).bold());
            current_unit = row.unit.clone();
        }
        let interval = format!("[{:>4}, {:>4})", row.start, row.end);
        match row.kind {
            IntervalKind::Calc => println!("  {} {}", interval, row.label.green()),
            IntervalKind::Transfer => println!(
                "  {} {} link {} {} {}",
                interval,
                row.label.cyan(),
                row.link.unwrap_or_default(),
                row.direction.unwrap_or_default(),
                row.peer.unwrap_or_default().dimmed()
            ),
        }
    }

    let metrics = outcome.metrics;
    println!(
        "{} {}  {} {}  {} {:.3}  {} {:.3}",
        "makespan".bold(),
        metrics.makespan,
        "serial".bold(),
        metrics.serial_duration,
        "speed-up".bold(),
        metrics.speed_up,
        "efficiency".bold(),
        metrics.efficiency
    );
    Ok(())
}

fn analyse(args: AnalyseArgs) -> Result<()> {
    let dag: Dag = load_graph(&args.dag, None).with_context(|| format!("Failed to load DAG '{}'", args.dag))?;

    let cycles = find_all_cycles(&dag);
    if !cycles.is_empty() {
        println!("{} {}", "cycles".red().bold(), cycles.len());
        for cycle in &cycles {
            println!("  {}", cycle.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> "));
        }
        return Ok(());
    }

    println!("{} {}  {} {}", "tasks".bold(), dag.node_count(), "edges".bold(), dag.edge_count());
    println!("{} {}  {} {:.3}", "serial".bold(), dag.duration_on_one_cpu(), "correlation".bold(), dag.correlation());

    for (label, metric) in [("critical path (weight)", PathMetric::Weight), ("critical path (hops)", PathMetric::HopCount)] {
        let path = find_critical_path(&dag, Traversal::Forward, metric)?;
        let nodes: Vec<String> = path.path.iter().map(ToString::to_string).collect();
        println!("{} {}: {}", label.bold(), path.value, nodes.join(" -> "));
    }

    for (index, level) in dag.levels()?.iter().enumerate() {
        let nodes: Vec<String> = level.iter().map(ToString::to_string).collect();
        println!("{} {}: {}", "level".bold(), index, nodes.join(", "));
    }

    if let Some(path) = &args.topology {
        let topology: Topology = load_graph(path, None).with_context(|| format!("Failed to load topology '{}'", path))?;
        let connected = if is_connected(&topology) { "connected".green() } else { "disconnected".red() };
        println!("{} {} units, {}", "topology".bold(), topology.node_count(), connected);
    }
    Ok(())
}

fn generate(args: GenerateArgs) -> Result<()> {
    let params = GeneratorParams {
        min_weight: args.min_weight,
        max_weight: args.max_weight,
        count: args.count,
        connectivity: args.connectivity,
        connections_percent: args.connections_percent,
        min_edge_weight: args.min_edge_weight,
        max_edge_weight: args.max_edge_weight,
    };

    let mut generated = generate_dag(&params, &mut rng(args.seed))?;
    if args.arrange {
        generated.dag.arrange()?;
    }
    save_graph(&args.output, &generated.dag).with_context(|| format!("Failed to write '{}'", args.output.display()))?;

    for notice in &generated.notices {
        println!("{} {}", "notice".yellow(), notice);
    }
    println!(
        "{} {} tasks, {} edges, correlation {:.3} -> {}",
        "generated".bold(),
        generated.dag.node_count(),
        generated.dag.edge_count(),
        generated.dag.correlation(),
        args.output.display()
    );
    Ok(())
}

fn bench(args: BenchArgs) -> Result<()> {
    let topology: Topology = load_graph(&args.topology, None).with_context(|| format!("Failed to load topology '{}'", args.topology))?;

    let mut config = RunConfigDto::default();
    args.policy.apply(&mut config);

    let mut benchmark = BenchmarkConfig { settings: SchedulerSettings::from_dto(&config)?, scale: args.scale, samples: args.samples, ..BenchmarkConfig::default() };
    if !args.connectivity.is_empty() {
        benchmark.connectivities = args.connectivity.clone();
    }

    let points = run_benchmark(&topology, &benchmark, &mut rng(args.seed))?;

    println!("{:>12} {:>10} {:>10}", "connectivity".bold(), "speed-up".bold(), "efficiency".bold());
    for point in points {
        println!("{:>12.2} {:>10.3} {:>10.3}", point.connectivity, point.speed_up, point.efficiency);
    }
    Ok(())
}
