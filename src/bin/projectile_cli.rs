use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use projectile_engine::{
    bin, comparison_series, export_csv, field_statistics, import_csv, run_batch,
    theoretical_distance, write_trials, DrivenIntegrator, EnergyBreakdown, ExportColumns,
    FieldStatistics, HeadlessIntegrator, Heatmap, IntegratorConfig, JitterSampler, LaunchParams,
    ParamSampler, PointMassHost, SimConfig, TrialField, TrialOrigin, TrialResult, TrialStore,
    UniformSampler,
};

#[derive(Parser)]
#[command(name = "projectile")]
#[command(version)]
#[command(about = "Projectile flight simulator with drag and Magnus lift", long_about = None)]
struct Cli {
    /// TOML config file (integrator, forces, landing, batch, launch defaults)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a single launch headlessly
    Launch {
        #[command(flatten)]
        launch: LaunchArgs,

        /// Launch and land at y = 0 instead of the configured heights
        #[arg(long)]
        ground_level: bool,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,

        /// List every trajectory sample
        #[arg(long)]
        full: bool,
    },

    /// Fly a launch tick by tick against the built-in point-mass host
    Live {
        #[command(flatten)]
        launch: LaunchArgs,

        /// Print a readout every N ticks
        #[arg(long, default_value = "30")]
        every: u64,

        /// Output format for the final result
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Run a seeded batch of randomized trials
    Batch {
        /// Number of trials (defaults to the config's batch.trials)
        #[arg(short = 'n', long)]
        trials: Option<usize>,

        /// RNG seed (defaults to the config's batch.seed)
        #[arg(short = 's', long)]
        seed: Option<u64>,

        /// Vary launch parameters normally around the launch values instead of uniform ranges
        #[arg(long)]
        jitter: bool,

        #[command(flatten)]
        launch: LaunchArgs,

        /// Write the trials to this CSV file
        #[arg(short = 'e', long)]
        export: Option<PathBuf>,

        /// Export only the six numeric columns
        #[arg(long)]
        basic: bool,

        /// Also list the most recent N trials
        #[arg(long)]
        keep_last: Option<usize>,

        /// Report progress on stderr
        #[arg(long)]
        progress: bool,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Bin an exported CSV over two fields, averaging a third
    Heatmap {
        /// CSV file produced by `batch --export`
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Horizontal axis field (e.g. angle, params.launchVelocity)
        #[arg(short = 'x', long, default_value = "angle")]
        x: String,

        /// Vertical axis field
        #[arg(short = 'y', long, default_value = "velocity")]
        y: String,

        /// Averaged field
        #[arg(short = 'z', long, default_value = "distance")]
        z: String,

        /// Bins per axis
        #[arg(short = 'b', long, default_value_t = projectile_engine::constants::DEFAULT_BINS)]
        bins: usize,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Compare simulated range against the drag-free closed form
    Compare {
        /// CSV file to compare; runs a fresh batch when omitted
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Trials for a fresh batch
        #[arg(short = 'n', long, default_value = "20")]
        trials: usize,

        /// RNG seed for a fresh batch
        #[arg(short = 's', long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Display engine information
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// Launch parameter overrides; unset flags keep the configured values
#[derive(Args, Debug, Clone, Default)]
struct LaunchArgs {
    /// Launch velocity (m/s)
    #[arg(short = 'v', long)]
    velocity: Option<f64>,

    /// Launch angle (degrees above horizontal)
    #[arg(short = 'a', long)]
    angle: Option<f64>,

    /// Mass (kg)
    #[arg(short = 'm', long)]
    mass: Option<f64>,

    /// Drag coefficient
    #[arg(short = 'd', long)]
    drag: Option<f64>,

    /// Spin (rad/s, positive lifts a forward-moving projectile)
    #[arg(long, allow_negative_numbers = true)]
    spin: Option<f64>,

    /// Air density (kg/m³)
    #[arg(long)]
    air_density: Option<f64>,

    /// Gravity (m/s²)
    #[arg(long)]
    gravity: Option<f64>,

    /// Coefficient of restitution for ground contact
    #[arg(long)]
    restitution: Option<f64>,
}

impl LaunchArgs {
    fn apply(&self, base: LaunchParams) -> LaunchParams {
        LaunchParams {
            launch_velocity: self.velocity.unwrap_or(base.launch_velocity),
            angle_deg: self.angle.unwrap_or(base.angle_deg),
            mass: self.mass.unwrap_or(base.mass),
            drag: self.drag.unwrap_or(base.drag),
            spin: self.spin.unwrap_or(base.spin),
            air_density: self.air_density.unwrap_or(base.air_density),
            gravity: self.gravity.unwrap_or(base.gravity),
            restitution: self.restitution.unwrap_or(base.restitution),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LaunchReport<'a> {
    params: &'a LaunchParams,
    theoretical_distance: f64,
    #[serde(flatten)]
    result: &'a TrialResult,
}

#[derive(Serialize)]
struct BatchSummary {
    trials: usize,
    seed: u64,
    statistics: Vec<(TrialField, FieldStatistics)>,
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive("projectile_engine=info".parse()?))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging()?;

    let config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    match cli.command {
        Commands::Launch { launch, ground_level, output, full } => {
            let params = launch.apply(config.launch);
            params.validate()?;

            let integrator_config = if ground_level {
                IntegratorConfig { initial_height: 0.0, ground_threshold: 0.0, ..config.integrator }
            } else {
                config.integrator
            };
            let result = HeadlessIntegrator::new(integrator_config, config.forces).run(&params);

            display_launch(&params, &result, output, full)?;
        },

        Commands::Live { launch, every, output } => {
            let params = launch.apply(config.launch);
            params.validate()?;
            run_live(&config, params, every.max(1), output)?;
        },

        Commands::Batch { trials, seed, jitter, launch, export, basic, keep_last, progress, output } => {
            let trials = trials.unwrap_or(config.batch.trials);
            let seed = seed.unwrap_or(config.batch.seed);
            let base = launch.apply(config.launch);

            let mut sampler: Box<dyn ParamSampler> = if jitter {
                Box::new(JitterSampler::new(base, config.batch.jitter, seed)?)
            } else {
                Box::new(UniformSampler::new(config.batch.ranges, base, seed)?)
            };

            let mut store = TrialStore::new();
            run_batch(trials, sampler.as_mut(), &mut store, config.headless()).run_to_end(|p| {
                if progress {
                    eprint!("\rProgress: {:>5.1}% ({}/{})", p.percent, p.completed, p.total);
                }
            });
            if progress && trials > 0 {
                eprintln!();
            }

            if let Some(path) = &export {
                let columns = if basic { ExportColumns::Basic } else { ExportColumns::Full };
                export_csv(path, store.trials(), columns)?;
                info!("Exported {} trials to {}", store.len(), path.display());
            }

            display_batch(&store, seed, output)?;

            if let Some(n) = keep_last {
                display_recent(&store, n);
            }
        },

        Commands::Heatmap { input, x, y, z, bins, output } => {
            let mut store = TrialStore::new();
            let report = import_csv(&input, &mut store)?;
            if !report.skipped.is_empty() {
                eprintln!("Skipped {} malformed rows", report.skipped.len());
            }

            let heatmap = bin(store.trials(), x.parse()?, y.parse()?, z.parse()?, bins, bins);
            display_heatmap(&heatmap, output)?;
        },

        Commands::Compare { input, trials, seed, output } => {
            let mut store = TrialStore::new();
            match &input {
                Some(path) => {
                    let report = import_csv(path, &mut store)?;
                    if !report.skipped.is_empty() {
                        eprintln!("Skipped {} malformed rows", report.skipped.len());
                    }
                },
                None => {
                    let mut sampler = UniformSampler::new(
                        config.batch.ranges,
                        config.launch,
                        seed.unwrap_or(config.batch.seed),
                    )?;
                    run_batch(trials, &mut sampler, &mut store, config.headless()).run_to_end(|_| {});
                },
            }
            display_comparison(&store, output)?;
        },

        Commands::Info => {
            println!("╔════════════════════════════════════════╗");
            println!("║      PROJECTILE ENGINE v{:<15}║", env!("CARGO_PKG_VERSION"));
            println!("╠════════════════════════════════════════╣");
            println!("║ Fixed-timestep projectile simulator.   ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Features:                              ║");
            println!("║ • Quadratic drag                       ║");
            println!("║ • Magnus lift from spin                ║");
            println!("║ • Headless and host-driven integration ║");
            println!("║ • Seeded randomized batches            ║");
            println!("║ • Heatmap binning and CSV round trip   ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Defaults:                              ║");
            println!("║ Time step:         {:>8.4} s          ║", config.integrator.dt);
            println!("║ Launch height:     {:>8.2} m          ║", config.integrator.initial_height);
            println!("║ Ground threshold:  {:>8.2} m          ║", config.integrator.ground_threshold);
            println!("║ Magnus k:          {:>8.5}            ║", config.forces.magnus_coefficient);
            println!("╚════════════════════════════════════════╝");
        },
    }

    Ok(())
}

fn run_live(config: &SimConfig, params: LaunchParams, every: u64, output: OutputFormat) -> Result<(), Box<dyn Error>> {
    let mut host = PointMassHost::for_params(&params);
    let mut integrator = DrivenIntegrator::new(config.driven(), config.forces);
    integrator.launch(&mut host, params);

    let table = output == OutputFormat::Table;
    if table {
        println!("┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐");
        println!("│ Time (s) │  X (m)   │  Y (m)   │ Vel(m/s) │  KE (J)  │  PE (J)  │");
        println!("├──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤");
    }

    let result = loop {
        if let Some(result) = integrator.step(&mut host) {
            break result;
        }
        if table && integrator.ticks() % every == 0 {
            let state = integrator.state();
            let energy = EnergyBreakdown::from_state(state, params.mass, params.gravity);
            println!(
                "│ {:>8.3} │ {:>8.2} │ {:>8.2} │ {:>8.2} │ {:>8.1} │ {:>8.1} │",
                state.elapsed_time,
                state.position.x,
                state.position.y,
                state.speed(),
                energy.kinetic,
                energy.potential
            );
        }
    };

    if table {
        println!("└──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘");
    }

    let mut store = TrialStore::new();
    let id = store.record(params, result, TrialOrigin::Interactive);
    let trial = store.get(id).ok_or("trial missing from store")?;
    display_launch(&trial.params, &trial.results, output, false)
}

fn display_launch(params: &LaunchParams, result: &TrialResult, format: OutputFormat, full: bool) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            let report = LaunchReport {
                params,
                theoretical_distance: theoretical_distance(params),
                result,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        },

        OutputFormat::Csv => {
            println!("x,y,z");
            for p in result.trajectory.points() {
                println!("{:.3},{:.3},{:.3}", p.x, p.y, p.z);
            }
        },

        OutputFormat::Table => {
            println!("╔════════════════════════════════════════╗");
            println!("║         TRAJECTORY RESULTS             ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Distance:          {:>8.2} m          ║", result.distance);
            println!("║ Max Height:        {:>8.2} m          ║", result.max_height);
            println!("║ Air Time:          {:>8.3} s          ║", result.air_time);
            println!("║ Theoretical:       {:>8.2} m          ║", theoretical_distance(params));
            println!("║ Outcome:           {:<20}║", format!("{:?}", result.outcome));
            println!("║ Samples:           {:>8}            ║", result.trajectory.len());
            println!("╚════════════════════════════════════════╝");

            if full {
                println!("\nTrajectory Samples:");
                println!("┌──────────┬──────────┬──────────┐");
                println!("│    #     │  X (m)   │  Y (m)   │");
                println!("├──────────┼──────────┼──────────┤");
                for (i, p) in result.trajectory.points().iter().enumerate() {
                    println!("│ {:>8} │ {:>8.2} │ {:>8.2} │", i, p.x, p.y);
                }
                println!("└──────────┴──────────┴──────────┘");
            }
        },
    }

    Ok(())
}

const SUMMARY_FIELDS: [TrialField; 3] = [TrialField::Distance, TrialField::MaxHeight, TrialField::AirTime];

fn display_batch(store: &TrialStore, seed: u64, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            let summary = BatchSummary {
                trials: store.len(),
                seed,
                statistics: SUMMARY_FIELDS
                    .iter()
                    .filter_map(|&f| field_statistics(store.trials(), f).map(|s| (f, s)))
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        },

        OutputFormat::Csv => {
            let stdout = io::stdout();
            write_trials(stdout.lock(), store.trials(), ExportColumns::Basic)?;
        },

        OutputFormat::Table => {
            println!("╔════════════════════════════════════════╗");
            println!("║      BATCH SIMULATION                  ║");
            println!("║      {:>6} trials, seed {:<12}  ║", store.len(), seed);
            for field in SUMMARY_FIELDS {
                let Some(stats) = field_statistics(store.trials(), field) else {
                    continue;
                };
                println!("╠════════════════════════════════════════╣");
                println!("║ {:<39}║", field.path().to_uppercase());
                println!("║ Mean:              {:>8.2}            ║", stats.mean);
                println!("║ Std Dev:           {:>8.2}            ║", stats.std);
                println!("║ Min:               {:>8.2}            ║", stats.min);
                println!("║ Max:               {:>8.2}            ║", stats.max);
                if let Some(median) = stats.percentile(0.5) {
                    println!("║ Median:            {:>8.2}            ║", median);
                }
            }
            println!("╚════════════════════════════════════════╝");
        },
    }

    Ok(())
}

fn display_recent(store: &TrialStore, n: usize) {
    println!("\nMost recent {} trials:", store.last_n(n).len());
    println!("┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐");
    println!("│  Trial   │ Vel(m/s) │ Angle(°) │ Spin     │ Dist (m) │ Hgt (m)  │");
    println!("├──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤");
    for trial in store.last_n(n) {
        println!(
            "│ {:>8} │ {:>8.2} │ {:>8.2} │ {:>8.2} │ {:>8.2} │ {:>8.2} │",
            trial.id.to_string(),
            trial.params.launch_velocity,
            trial.params.angle_deg,
            trial.params.spin,
            trial.results.distance,
            trial.results.max_height
        );
    }
    println!("└──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘");
}

fn display_heatmap(heatmap: &Heatmap, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(heatmap)?);
        },

        OutputFormat::Csv => {
            println!("x_min,x_max,y_min,y_max,count,value");
            for cell in heatmap.cells() {
                let value = cell.value.map(|v| v.to_string()).unwrap_or_default();
                println!(
                    "{},{},{},{},{},{}",
                    cell.x_range.0, cell.x_range.1, cell.y_range.0, cell.y_range.1, cell.count, value
                );
            }
        },

        OutputFormat::Table => {
            println!(
                "Mean {} by {} (columns) and {} (rows)",
                heatmap.z_field, heatmap.x_field, heatmap.y_field
            );
            let mut out = io::stdout().lock();
            // highest y first so the grid reads like a chart
            for yi in (0..heatmap.y_bins()).rev() {
                let label = heatmap.cell(0, yi).map(|c| c.y_range.0).unwrap_or_default();
                write!(out, "{:>9.2} │", label)?;
                for xi in 0..heatmap.x_bins() {
                    match heatmap.cell(xi, yi).and_then(|c| c.value) {
                        Some(v) => write!(out, "{:>8.1}", v)?,
                        None => write!(out, "{:>8}", "·")?,
                    }
                }
                writeln!(out)?;
            }
            write!(out, "{:>9} └", "")?;
            writeln!(out, "{}", "─".repeat(8 * heatmap.x_bins()))?;
            write!(out, "{:>11}", "")?;
            for xi in 0..heatmap.x_bins() {
                let label = heatmap.cell(xi, 0).map(|c| c.x_range.0).unwrap_or_default();
                write!(out, "{:>8.2}", label)?;
            }
            writeln!(out)?;
        },
    }

    Ok(())
}

fn display_comparison(store: &TrialStore, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    let series = comparison_series(store.trials());
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&series)?);
        },

        OutputFormat::Csv => {
            println!("trial,velocity,angle,actual,theoretical,max_height,air_time");
            for p in &series {
                println!(
                    "{},{},{},{},{},{},{}",
                    p.trial_id.0, p.launch_velocity, p.angle, p.actual, p.theoretical, p.max_height, p.air_time
                );
            }
        },

        OutputFormat::Table => {
            println!("┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐");
            println!("│  Trial   │ Vel(m/s) │ Angle(°) │ Actual   │ Theory   │  Ratio   │");
            println!("├──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤");
            for p in &series {
                let ratio = p.ratio().map(|r| format!("{:.3}", r)).unwrap_or_else(|| "-".to_string());
                println!(
                    "│ {:>8} │ {:>8.2} │ {:>8.2} │ {:>8.2} │ {:>8.2} │ {:>8} │",
                    p.trial_id.to_string(),
                    p.launch_velocity,
                    p.angle,
                    p.actual,
                    p.theoretical,
                    ratio
                );
            }
            println!("└──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘");
        },
    }

    Ok(())
}
