// Convention-formation lab: a population of agents repeatedly plays an
// anonymous pairwise Blue/Red coordination game, and we measure how fast a
// shared convention emerges under competing belief-update policies.

use concord::metrics::logger::{MetricsLogger, SweepLogger};
use concord::metrics::{MetricsCollector, analyzer};
use concord::policies::PolicyRegistry;
use concord::simulation::runner::SizeReport;
use concord::simulation::{ExperimentRunner, PolicyParams, SimConfig, Simulation};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Instant;
use tracing::{Level, info};

use tracing_subscriber;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Single convergence run with one policy
    Run {
        #[arg(short, long, default_value = "pseudo-count")]
        policy: String,
        #[arg(short = 'n', long, default_value_t = 20)]
        agents: u32,
        #[arg(short, long, default_value_t = 100_000)]
        rounds: u64,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 0.3)]
        learning_rate: f64,
        #[arg(long, default_value_t = 0.5)]
        alpha: f64,
        #[arg(long, default_value_t = 0.4)]
        beta: f64,
        #[arg(long, default_value_t = 2.0)]
        pseudo_count: f64,
        #[arg(long, default_value_t = 0.5)]
        initial_exploration: f64,
        #[arg(long, default_value_t = 0.98)]
        decay_factor: f64,
        #[arg(long, default_value_t = 0.0)]
        min_exploration: f64,
    },

    /// Convergence rounds vs population size, averaged over repeated trials
    Sweep {
        #[arg(short, long, default_value = "pseudo-count")]
        policy: String,
        #[arg(long, default_value = "2,4,6,8,10,16,20,50,100,200")]
        sizes: String,
        #[arg(long, default_value_t = 20)]
        runs: u32,
        #[arg(short, long, default_value_t = 100_000)]
        rounds: u64,
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Pit several policies against each other at one population size
    Compare {
        #[arg(
            short,
            long,
            default_value = "frequency-ratio,pseudo-count,pseudo-count-direct,exploration-decay,reward,recent-reward,preference"
        )]
        policies: String,
        #[arg(short = 'n', long, default_value_t = 20)]
        agents: u32,
        #[arg(long, default_value_t = 20)]
        runs: u32,
        #[arg(short, long, default_value_t = 100_000)]
        rounds: u64,
        #[arg(short, long)]
        seed: Option<u64>,
    },

    List,
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            policy,
            agents,
            rounds,
            seed,
            learning_rate,
            alpha,
            beta,
            pseudo_count,
            initial_exploration,
            decay_factor,
            min_exploration,
        } => {
            let params = PolicyParams {
                learning_rate,
                alpha,
                beta,
                pseudo_count,
                initial_exploration_rate: initial_exploration,
                decay_factor,
                min_exploration_rate: min_exploration,
            };
            run_single(policy, agents, rounds, seed, params)?;
        }

        Commands::Sweep {
            policy,
            sizes,
            runs,
            rounds,
            seed,
        } => {
            sweep_sizes(policy, &sizes, runs, rounds, seed)?;
        }

        Commands::Compare {
            policies,
            agents,
            runs,
            rounds,
            seed,
        } => {
            compare_policies(&policies, agents, runs, rounds, seed)?;
        }

        Commands::List => {
            println!("\nAvailable Decision Policies");

            for policy in PolicyRegistry::global().list() {
                println!("  - {}", policy);
            }

            println!("\nUsage: cargo run -- run --policy <name>");
            println!("Example: cargo run -- sweep --policy preference\n");
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn run_single(
    policy_name: String,
    agents: u32,
    rounds: u64,
    seed: Option<u64>,
    params: PolicyParams,
) -> Result<()> {
    let config = SimConfig {
        name: format!("{}_n{}", policy_name, agents),
        policy_name,
        num_agents: agents,
        max_rounds: rounds,
        check_interval: 10,
        seed,
        params,
    };

    info!("Concord: Single Run");

    let mut sim = Simulation::new(config)?;
    let mut collector = MetricsCollector::new();
    let result = sim.run_with_observer(&mut collector);

    if result.converged {
        info!("Population converged after {} rounds", result.rounds);
    } else {
        info!("Population did not converge within {} rounds", result.rounds);
    }
    info!("Coordination success rate: {:.2}%", collector.success_rate() * 100.0);

    save_run_results(&sim, &collector, &result)?;
    Ok(())
}

fn save_run_results(
    sim: &Simulation,
    collector: &MetricsCollector,
    result: &concord::simulation::ConvergenceResult,
) -> Result<()> {
    let snapshots = collector.get_snapshots();
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

    std::fs::create_dir_all("results")?;

    let csv_path = format!("results/{}_{}.csv", sim.config().name, timestamp);
    let mut logger = MetricsLogger::new(&csv_path)?;
    logger.log_batch(&snapshots)?;
    info!("Belief time series saved to: {}", csv_path);

    let report = analyzer::analyze(&snapshots, result, &sim.config().policy_name);

    let json_path = format!("results/{}_{}_analysis.json", sim.config().name, timestamp);
    std::fs::write(&json_path, serde_json::to_string_pretty(&report)?)?;
    info!("Analysis saved to: {}", json_path);

    info!("Final mean p(Blue) signal: {:.2}", report.final_mean_signal_bias);
    info!("Final mean p(Blue) choice: {:.2}", report.final_mean_choice_bias);

    Ok(())
}

fn sweep_sizes(
    policy: String,
    sizes_str: &str,
    runs: u32,
    rounds: u64,
    seed: Option<u64>,
) -> Result<()> {
    let sizes = parse_sizes(sizes_str)?;

    info!("Concord: Population Sweep");
    info!("");
    info!("Policy: {}", policy);
    info!("Sizes: {:?}", sizes);
    info!("Trials per size: {}", runs);
    info!("");

    let base = SimConfig {
        name: format!("sweep_{}", policy),
        policy_name: policy,
        max_rounds: rounds,
        seed,
        ..SimConfig::default()
    };
    base.validate()?;

    let runner = ExperimentRunner::new(base.clone(), runs);
    let reports = runner.sweep(&sizes)?;

    sweep_table(&reports);

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    std::fs::create_dir_all("results")?;

    let csv_path = format!("results/{}_{}.csv", base.name, timestamp);
    let mut logger = SweepLogger::new(&csv_path)?;
    logger.log_batch(&reports)?;
    info!("Sweep saved to: {}", csv_path);

    let json_path = format!("results/{}_{}.json", base.name, timestamp);
    std::fs::write(&json_path, serde_json::to_string_pretty(&reports)?)?;
    info!("Sweep saved to: {}", json_path);

    Ok(())
}

fn compare_policies(
    policies_str: &str,
    agents: u32,
    runs: u32,
    rounds: u64,
    seed: Option<u64>,
) -> Result<()> {
    let policy_names: Vec<&str> = policies_str.split(',').map(|s| s.trim()).collect();

    info!("Concord: Policy Comparison");
    info!("");
    info!("Policies: {}", policy_names.join(", "));
    info!("Agents: {}", agents);
    info!("Trials per policy: {}", runs);
    info!("");

    let mut all_reports = Vec::new();

    for policy_name in policy_names {
        info!("Testing: {}", policy_name);

        let base = SimConfig {
            name: format!("compare_{}", policy_name),
            policy_name: policy_name.to_string(),
            num_agents: agents,
            max_rounds: rounds,
            seed,
            ..SimConfig::default()
        };
        base.validate()?;

        let runner = ExperimentRunner::new(base, runs);
        let report = runner.run_size(agents)?;
        all_reports.push(report);
    }

    sweep_table(&all_reports);

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    std::fs::create_dir_all("results")?;
    let comparison_path = format!("results/comparison_{}.json", timestamp);
    std::fs::write(&comparison_path, serde_json::to_string_pretty(&all_reports)?)?;
    info!("Comparison saved to: {}", comparison_path);

    Ok(())
}

fn parse_sizes(sizes_str: &str) -> Result<Vec<u32>> {
    let sizes = sizes_str
        .split(',')
        .map(|s| s.trim().parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if sizes.is_empty() {
        anyhow::bail!("at least one population size is required");
    }
    for &size in &sizes {
        if size < 2 {
            anyhow::bail!("population sizes must be at least 2, got {}", size);
        }
    }
    Ok(sizes)
}

fn sweep_table(reports: &[SizeReport]) {
    println!("\n╔══════════════════════════════════════════════════════════════════════════════════╗");
    println!("║                              CONVERGENCE SUMMARY                                 ║");
    println!("╠══════════════════════╦════════╦════════════╦═══════════╦════════════╦════════════╣");
    println!("║ Policy               ║ Agents ║ Avg Rounds ║ Converged ║ p(Blue) S  ║ p(Blue) C  ║");
    println!("╠══════════════════════╬════════╬════════════╬═══════════╬════════════╬════════════╣");

    for report in reports {
        println!(
            "║ {:<20} ║ {:>6} ║ {:>10.1} ║ {:>8.0}% ║ {:>10.2} ║ {:>10.2} ║",
            report.policy_name,
            report.num_agents,
            report.avg_rounds,
            report.convergence_rate * 100.0,
            report.avg_signal_bias,
            report.avg_choice_bias,
        );
    }

    println!("╚══════════════════════╩════════╩════════════╩═══════════╩════════════╩════════════╝\n");

    if let Some(fastest) = reports.iter().min_by(|a, b| {
        a.avg_rounds.partial_cmp(&b.avg_rounds).unwrap()
    }) {
        println!(
            "Fastest convergence: {} at n={} ({:.1} rounds)",
            fastest.policy_name, fastest.num_agents, fastest.avg_rounds
        );
    }

    println!();
}
