//! Arbiter CLI - drives a demo actor through the behavior scheduler.
//!
//! Single binary that provides:
//! - `arbiter run` - tick the demo sentry and report what it did
//! - `arbiter check` - validate a config file against the demo actor
//! - `arbiter tree` - print the demo actor's behavior trees

mod demo;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use arbiter::prelude::*;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use demo::Outpost;

#[derive(Parser)]
#[command(name = "arbiter")]
#[command(about = "Per-actor behavior arbitration demo", version)]
struct Cli {
    /// YAML config (seed, scheduler settings, schedule)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo sentry
    Run {
        /// Number of ticks to simulate
        #[arg(long, default_value_t = 400)]
        ticks: u64,

        /// Actor id (seeds sensor offsets and random streams)
        #[arg(long, default_value_t = 1)]
        actor: u64,

        /// Print every trace event as a JSON line
        #[arg(long)]
        trace_json: bool,
    },

    /// Validate the config by building the demo actor with it
    Check,

    /// Print the demo actor's behavior trees
    Tree,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Some(Commands::Run {
            ticks,
            actor,
            trace_json,
        }) => run(&config, actor, ticks, trace_json),
        Some(Commands::Check) => check(&config),
        Some(Commands::Tree) => tree(&config),
        None => {
            println!("Arbiter - per-actor behavior arbitration");
            println!();
            println!("Usage: arbiter <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run    Run the demo sentry");
            println!("  check  Validate a config file");
            println!("  tree   Print the demo behavior trees");
            println!();
            println!("Run 'arbiter --help' for more information.");
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ArbiterConfig> {
    match path {
        Some(path) => ArbiterConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(ArbiterConfig::default()),
    }
}

fn run(config: &ArbiterConfig, actor: u64, ticks: u64, trace_json: bool) -> Result<()> {
    let trace = Rc::new(RefCell::new(TraceLog::default()));
    let mut scheduler = demo::sentry(actor, config)
        .trace_sink(Box::new(trace.clone()))
        .build()
        .context("Failed to build the demo actor")?;
    let mut world = Outpost::new();

    tracing::info!(actor, ticks, seed = config.seed, "Starting simulation");

    let mut last_primary = scheduler.primary();
    for tick in 0..ticks {
        world.now = tick;
        let ctx = TickContext::new(tick).with_seed(config.seed);
        scheduler.tick(&ctx, &mut world);

        let primary = scheduler.primary();
        if primary != last_primary {
            tracing::info!(
                tick,
                day = tick / demo::DAY,
                activity = %primary.map_or("none", ActivityId::name),
                "Activity changed"
            );
            last_primary = primary;
        }
    }

    let log = trace.borrow();
    if trace_json {
        for event in &log.events {
            println!("{}", serde_json::to_string(event)?);
        }
    }

    tracing::info!(
        strikes = world.strikes,
        steps = world.steps,
        position = world.position,
        stamina = world.stamina,
        started = log.of_kind(TraceKind::NodeStarted).count(),
        switches = log.of_kind(TraceKind::ActivityChanged).count(),
        "Simulation finished"
    );
    Ok(())
}

fn check(config: &ArbiterConfig) -> Result<()> {
    let scheduler = demo::sentry(1, config)
        .build()
        .context("Config does not fit the demo actor")?;

    let activities: Vec<&str> = scheduler.activities().map(ActivityId::name).collect();
    println!("Config OK");
    println!("  activities: {}", activities.join(", "));
    println!(
        "  arbitrate every {} tick(s), offset {}",
        config.scheduler.arbitrate_every_ticks, config.scheduler.arbitrate_offset
    );
    if let Some(schedule) = scheduler.schedule() {
        let period = schedule
            .period()
            .map_or_else(|| "none".to_string(), |p| p.to_string());
        println!("  schedule: {} keyframe(s), period {}", schedule.keyframes().len(), period);
    }
    Ok(())
}

fn tree(config: &ArbiterConfig) -> Result<()> {
    let scheduler = demo::sentry(1, config)
        .build()
        .context("Failed to build the demo actor")?;

    for line in render_tree(&scheduler) {
        println!("{line}");
    }
    Ok(())
}

fn render_tree(scheduler: &Scheduler<Outpost>) -> Vec<String> {
    let mut depth: Vec<(&BehaviorNode<Outpost>, usize)> = Vec::new();
    let mut lines = Vec::new();
    scheduler.visit_nodes(|visit| {
        let level = match visit.parent {
            None => 0,
            Some(parent) => depth
                .iter()
                .rev()
                .find(|(node, _)| std::ptr::eq(*node, parent))
                .map_or(1, |(_, level)| level + 1),
        };
        depth.push((visit.node, level));

        let label = if level == 0 {
            format!("[{} @{}] ", visit.activity, visit.priority)
        } else {
            String::new()
        };
        lines.push(format!(
            "{}{}{} ({:?})",
            "  ".repeat(level),
            label,
            visit.node.name(),
            visit.node.variant()
        ));
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_indents_by_position_not_by_name() {
        let step = || BehaviorNode::leaf("step", FnLeaf::<Outpost>::new());
        let inner = BehaviorNode::select_first("step", vec![step()]);
        let outer = BehaviorNode::run_all("drill", vec![inner, step()]);
        let scheduler = SchedulerBuilder::new(1u64)
            .activity(ActivityGroup::new(ActivityId::new("drill"), 0).behavior(outer))
            .build()
            .expect("build");

        let lines = render_tree(&scheduler);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("[drill @0] drill"), "{lines:?}");
        assert!(lines[1].starts_with("  step (SelectFirst"), "{lines:?}");
        assert!(lines[2].starts_with("    step (Leaf"), "{lines:?}");
        assert!(lines[3].starts_with("  step (Leaf"), "{lines:?}");
    }
}
