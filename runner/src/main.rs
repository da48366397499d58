//! Sky Runner
//!
//! Headless host for the sky widgets: builds a store, configures N widgets
//! from one card config, runs the scheduler and feeds host snapshots.
//!
//! Usage:
//!   sky-runner --config card.json --instances 3 --duration-secs 20
//!   sky-runner --config card.json --snapshot states.json --push-secs 2

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sky_coordinator::{now_ms, Scheduler, SkyStore, WidgetInstance};
use sky_demo::DemoCommand;
use sky_model::{CardConfig, HostSnapshot};

#[derive(Parser, Debug)]
#[command(name = "sky-runner", about = "Drive a group of sky widgets without a dashboard")]
struct Args {
    /// Card configuration JSON (defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host entity snapshot JSON, re-read on every push
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Widgets sharing the group
    #[arg(short = 'n', long, default_value_t = 3)]
    instances: usize,

    /// Scheduler period (ms)
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Seconds between host pushes
    #[arg(long, default_value_t = 1)]
    push_secs: u64,

    /// How long to run
    #[arg(short, long, default_value_t = 10)]
    duration_secs: u64,

    /// Force demo mode on
    #[arg(long)]
    demo: bool,

    /// Pin the demo condition ("auto" or a condition name)
    #[arg(long)]
    condition: Option<String>,

    /// Demo scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final frame of every widget as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(path: Option<&Path>, args: &Args) -> Result<CardConfig> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            CardConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => CardConfig::default(),
    };

    if args.demo {
        config.demo_mode = true;
    }
    if config.singleton_id.is_none() && args.instances > 1 {
        config.singleton_id = Some("sky-runner".to_string());
    }
    Ok(config)
}

fn load_snapshot(path: &Path) -> Result<HostSnapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    Ok(HostSnapshot::from_json(&json)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "sky_runner=debug,sky_coordinator=debug,info"
    } else {
        "sky_runner=debug,info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(args.config.as_deref(), &args)?;
    info!(
        "Sky runner: {} widget(s), demo={}, group={:?}",
        args.instances,
        config.demo_enabled(),
        config.singleton_id
    );

    let store = match args.seed {
        Some(seed) => SkyStore::new().with_seed(seed),
        None => SkyStore::new(),
    };

    let mut widgets = Vec::with_capacity(args.instances);
    for _ in 0..args.instances.max(1) {
        let mut widget = WidgetInstance::new(store.clone());
        widget.configure(config.clone(), now_ms())?;
        widget.attach(now_ms());
        widgets.push(widget);
    }

    if let Some(condition) = &args.condition {
        let command: DemoCommand = condition.parse()?;
        for widget in widgets.iter_mut() {
            // Only the UI master accepts it
            if widget.command(command, now_ms()).is_ok() {
                info!("Demo condition set to {}", command);
                break;
            }
        }
    }

    let scheduler = Scheduler::spawn(store.clone(), Duration::from_millis(args.tick_ms));

    let mut frame_tick = tokio::time::interval(Duration::from_millis(args.tick_ms.max(1)));
    let mut push_tick = tokio::time::interval(Duration::from_secs(args.push_secs.max(1)));
    let deadline = tokio::time::sleep(Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = frame_tick.tick() => {
                let now = now_ms();
                for widget in widgets.iter_mut() {
                    widget.refresh(now);
                }
            }
            _ = push_tick.tick() => {
                let now = now_ms();
                if let Some(path) = &args.snapshot {
                    match load_snapshot(path) {
                        Ok(snapshot) => {
                            for widget in widgets.iter_mut() {
                                widget.receive_state_update(&snapshot, now);
                            }
                        }
                        Err(e) => warn!("Skipping push: {:#}", e),
                    }
                }
                if let Some(frame) = widgets.iter().find_map(|w| w.frame()) {
                    match &frame.readout {
                        Some(readout) => info!("{}", readout.lines().join(" | ")),
                        None => info!(
                            "v{} {} night={} sun=({:.1}%, {:.1}%) wind={:.1} km/h",
                            frame.version,
                            frame.state.condition,
                            frame.state.is_night,
                            frame.state.sun.left,
                            frame.state.sun.top,
                            frame.state.wind_speed_kmh
                        ),
                    }
                }
            }
        }
    }

    let ticks = scheduler.shutdown().await;
    info!("Scheduler ran {} ticks", ticks);

    for widget in &widgets {
        let Some(frame) = widget.frame() else {
            warn!("Widget {} never rendered", widget.id());
            continue;
        };
        info!(
            "Widget {}: v{} {} rebuilds={} controls={}",
            widget.id(),
            frame.version,
            frame.state.condition,
            widget.rebuilds(),
            frame.controls.is_some()
        );
        if args.json {
            println!("{}", serde_json::to_string_pretty(frame)?);
        }
    }

    for widget in widgets.iter_mut() {
        widget.detach(now_ms());
    }
    Ok(())
}
