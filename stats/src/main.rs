use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rrt2d::PlannerConfig;
use rrt2d_scene::{Scene, SceneOptions};
use rrt2d_stats::{run_rounds, Summary};

#[derive(Parser, Debug)]
#[command(name = "rrt2d-stats")]
#[command(about = "Plans a scene many times and reports path statistics", long_about = None)]
struct Args {
    /// Scene file (JSON)
    scene: PathBuf,

    /// Number of episodes to plan
    #[arg(short, long, default_value_t = 1)]
    rounds: usize,

    /// Seed of the first round, round i uses seed + i
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Factor applied to every scene coordinate
    #[arg(long, default_value_t = 10.0)]
    scale: f32,

    /// Width of the planning domain
    #[arg(long, default_value_t = 1000.0)]
    width: f32,

    /// Height of the planning domain
    #[arg(long, default_value_t = 400.0)]
    height: f32,

    /// Planner configuration (JSON), missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PlannerConfig> {
    let Some(path) = path else {
        return Ok(PlannerConfig::default());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading planner config {}", path.display()))?;
    let config: PlannerConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing planner config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid planner config {}", path.display()))?;

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "rrt2d=debug,rrt2d_scene=debug,rrt2d_stats=debug,info"
    } else {
        "rrt2d=info,rrt2d_scene=info,rrt2d_stats=info,warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(args.config.as_ref())?;
    let options = SceneOptions {
        scale: args.scale,
        width: args.width,
        height: args.height,
    };
    let episode = Scene::load(&args.scene)
        .and_then(|scene| scene.build(&options))
        .with_context(|| format!("loading scene {}", args.scene.display()))?;

    info!(rounds = args.rounds, seed = args.seed, "planning");
    let results = run_rounds(&episode, &config, args.rounds, args.seed)?;
    let summary = Summary::from_rounds(&results);

    for line in summary.to_string().lines() {
        info!("{}", line);
    }

    Ok(())
}
