//! Drapery environment CLI.
//!
//! Provides four modes of operation:
//! - `reach`: Run reacher episodes on the kinematic arm and print statistics
//! - `dress`: Run dressing episodes with a garment mesh and print statistics
//! - `index`: Build a reset-state manifest from legacy numbered files
//! - `info`: Print workspace crate versions and defaults

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use drapery_core::prelude::*;
use drapery_env::prelude::*;
use drapery_physics::kinematic::presets;
use drapery_physics::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Reacher and upper-body dressing environments.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Number of episodes to run.
    #[arg(short = 'n', long, default_value_t = 1)]
    episodes: u32,

    /// Maximum steps per episode. `0` means no limit.
    #[arg(short, long, default_value_t = 100)]
    max_steps: u32,

    /// Root seed; episode seeds are derived from it.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Environment config (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Policy::Zero)]
    policy: Policy,

    /// Write the debug draw list of the last step as JSON.
    #[arg(long)]
    render: Option<PathBuf>,

    /// Integration sub-step in seconds.
    #[arg(long, default_value_t = 0.01)]
    dt: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reacher episodes and print statistics.
    Reach {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Run dressing episodes and print statistics.
    Dress {
        #[command(flatten)]
        run: RunArgs,

        /// Garment mesh (OBJ).
        #[arg(long)]
        mesh: PathBuf,

        /// Number of haptic sensors on the character.
        #[arg(long, default_value_t = 22)]
        sensors: usize,
    },

    /// Build a manifest from `<prefix><NNNNN>.obj` / `<prefix>_char<NNNNN>` files.
    Index {
        /// Directory holding the numbered files.
        #[arg(long)]
        root: PathBuf,

        #[arg(long)]
        prefix: String,

        /// Manifest to write. Defaults to `<root>/manifest.toml`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print crate information.
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// All-zero action.
    Zero,
    /// Uniform samples from the action space.
    Random,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Drapery(#[from] DraperyError),

    #[error("render dump: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::Drapery(e.into())
    }
}

impl From<SimError> for AppError {
    fn from(e: SimError) -> Self {
        Self::Drapery(e.into())
    }
}

impl From<ManifestError> for AppError {
    fn from(e: ManifestError) -> Self {
        Self::Drapery(e.into())
    }
}

// ---------------------------------------------------------------------------
// Episode loop
// ---------------------------------------------------------------------------

fn run_episodes<E>(env: &mut E, args: &RunArgs) -> Result<(), AppError>
where
    E: Environment + DebugRender,
{
    let seeds = SeedHierarchy::new(args.seed);
    let mut rng = seeds.root_rng();
    let space = env.action_space();
    let mut stats = EpisodeStats::new();
    info!(
        env = env.name(),
        obs_dim = env.observation_space().size(),
        act_dim = space.size(),
        "starting run"
    );

    for ep in 0..args.episodes {
        let seed = seeds.episode_seed(0, u64::from(ep));
        env.reset(Some(seed))?;

        let mut episode = Episode::default();
        episode.reset(Some(seed));
        let mut cause = None;
        while episode.is_running() {
            let action = match args.policy {
                Policy::Zero => Action::zeros(space.size()),
                Policy::Random => space.sample(&mut rng),
            };
            let result = env.step(&action)?;
            episode.advance(f64::from(result.reward));
            if result.terminated {
                episode.terminate();
                cause = result.info.termination;
            } else if result.truncated {
                // the environment's own step limit
                episode.check_truncation(episode.step_count);
            } else {
                episode.check_truncation(args.max_steps);
            }
        }

        println!(
            "episode {}: steps={}, reward={:.3}{}",
            ep + 1,
            episode.step_count,
            episode.total_reward,
            cause.map(|c| format!(", ended by {c}")).unwrap_or_default()
        );
        stats.record(&episode, None);
    }

    println!(
        "\ntotal: episodes={}, steps={}, mean reward={:.3}",
        stats.episodes_completed,
        stats.total_steps,
        stats.mean_episode_reward().unwrap_or(0.0)
    );

    if let Some(path) = &args.render {
        write_render(env, path)?;
    }
    Ok(())
}

fn write_render<E: DebugRender>(env: &E, path: &Path) -> Result<(), AppError> {
    let dump = serde_json::json!({
        "camera": env.viewer_setup(),
        "commands": env.extra_render(),
    });
    std::fs::write(path, serde_json::to_string_pretty(&dump)?).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote draw list");
    Ok(())
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_reach(args: &RunArgs) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => ReacherConfig::from_file(path)?,
        None => ReacherConfig::default(),
    };
    let world = KinematicWorld::new(presets::reacher_arm(), args.dt);
    let mut env = ReacherEnv::new(world, config)?;
    run_episodes(&mut env, args)
}

fn run_dress(args: &RunArgs, mesh: &Path, sensors: usize) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => DressingConfig::from_file(path)?,
        None => DressingConfig::default(),
    };
    let cloth = MeshCloth::load(mesh, sensors)?;
    let world = KinematicClothWorld::new(presets::upper_body(), cloth, args.dt);
    let mut env = DressingEnv::new(world, config)?;
    run_episodes(&mut env, args)
}

fn run_index(root: &Path, prefix: &str, output: Option<&Path>) -> Result<(), AppError> {
    let manifest = ResetManifest::scan(root, prefix);
    let output = output.map_or_else(|| root.join("manifest.toml"), Path::to_path_buf);
    manifest.save(&output)?;
    println!(
        "indexed {} reset states into {}",
        manifest.len(),
        output.display()
    );
    Ok(())
}

fn run_info() {
    println!("drapery v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  drapery-core    {}", env!("CARGO_PKG_VERSION"));
    println!("  drapery-physics {}", env!("CARGO_PKG_VERSION"));
    println!("  drapery-env     {}", env!("CARGO_PKG_VERSION"));
    println!();
    let reacher = ReacherConfig::default();
    let dressing = DressingConfig::default();
    println!(
        "reacher:  {} dofs, frame_skip={}",
        reacher.action.dim(),
        reacher.frame_skip
    );
    println!(
        "dressing: {} dofs, frame_skip={}, reward terms={}",
        dressing.action.dim(),
        dressing.frame_skip,
        dressing.reward.weights.len()
    );
    println!();
    println!("edition: 2024");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> std::process::ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Some(Commands::Reach { run }) => run_reach(&run),
        Some(Commands::Dress { run, mesh, sensors }) => run_dress(&run, &mesh, sensors),
        Some(Commands::Index {
            root,
            prefix,
            output,
        }) => run_index(&root, &prefix, output.as_deref()),
        Some(Commands::Info) => {
            run_info();
            Ok(())
        }
        None => run_reach(&RunArgs {
            episodes: 1,
            max_steps: 100,
            seed: 0,
            config: None,
            policy: Policy::Zero,
            render: None,
            dt: 0.01,
        }),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
