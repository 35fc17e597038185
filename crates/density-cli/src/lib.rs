//! Command-line front end for the density check
//!
//! Reads a serialized scene and an optional TOML config, runs the check,
//! writes the recoloured scene and the report, and maps the run outcome
//! onto the process exit code.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use density_core::{
    AnnotationSink, DensityCheck, DensityCheckConfig, InMemoryAnnotations, InMemoryPublisher,
    PublishError, PublishSink, RunContext, RunOutcome, SceneNode, VersionId,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

/// Result of a command, mapped to the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Check passed
    Passed,
    /// Check ran and failed
    Failed,
}

impl RunStatus {
    /// Process exit code: 0 passed, 1 failed
    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Passed => ExitCode::SUCCESS,
            Self::Failed => ExitCode::from(1),
        }
    }
}

/// Publish sink writing the recoloured scene to a JSON file
#[derive(Debug, Clone)]
pub struct FilePublisher {
    path: PathBuf,
}

impl FilePublisher {
    /// Publisher writing to `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PublishSink for FilePublisher {
    fn publish(
        &mut self,
        root: &SceneNode,
        branch: &str,
        message: &str,
    ) -> Result<VersionId, PublishError> {
        let bytes = serde_json::to_vec_pretty(&root.to_json())
            .map_err(|err| PublishError::Rejected(err.to_string()))?;
        fs::write(&self.path, &bytes)?;
        let id = VersionId::from_content(branch, &bytes);
        info!(version = %id, branch, message, path = %self.path.display(), "scene written");
        Ok(id)
    }
}

/// Command-line definition
#[must_use]
pub fn command() -> Command {
    let scene = Arg::new("scene")
        .long("scene")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Serialized scene graph (JSON)");
    let config = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file");
    let density_level = Arg::new("density-level")
        .long("density-level")
        .value_parser(value_parser!(f64))
        .help("Density threshold in bytes per square metre");

    Command::new("density-check")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mesh density check for scene graphs")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("check")
                .about("Run the full check and write the recoloured scene")
                .arg(scene.clone())
                .arg(config.clone())
                .arg(density_level.clone())
                .arg(
                    Arg::new("max-percentage")
                        .long("max-percentage")
                        .value_parser(value_parser!(f64))
                        .help("Tolerated share of high-density objects (0-1)"),
                )
                .arg(
                    Arg::new("recolor-branch")
                        .long("recolor-branch")
                        .help("Branch that receives the recoloured scene"),
                )
                .arg(
                    Arg::new("no-publish")
                        .long("no-publish")
                        .action(ArgAction::SetTrue)
                        .help("Skip writing the recoloured scene"),
                )
                .arg(
                    Arg::new("branch")
                        .long("branch")
                        .default_value("main")
                        .help("Branch the analyzed scene belongs to"),
                )
                .arg(Arg::new("server-url").long("server-url").default_value(""))
                .arg(Arg::new("project-id").long("project-id").default_value(""))
                .arg(Arg::new("version-id").long("version-id").default_value(""))
                .arg(
                    Arg::new("out-scene")
                        .long("out-scene")
                        .value_parser(value_parser!(PathBuf))
                        .help("Where to write the recoloured scene"),
                )
                .arg(
                    Arg::new("report")
                        .long("report")
                        .value_parser(value_parser!(PathBuf))
                        .help("Where to write the JSON report"),
                )
                .arg(
                    Arg::new("annotations")
                        .long("annotations")
                        .value_parser(value_parser!(PathBuf))
                        .help("Where to write emitted annotations as JSON"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the outcome as JSON"),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Print density statistics without touching the scene")
                .arg(scene)
                .arg(config)
                .arg(density_level),
        )
}

/// Install the tracing subscriber, filtered by `RUST_LOG`
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        debug!(error = %err, "tracing subscriber not installed");
    }
}

/// Dispatch parsed arguments
///
/// # Errors
/// Returns an error for unreadable input, invalid configuration or
/// unwritable output. A failed density check is not an error.
pub fn execute(matches: &ArgMatches) -> Result<RunStatus> {
    match matches.subcommand() {
        Some(("check", args)) => check(args),
        Some(("stats", args)) => stats(args),
        _ => anyhow::bail!("unknown command"),
    }
}

fn load_config(args: &ArgMatches) -> Result<DensityCheckConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => DensityCheckConfig::load(path)?,
        None => DensityCheckConfig::default(),
    };
    if let Some(&level) = args.get_one::<f64>("density-level") {
        config = config.with_density_level(level);
    }
    if let Ok(Some(&share)) = args.try_get_one::<f64>("max-percentage") {
        config = config.with_max_percentage(share);
    }
    if let Ok(Some(branch)) = args.try_get_one::<String>("recolor-branch") {
        config = config.with_recolor_branch(branch.clone());
    }
    if args.try_get_one::<bool>("no-publish").ok().flatten() == Some(&true) {
        config = config.with_publish_recolored(false);
    }
    Ok(config)
}

fn load_scene(path: &Path) -> Result<SceneNode> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    SceneNode::from_json_str(&text).with_context(|| format!("invalid scene {}", path.display()))
}

fn string_arg(args: &ArgMatches, name: &str) -> String {
    args.get_one::<String>(name).cloned().unwrap_or_default()
}

fn check(args: &ArgMatches) -> Result<RunStatus> {
    let check = DensityCheck::new(load_config(args)?)?;
    let scene_path = args
        .get_one::<PathBuf>("scene")
        .context("missing --scene")?;
    let mut root = load_scene(scene_path)?;
    let run = RunContext::new(
        string_arg(args, "server-url"),
        string_arg(args, "project-id"),
        string_arg(args, "version-id"),
        string_arg(args, "branch"),
    );

    let mut annotations = InMemoryAnnotations::new();
    let outcome = match args.get_one::<PathBuf>("out-scene") {
        Some(path) => check.run(&mut root, &run, &mut annotations, &mut FilePublisher::new(path)),
        None => check.run(&mut root, &run, &mut annotations, &mut InMemoryPublisher::new()),
    };

    if let Some(path) = args.get_one::<PathBuf>("report") {
        if let Some(report) = outcome.report() {
            fs::write(path, report.to_json_pretty()?)
                .with_context(|| format!("failed to write report {}", path.display()))?;
        }
    }
    if let Some(path) = args.get_one::<PathBuf>("annotations") {
        write_annotations(path, &annotations)?;
    }

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(if outcome.is_success() {
        RunStatus::Passed
    } else {
        RunStatus::Failed
    })
}

fn write_annotations(path: &Path, annotations: &InMemoryAnnotations) -> Result<()> {
    let text = serde_json::to_string_pretty(annotations.annotations())?;
    fs::write(path, text).with_context(|| format!("failed to write annotations {}", path.display()))
}

fn print_outcome(outcome: &RunOutcome) {
    if let Some(report) = outcome.report() {
        println!("{}", report.render_text());
    }
    let label = if outcome.is_success() { "PASSED" } else { "FAILED" };
    println!("{label}: {}", outcome.message());
}

fn stats(args: &ArgMatches) -> Result<RunStatus> {
    let check = DensityCheck::new(load_config(args)?)?;
    let scene_path = args
        .get_one::<PathBuf>("scene")
        .context("missing --scene")?;
    let root = load_scene(scene_path)?;

    let mut discard = Discard;
    match check.analyze(&root, &RunContext::default(), &mut discard) {
        Ok(analysis) => {
            println!("{}", analysis.report.render_text());
            Ok(RunStatus::Passed)
        }
        Err(err) => {
            println!("FAILED: {err}");
            Ok(RunStatus::Failed)
        }
    }
}

struct Discard;

impl AnnotationSink for Discard {
    fn attach(&mut self, _annotation: density_core::Annotation) {}
}
